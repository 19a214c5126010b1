pub mod clips;
pub mod config;
pub mod constants;
pub mod controller;
pub mod flap_audio;
pub mod flight;
pub mod mixer;
pub mod velocity;

pub use clips::*;
pub use config::*;
pub use controller::*;
pub use flap_audio::*;
pub use flight::*;
pub use mixer::*;
pub use velocity::*;
