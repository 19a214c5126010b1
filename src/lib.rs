//! Scroll-driven bird flight: animation phase control and flap audio.
//!
//! `core` is plain Rust and builds on every target; the browser glue (mixer
//! bridge, `<audio>` voices, exported driver) only exists on wasm32.

pub mod core;

#[cfg(target_arch = "wasm32")]
mod audio;
#[cfg(target_arch = "wasm32")]
mod bridge;
#[cfg(target_arch = "wasm32")]
mod constants;
#[cfg(target_arch = "wasm32")]
mod driver;
#[cfg(target_arch = "wasm32")]
mod frame;

#[cfg(target_arch = "wasm32")]
pub use bridge::MixerBridge;
#[cfg(target_arch = "wasm32")]
pub use driver::*;
