// Flight and audio tuning constants shared by the core modules.

// Velocity estimation
pub const OFFSET_VELOCITY_WEIGHT: f32 = 0.2; // offset-derived speed is noisier than the scroll delta
pub const FALLBACK_FRAME_RATE: f32 = 60.0; // assumed fps when the frame delta is not usable
pub const PRE_FLIGHT_DAMPING: f32 = 0.001; // scroll speed multiplier until flight has started
pub const VELOCITY_EMA_ALPHA: f32 = 0.3; // new = (1-α)*old + α*sample
pub const DEFAULT_FAST_THRESHOLD: f32 = 0.005;
pub const FAST_INTENT_HOLD_SEC: f64 = 0.6; // hysteresis window after the last fast sample

// Flight state machine
pub const DEFAULT_FADE_SEC: f32 = 0.25;
pub const FAST_LOOPS_BEFORE_GLIDE: u32 = 2;
pub const MIN_GLIDE_TAIL_SEC: f32 = 0.02;

// Playback-rate shaping for flap phases
pub const RATE_VELOCITY_GAIN: f32 = 50.0;
pub const RATE_MIN: f32 = 0.9;
pub const RATE_MAX: f32 = 20.0;
pub const RATE_LERP: f32 = 0.3;

// Flap audio
pub const DEFAULT_FLAP_VOLUME: f32 = 0.5;
pub const DEFAULT_FLAP_INTERVAL_SEC: f32 = 1.083; // 12 flaps in 13 seconds
pub const DEFAULT_SELECTION_FLAP_INTERVAL_SEC: f32 = 0.5;
pub const FLAP_RETRIGGER_FRACTION: f64 = 0.3; // share of the expected interval before re-arming
pub const FLAP_RATE_MIN: f32 = 0.5;
pub const FLAP_RATE_MAX: f32 = 2.0;

// Ambient wind
pub const DEFAULT_WIND_VOLUME: f32 = 0.5;
pub const DEFAULT_WIND_FADE_PER_SEC: f32 = 2.0;
pub const WIND_SCROLL_DELTA_MIN: f32 = 0.0005; // forward offset change per frame that counts as moving

// Sound assets
pub const DEFAULT_FLAP_SRC: &str = "/sounds/flap.mp3";
pub const DEFAULT_WIND_SRC: &str = "/sounds/gust.mp3";

// Event kind codes in the flat `[kind, clip, ...]` array the engine bridge reports
pub const EVENT_KIND_LOOP: u32 = 0;
pub const EVENT_KIND_FINISHED: u32 = 1;
pub const EVENT_KIND_PLAY: u32 = 2;
