//! Tunables supplied by the host page. Every field is optional; missing
//! fields take the defaults below.

use super::clips::ClipNames;
use super::constants::*;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlightConfig {
    pub clip_names: ClipNames,
    pub fast_threshold: f32,
    /// Cross-fade duration in seconds; 0 switches clips hard.
    pub fade: f32,
    pub debug: bool,
    pub audio: AudioConfig,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            clip_names: ClipNames::default(),
            fast_threshold: DEFAULT_FAST_THRESHOLD,
            fade: DEFAULT_FADE_SEC,
            debug: false,
            audio: AudioConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioConfig {
    /// Start offset into the flap sound while flapping, seconds.
    pub flap_offset: f64,
    /// Start offset into the flap sound during the take-off transition.
    pub transition_offset: f64,
    pub flap_volume: f32,
    /// Expected flap period when the flap clip length is unknown.
    pub flap_interval: f32,
    /// Expected flap period of the take-off transition clip.
    pub selection_flap_interval: f32,
    pub wind_volume: f32,
    /// Wind volume change per second while fading.
    pub wind_fade_speed: f32,
    pub flap_src: String,
    pub wind_src: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            flap_offset: 0.0,
            transition_offset: 0.0,
            flap_volume: DEFAULT_FLAP_VOLUME,
            flap_interval: DEFAULT_FLAP_INTERVAL_SEC,
            selection_flap_interval: DEFAULT_SELECTION_FLAP_INTERVAL_SEC,
            wind_volume: DEFAULT_WIND_VOLUME,
            wind_fade_speed: DEFAULT_WIND_FADE_PER_SEC,
            flap_src: DEFAULT_FLAP_SRC.into(),
            wind_src: DEFAULT_WIND_SRC.into(),
        }
    }
}

impl FlightConfig {
    /// Clamp values into usable ranges. Non-finite numbers fall back to defaults.
    pub fn sanitized(mut self) -> Self {
        let d = FlightConfig::default();
        self.fast_threshold = finite_or(self.fast_threshold, d.fast_threshold).max(0.0);
        self.fade = finite_or(self.fade, d.fade).max(0.0);

        let a = &mut self.audio;
        a.flap_offset = finite_or(a.flap_offset, 0.0).max(0.0);
        a.transition_offset = finite_or(a.transition_offset, 0.0).max(0.0);
        a.flap_volume = finite_or(a.flap_volume, d.audio.flap_volume).clamp(0.0, 1.0);
        a.wind_volume = finite_or(a.wind_volume, d.audio.wind_volume).clamp(0.0, 1.0);
        a.wind_fade_speed = finite_or(a.wind_fade_speed, d.audio.wind_fade_speed).max(0.0);
        if !(a.flap_interval.is_finite() && a.flap_interval > 0.0) {
            a.flap_interval = d.audio.flap_interval;
        }
        if !(a.selection_flap_interval.is_finite() && a.selection_flap_interval > 0.0) {
            a.selection_flap_interval = d.audio.selection_flap_interval;
        }
        self
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let cfg: FlightConfig = serde_json::from_str(json)?;
        Ok(cfg.sanitized())
    }
}

#[inline]
fn finite_or<T: Into<f64> + Copy>(v: T, fallback: T) -> T {
    if v.into().is_finite() {
        v
    } else {
        fallback
    }
}
