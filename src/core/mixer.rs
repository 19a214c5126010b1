//! Seam to the external animation engine.
//!
//! The engine owns skinning, interpolation and blending. The flight logic only
//! needs to start, stop and cross-fade clips, steer their playback rate and
//! hear about loop boundaries and finished one-shots. Every method addresses a
//! clip by its index in the loaded asset.

use super::constants::{EVENT_KIND_FINISHED, EVENT_KIND_LOOP, EVENT_KIND_PLAY};
use smallvec::SmallVec;

/// Index of a clip in the loaded asset's clip list.
pub type ClipId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once and raise [`MixerEventKind::Finished`] at the end.
    Once,
    /// Wrap forever, raising [`MixerEventKind::Loop`] at every boundary.
    Repeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixerEventKind {
    Loop,
    Finished,
    Play,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MixerEvent {
    pub kind: MixerEventKind,
    pub clip: ClipId,
}

impl MixerEventKind {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            EVENT_KIND_LOOP => Some(Self::Loop),
            EVENT_KIND_FINISHED => Some(Self::Finished),
            EVENT_KIND_PLAY => Some(Self::Play),
            _ => None,
        }
    }
}

impl MixerEvent {
    pub fn new(kind: MixerEventKind, clip: ClipId) -> Self {
        Self { kind, clip }
    }

    /// Decode one `[kind, clip]` pair of numbers reported by the engine.
    /// Negative, fractional and non-finite slots are malformed, not truncated.
    pub fn decode(kind: f64, clip: f64) -> Option<Self> {
        let kind = whole_index(kind)
            .and_then(|k| u32::try_from(k).ok())
            .and_then(MixerEventKind::from_code)?;
        Some(Self::new(kind, whole_index(clip)?))
    }
}

/// `value` as an index when it is a non-negative whole number.
pub fn whole_index(value: f64) -> Option<usize> {
    (value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64).then_some(value as usize)
}

/// Events raised during one mixer step; a frame rarely produces more than a few.
pub type MixerEvents = SmallVec<[MixerEvent; 4]>;

#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    #[error("cross-fade from clip {from} to clip {to} rejected: {reason}")]
    CrossFadeRejected {
        from: ClipId,
        to: ClipId,
        reason: String,
    },
    #[error("clip {0} is not known to the mixer")]
    UnknownClip(ClipId),
}

pub trait AnimationMixer {
    /// Reset `clip` to t=0, apply the loop mode and start it. Weight is left
    /// to the caller or to a following cross-fade.
    fn start(&mut self, clip: ClipId, mode: LoopMode);

    /// Blend from `from` to `to` over `duration` seconds. With `warp` the
    /// playback rates are synchronized during the blend.
    fn cross_fade(
        &mut self,
        from: ClipId,
        to: ClipId,
        duration: f32,
        warp: bool,
    ) -> Result<(), MixerError>;

    fn stop(&mut self, clip: ClipId);
    fn stop_all(&mut self);
    fn fade_out(&mut self, clip: ClipId, duration: f32);
    fn set_weight(&mut self, clip: ClipId, weight: f32);

    fn time_scale(&self, clip: ClipId) -> f32;
    fn set_time_scale(&mut self, clip: ClipId, scale: f32);

    /// Local playback position of `clip` in seconds.
    fn time(&self, clip: ClipId) -> f32;
    fn duration(&self, clip: ClipId) -> f32;
    fn is_running(&self, clip: ClipId) -> bool;

    /// Advance the engine by `dt` seconds and append the loop/finish events
    /// raised during the step.
    fn update(&mut self, dt: f32, events: &mut MixerEvents);
}
