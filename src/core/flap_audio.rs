//! Flap sound effects aligned to the wing beat, plus the ambient wind bed.
//!
//! The trigger never changes clip playback: it reads the active clip, clip
//! rates and running state through a shared borrow of the mixer.

use super::clips::{ClipRole, ClipSet};
use super::config::AudioConfig;
use super::constants::*;
use super::mixer::{AnimationMixer, ClipId, MixerEvent, MixerEventKind};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),
    #[error("seek to {position:.3}s failed: {reason}")]
    SeekFailed { position: f64, reason: String },
    #[error("sound template {0} unavailable")]
    TemplateUnavailable(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceStatus {
    Idle,
    Playing,
    Ended,
    Failed,
}

pub trait SoundVoice {
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn set_playback_rate(&mut self, rate: f32);
    /// Length in seconds, once the media metadata is known.
    fn duration(&self) -> Option<f64>;
    fn seek(&mut self, position: f64) -> Result<(), AudioError>;
    /// Seek to `offset`, clamped to the duration, as soon as the media is ready.
    fn seek_when_ready(&mut self, offset: f64);
    /// Start playback. A rejection may also surface later as
    /// [`VoiceStatus::Failed`].
    fn play(&mut self) -> Result<(), AudioError>;
    /// Pause and rewind to the start.
    fn stop(&mut self);
    fn status(&self) -> VoiceStatus;
}

pub trait SoundBank {
    type Voice: SoundVoice;
    /// A fresh flap voice cloned from the preloaded template.
    fn spawn_flap(&mut self) -> Result<Self::Voice, AudioError>;
    /// The single persistent wind voice.
    fn wind(&mut self) -> &mut Self::Voice;
}

/// Read-only view of the animation state for one frame.
pub struct AnimationView<'a, M: AnimationMixer + ?Sized> {
    pub clips: &'a ClipSet,
    pub active: Option<ClipId>,
    pub mixer: &'a M,
}

impl<'a, M: AnimationMixer + ?Sized> AnimationView<'a, M> {
    fn running(&self, role: ClipRole) -> Option<ClipId> {
        self.clips
            .get(role)
            .filter(|clip| self.mixer.is_running(*clip))
    }

    fn rate(&self, clip: ClipId) -> f32 {
        let r = self.mixer.time_scale(clip);
        if r.is_finite() && r > 0.0 {
            r
        } else {
            1.0
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioFrame {
    pub now: f64,
    pub dt: f32,
    pub offset: f32,
    pub end: bool,
}

#[inline]
pub fn clamp_offset(offset: f64, duration: f64) -> f64 {
    offset.clamp(0.0, duration.max(0.0))
}

#[inline]
pub fn flap_voice_rate(animation_rate: f32) -> f32 {
    animation_rate.clamp(FLAP_RATE_MIN, FLAP_RATE_MAX)
}

/// Seek now when the duration is known, otherwise defer to the ready callback.
pub fn apply_start_offset<V: SoundVoice + ?Sized>(voice: &mut V, offset: f64) {
    if offset == 0.0 {
        return;
    }
    match voice.duration() {
        Some(duration) => {
            if let Err(e) = voice.seek(clamp_offset(offset, duration)) {
                log::debug!("[audio] {}; retrying when ready", e);
                voice.seek_when_ready(offset);
            }
        }
        None => voice.seek_when_ready(offset),
    }
}

#[inline]
fn gate_open(last: Option<f64>, now: f64, expected_interval: f64) -> bool {
    match last {
        None => true,
        Some(t) => now - t >= expected_interval * FLAP_RETRIGGER_FRACTION,
    }
}

pub struct FlapAudio<B: SoundBank> {
    bank: B,
    config: AudioConfig,
    in_flight: Option<B::Voice>,
    last_flap_at: Option<f64>,
    last_takeoff_flap_at: Option<f64>,
    wind_playing: bool,
    last_offset: f32,
}

impl<B: SoundBank> FlapAudio<B> {
    pub fn new(bank: B, config: AudioConfig) -> Self {
        Self {
            bank,
            config,
            in_flight: None,
            last_flap_at: None,
            last_takeoff_flap_at: None,
            wind_playing: false,
            last_offset: 0.0,
        }
    }

    #[inline]
    pub fn bank(&self) -> &B {
        &self.bank
    }

    #[inline]
    pub fn in_flight(&self) -> Option<&B::Voice> {
        self.in_flight.as_ref()
    }

    #[inline]
    pub fn wind_playing(&self) -> bool {
        self.wind_playing
    }

    /// React to loop boundaries and play starts of the flap and take-off clips.
    pub fn on_events<M: AnimationMixer + ?Sized>(
        &mut self,
        events: &[MixerEvent],
        view: &AnimationView<'_, M>,
        now: f64,
    ) {
        for ev in events {
            if ev.kind == MixerEventKind::Finished {
                continue;
            }
            match view.clips.role_of(ev.clip) {
                Some(ClipRole::Flap) => {
                    if ev.kind == MixerEventKind::Play {
                        self.last_flap_at = None;
                    }
                    self.try_flap(view, now);
                }
                Some(ClipRole::TransitionToFlight) => {
                    if ev.kind == MixerEventKind::Play {
                        self.last_takeoff_flap_at = None;
                    }
                    self.try_takeoff_flap(view, now);
                }
                _ => {}
            }
        }
    }

    /// Per-frame work: retire finished voices, run the take-off timer, fade
    /// the wind and silence flaps that no longer match the animation.
    pub fn frame<M: AnimationMixer + ?Sized>(&mut self, frame: AudioFrame, view: &AnimationView<'_, M>) {
        self.reap();
        if frame.end {
            self.stop_all();
            self.last_offset = frame.offset;
            return;
        }

        let flapping = view.running(ClipRole::Flap).is_some();
        let taking_off = view.running(ClipRole::TransitionToFlight).is_some();

        if taking_off {
            self.try_takeoff_flap(view, frame.now);
        }

        self.update_wind(frame, taking_off);

        if !flapping && !taking_off {
            if let Some(mut voice) = self.in_flight.take() {
                voice.stop();
            }
        }
    }

    /// Stop and rewind every voice immediately, regardless of fade state.
    pub fn stop_all(&mut self) {
        if let Some(mut voice) = self.in_flight.take() {
            voice.stop();
        }
        let wind = self.bank.wind();
        wind.stop();
        wind.set_volume(0.0);
        self.wind_playing = false;
    }

    fn reap(&mut self) {
        let done = self
            .in_flight
            .as_ref()
            .map(|v| matches!(v.status(), VoiceStatus::Ended | VoiceStatus::Failed))
            .unwrap_or(false);
        if done {
            self.in_flight = None;
        }
    }

    fn try_flap<M: AnimationMixer + ?Sized>(&mut self, view: &AnimationView<'_, M>, now: f64) {
        let Some(flap) = view.clips.get(ClipRole::Flap) else {
            return;
        };
        if view.active != Some(flap) || !view.mixer.is_running(flap) {
            return;
        }
        self.reap();
        if self.in_flight.is_some() {
            return;
        }
        let rate = view.rate(flap);
        let clip_len = view.mixer.duration(flap);
        let period = if clip_len > 0.0 {
            clip_len
        } else {
            self.config.flap_interval
        };
        let expected = (period / rate) as f64;
        if gate_open(self.last_flap_at, now, expected) {
            self.last_flap_at = Some(now);
            self.trigger(rate, self.config.flap_offset);
        }
    }

    fn try_takeoff_flap<M: AnimationMixer + ?Sized>(&mut self, view: &AnimationView<'_, M>, now: f64) {
        let Some(clip) = view.running(ClipRole::TransitionToFlight) else {
            return;
        };
        self.reap();
        if self.in_flight.is_some() {
            return;
        }
        let rate = view.rate(clip);
        let expected = (self.config.selection_flap_interval / rate) as f64;
        if gate_open(self.last_takeoff_flap_at, now, expected) {
            self.last_takeoff_flap_at = Some(now);
            self.trigger(rate, self.config.transition_offset);
        }
    }

    fn trigger(&mut self, rate: f32, offset: f64) {
        let mut voice = match self.bank.spawn_flap() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("[audio] flap skipped: {}", e);
                return;
            }
        };
        voice.set_volume(self.config.flap_volume);
        voice.set_playback_rate(flap_voice_rate(rate));
        apply_start_offset(&mut voice, offset);
        match voice.play() {
            Ok(()) => self.in_flight = Some(voice),
            Err(e) => log::warn!("[audio] flap play failed: {}", e),
        }
    }

    fn update_wind(&mut self, frame: AudioFrame, taking_off: bool) {
        let moving = frame.offset - self.last_offset > WIND_SCROLL_DELTA_MIN;
        self.last_offset = frame.offset;

        let target = self.config.wind_volume;
        let step = frame.dt.max(0.0) * self.config.wind_fade_speed;
        let wind = self.bank.wind();

        if self.wind_playing && wind.status() == VoiceStatus::Failed {
            self.wind_playing = false;
        }

        if moving && !taking_off {
            if !self.wind_playing {
                wind.set_volume(0.0);
                if let Err(e) = wind.play() {
                    log::warn!("[audio] wind play failed: {}", e);
                }
                self.wind_playing = true;
            }
            let v = wind.volume();
            if v < target {
                wind.set_volume((v + step).min(target));
            }
        } else if self.wind_playing {
            let v = (wind.volume() - step).max(0.0);
            wind.set_volume(v);
            if v <= 0.0 {
                wind.stop();
                self.wind_playing = false;
            }
        }
    }
}

impl<B: SoundBank> Drop for FlapAudio<B> {
    fn drop(&mut self) {
        self.stop_all();
    }
}
