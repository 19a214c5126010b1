// Host-side test doubles: a mixer that advances clip time and raises
// loop/finish events like the engine does, and a sound bank that records
// every voice it hands out.

#![allow(dead_code)]

use flight_web::core::*;
use std::cell::RefCell;
use std::rc::Rc;

pub const CLIP_NAMES: [&str; 6] = [
    "Teratorn_Idle",
    "Teratorn_Transition-Flying",
    "Teratorn_Flapping",
    "Teratorn_Transition-Gliding",
    "Teratorn_Gliding",
    "Teratorn_Gliding-Flapping",
];

// Indices of CLIP_NAMES
pub const IDLE: ClipId = 0;
pub const TAKEOFF: ClipId = 1;
pub const FLAP: ClipId = 2;
pub const TO_GLIDE: ClipId = 3;
pub const GLIDE: ClipId = 4;
pub const GLIDE_FLAP: ClipId = 5;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Start(ClipId, LoopMode),
    CrossFade(ClipId, ClipId, f32, bool),
    Stop(ClipId),
    StopAll,
    FadeOut(ClipId, f32),
    SetWeight(ClipId, f32),
}

#[derive(Clone, Debug)]
pub struct ClipState {
    pub duration: f32,
    pub time: f32,
    pub scale: f32,
    pub weight: f32,
    pub running: bool,
    pub mode: LoopMode,
    pub fading_for: Option<f32>,
}

impl ClipState {
    fn new(duration: f32) -> Self {
        Self {
            duration,
            time: 0.0,
            scale: 1.0,
            weight: 0.0,
            running: false,
            mode: LoopMode::Repeat,
            fading_for: None,
        }
    }
}

pub struct ScriptedMixer {
    pub clips: Vec<ClipState>,
    pub calls: Vec<Call>,
    pub reject_cross_fade: bool,
}

impl ScriptedMixer {
    pub fn new(durations: &[f32]) -> Self {
        Self {
            clips: durations.iter().map(|d| ClipState::new(*d)).collect(),
            calls: Vec::new(),
            reject_cross_fade: false,
        }
    }

    /// Idle 2s, take-off 1s, flap 1s, to-glide 0.8s, glide 2s, glide-flap 1s.
    pub fn bird() -> Self {
        Self::new(&[2.0, 1.0, 1.0, 0.8, 2.0, 1.0])
    }

    pub fn running(&self) -> Vec<ClipId> {
        (0..self.clips.len())
            .filter(|i| self.clips[*i].running)
            .collect()
    }

    pub fn starts(&self) -> Vec<ClipId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Start(clip, _) => Some(*clip),
                _ => None,
            })
            .collect()
    }
}

impl AnimationMixer for ScriptedMixer {
    fn start(&mut self, clip: ClipId, mode: LoopMode) {
        self.calls.push(Call::Start(clip, mode));
        let c = &mut self.clips[clip];
        c.time = 0.0;
        c.mode = mode;
        c.running = true;
        c.fading_for = None;
    }

    fn cross_fade(
        &mut self,
        from: ClipId,
        to: ClipId,
        duration: f32,
        warp: bool,
    ) -> Result<(), MixerError> {
        if self.reject_cross_fade {
            return Err(MixerError::CrossFadeRejected {
                from,
                to,
                reason: "scripted rejection".into(),
            });
        }
        self.calls.push(Call::CrossFade(from, to, duration, warp));
        self.clips[from].fading_for = Some(duration);
        self.clips[to].weight = 1.0;
        Ok(())
    }

    fn stop(&mut self, clip: ClipId) {
        self.calls.push(Call::Stop(clip));
        let c = &mut self.clips[clip];
        c.running = false;
        c.time = 0.0;
        c.weight = 0.0;
    }

    fn stop_all(&mut self) {
        self.calls.push(Call::StopAll);
        for c in self.clips.iter_mut() {
            c.running = false;
            c.time = 0.0;
        }
    }

    fn fade_out(&mut self, clip: ClipId, duration: f32) {
        self.calls.push(Call::FadeOut(clip, duration));
        self.clips[clip].fading_for = Some(duration);
    }

    fn set_weight(&mut self, clip: ClipId, weight: f32) {
        self.calls.push(Call::SetWeight(clip, weight));
        self.clips[clip].weight = weight;
    }

    fn time_scale(&self, clip: ClipId) -> f32 {
        self.clips[clip].scale
    }

    fn set_time_scale(&mut self, clip: ClipId, scale: f32) {
        self.clips[clip].scale = scale;
    }

    fn time(&self, clip: ClipId) -> f32 {
        self.clips[clip].time
    }

    fn duration(&self, clip: ClipId) -> f32 {
        self.clips[clip].duration
    }

    fn is_running(&self, clip: ClipId) -> bool {
        self.clips[clip].running
    }

    fn update(&mut self, dt: f32, events: &mut MixerEvents) {
        for (i, c) in self.clips.iter_mut().enumerate() {
            if !c.running {
                continue;
            }
            c.time += dt * c.scale;
            match c.mode {
                LoopMode::Repeat => {
                    while c.duration > 0.0 && c.time >= c.duration {
                        c.time -= c.duration;
                        events.push(MixerEvent::new(MixerEventKind::Loop, i));
                    }
                }
                LoopMode::Once => {
                    if c.time >= c.duration {
                        c.time = c.duration;
                        c.running = false;
                        events.push(MixerEvent::new(MixerEventKind::Finished, i));
                    }
                }
            }
            if let Some(left) = c.fading_for.as_mut() {
                *left -= dt;
                if *left <= 0.0 {
                    c.fading_for = None;
                    c.running = false;
                    c.weight = 0.0;
                }
            }
        }
    }
}

// ---------------- Sounds ----------------

#[derive(Clone, Debug)]
pub struct VoiceState {
    pub volume: f32,
    pub rate: f32,
    pub position: f64,
    pub duration: Option<f64>,
    pub deferred_seek: Option<f64>,
    pub status: VoiceStatus,
    pub plays: u32,
    pub stops: u32,
}

pub struct FakeVoice {
    pub state: Rc<RefCell<VoiceState>>,
    pub reject_play: bool,
}

impl FakeVoice {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            state: Rc::new(RefCell::new(VoiceState {
                volume: 1.0,
                rate: 1.0,
                position: 0.0,
                duration,
                deferred_seek: None,
                status: VoiceStatus::Idle,
                plays: 0,
                stops: 0,
            })),
            reject_play: false,
        }
    }
}

/// Simulate the media becoming ready: apply a deferred seek like the
/// `canplay` handler does.
pub fn make_ready(state: &Rc<RefCell<VoiceState>>, duration: f64) {
    let mut s = state.borrow_mut();
    s.duration = Some(duration);
    if let Some(offset) = s.deferred_seek.take() {
        s.position = clamp_offset(offset, duration);
    }
}

impl SoundVoice for FakeVoice {
    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.state.borrow_mut().rate = rate;
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn seek(&mut self, position: f64) -> Result<(), AudioError> {
        self.state.borrow_mut().position = position;
        Ok(())
    }

    fn seek_when_ready(&mut self, offset: f64) {
        self.state.borrow_mut().deferred_seek = Some(offset);
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let mut s = self.state.borrow_mut();
        s.plays += 1;
        if self.reject_play {
            s.status = VoiceStatus::Failed;
            return Err(AudioError::PlaybackRejected("autoplay blocked".into()));
        }
        s.status = VoiceStatus::Playing;
        Ok(())
    }

    fn stop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.stops += 1;
        s.position = 0.0;
        s.status = VoiceStatus::Idle;
    }

    fn status(&self) -> VoiceStatus {
        self.state.borrow().status
    }
}

pub struct RecordingBank {
    pub flap_duration: Option<f64>,
    pub reject_play: bool,
    pub spawned: Vec<Rc<RefCell<VoiceState>>>,
    pub wind: FakeVoice,
}

impl RecordingBank {
    pub fn new(flap_duration: Option<f64>) -> Self {
        Self {
            flap_duration,
            reject_play: false,
            spawned: Vec::new(),
            wind: FakeVoice::new(Some(4.0)),
        }
    }

    pub fn last(&self) -> Option<Rc<RefCell<VoiceState>>> {
        self.spawned.last().cloned()
    }
}

impl SoundBank for RecordingBank {
    type Voice = FakeVoice;

    fn spawn_flap(&mut self) -> Result<FakeVoice, AudioError> {
        let mut voice = FakeVoice::new(self.flap_duration);
        voice.reject_play = self.reject_play;
        self.spawned.push(voice.state.clone());
        Ok(voice)
    }

    fn wind(&mut self) -> &mut FakeVoice {
        &mut self.wind
    }
}

pub fn bird_clips() -> ClipSet {
    ClipSet::resolve(&CLIP_NAMES, &ClipNames::default())
}

pub const FRAME_DT: f32 = 1.0 / 60.0;
