//! Per-frame pipeline: estimate -> decide -> apply -> advance -> react.
//!
//! Velocity is always recomputed before any transition is evaluated, and clip
//! switches land before the audio trigger looks at the active clip.

use super::clips::ClipSet;
use super::config::FlightConfig;
use super::flap_audio::{AnimationView, AudioFrame, FlapAudio, SoundBank};
use super::flight::{FlightEvent, FlightMachine, FlightPhase, StepOutcome};
use super::mixer::{AnimationMixer, MixerEvent, MixerEventKind, MixerEvents};
use super::velocity::{ScrollSample, VelocityEstimator, VelocitySignal};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub offset: f32,
    pub delta: f32,
    pub dt: f32,
    pub now: f64,
    /// Scroll reached the end of the narrative; silences all audio.
    pub end: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub phase: FlightPhase,
    pub signal: VelocitySignal,
    /// Set on the single frame where sustained flight began.
    pub flight_started: bool,
    /// Last phase entered during this frame.
    pub entered: Option<FlightPhase>,
}

pub struct FlightController<B: SoundBank> {
    estimator: VelocityEstimator,
    machine: FlightMachine,
    audio: FlapAudio<B>,
    events: MixerEvents,
    audio_events: MixerEvents,
}

impl<B: SoundBank> FlightController<B> {
    pub fn new(clips: ClipSet, config: &FlightConfig, bank: B) -> Self {
        Self {
            estimator: VelocityEstimator::new(config.fast_threshold),
            machine: FlightMachine::new(clips, config.fade),
            audio: FlapAudio::new(bank, config.audio.clone()),
            events: MixerEvents::new(),
            audio_events: MixerEvents::new(),
        }
    }

    #[inline]
    pub fn machine(&self) -> &FlightMachine {
        &self.machine
    }

    #[inline]
    pub fn audio(&self) -> &FlapAudio<B> {
        &self.audio
    }

    #[inline]
    pub fn signal(&self) -> VelocitySignal {
        self.estimator.signal()
    }

    pub fn start<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M) {
        self.machine.start(mixer);
    }

    pub fn frame<M: AnimationMixer + ?Sized>(&mut self, input: FrameInput, mixer: &mut M) -> FrameReport {
        let mut report = FrameReport {
            phase: self.machine.phase(),
            signal: VelocitySignal::default(),
            flight_started: false,
            entered: None,
        };
        self.audio_events.clear();

        // estimate
        let signal = self.estimator.update(
            ScrollSample {
                offset: input.offset,
                delta: input.delta,
                dt: input.dt,
                now: input.now,
            },
            self.machine.flight_started(),
        );
        report.signal = signal;

        // decide + apply frame-driven transitions
        if let Some(ev) = self.machine.frame_event(self.estimator.has_scrolled(), &*mixer) {
            let outcome = self.machine.handle(ev, signal, mixer);
            absorb(outcome, &mut self.audio_events, &mut report);
        }
        self.machine.shape_rate(signal.velocity, mixer);

        // advance the engine; loop/finish events are raised inside this step
        self.events.clear();
        mixer.update(input.dt, &mut self.events);
        for ev in self.events.iter().copied() {
            self.audio_events.push(ev);
            if let Some(fe) = self.machine.event_for(ev) {
                let outcome = self.machine.handle(fe, signal, mixer);
                absorb(outcome, &mut self.audio_events, &mut report);
            }
        }

        // audio observes the settled animation state; nothing new sounds at the end
        let view = AnimationView {
            clips: self.machine.clips(),
            active: self.machine.active_clip(),
            mixer: &*mixer,
        };
        if !input.end {
            self.audio.on_events(&self.audio_events, &view, input.now);
        }
        self.audio.frame(
            AudioFrame {
                now: input.now,
                dt: input.dt,
                offset: input.offset,
                end: input.end,
            },
            &view,
        );

        report.phase = self.machine.phase();
        report
    }

    /// Play the glide-flap flourish if currently gliding. Returns whether
    /// the clip switched.
    pub fn request_flourish<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M) -> bool {
        let outcome = self.machine.handle(
            FlightEvent::FlourishRequested,
            self.estimator.signal(),
            mixer,
        );
        outcome.entered == Some(FlightPhase::GlideFlapFlourish)
    }

    /// Stop every voice now. Called on teardown.
    pub fn shutdown(&mut self) {
        self.audio.stop_all();
    }
}

fn absorb(outcome: StepOutcome, audio_events: &mut MixerEvents, report: &mut FrameReport) {
    if let Some(clip) = outcome.started_clip {
        audio_events.push(MixerEvent::new(MixerEventKind::Play, clip));
    }
    if outcome.entered.is_some() {
        report.entered = outcome.entered;
    }
    report.flight_started |= outcome.flight_started;
}
