// Host-side integration tests: the full per-frame pipeline against a
// scripted mixer and recording sound bank.

mod common;

use common::*;
use flight_web::core::*;

struct Rig {
    controller: FlightController<RecordingBank>,
    mixer: ScriptedMixer,
    now: f64,
    offset: f32,
}

impl Rig {
    fn new() -> Self {
        Self::with_clips(&CLIP_NAMES, ScriptedMixer::bird())
    }

    fn with_clips(names: &[&str], mut mixer: ScriptedMixer) -> Self {
        let mut controller = FlightController::new(
            ClipSet::resolve(names, &ClipNames::default()),
            &FlightConfig::default(),
            RecordingBank::new(Some(0.4)),
        );
        controller.start(&mut mixer);
        Self {
            controller,
            mixer,
            now: 0.0,
            offset: 0.0,
        }
    }

    fn step_with(&mut self, offset_step: f32, delta: f32, end: bool) -> FrameReport {
        self.now += FRAME_DT as f64;
        self.offset += offset_step;
        let report = self.controller.frame(
            FrameInput {
                offset: self.offset,
                delta,
                dt: FRAME_DT,
                now: self.now,
                end,
            },
            &mut self.mixer,
        );
        // Every frame leaves the active clip playing
        let active = self.controller.machine().active_clip().expect("active clip");
        assert!(self.mixer.running().contains(&active));
        report
    }

    fn step(&mut self, offset_step: f32, delta: f32) -> FrameReport {
        self.step_with(offset_step, delta, false)
    }

    /// Let every spawned flap voice run to its end.
    fn finish_sounds(&self) {
        for v in &self.controller.audio().bank().spawned {
            v.borrow_mut().status = VoiceStatus::Ended;
        }
    }

    fn take_off(&mut self) {
        self.step(0.01, 0.01);
        for _ in 0..90 {
            self.step(0.0001, 0.0001);
        }
        assert_eq!(self.controller.machine().phase(), FlightPhase::Flapping);
    }
}

#[test]
fn stays_idle_without_scroll() {
    let mut rig = Rig::new();
    for _ in 0..120 {
        let r = rig.step(0.0, 0.0);
        assert_eq!(r.phase, FlightPhase::Idle);
        assert!(!r.flight_started);
    }
    assert!(rig.controller.audio().bank().spawned.is_empty());
    assert!(!rig.controller.audio().wind_playing());
}

#[test]
fn first_scroll_takes_off_in_the_same_frame() {
    let mut rig = Rig::new();
    assert_eq!(rig.step(0.0, 0.0).phase, FlightPhase::Idle);

    let r = rig.step(0.01, 0.01);
    assert_eq!(r.phase, FlightPhase::TransitioningToFlight);
    assert_eq!(r.entered, Some(FlightPhase::TransitioningToFlight));
    assert!(!r.flight_started);
    assert_eq!(rig.controller.machine().active_clip(), Some(TAKEOFF));
    // The new clip was advanced by this frame's mixer step
    assert!((rig.mixer.clips[TAKEOFF].time - FRAME_DT).abs() < 1e-6);

    // Take-off flap plays as soon as the clip starts; no wind during take-off
    assert_eq!(rig.controller.audio().bank().spawned.len(), 1);
    assert!(!rig.controller.audio().wind_playing());
}

#[test]
fn slow_flight_reports_start_once_and_keeps_flapping() {
    let mut rig = Rig::new();
    let mut starts = 0;
    let mut started_at = None;
    rig.step(0.01, 0.01);
    for _ in 0..600 {
        let r = rig.step(0.0001, 0.0001);
        if r.flight_started {
            starts += 1;
            started_at = Some(rig.now);
        }
        assert!(!r.signal.fast);
        rig.finish_sounds();
    }
    assert_eq!(starts, 1);
    // Take-off clip is 1s long
    let t = started_at.unwrap();
    assert!(t > 0.9 && t < 1.2, "flight started at {}", t);

    assert_eq!(rig.controller.machine().phase(), FlightPhase::Flapping);
    assert!(rig.controller.machine().flight_started());
    assert!(rig.controller.audio().bank().spawned.len() >= 5);
    // Offset creeps too slowly to count as moving
    assert!(!rig.controller.audio().wind_playing());
}

#[test]
fn fast_scroll_glides_and_slowing_down_flaps_again() {
    let mut rig = Rig::new();
    rig.take_off();

    let mut seen = Vec::new();
    for _ in 0..120 {
        let r = rig.step(0.005, 0.05);
        assert!(r.signal.fast);
        if let Some(p) = r.entered {
            seen.push(p);
        }
        rig.finish_sounds();
    }
    assert_eq!(
        seen,
        vec![FlightPhase::TransitioningToGlide, FlightPhase::Gliding]
    );
    assert_eq!(rig.controller.machine().phase(), FlightPhase::Gliding);
    assert_eq!(rig.mixer.clips[FLAP].scale, 1.0);
    assert_eq!(rig.mixer.clips[GLIDE].scale, 1.0);

    // Stop scrolling: back to flapping at a glide loop boundary
    let mut back = None;
    for i in 0..240 {
        let r = rig.step(0.0, 0.0);
        if r.entered == Some(FlightPhase::Flapping) {
            assert!(!r.signal.fast);
            back = Some(i);
        }
        rig.finish_sounds();
    }
    assert!(back.is_some());
    assert_eq!(rig.controller.machine().phase(), FlightPhase::Flapping);

    // Cross-fades settle on a single playing clip
    for _ in 0..30 {
        rig.step(0.0, 0.0);
    }
    assert_eq!(rig.mixer.running(), vec![FLAP]);
}

#[test]
fn fast_scroll_speeds_up_the_wing_beat() {
    let mut rig = Rig::new();
    rig.take_off();
    for _ in 0..10 {
        rig.step(0.005, 0.05);
    }
    if rig.controller.machine().phase() == FlightPhase::Flapping {
        assert!(rig.mixer.clips[FLAP].scale > 2.0);
    }
}

#[test]
fn reaching_the_end_silences_audio() {
    let mut rig = Rig::new();
    rig.take_off();
    for _ in 0..10 {
        rig.step(0.001, 0.001);
    }
    assert!(rig.controller.audio().wind_playing());

    rig.step_with(0.001, 0.001, true);
    assert!(!rig.controller.audio().wind_playing());
    assert!(rig.controller.audio().in_flight().is_none());
    // Animation keeps going
    assert_eq!(rig.controller.machine().phase(), FlightPhase::Flapping);
}

#[test]
fn no_flaps_trigger_while_at_the_end() {
    let mut rig = Rig::new();
    rig.take_off();
    rig.finish_sounds();
    let spawned = rig.controller.audio().bank().spawned.len();

    // Five seconds of one-second flap loops with the end flag set
    for _ in 0..300 {
        rig.step_with(0.0, 0.0, true);
        rig.finish_sounds();
    }
    assert_eq!(rig.controller.audio().bank().spawned.len(), spawned);
    assert!(rig.controller.audio().in_flight().is_none());
    assert_eq!(rig.controller.machine().phase(), FlightPhase::Flapping);
}

#[test]
fn glide_transition_without_glide_clip_keeps_flapping() {
    let names = [
        "Teratorn_Idle",
        "Teratorn_Transition-Flying",
        "Teratorn_Flapping",
        "Teratorn_Transition-Gliding",
    ];
    let mut rig = Rig::with_clips(&names, ScriptedMixer::new(&[2.0, 1.0, 1.0, 0.8]));
    rig.take_off();

    for _ in 0..600 {
        let r = rig.step(0.005, 0.05);
        assert_eq!(r.entered, None);
        assert_eq!(r.phase, FlightPhase::Flapping);
        rig.finish_sounds();
    }
    assert!(!rig.mixer.calls.iter().any(|c| matches!(c, Call::FadeOut(..))));
    assert_eq!(rig.mixer.running(), vec![2]);
}

#[test]
fn shutdown_stops_wind() {
    let mut rig = Rig::new();
    rig.take_off();
    for _ in 0..10 {
        rig.step(0.001, 0.001);
    }
    rig.controller.shutdown();
    assert!(!rig.controller.audio().wind_playing());
    assert_eq!(rig.controller.audio().bank().wind.state.borrow().volume, 0.0);
}
