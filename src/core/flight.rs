//! Flight phase state machine.
//!
//! Transitions are a pure table over `(phase, event)` with guards taken from
//! the velocity signal and the machine's own fast-loop counter. Applying a
//! transition is the only place that touches clip playback.

use super::clips::{ClipRole, ClipSet};
use super::constants::*;
use super::mixer::{AnimationMixer, ClipId, LoopMode, MixerEvent, MixerEventKind};
use super::velocity::VelocitySignal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightPhase {
    Idle,
    TransitioningToFlight,
    Flapping,
    TransitioningToGlide,
    Gliding,
    GlideFlapFlourish,
}

impl FlightPhase {
    pub fn role(self) -> ClipRole {
        match self {
            FlightPhase::Idle => ClipRole::Idle,
            FlightPhase::TransitioningToFlight => ClipRole::TransitionToFlight,
            FlightPhase::Flapping => ClipRole::Flap,
            FlightPhase::TransitioningToGlide => ClipRole::TransitionToGlide,
            FlightPhase::Gliding => ClipRole::Glide,
            FlightPhase::GlideFlapFlourish => ClipRole::GlideFlap,
        }
    }

    /// Clips that end in a natural finish play once; the rest loop forever.
    pub fn loop_mode(self) -> LoopMode {
        match self {
            FlightPhase::TransitioningToFlight
            | FlightPhase::TransitioningToGlide
            | FlightPhase::GlideFlapFlourish => LoopMode::Once,
            _ => LoopMode::Repeat,
        }
    }

    #[inline]
    pub fn is_one_shot_transition(self) -> bool {
        matches!(
            self,
            FlightPhase::TransitioningToFlight | FlightPhase::TransitioningToGlide
        )
    }

    /// Phase entered when this play-once clip completes.
    pub fn successor(self) -> Option<FlightPhase> {
        match self {
            FlightPhase::TransitioningToFlight => Some(FlightPhase::Flapping),
            FlightPhase::TransitioningToGlide => Some(FlightPhase::Gliding),
            FlightPhase::GlideFlapFlourish => Some(FlightPhase::Flapping),
            _ => None,
        }
    }

    /// Phases whose playback rate follows scroll speed.
    #[inline]
    pub fn shapes_rate(self) -> bool {
        matches!(
            self,
            FlightPhase::Flapping
                | FlightPhase::GlideFlapFlourish
                | FlightPhase::TransitioningToGlide
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightEvent {
    /// First frame with a nonzero scroll offset.
    ScrollStarted,
    Looped(ClipRole),
    Finished(ClipRole),
    /// The glide transition is within its cross-fade tail.
    TailReached,
    /// Host asked for a decorative flap while gliding.
    FlourishRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Switch to the next phase's clip.
    Switch,
    /// Fade the active clip out explicitly, then switch.
    FadeOutAndSwitch,
    /// Stay; one more fast loop observed.
    CountFastLoop,
    /// Stay; the fast streak is broken.
    ResetFastLoops,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: FlightPhase,
    pub action: Action,
}

impl Transition {
    fn switch(next: FlightPhase) -> Self {
        Self {
            next,
            action: Action::Switch,
        }
    }

    fn stay(phase: FlightPhase, action: Action) -> Self {
        Self {
            next: phase,
            action,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Guards {
    pub fast: bool,
    pub fast_loops: u32,
}

/// The transition table. `None` means the event is ignored in this phase,
/// which covers every loop/finish of a clip other than the active one.
pub fn next_transition(
    phase: FlightPhase,
    event: FlightEvent,
    guards: Guards,
) -> Option<Transition> {
    use ClipRole as R;
    use FlightEvent as E;
    use FlightPhase as P;
    match (phase, event) {
        (P::Idle, E::ScrollStarted) => Some(Transition::switch(P::TransitioningToFlight)),
        (P::TransitioningToFlight, E::Finished(R::TransitionToFlight)) => {
            Some(Transition::switch(P::Flapping))
        }
        (P::Flapping, E::Looped(R::Flap)) if guards.fast => {
            if guards.fast_loops + 1 >= FAST_LOOPS_BEFORE_GLIDE {
                Some(Transition::switch(P::TransitioningToGlide))
            } else {
                Some(Transition::stay(P::Flapping, Action::CountFastLoop))
            }
        }
        (P::Flapping, E::Looped(R::Flap)) => {
            Some(Transition::stay(P::Flapping, Action::ResetFastLoops))
        }
        (P::TransitioningToGlide, E::Finished(R::TransitionToGlide)) => {
            Some(Transition::switch(P::Gliding))
        }
        (P::TransitioningToGlide, E::TailReached) => Some(Transition {
            next: P::Gliding,
            action: Action::FadeOutAndSwitch,
        }),
        (P::Gliding, E::Looped(R::Glide)) if !guards.fast => Some(Transition::switch(P::Flapping)),
        (P::Gliding, E::FlourishRequested) => Some(Transition::switch(P::GlideFlapFlourish)),
        (P::GlideFlapFlourish, E::Finished(R::GlideFlap)) => Some(Transition::switch(P::Flapping)),
        _ => None,
    }
}

/// What changed while applying a transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Phase entered, if a clip switch happened.
    pub entered: Option<FlightPhase>,
    /// Clip that was (re)started from t=0.
    pub started_clip: Option<ClipId>,
    /// True exactly once per session, when sustained flight begins.
    pub flight_started: bool,
}

pub struct FlightMachine {
    clips: ClipSet,
    fade: f32,
    phase: FlightPhase,
    active: Option<ClipId>,
    fast_loops: u32,
    flight_started: bool,
}

impl FlightMachine {
    pub fn new(clips: ClipSet, fade: f32) -> Self {
        Self {
            clips,
            fade: fade.max(0.0),
            phase: FlightPhase::Idle,
            active: None,
            fast_loops: 0,
            flight_started: false,
        }
    }

    #[inline]
    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    /// The single clip whose loop/finish events drive transitions.
    #[inline]
    pub fn active_clip(&self) -> Option<ClipId> {
        self.active
    }

    #[inline]
    pub fn clips(&self) -> &ClipSet {
        &self.clips
    }

    #[inline]
    pub fn fast_loops(&self) -> u32 {
        self.fast_loops
    }

    #[inline]
    pub fn flight_started(&self) -> bool {
        self.flight_started
    }

    #[inline]
    pub fn fade(&self) -> f32 {
        self.fade
    }

    /// Begin in Idle with the resting clip looping. Falls back to the flap
    /// clip when the asset has no idle clip.
    pub fn start<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M) -> StepOutcome {
        mixer.stop_all();
        self.phase = FlightPhase::Idle;
        self.active = None;
        let resting = self
            .clips
            .get(ClipRole::Idle)
            .or_else(|| self.clips.get(ClipRole::Flap));
        match resting {
            Some(clip) => {
                self.switch_clip(mixer, clip, LoopMode::Repeat);
                StepOutcome {
                    entered: Some(FlightPhase::Idle),
                    started_clip: Some(clip),
                    flight_started: false,
                }
            }
            None => {
                log::warn!("[flight] no idle or flap clip; nothing to play at rest");
                StepOutcome::default()
            }
        }
    }

    /// Frame-driven events: the first scroll and the glide transition tail.
    pub fn frame_event<M: AnimationMixer + ?Sized>(
        &self,
        scrolled: bool,
        mixer: &M,
    ) -> Option<FlightEvent> {
        match self.phase {
            FlightPhase::Idle if scrolled && !self.flight_started => {
                Some(FlightEvent::ScrollStarted)
            }
            FlightPhase::TransitioningToGlide => {
                let clip = self.active?;
                let remaining = mixer.duration(clip) - mixer.time(clip);
                (remaining <= MIN_GLIDE_TAIL_SEC.max(self.fade)).then_some(FlightEvent::TailReached)
            }
            _ => None,
        }
    }

    /// Map an engine event onto a machine event. Play notifications carry no
    /// transition meaning.
    pub fn event_for(&self, ev: MixerEvent) -> Option<FlightEvent> {
        let role = self.clips.role_of(ev.clip)?;
        match ev.kind {
            MixerEventKind::Loop => Some(FlightEvent::Looped(role)),
            MixerEventKind::Finished => Some(FlightEvent::Finished(role)),
            MixerEventKind::Play => None,
        }
    }

    /// Pure decision step over the current phase.
    pub fn decide(&self, event: FlightEvent, signal: VelocitySignal) -> Option<Transition> {
        next_transition(
            self.phase,
            event,
            Guards {
                fast: signal.fast,
                fast_loops: self.fast_loops,
            },
        )
    }

    pub fn handle<M: AnimationMixer + ?Sized>(
        &mut self,
        event: FlightEvent,
        signal: VelocitySignal,
        mixer: &mut M,
    ) -> StepOutcome {
        match self.decide(event, signal) {
            Some(t) => self.apply(t, mixer),
            None => StepOutcome::default(),
        }
    }

    pub fn apply<M: AnimationMixer + ?Sized>(
        &mut self,
        transition: Transition,
        mixer: &mut M,
    ) -> StepOutcome {
        match transition.action {
            Action::CountFastLoop => {
                self.fast_loops += 1;
                log::debug!("[flight] fast flap loop {}", self.fast_loops);
                StepOutcome::default()
            }
            Action::ResetFastLoops => {
                self.fast_loops = 0;
                StepOutcome::default()
            }
            Action::FadeOutAndSwitch => {
                if let Some(clip) = self.active {
                    mixer.fade_out(clip, self.fade);
                }
                self.enter(transition.next, mixer)
            }
            Action::Switch => self.enter(transition.next, mixer),
        }
    }

    fn enter<M: AnimationMixer + ?Sized>(&mut self, next: FlightPhase, mixer: &mut M) -> StepOutcome {
        let from = self.phase;
        self.fast_loops = 0;
        let mut outcome = StepOutcome::default();

        match self.resolve_target(next) {
            Some(phase) => {
                if let Some(clip) = self.clips.get(phase.role()) {
                    self.switch_clip(mixer, clip, phase.loop_mode());
                    log::debug!("[flight] {:?} -> {:?} (clip {})", from, phase, clip);
                    self.phase = phase;
                    outcome.entered = Some(phase);
                    outcome.started_clip = Some(clip);
                }
            }
            None => {
                log::warn!("[flight] no clip for {:?}; staying in {:?}", next, from);
            }
        }

        // Take-off is over once we reach flapping, or when it cannot be played at all.
        let takeoff_over = match (from, self.phase) {
            (_, FlightPhase::Flapping) => true,
            (FlightPhase::Idle, FlightPhase::Idle) => next == FlightPhase::TransitioningToFlight,
            (FlightPhase::TransitioningToFlight, FlightPhase::TransitioningToFlight) => true,
            _ => false,
        };
        if takeoff_over && !self.flight_started {
            self.flight_started = true;
            outcome.flight_started = true;
            log::info!("[flight] flight started");
        }
        outcome
    }

    /// Clip-backed phase to enter for `next`. One-shot transitions without a
    /// clip are bypassed to their successor. A play-once phase is only entered
    /// when its successor can be entered too, so finishing never strands the
    /// machine on a stopped clip.
    fn resolve_target(&self, next: FlightPhase) -> Option<FlightPhase> {
        let successor = next.successor();
        if self.clips.has(next.role()) {
            return match successor {
                Some(s) if self.resolve_target(s).is_none() => None,
                _ => Some(next),
            };
        }
        if next.is_one_shot_transition() {
            return successor.and_then(|s| self.resolve_target(s));
        }
        None
    }

    fn switch_clip<M: AnimationMixer + ?Sized>(&mut self, mixer: &mut M, next: ClipId, mode: LoopMode) {
        let prev = self.active;
        mixer.start(next, mode);
        match prev {
            Some(prev) if prev != next => {
                // The outgoing clip must not keep a shaped rate into its next use.
                mixer.set_time_scale(prev, 1.0);
                if self.fade > 0.0 {
                    if let Err(e) = mixer.cross_fade(prev, next, self.fade, true) {
                        log::warn!("[flight] {}; switching without fade", e);
                        mixer.stop(prev);
                        mixer.set_weight(next, 1.0);
                    }
                } else {
                    mixer.stop(prev);
                    mixer.set_weight(next, 1.0);
                }
            }
            _ => mixer.set_weight(next, 1.0),
        }
        self.active = Some(next);
    }

    /// Drive the active clip's rate toward the scroll-derived target in flap
    /// phases; pin it to 1x elsewhere.
    pub fn shape_rate<M: AnimationMixer + ?Sized>(&self, velocity: f32, mixer: &mut M) {
        let Some(clip) = self.active else {
            return;
        };
        if self.phase.shapes_rate() {
            let target = (1.0 + velocity * RATE_VELOCITY_GAIN).clamp(RATE_MIN, RATE_MAX);
            let cur = mixer.time_scale(clip);
            mixer.set_time_scale(clip, cur + (target - cur) * RATE_LERP);
        } else {
            mixer.set_time_scale(clip, 1.0);
        }
    }
}
