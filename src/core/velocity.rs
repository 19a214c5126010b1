use super::constants::*;

/// One frame of scroll input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollSample {
    /// Normalized scroll progress, 0..1.
    pub offset: f32,
    /// Per-frame delta reported by the scroll source.
    pub delta: f32,
    /// Frame duration in seconds.
    pub dt: f32,
    /// Seconds since the driver started.
    pub now: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocitySignal {
    /// Exponential moving average of scroll speed.
    pub velocity: f32,
    /// Latched fast-scroll intent.
    pub fast: bool,
}

/// Smooths raw scroll motion into a flight intent signal.
///
/// The fast flag is held for [`FAST_INTENT_HOLD_SEC`] after the last sample
/// above threshold, so decisions taken at loop boundaries see recent speed
/// even when it oscillates around the threshold.
#[derive(Clone, Debug)]
pub struct VelocityEstimator {
    threshold: f32,
    ema: f32,
    fast_until: f64,
    last_offset: f32,
    scrolled: bool,
    signal: VelocitySignal,
}

impl VelocityEstimator {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            ema: 0.0,
            fast_until: f64::NEG_INFINITY,
            last_offset: 0.0,
            scrolled: false,
            signal: VelocitySignal::default(),
        }
    }

    pub fn update(&mut self, sample: ScrollSample, flight_started: bool) -> VelocitySignal {
        let offset = finite_or_zero(sample.offset);
        let d1 = finite_or_zero(sample.delta).abs();
        let d_offset = (offset - self.last_offset).abs();
        self.last_offset = offset;
        self.scrolled |= offset > 0.0;

        let dt = finite_or_zero(sample.dt);
        let d2 = if dt > f32::EPSILON {
            d_offset / dt
        } else {
            d_offset * FALLBACK_FRAME_RATE
        };
        let mut raw = d1.max(d2 * OFFSET_VELOCITY_WEIGHT);
        if !flight_started {
            raw *= PRE_FLIGHT_DAMPING;
        }

        self.ema = (1.0 - VELOCITY_EMA_ALPHA) * self.ema + VELOCITY_EMA_ALPHA * raw;

        let now = if sample.now.is_finite() { sample.now } else { 0.0 };
        if self.ema > self.threshold {
            self.fast_until = now + FAST_INTENT_HOLD_SEC;
        }
        self.signal = VelocitySignal {
            velocity: self.ema,
            fast: now < self.fast_until,
        };
        self.signal
    }

    #[inline]
    pub fn signal(&self) -> VelocitySignal {
        self.signal
    }

    /// Whether a nonzero scroll offset has been observed since creation.
    #[inline]
    pub fn has_scrolled(&self) -> bool {
        self.scrolled
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
