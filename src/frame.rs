use crate::audio::WebSoundBank;
use crate::bridge::JsMixer;
use crate::core::{FlightController, FrameInput, FrameReport};
use instant::Instant;
use wasm_bindgen::JsValue;

pub struct FrameContext {
    pub controller: FlightController<WebSoundBank>,
    pub mixer: JsMixer,

    pub started_at: Instant,
    pub last_instant: Instant,
    pub end: bool,
}

impl FrameContext {
    pub fn new(controller: FlightController<WebSoundBank>, mixer: JsMixer) -> Self {
        let now = Instant::now();
        Self {
            controller,
            mixer,
            started_at: now,
            last_instant: now,
            end: false,
        }
    }

    pub fn frame(&mut self, offset: f32, delta: f32) -> FrameReport {
        let now = Instant::now();
        let dt = now - self.last_instant;
        self.last_instant = now;

        let report = self.controller.frame(
            FrameInput {
                offset,
                delta,
                dt: dt.as_secs_f32(),
                now: (now - self.started_at).as_secs_f64(),
                end: self.end,
            },
            &mut self.mixer,
        );
        if let Some(phase) = report.entered {
            log::debug!(
                "[frame] entered {:?} vel={:.4} fast={}",
                phase,
                report.signal.velocity,
                report.signal.fast
            );
        }
        report
    }
}

/// Invoke a host callback, logging instead of propagating a thrown error.
pub fn notify(callback: &js_sys::Function, label: &str) {
    if let Err(e) = callback.call0(&JsValue::NULL) {
        log::error!("{} callback error: {:?}", label, e);
    }
}
