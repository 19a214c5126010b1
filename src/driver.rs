use crate::audio::WebSoundBank;
use crate::bridge::{JsMixer, MixerBridge};
use crate::core::{prepend_start_key, ClipSet, FlightConfig, FlightController};
use crate::frame::{self, FrameContext};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("flight-web starting");
    Ok(())
}

fn parse_config(value: &JsValue) -> anyhow::Result<FlightConfig> {
    if value.is_undefined() || value.is_null() {
        return Ok(FlightConfig::default());
    }
    #[allow(deprecated)]
    let cfg: FlightConfig = value
        .into_serde()
        .map_err(|e| anyhow::anyhow!("invalid flight config: {}", e))?;
    Ok(cfg.sanitized())
}

fn build(bridge: MixerBridge, config: &JsValue) -> anyhow::Result<FrameContext> {
    let config = parse_config(config)?;
    if config.debug {
        log::set_max_level(log::LevelFilter::Debug);
    }
    let mut mixer = JsMixer::new(bridge);
    let clips = ClipSet::resolve(mixer.clip_names(), &config.clip_names);
    let bank = WebSoundBank::new(&config.audio)?;
    let mut controller = FlightController::new(clips, &config, bank);
    controller.start(&mut mixer);
    Ok(FrameContext::new(controller, mixer))
}

/// Per-frame driver owned by the host render loop.
///
/// Call `frame` once per rendered frame with the scroll progress and the scroll
/// source's own delta. Dropping the driver (`free()`) stops every sound and
/// removes its media listeners.
#[wasm_bindgen]
pub struct FlightDriver {
    ctx: RefCell<FrameContext>,
    on_flight_start: RefCell<Option<js_sys::Function>>,
}

#[wasm_bindgen]
impl FlightDriver {
    #[wasm_bindgen(constructor)]
    pub fn new(bridge: MixerBridge, config: JsValue) -> Result<FlightDriver, JsValue> {
        let ctx = build(bridge, &config).map_err(|e| {
            log::error!("driver init error: {:?}", e);
            JsValue::from_str(&format!("{:#}", e))
        })?;
        Ok(FlightDriver {
            ctx: RefCell::new(ctx),
            on_flight_start: RefCell::new(None),
        })
    }

    pub fn frame(&self, offset: f32, delta: f32) {
        // The borrow ends before host callbacks run, so they may call back in.
        let report = self.ctx.borrow_mut().frame(offset, delta);
        if report.flight_started {
            if let Some(cb) = self.on_flight_start.borrow().as_ref() {
                frame::notify(cb, "flight start");
            }
        }
    }

    #[wasm_bindgen(js_name = setEnd)]
    pub fn set_end(&self, end: bool) {
        self.ctx.borrow_mut().end = end;
    }

    #[wasm_bindgen(js_name = onFlightStart)]
    pub fn on_flight_start(&self, callback: js_sys::Function) {
        *self.on_flight_start.borrow_mut() = Some(callback);
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.ctx.borrow().controller.machine().phase())
    }

    pub fn velocity(&self) -> f32 {
        self.ctx.borrow().controller.signal().velocity
    }

    #[wasm_bindgen(js_name = isFast)]
    pub fn is_fast(&self) -> bool {
        self.ctx.borrow().controller.signal().fast
    }

    #[wasm_bindgen(js_name = flightStarted)]
    pub fn flight_started(&self) -> bool {
        self.ctx.borrow().controller.machine().flight_started()
    }

    /// Trigger the glide-flap flourish; ignored unless gliding.
    pub fn flourish(&self) -> bool {
        let mut ctx = self.ctx.borrow_mut();
        let ctx = &mut *ctx;
        ctx.controller.request_flourish(&mut ctx.mixer)
    }

    /// Stop all sounds immediately without releasing the driver.
    pub fn silence(&self) {
        self.ctx.borrow_mut().controller.shutdown();
    }
}

/// New key buffers for one track, or `undefined` when it already starts at 0.
#[wasm_bindgen]
pub struct StartKeyPatch {
    times: Vec<f32>,
    values: Vec<f32>,
}

#[wasm_bindgen]
impl StartKeyPatch {
    #[wasm_bindgen(getter)]
    pub fn times(&self) -> Vec<f32> {
        self.times.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn values(&self) -> Vec<f32> {
        self.values.clone()
    }
}

#[wasm_bindgen(js_name = ensureStartKey)]
pub fn ensure_start_key(
    times: &[f32],
    values: &[f32],
    item_size: usize,
    quaternion: bool,
) -> Option<StartKeyPatch> {
    prepend_start_key(times, values, item_size, quaternion)
        .map(|(times, values)| StartKeyPatch { times, values })
}
