use crate::core::{AnimationMixer, ClipId, LoopMode, MixerError, MixerEvent, MixerEvents};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(typescript_custom_section)]
const MIXER_BRIDGE_TS: &'static str = r#"
export interface MixerBridge {
  clipNames(): string[];
  start(clip: number, once: boolean): void;
  crossFade(from: number, to: number, duration: number, warp: boolean): void;
  stop(clip: number): void;
  stopAll(): void;
  fadeOut(clip: number, duration: number): void;
  setWeight(clip: number, weight: number): void;
  timeScale(clip: number): number;
  setTimeScale(clip: number, scale: number): void;
  time(clip: number): number;
  duration(clip: number): number;
  isRunning(clip: number): boolean;
  update(dt: number): number[];
}
"#;

#[wasm_bindgen]
extern "C" {
    /// Host object wrapping the engine's animation mixer. `update` advances
    /// the mixer and returns the loop/finish events raised during that step.
    #[wasm_bindgen(typescript_type = "MixerBridge")]
    pub type MixerBridge;

    #[wasm_bindgen(method, js_name = clipNames)]
    fn clip_names(this: &MixerBridge) -> js_sys::Array;
    #[wasm_bindgen(method)]
    fn start(this: &MixerBridge, clip: u32, once: bool);
    #[wasm_bindgen(method, catch, js_name = crossFade)]
    fn cross_fade(
        this: &MixerBridge,
        from: u32,
        to: u32,
        duration: f32,
        warp: bool,
    ) -> Result<(), JsValue>;
    #[wasm_bindgen(method)]
    fn stop(this: &MixerBridge, clip: u32);
    #[wasm_bindgen(method, js_name = stopAll)]
    fn stop_all(this: &MixerBridge);
    #[wasm_bindgen(method, js_name = fadeOut)]
    fn fade_out(this: &MixerBridge, clip: u32, duration: f32);
    #[wasm_bindgen(method, js_name = setWeight)]
    fn set_weight(this: &MixerBridge, clip: u32, weight: f32);
    #[wasm_bindgen(method, js_name = timeScale)]
    fn time_scale(this: &MixerBridge, clip: u32) -> f32;
    #[wasm_bindgen(method, js_name = setTimeScale)]
    fn set_time_scale(this: &MixerBridge, clip: u32, scale: f32);
    #[wasm_bindgen(method)]
    fn time(this: &MixerBridge, clip: u32) -> f32;
    #[wasm_bindgen(method)]
    fn duration(this: &MixerBridge, clip: u32) -> f32;
    #[wasm_bindgen(method, js_name = isRunning)]
    fn is_running(this: &MixerBridge, clip: u32) -> bool;
    #[wasm_bindgen(method)]
    fn update(this: &MixerBridge, dt: f32) -> js_sys::Array;
}

pub struct JsMixer {
    bridge: MixerBridge,
    names: Vec<String>,
}

impl JsMixer {
    pub fn new(bridge: MixerBridge) -> Self {
        // Non-string entries keep their slot so indices still line up with the asset.
        let names = bridge
            .clip_names()
            .iter()
            .map(|v| v.as_string().unwrap_or_default())
            .collect::<Vec<_>>();
        log::info!("[bridge] clips={:?}", names);
        Self { bridge, names }
    }

    #[inline]
    pub fn clip_names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    fn known(&self, clip: ClipId) -> bool {
        clip < self.names.len()
    }
}

impl AnimationMixer for JsMixer {
    fn start(&mut self, clip: ClipId, mode: LoopMode) {
        if self.known(clip) {
            self.bridge.start(clip as u32, mode == LoopMode::Once);
        }
    }

    fn cross_fade(
        &mut self,
        from: ClipId,
        to: ClipId,
        duration: f32,
        warp: bool,
    ) -> Result<(), MixerError> {
        for clip in [from, to] {
            if !self.known(clip) {
                return Err(MixerError::UnknownClip(clip));
            }
        }
        self.bridge
            .cross_fade(from as u32, to as u32, duration, warp)
            .map_err(|e| MixerError::CrossFadeRejected {
                from,
                to,
                reason: format!("{:?}", e),
            })
    }

    fn stop(&mut self, clip: ClipId) {
        if self.known(clip) {
            self.bridge.stop(clip as u32);
        }
    }

    fn stop_all(&mut self) {
        self.bridge.stop_all();
    }

    fn fade_out(&mut self, clip: ClipId, duration: f32) {
        if self.known(clip) {
            self.bridge.fade_out(clip as u32, duration);
        }
    }

    fn set_weight(&mut self, clip: ClipId, weight: f32) {
        if self.known(clip) {
            self.bridge.set_weight(clip as u32, weight);
        }
    }

    fn time_scale(&self, clip: ClipId) -> f32 {
        if self.known(clip) {
            self.bridge.time_scale(clip as u32)
        } else {
            1.0
        }
    }

    fn set_time_scale(&mut self, clip: ClipId, scale: f32) {
        if self.known(clip) {
            self.bridge.set_time_scale(clip as u32, scale);
        }
    }

    fn time(&self, clip: ClipId) -> f32 {
        if self.known(clip) {
            self.bridge.time(clip as u32)
        } else {
            0.0
        }
    }

    fn duration(&self, clip: ClipId) -> f32 {
        if self.known(clip) {
            self.bridge.duration(clip as u32)
        } else {
            0.0
        }
    }

    fn is_running(&self, clip: ClipId) -> bool {
        self.known(clip) && self.bridge.is_running(clip as u32)
    }

    fn update(&mut self, dt: f32, events: &mut MixerEvents) {
        let flat = self.bridge.update(dt);
        let len = flat.length();
        let mut i = 0;
        while i + 1 < len {
            let kind = flat.get(i).as_f64().unwrap_or(f64::NAN);
            let clip = flat.get(i + 1).as_f64().unwrap_or(f64::NAN);
            match MixerEvent::decode(kind, clip) {
                Some(ev) if self.known(ev.clip) => events.push(ev),
                _ => log::warn!("[bridge] dropped malformed event at {}", i / 2),
            }
            i += 2;
        }
    }
}
