use crate::constants::{HAVE_CURRENT_DATA, SEEK_TOLERANCE_SEC};
use crate::core::{clamp_offset, AudioConfig, AudioError, SoundBank, SoundVoice, VoiceStatus};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

// Create an audio element for `src`; logs on failure
fn create_audio(src: &str, label: &str) -> anyhow::Result<web::HtmlAudioElement> {
    match web::HtmlAudioElement::new_with_src(src) {
        Ok(el) => {
            el.set_preload("auto");
            Ok(el)
        }
        Err(e) => {
            log::error!("{} HtmlAudioElement error: {:?}", label, e);
            Err(anyhow::anyhow!("{} audio element ({}) unavailable", label, src))
        }
    }
}

#[inline]
fn known_duration(el: &web::HtmlAudioElement) -> Option<f64> {
    let d = el.duration();
    (el.ready_state() >= HAVE_CURRENT_DATA && d.is_finite()).then_some(d)
}

/// One `<audio>` element with its status tracked through media events.
pub struct HtmlVoice {
    el: web::HtmlAudioElement,
    status: Rc<Cell<VoiceStatus>>,
    start_at: Rc<Cell<Option<f64>>>,
    seek_pending: Rc<Cell<bool>>,
    listeners: Vec<(&'static str, Closure<dyn FnMut()>)>,
}

impl HtmlVoice {
    pub fn new(el: web::HtmlAudioElement) -> Self {
        let mut voice = Self {
            el,
            status: Rc::new(Cell::new(VoiceStatus::Idle)),
            start_at: Rc::new(Cell::new(None)),
            seek_pending: Rc::new(Cell::new(false)),
            listeners: Vec::new(),
        };

        let status = voice.status.clone();
        voice.listen("ended", move || status.set(VoiceStatus::Ended));

        let status = voice.status.clone();
        voice.listen("error", move || status.set(VoiceStatus::Failed));

        let el = voice.el.clone();
        let start_at = voice.start_at.clone();
        let pending = voice.seek_pending.clone();
        voice.listen("canplay", move || {
            if !pending.get() {
                return;
            }
            if let (Some(offset), Some(d)) = (start_at.get(), known_duration(&el)) {
                el.set_current_time(clamp_offset(offset, d));
                pending.set(false);
            }
        });
        voice
    }

    fn listen(&mut self, event: &'static str, handler: impl FnMut() + 'static) {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
        _ = self
            .el
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        self.listeners.push((event, closure));
    }
}

impl Drop for HtmlVoice {
    fn drop(&mut self) {
        for (event, closure) in self.listeners.drain(..) {
            _ = self
                .el
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}

impl SoundVoice for HtmlVoice {
    fn volume(&self) -> f32 {
        self.el.volume() as f32
    }

    fn set_volume(&mut self, volume: f32) {
        self.el.set_volume(volume.clamp(0.0, 1.0) as f64);
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.el.set_playback_rate(rate as f64);
    }

    fn duration(&self) -> Option<f64> {
        known_duration(&self.el)
    }

    fn seek(&mut self, position: f64) -> Result<(), AudioError> {
        if known_duration(&self.el).is_none() {
            return Err(AudioError::SeekFailed {
                position,
                reason: "media not ready".into(),
            });
        }
        self.start_at.set(Some(position));
        self.el.set_current_time(position);
        Ok(())
    }

    fn seek_when_ready(&mut self, offset: f64) {
        self.start_at.set(Some(offset));
        self.seek_pending.set(true);
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let promise = self
            .el
            .play()
            .map_err(|e| AudioError::PlaybackRejected(format!("{:?}", e)))?;
        self.status.set(VoiceStatus::Playing);

        let el = self.el.clone();
        let status = self.status.clone();
        let start_at = self.start_at.clone();
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => {
                    // Some browsers reset the position when playback actually starts.
                    if let (Some(offset), Some(d)) = (start_at.get(), known_duration(&el)) {
                        let target = clamp_offset(offset, d);
                        if (el.current_time() - target).abs() > SEEK_TOLERANCE_SEC {
                            el.set_current_time(target);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("[audio] play rejected: {:?}", e);
                    status.set(VoiceStatus::Failed);
                }
            }
        });
        Ok(())
    }

    fn stop(&mut self) {
        _ = self.el.pause();
        self.el.set_current_time(0.0);
        self.seek_pending.set(false);
        self.status.set(VoiceStatus::Idle);
    }

    fn status(&self) -> VoiceStatus {
        self.status.get()
    }
}

/// Preloaded flap template plus the looping wind element.
pub struct WebSoundBank {
    flap_template: web::HtmlAudioElement,
    flap_src: String,
    wind: HtmlVoice,
}

impl WebSoundBank {
    pub fn new(config: &AudioConfig) -> anyhow::Result<Self> {
        let flap_template = create_audio(&config.flap_src, "flap")?;
        flap_template.set_volume(config.flap_volume as f64);

        let wind = create_audio(&config.wind_src, "wind")?;
        wind.set_loop(true);
        wind.set_volume(0.0);

        Ok(Self {
            flap_template,
            flap_src: config.flap_src.clone(),
            wind: HtmlVoice::new(wind),
        })
    }
}

impl SoundBank for WebSoundBank {
    type Voice = HtmlVoice;

    fn spawn_flap(&mut self) -> Result<HtmlVoice, AudioError> {
        let node = self
            .flap_template
            .clone_node()
            .map_err(|_| AudioError::TemplateUnavailable(self.flap_src.clone()))?;
        let el = node
            .dyn_into::<web::HtmlAudioElement>()
            .map_err(|_| AudioError::TemplateUnavailable(self.flap_src.clone()))?;
        Ok(HtmlVoice::new(el))
    }

    fn wind(&mut self) -> &mut HtmlVoice {
        &mut self.wind
    }
}
