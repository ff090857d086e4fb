//! Click-gated background music.
//!
//! Browsers refuse to start audio before the user interacted with the page,
//! so nothing is created up front. The first click creates the audio output
//! and requests the looping track; clicks while the track is loading or
//! playing do nothing.

use std::{future::Future, pin::Pin};

use crate::input::PointerEvent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MusicState {
    #[default]
    Idle,
    Loading,
    Playing,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayRequest {
    pub track: String,
    pub volume: f32,
    pub looping: bool,
}

/// What a click asks the platform to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClickAction {
    pub create_output: bool,
    pub play: Option<PlayRequest>,
}

#[derive(Clone, Debug, Default)]
pub struct BackgroundMusic {
    track: String,
    volume: f32,
    state: MusicState,
    output_created: bool,
    requests: usize,
}

impl BackgroundMusic {
    pub fn new(track: &str, volume: f32) -> Self {
        Self {
            track: track.to_string(),
            volume,
            ..Default::default()
        }
    }

    pub fn state(&self) -> MusicState {
        self.state
    }

    /// Number of playback requests issued so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Only clicks reach the gate. A drag that ends on release counts too.
    pub fn on_pointer(&mut self, event: &PointerEvent) -> Option<ClickAction> {
        match event {
            PointerEvent::Click { .. } => Some(self.on_click()),
            _ => None,
        }
    }

    pub fn on_click(&mut self) -> ClickAction {
        let create_output = !self.output_created;
        self.output_created = true;
        let play = match self.state {
            MusicState::Idle => {
                self.state = MusicState::Loading;
                self.requests += 1;
                Some(PlayRequest {
                    track: self.track.clone(),
                    volume: self.volume,
                    looping: true,
                })
            }
            MusicState::Loading | MusicState::Playing => None,
        };
        ClickAction {
            create_output,
            play,
        }
    }

    pub fn on_started(&mut self) {
        self.state = MusicState::Playing;
    }

    /// Returns to idle so the next click tries again.
    pub fn on_failed(&mut self, err: &anyhow::Error) {
        log::warn!("Background music {} failed: {:#}", self.track, err);
        self.state = MusicState::Idle;
    }
}

pub type PlayFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;

/// Platform audio sink. In the browser this owns the `AudioContext` and the
/// looping `<audio>` element; natively it only logs.
#[cfg(target_arch = "wasm32")]
pub struct AudioOutput {
    _context: web_sys::AudioContext,
    element: Option<web_sys::HtmlAudioElement>,
}

#[cfg(target_arch = "wasm32")]
impl AudioOutput {
    pub fn new() -> anyhow::Result<Self> {
        let context = web_sys::AudioContext::new()
            .map_err(|e| anyhow::anyhow!("could not create audio context: {:?}", e))?;
        Ok(Self {
            _context: context,
            element: None,
        })
    }

    pub fn play(&mut self, request: &PlayRequest) -> anyhow::Result<PlayFuture> {
        let url = crate::resources::texture::format_url(&request.track)?;
        let element = web_sys::HtmlAudioElement::new_with_src(url.as_str())
            .map_err(|e| anyhow::anyhow!("could not create audio element: {:?}", e))?;
        element.set_loop(request.looping);
        element.set_volume(request.volume as f64);
        let promise = element
            .play()
            .map_err(|e| anyhow::anyhow!("could not start playback: {:?}", e))?;
        self.element = Some(element);
        Ok(Box::pin(async move {
            wasm_bindgen_futures::JsFuture::from(promise)
                .await
                .map_err(|e| anyhow::anyhow!("playback rejected: {:?}", e))?;
            Ok(())
        }))
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub struct AudioOutput;

#[cfg(not(target_arch = "wasm32"))]
impl AudioOutput {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self)
    }

    pub fn play(&mut self, request: &PlayRequest) -> anyhow::Result<PlayFuture> {
        let path = crate::config::asset_root().join(&request.track);
        log::info!(
            "No audio device on native targets, skipping {} (volume {}, loop {})",
            path.display(),
            request.volume,
            request.looping
        );
        Ok(Box::pin(async { Ok(()) }))
    }
}
