//! The control tray: user-driven toggles for local media.
//!
//! Owns the optional capture/playback handles for the lifetime of one
//! authenticated shell. Dropping the tray releases every device.

use crate::{
    audio,
    media::{MicCapture, PlaybackSink},
};
use anyhow::Result;
use gemini_live::LiveClientEvent;
use tokio::sync::mpsc;
use tracing::warn;

/// A handle to a locally captured video stream, used for the preview line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub label: String,
}

/// Local media state for the authenticated shell.
#[derive(Default)]
pub struct ControlTray {
    mic: Option<MicCapture>,
    preview: Option<PreviewHandle>,
    playback: Option<PlaybackSink>,
    playback_unavailable: bool,
}

impl ControlTray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles microphone capture. Returns whether the mic is now live.
    pub fn toggle_mic(&mut self, live_tx: &mpsc::Sender<LiveClientEvent>) -> Result<bool> {
        if self.mic.take().is_some() {
            return Ok(false);
        }
        self.mic = Some(MicCapture::start(live_tx.clone())?);
        Ok(true)
    }

    pub fn mic_active(&self) -> bool {
        self.mic.is_some()
    }

    /// Toggles the local video preview handle. Returns whether a stream is
    /// now present.
    pub fn toggle_preview(&mut self) -> bool {
        if self.preview.take().is_some() {
            return false;
        }
        self.preview = Some(PreviewHandle {
            label: "camera0".to_string(),
        });
        true
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn preview_label(&self) -> Option<&str> {
        self.preview.as_ref().map(|handle| handle.label.as_str())
    }

    /// Plays a base64 PCM16 chunk of model audio through the speakers.
    ///
    /// The output device is opened lazily on the first chunk; if it cannot
    /// be opened, playback stays off for the rest of this shell.
    pub fn play_chunk(&mut self, base64_data: &str) {
        if self.playback_unavailable {
            return;
        }
        if self.playback.is_none() {
            match PlaybackSink::start() {
                Ok(sink) => self.playback = Some(sink),
                Err(e) => {
                    warn!("Audio playback unavailable: {e}");
                    self.playback_unavailable = true;
                    return;
                }
            }
        }
        let samples = audio::decode_f32_from_base64_i16(base64_data);
        if samples.is_empty() {
            return;
        }
        if let Some(sink) = &self.playback {
            sink.enqueue(samples);
        }
    }
}
