//! Client for the Gemini Live API (`BidiGenerateContent` over WebSocket).
//!
//! This crate owns the realtime connection: the connection descriptor, the
//! wire types of the Bidi protocol, and the session task that proxies
//! between application events and server content. Consumers interact only
//! with [`LiveSession`] and the event enums; protocol framing, the setup
//! handshake, and reconnection semantics stay inside.

pub mod client;
pub mod config;
pub mod events;
pub mod types;

pub use client::{LiveSession, SessionSetup};
pub use config::ConnectionDescriptor;
pub use events::{LiveClientEvent, LiveEvent};

/// Sample rate (16kHz) the Live API accepts for audio sent to it.
pub const LIVE_INPUT_SAMPLE_RATE_HZ: u32 = 16000;
/// Sample rate (24kHz) of PCM16 audio the Live API emits.
pub const LIVE_OUTPUT_SAMPLE_RATE_HZ: u32 = 24000;
