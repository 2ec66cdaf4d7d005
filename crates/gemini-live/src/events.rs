//! The app-facing session contract.

/// Events the application sends into an active session.
#[derive(Debug, Clone)]
pub enum LiveClientEvent {
    /// A chunk of captured audio, base64 PCM16 at 16kHz mono.
    Audio(String),
    /// A still video frame, base64 JPEG.
    VideoFrame(String),
    /// A complete user text turn.
    TextTurn(String),
}

/// Events a session emits back to the application.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// A transcription of the user's speech.
    Transcription { text: String, is_final: bool },
    /// A chunk of streamed response text.
    TextChunk(String),
    /// A chunk of spoken audio from the model, base64 PCM16 at 24kHz.
    AudioChunk(String),
    /// The model has started a response turn.
    TurnStarted,
    /// The model's response turn is complete.
    TurnComplete,
    /// An error from the provider connection.
    Error(String),
    /// The connection was closed.
    Closed,
}
