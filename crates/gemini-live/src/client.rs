//! The realtime session task.
//!
//! Connects to the Bidi endpoint, performs the setup handshake, and then
//! proxies events both ways until either side closes. The application talks
//! to the task only through channels; dropping or aborting the session
//! tears the connection down.

use crate::{
    config::ConnectionDescriptor,
    events::{LiveClientEvent, LiveEvent},
    types::{
        BidiGenerateContentClientContent, BidiGenerateContentRealtimeInput,
        BidiGenerateContentSetup, Blob, ClientMessage, Content, GenerationConfig, Part,
        ResponseModality, ServerMessage,
    },
};
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::protocol::Message as WsMessage,
};

use tracing::{error, info, warn};

const AUDIO_INPUT_MIME: &str = "audio/pcm;rate=16000";
const VIDEO_FRAME_MIME: &str = "image/jpeg";
const CHANNEL_CAPACITY: usize = 128;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Parameters for the session setup handshake.
#[derive(Debug, Clone)]
pub struct SessionSetup {
    pub model: String,
    pub response_modalities: Vec<ResponseModality>,
    pub system_instruction: Option<String>,
}

impl SessionSetup {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            response_modalities: vec![ResponseModality::Audio],
            system_instruction: None,
        }
    }

    pub fn with_modalities(mut self, modalities: Vec<ResponseModality>) -> Self {
        self.response_modalities = modalities;
        self
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(text.into());
        self
    }
}

/// A mounted realtime session.
///
/// Holds the sender for client events, the receiver for server events, and
/// the handle of the socket task. The task is NOT aborted on drop here;
/// callers scope the session to their own lifetime (see `into_parts`).
pub struct LiveSession {
    client_tx: mpsc::Sender<LiveClientEvent>,
    events_rx: mpsc::Receiver<LiveEvent>,
    task: JoinHandle<()>,
}

impl LiveSession {
    /// Connects, then spawns the session task. Returns once the socket is
    /// established; the setup handshake completes inside the task.
    pub async fn connect(descriptor: &ConnectionDescriptor, setup: SessionSetup) -> Result<Self> {
        let (ws_stream, _) = connect_async(descriptor.connect_uri()).await?;
        info!(uri = %descriptor.uri(), "Connected to Live API WebSocket");

        let (client_tx, client_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            if let Err(e) = run(ws_stream, setup, client_rx, event_tx.clone()).await {
                error!(error = ?e, "Live session task failed");
                let _ = event_tx.send(LiveEvent::Error(e.to_string())).await;
            }
        });

        Ok(Self {
            client_tx,
            events_rx,
            task,
        })
    }

    /// A handle for pushing client events into the session.
    pub fn sender(&self) -> mpsc::Sender<LiveClientEvent> {
        self.client_tx.clone()
    }

    /// Receives the next server event; `None` once the session task ends.
    pub async fn recv(&mut self) -> Option<LiveEvent> {
        self.events_rx.recv().await
    }

    /// Decomposes the session so a caller can own teardown.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Sender<LiveClientEvent>,
        mpsc::Receiver<LiveEvent>,
        JoinHandle<()>,
    ) {
        (self.client_tx, self.events_rx, self.task)
    }

    /// Tears the connection down.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// The session loop: setup handshake, then bidirectional proxying.
async fn run(
    ws_stream: WsStream,
    setup: SessionSetup,
    mut client_rx: mpsc::Receiver<LiveClientEvent>,
    event_tx: mpsc::Sender<LiveEvent>,
) -> Result<()> {
    let (mut live_tx, mut live_rx) = ws_stream.split();

    let setup_msg = ClientMessage::Setup(BidiGenerateContentSetup {
        model: setup.model,
        generation_config: GenerationConfig {
            response_modalities: setup.response_modalities,
        },
        system_instruction: setup.system_instruction.map(|text| Content {
            role: "system".to_string(),
            parts: vec![Part { text }],
        }),
    });
    live_tx
        .send(WsMessage::Text(serde_json::to_string(&setup_msg)?.into()))
        .await?;

    let mut is_ready = false;
    let mut turn_open = false;
    loop {
        tokio::select! {
            // Events from the application.
            Some(event) = client_rx.recv() => {
                if !is_ready {
                    warn!("Received client event before setup was complete. Ignoring.");
                    continue;
                }
                let message = match event {
                    LiveClientEvent::Audio(data) => {
                        ClientMessage::RealtimeInput(BidiGenerateContentRealtimeInput {
                            audio: Some(Blob { mime_type: AUDIO_INPUT_MIME.to_string(), data }),
                            video: None,
                        })
                    }
                    LiveClientEvent::VideoFrame(data) => {
                        ClientMessage::RealtimeInput(BidiGenerateContentRealtimeInput {
                            audio: None,
                            video: Some(Blob { mime_type: VIDEO_FRAME_MIME.to_string(), data }),
                        })
                    }
                    LiveClientEvent::TextTurn(text) => {
                        ClientMessage::ClientContent(BidiGenerateContentClientContent {
                            turns: vec![Content {
                                role: "user".to_string(),
                                parts: vec![Part { text }],
                            }],
                            turn_complete: true,
                        })
                    }
                };
                live_tx
                    .send(WsMessage::Text(serde_json::to_string(&message)?.into()))
                    .await?;
            },
            // Events from the Live API server.
            Some(msg_result) = live_rx.next() => {
                match msg_result {
                    Ok(WsMessage::Text(text)) => {
                        let message = match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(message) => message,
                            Err(_) => {
                                error!("Failed to parse Live API message. Raw text: {}", text);
                                continue;
                            }
                        };
                        if !is_ready {
                            if message.setup_complete.is_some() {
                                info!("Live session setup is complete. Ready for bidirectional streaming.");
                                is_ready = true;
                                // Open the user's turn so realtime input is accepted.
                                let start_turn = ClientMessage::ClientContent(
                                    BidiGenerateContentClientContent {
                                        turns: vec![],
                                        turn_complete: false,
                                    },
                                );
                                live_tx
                                    .send(WsMessage::Text(serde_json::to_string(&start_turn)?.into()))
                                    .await?;
                            } else {
                                error!("Received unexpected message during setup: {:?}", message);
                            }
                            continue;
                        }
                        let Some(content) = message.server_content else { continue };
                        let mut emitted = Vec::new();
                        if let Some(transcription) = content.input_transcription {
                            emitted.push(LiveEvent::Transcription {
                                text: transcription.text,
                                is_final: true,
                            });
                        }
                        if let Some(ref model_turn) = content.model_turn {
                            if !turn_open {
                                turn_open = true;
                                emitted.push(LiveEvent::TurnStarted);
                            }
                            for part in &model_turn.parts {
                                if let Some(text) = &part.text {
                                    emitted.push(LiveEvent::TextChunk(text.clone()));
                                }
                                if let Some(blob) = &part.inline_data {
                                    emitted.push(LiveEvent::AudioChunk(blob.data.clone()));
                                }
                            }
                        }
                        if content.turn_complete == Some(true) {
                            turn_open = false;
                            emitted.push(LiveEvent::TurnComplete);
                        }
                        for event in emitted {
                            if event_tx.send(event).await.is_err() {
                                // Application side hung up; the session is over.
                                return Ok(());
                            }
                        }
                    },
                    Ok(WsMessage::Close(close_frame)) => {
                        warn!(?close_frame, "Live API connection closed by server.");
                        let _ = event_tx.send(LiveEvent::Closed).await;
                        break;
                    }
                    Err(e) => {
                        error!("Error reading from Live API WebSocket: {}", e);
                        let _ = event_tx.send(LiveEvent::Error(e.to_string())).await;
                        break;
                    }
                    _ => {}
                }
            },
            else => break,
        }
    }
    Ok(())
}
