//! The authenticated shell: side panel, feature view, and control tray.
//!
//! Runs for as long as the gate stays `Authenticated`. Input lines starting
//! with `/` are tray and session commands; anything else is sent to the
//! model as a text turn. Server events stream into the feature view; state
//! changes redraw the status frame synchronously.

use crate::{live::MountedSession, tray::ControlTray};
use gemini_live::{LiveClientEvent, LiveEvent};
use lumen_core::{AuthGate, AuthStore};
use std::{collections::VecDeque, io::Write};
use tokio::sync::mpsc;

#[derive(Debug, PartialEq, Eq)]
pub enum ShellOutcome {
    LoggedOut,
    Quit,
}

const SIDE_PANEL_LINES: usize = 8;

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand<'a> {
    ToggleMic,
    TogglePreview,
    Logout,
    Quit,
    Say(&'a str),
    Unknown(&'a str),
    Noop,
}

fn parse_line(line: &str) -> ShellCommand<'_> {
    let trimmed = line.trim();
    match trimmed {
        "" => ShellCommand::Noop,
        "/mic" => ShellCommand::ToggleMic,
        "/cam" => ShellCommand::TogglePreview,
        "/logout" => ShellCommand::Logout,
        "/quit" => ShellCommand::Quit,
        _ if trimmed.starts_with('/') => ShellCommand::Unknown(trimmed),
        text => ShellCommand::Say(text),
    }
}

struct Shell {
    tray: ControlTray,
    side_panel: VecDeque<String>,
    user_label: String,
    line_open: bool,
}

impl Shell {
    fn new(user_label: String) -> Self {
        Self {
            tray: ControlTray::new(),
            side_panel: VecDeque::new(),
            user_label,
            line_open: false,
        }
    }

    fn note(&mut self, line: impl Into<String>) {
        self.side_panel.push_back(line.into());
        while self.side_panel.len() > SIDE_PANEL_LINES {
            self.side_panel.pop_front();
        }
    }

    /// Writes the status frame: logout affordance, tray state, side panel.
    fn render<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out)?;
        writeln!(out, "-- streaming console --------------------------")?;
        writeln!(out, "signed in: {}   [/logout to sign out]", self.user_label)?;
        let mic = if self.tray.mic_active() { "mic: live" } else { "mic: off" };
        let preview = match self.tray.preview_label() {
            Some(label) => format!("preview: {label}"),
            None => "preview: [hidden]".to_string(),
        };
        writeln!(out, "{mic}   {preview}")?;
        for line in &self.side_panel {
            writeln!(out, " | {line}")?;
        }
        writeln!(out, "-----------------------------------------------")?;
        out.flush()
    }
}

pub async fn run<W: Write>(
    store: &AuthStore,
    mut session: MountedSession,
    input: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> anyhow::Result<ShellOutcome> {
    let mut auth_rx = store.subscribe();
    let snapshot = store.snapshot();
    let user_label = snapshot
        .user
        .map(|user| user.email.unwrap_or(user.uid))
        .unwrap_or_default();

    let sender = session.sender.clone();
    let events = &mut session.events;
    let mut session_open = true;

    let mut shell = Shell::new(user_label);
    shell.note("live session mounted");
    shell.render(out)?;

    loop {
        tokio::select! {
            // Deterministic priority: auth changes, then server events, then
            // user input, so pending model output renders before a quit.
            biased;
            changed = auth_rx.changed() => {
                if changed.is_err() {
                    return Ok(ShellOutcome::LoggedOut);
                }
                let snapshot = auth_rx.borrow_and_update().clone();
                if AuthGate::evaluate(&snapshot) != AuthGate::Authenticated {
                    writeln!(out, "Signed out.")?;
                    return Ok(ShellOutcome::LoggedOut);
                }
                // Unchanged gate: redraw only, the session stays mounted.
                shell.render(out)?;
            },
            event = events.recv(), if session_open => {
                let Some(event) = event else {
                    session_open = false;
                    shell.note("live connection ended");
                    shell.render(out)?;
                    continue;
                };
                match event {
                    LiveEvent::TurnStarted => {
                        write!(out, "model: ")?;
                        out.flush()?;
                        shell.line_open = true;
                    }
                    LiveEvent::TextChunk(chunk) => {
                        if !shell.line_open {
                            write!(out, "model: ")?;
                            shell.line_open = true;
                        }
                        write!(out, "{chunk}")?;
                        out.flush()?;
                    }
                    LiveEvent::TurnComplete => {
                        if shell.line_open {
                            writeln!(out)?;
                            shell.line_open = false;
                        }
                    }
                    LiveEvent::Transcription { text, .. } => {
                        shell.note(format!("you (voice): {text}"));
                        shell.render(out)?;
                    }
                    LiveEvent::AudioChunk(data) => {
                        shell.tray.play_chunk(&data);
                    }
                    LiveEvent::Error(message) => {
                        shell.note(format!("live error: {message}"));
                        shell.render(out)?;
                    }
                    LiveEvent::Closed => {
                        shell.note("live connection closed");
                        shell.render(out)?;
                    }
                }
            },
            maybe_line = input.recv() => {
                let Some(line) = maybe_line else {
                    return Ok(ShellOutcome::Quit);
                };
                match parse_line(&line) {
                    ShellCommand::Quit => return Ok(ShellOutcome::Quit),
                    ShellCommand::Logout => {
                        if let Err(e) = store.sign_out().await {
                            shell.note(format!("sign-out failed: {e}"));
                            shell.render(out)?;
                        }
                        // The watch subscription observes the change and exits.
                    }
                    ShellCommand::ToggleMic => {
                        match shell.tray.toggle_mic(&sender) {
                            Ok(true) => shell.note("microphone live"),
                            Ok(false) => shell.note("microphone off"),
                            Err(e) => shell.note(format!("microphone unavailable: {e}")),
                        }
                        shell.render(out)?;
                    }
                    ShellCommand::TogglePreview => {
                        let on = shell.tray.toggle_preview();
                        shell.note(if on { "local preview started" } else { "local preview stopped" });
                        shell.render(out)?;
                    }
                    ShellCommand::Unknown(command) => {
                        shell.note(format!("unknown command: {command}"));
                        shell.render(out)?;
                    }
                    ShellCommand::Say(text) => {
                        if sender.send(LiveClientEvent::TextTurn(text.to_string())).await.is_err() {
                            shell.note("live session is closed");
                            shell.render(out)?;
                        } else {
                            writeln!(out, "you: {text}")?;
                        }
                    }
                    ShellCommand::Noop => {
                        shell.render(out)?;
                    }
                }
            },
        }
    }
}
