//! Local media devices.
//!
//! cpal streams are not `Send`, so each device lives on a dedicated thread:
//! the capture thread pushes microphone samples through a ring buffer,
//! resamples them to the rate the Live API accepts, and forwards encoded
//! chunks into the session; the playback thread drains decoded model audio
//! into the output device. Threads are controlled over std channels and
//! joined on drop.

use crate::audio;
use anyhow::{Result, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use gemini_live::LiveClientEvent;
use ringbuf::{
    HeapRb,
    traits::{Consumer, Producer, Split},
};
use rubato::Resampler;
use std::{
    sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel},
    thread,
    time::Duration,
};
use tracing::{debug, error, warn};

const RESAMPLER_CHUNK_SIZE: usize = 512;
const DRAIN_INTERVAL: Duration = Duration::from_millis(100);
const DEVICE_READY_TIMEOUT: Duration = Duration::from_secs(2);

/// An active microphone capture stream.
pub struct MicCapture {
    stop_tx: Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MicCapture {
    /// Opens the default input device and starts streaming encoded chunks
    /// into the live session. Fails if no usable device is present.
    pub fn start(live_tx: tokio::sync::mpsc::Sender<LiveClientEvent>) -> Result<Self> {
        let (stop_tx, stop_rx) = channel();
        let (ready_tx, ready_rx) = channel();

        let thread = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || run_capture(stop_rx, live_tx, ready_tx))?;

        match ready_rx.recv_timeout(DEVICE_READY_TIMEOUT) {
            Ok(Ok(())) => Ok(Self {
                stop_tx,
                thread: Some(thread),
            }),
            Ok(Err(message)) => {
                let _ = thread.join();
                bail!("microphone capture failed: {message}")
            }
            Err(_) => bail!("timed out waiting for the input device"),
        }
    }
}

impl Drop for MicCapture {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_capture(
    stop_rx: Receiver<()>,
    live_tx: tokio::sync::mpsc::Sender<LiveClientEvent>,
    ready_tx: Sender<Result<(), String>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready_tx.send(Err("no input device available".to_string()));
        return;
    };
    let supported = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    let sample_rate = supported.sample_rate().0 as f64;
    let channels = supported.channels() as usize;

    // ~1s of mono audio between the device callback and the drain loop.
    let ring = HeapRb::<f32>::new(sample_rate as usize);
    let (mut producer, mut consumer) = ring.split();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &supported.config(),
            move |data: &[f32], _| {
                // Downmix interleaved frames to mono before buffering.
                for frame in data.chunks(channels) {
                    let sample = frame.iter().sum::<f32>() / channels as f32;
                    let _ = producer.try_push(sample);
                }
            },
            |err| error!("Input stream error: {err}"),
            None,
        ),
        format => {
            let _ = ready_tx.send(Err(format!("unsupported input sample format: {format:?}")));
            return;
        }
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.to_string()));
        return;
    }
    let mut resampler =
        match audio::create_resampler(sample_rate, audio::LIVE_INPUT_SAMPLE_RATE, RESAMPLER_CHUNK_SIZE) {
            Ok(resampler) => resampler,
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
        };
    let _ = ready_tx.send(Ok(()));
    debug!(sample_rate, channels, "Microphone capture started");

    let mut pending: Vec<f32> = Vec::new();
    let mut scratch = vec![0.0f32; 4096];
    loop {
        match stop_rx.recv_timeout(DRAIN_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        let drained = consumer.pop_slice(&mut scratch);
        pending.extend_from_slice(&scratch[..drained]);

        let chunk_size = resampler.input_frames_next();
        let mut resampled = Vec::new();
        while pending.len() >= chunk_size {
            let frame: Vec<f32> = pending.drain(..chunk_size).collect();
            match resampler.process(&[frame], None) {
                Ok(output) => resampled.extend_from_slice(&output[0]),
                Err(e) => warn!("Resampling failed, dropping frame: {e}"),
            }
        }
        if !resampled.is_empty() {
            let encoded = audio::encode_f32_to_base64_i16(&resampled);
            if live_tx.blocking_send(LiveClientEvent::Audio(encoded)).is_err() {
                // Session is gone; capture has nothing left to feed.
                break;
            }
        }
    }
    drop(stream);
    debug!("Microphone capture stopped");
}

/// An active speaker sink for model audio.
pub struct PlaybackSink {
    chunk_tx: Sender<Vec<f32>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl PlaybackSink {
    /// Opens the default output device. Queued chunks are expected at the
    /// Live API output rate; the sink resamples to the device rate.
    pub fn start() -> Result<Self> {
        let (chunk_tx, chunk_rx) = channel();
        let (ready_tx, ready_rx) = channel();

        let thread = thread::Builder::new()
            .name("audio-playback".to_string())
            .spawn(move || run_playback(chunk_rx, ready_tx))?;

        match ready_rx.recv_timeout(DEVICE_READY_TIMEOUT) {
            Ok(Ok(())) => Ok(Self {
                chunk_tx,
                thread: Some(thread),
            }),
            Ok(Err(message)) => {
                let _ = thread.join();
                bail!("audio playback failed: {message}")
            }
            Err(_) => bail!("timed out waiting for the output device"),
        }
    }

    /// Queues decoded samples for playback.
    pub fn enqueue(&self, samples: Vec<f32>) {
        let _ = self.chunk_tx.send(samples);
    }
}

impl Drop for PlaybackSink {
    fn drop(&mut self) {
        // Disconnecting the channel stops the playback thread.
        drop(std::mem::replace(&mut self.chunk_tx, channel().0));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_playback(chunk_rx: Receiver<Vec<f32>>, ready_tx: Sender<Result<(), String>>) {
    let host = cpal::default_host();
    let Some(device) = host.default_output_device() else {
        let _ = ready_tx.send(Err("no output device available".to_string()));
        return;
    };
    let supported = match device.default_output_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    let sample_rate = supported.sample_rate().0 as f64;
    let channels = supported.channels() as usize;

    let ring = HeapRb::<f32>::new(sample_rate as usize * 2);
    let (mut producer, mut consumer) = ring.split();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &supported.config(),
            move |data: &mut [f32], _| {
                for frame in data.chunks_mut(channels) {
                    // Underruns play silence.
                    let sample = consumer.try_pop().unwrap_or(0.0);
                    for slot in frame {
                        *slot = sample;
                    }
                }
            },
            |err| error!("Output stream error: {err}"),
            None,
        ),
        format => {
            let _ = ready_tx.send(Err(format!("unsupported output sample format: {format:?}")));
            return;
        }
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.to_string()));
        return;
    }

    let needs_resampling = (sample_rate - audio::LIVE_OUTPUT_SAMPLE_RATE).abs() > f64::EPSILON;
    let mut resampler = if needs_resampling {
        match audio::create_resampler(audio::LIVE_OUTPUT_SAMPLE_RATE, sample_rate, RESAMPLER_CHUNK_SIZE)
        {
            Ok(resampler) => Some(resampler),
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
        }
    } else {
        None
    };
    let _ = ready_tx.send(Ok(()));
    debug!(sample_rate, channels, "Audio playback started");

    let mut pending: Vec<f32> = Vec::new();
    loop {
        match chunk_rx.recv_timeout(DRAIN_INTERVAL) {
            Ok(samples) => match resampler.as_mut() {
                Some(resampler) => {
                    pending.extend_from_slice(&samples);
                    let chunk_size = resampler.input_frames_next();
                    while pending.len() >= chunk_size {
                        let frame: Vec<f32> = pending.drain(..chunk_size).collect();
                        if let Ok(output) = resampler.process(&[frame], None) {
                            producer.push_slice(&output[0]);
                        }
                    }
                }
                None => {
                    producer.push_slice(&samples);
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    drop(stream);
    debug!("Audio playback stopped");
}
