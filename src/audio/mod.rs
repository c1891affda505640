use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::{AudioCommand, Sound, TriggerParams};
use crate::error::ClaveError;
use crate::scheduler::{AudioClock, SoundSink};

mod engine;
mod frame;
mod sample_buffer;
mod sound_bank;
mod voice;

pub use sample_buffer::SampleBuffer;
pub use sound_bank::{SampleId, SoundBank};

use engine::Engine;
use frame::StereoFrame;

const MAX_BLOCK_FRAMES: usize = 4096;

/// Reads the frame counter the audio callback publishes after every block.
#[derive(Clone, Debug)]
pub struct DeviceClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl DeviceClock {
    /// Absolute seconds to the nearest device frame; the past clamps to 0.
    pub fn frame_at(&self, when: f64) -> u64 {
        (when.max(0.0) * self.sample_rate as f64).round() as u64
    }
}

impl AudioClock for DeviceClock {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }
}

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: DeviceClock,
    stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) -> bool {
        send_or_log(&self.tx, cmd)
    }

    pub fn clock(&self) -> DeviceClock {
        self.clock.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.clock.sample_rate
    }

    /// Ask the device to run. Calling it on a running stream is harmless.
    pub fn resume(&self) -> Result<(), ClaveError> {
        self.stream
            .play()
            .map_err(|e| ClaveError::Backend(e.to_string()))
    }
}

// never blocks the UI thread; a full queue drops the command
fn send_or_log(tx: &Sender<AudioCommand>, cmd: AudioCommand) -> bool {
    match tx.try_send(cmd) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("audio command not sent: {e}");
            false
        }
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    log::info!("audio output: {channels} ch @ {sample_rate} Hz");

    let frames = Arc::new(AtomicU64::new(0));

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let stream = build_output_stream_f32(&device, &config.into(), rx, frames.clone(), channels)?;
            stream.play().context("failed to play output stream")?;
            Ok(AudioHandle {
                tx,
                clock: DeviceClock { frames, sample_rate },
                stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    frames: Arc<AtomicU64>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(frames);
    let mut scratch = vec![StereoFrame::default(); MAX_BLOCK_FRAMES];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            for chunk in data.chunks_mut(MAX_BLOCK_FRAMES * channels) {
                let block = &mut scratch[..chunk.len() / channels];
                engine.render_block(block);
                for (frame, out) in block.iter().zip(chunk.chunks_exact_mut(channels)) {
                    frame.write_interleaved(out);
                }
            }
        },
        |err| log::error!("audio output stream error: {err}"),
        None,
    )?;

    Ok(stream)
}

/// The real output: sound names resolved through the bank, times converted
/// to device frames.
pub struct Speaker {
    audio: AudioHandle,
    bank: SoundBank,
}

impl Speaker {
    pub fn new(audio: AudioHandle, bank: SoundBank) -> Self {
        Self { audio, bank }
    }
}

impl SoundSink for Speaker {
    fn resume(&self) -> Result<(), ClaveError> {
        self.audio.resume()
    }

    fn trigger(&self, sound: Sound, gain: f32, when: f64) {
        if let Err(e) = self.resume() {
            log::debug!("dropping '{}' at {when:.3}s: {e}", sound.name());
            return;
        }
        let params = TriggerParams {
            sample_id: self.bank.sample_id(sound),
            gain,
            start_frame: self.audio.clock.frame_at(when),
        };
        if !self.audio.send(AudioCommand::Trigger(params)) {
            log::debug!("command queue full, dropping '{}'", sound.name());
        }
    }

    fn cancel_pending(&self) {
        if !self.audio.send(AudioCommand::CancelPending) {
            log::debug!("command queue full, committed triggers will still play");
        }
    }
}
