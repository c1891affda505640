// Runs inside the cpal callback: no logging, no allocation once samples are
// registered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio_api::{AudioCommand, TriggerParams};

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sound_bank::SampleId;
use super::voice::Voice;

const MAX_VOICES: usize = 32; // hard cap so we wont malloc in audio callback
const MAX_PENDING: usize = 256;
const MAX_SAMPLES: usize = 8;

pub struct Engine {
    samples: Vec<(SampleId, SampleBuffer)>,
    voices: [Voice; MAX_VOICES],
    pending: Vec<TriggerParams>, // sorted by start_frame
    frames_rendered: u64,
    clock: Arc<AtomicU64>,
}

impl Engine {
    pub fn new(clock: Arc<AtomicU64>) -> Self {
        Self {
            samples: Vec::with_capacity(MAX_SAMPLES),
            voices: [Voice::IDLE; MAX_VOICES],
            pending: Vec::with_capacity(MAX_PENDING),
            frames_rendered: clock.load(Ordering::Acquire),
            clock,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterSample { id, buffer } => {
                if let Some(slot) = self.samples.iter_mut().find(|(sid, _)| *sid == id) {
                    slot.1 = buffer;
                } else if self.samples.len() < MAX_SAMPLES {
                    self.samples.push((id, buffer));
                }
            }
            AudioCommand::Trigger(t) => self.enqueue(t),
            AudioCommand::CancelPending => self.pending.clear(),
        }
    }

    fn enqueue(&mut self, t: TriggerParams) {
        if self.pending.len() == MAX_PENDING {
            return; // a missed beat beats a realloc
        }
        let at = self.pending.partition_point(|p| p.start_frame <= t.start_frame);
        self.pending.insert(at, t);
    }

    /// Mix one block and advance the device clock by its length.
    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::default());
        let block_start = self.frames_rendered;
        let block_end = block_start + out.len() as u64;

        let due = self.pending.partition_point(|p| p.start_frame < block_end);
        for i in 0..due {
            let t = self.pending[i];
            let Some(slot) = self.samples.iter().position(|(id, _)| *id == t.sample_id) else {
                continue;
            };
            // late triggers start at the top of the block
            let delay = t.start_frame.saturating_sub(block_start) as usize;
            let free = self.voices.iter().position(|v| !v.active).unwrap_or(0);
            self.voices[free] = Voice::new(slot, t.gain, delay);
        }
        self.pending.drain(..due);

        for voice in self.voices.iter_mut().filter(|v| v.active) {
            if let Some((_, buffer)) = self.samples.get(voice.slot) {
                voice.render_into(buffer, out);
            } else {
                voice.active = false;
            }
        }

        self.frames_rendered = block_end;
        self.clock.store(block_end, Ordering::Release);
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
