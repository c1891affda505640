use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio_api::{AudioCommand, Sound};

use super::sample_buffer::SampleBuffer;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleId(pub u64);

fn next_sample_id() -> SampleId {
    SampleId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Maps the logical sounds to samples registered with the engine.
#[derive(Clone, Copy, Debug)]
pub struct SoundBank {
    note: SampleId,
    kick: SampleId,
}

impl SoundBank {
    /// Load `note.wav` and `kick.wav` from `dir`, or synthesize stand-ins, and
    /// register both with the engine through `register`.
    pub fn load(dir: &Path, sample_rate: u32, mut register: impl FnMut(AudioCommand)) -> Self {
        let mut id_for = |sound: Sound| {
            let id = next_sample_id();
            let buffer = load_or_synth(dir, sound, sample_rate);
            log::info!("registered '{}' ({} frames) as {:?}", sound.name(), buffer.data.len(), id);
            register(AudioCommand::RegisterSample { id, buffer });
            id
        };
        Self {
            note: id_for(Sound::Note),
            kick: id_for(Sound::Kick),
        }
    }

    pub fn sample_id(&self, sound: Sound) -> SampleId {
        match sound {
            Sound::Note => self.note,
            Sound::Kick => self.kick,
        }
    }
}

fn load_or_synth(dir: &Path, sound: Sound, sample_rate: u32) -> SampleBuffer {
    let path = dir.join(format!("{}.wav", sound.name()));
    if path.exists() {
        match SampleBuffer::load_wav(&path, sample_rate) {
            Ok(buffer) if !buffer.data.is_empty() => return buffer,
            Ok(_) => log::warn!("{} is empty, using built-in '{}'", path.display(), sound.name()),
            Err(e) => log::warn!("{e:#}; using built-in '{}'", sound.name()),
        }
    } else {
        log::info!("no {}, using built-in '{}'", path.display(), sound.name());
    }
    match sound {
        Sound::Note => SampleBuffer::synth_note(sample_rate),
        Sound::Kick => SampleBuffer::synth_kick(sample_rate),
    }
}
