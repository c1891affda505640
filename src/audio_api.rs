pub use crate::audio::{SampleBuffer, SampleId};

/// The two logical voices the scheduler knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sound {
    Note,
    Kick,
}

impl Sound {
    pub fn name(self) -> &'static str {
        match self {
            Sound::Note => "note",
            Sound::Kick => "kick",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerParams {
    pub sample_id: SampleId,
    pub gain: f32,
    // absolute position on the device clock, in frames
    pub start_frame: u64,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // Decoding happens on the UI thread; the engine only ever receives ready
    // buffers, once, at startup.
    RegisterSample { id: SampleId, buffer: SampleBuffer },

    // Start a registered sample at an exact frame.
    Trigger(TriggerParams),

    // Forget triggers that have not started yet. Sounding voices ring out.
    CancelPending,
}
