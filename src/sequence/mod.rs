mod bases;
mod model;
mod step;

pub use bases::{describe_bases, possible_bases, Base};
pub use model::SequenceModel;
pub use step::{
    derive_metronome, generate_uniform, parse_sequence, validate_subdivision, MetronomeSequence,
    StepSequence,
};
