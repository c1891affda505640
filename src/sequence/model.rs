use crate::error::ClaveError;

use super::bases::{possible_bases, Base};
use super::step::{derive_metronome, MetronomeSequence, StepSequence};

/// The clave currently loaded and the metronome derived from it.
///
/// Both sequences are swapped together, so outside of this type their lengths
/// always agree.
#[derive(Clone, Debug)]
pub struct SequenceModel {
    clave: StepSequence,
    metronome: MetronomeSequence,
    subdivision: usize,
}

impl SequenceModel {
    pub fn new(subdivision: usize) -> Result<Self, ClaveError> {
        let clave = StepSequence::default();
        let metronome = derive_metronome(&clave, subdivision)?;
        Ok(Self { clave, metronome, subdivision })
    }

    pub fn clave(&self) -> &StepSequence {
        &self.clave
    }

    pub fn metronome(&self) -> &MetronomeSequence {
        &self.metronome
    }

    pub fn subdivision(&self) -> usize {
        self.subdivision
    }

    pub fn len(&self) -> usize {
        self.clave.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clave.is_empty()
    }

    /// Replace the clave wholesale and rebuild the metronome for it.
    pub fn regenerate(&mut self, clave: StepSequence) -> Result<(), ClaveError> {
        let metronome = derive_metronome(&clave, self.subdivision)?;
        self.clave = clave;
        self.metronome = metronome;
        Ok(())
    }

    /// Change the accent spacing. On error the old metronome stays.
    pub fn set_subdivision(&mut self, subdivision: usize) -> Result<(), ClaveError> {
        let metronome = derive_metronome(&self.clave, subdivision)?;
        self.metronome = metronome;
        self.subdivision = subdivision;
        Ok(())
    }

    pub fn possible_bases(&self) -> Vec<Base> {
        possible_bases(self.len())
    }
}
