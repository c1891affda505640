use std::fmt;
use std::sync::Arc;

use crate::error::ClaveError;
use crate::shared::{MAX_STEPS, MAX_SUBDIVISION};

/// An immutable run of on/off step markers.
///
/// Cloning is cheap (shared slice), so the scheduler and the visualizer can
/// both hold the sequence that is currently playing. Regeneration builds a new
/// one; nothing mutates an existing sequence.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StepSequence {
    steps: Arc<[bool]>,
}

impl StepSequence {
    pub fn from_steps(steps: Vec<bool>) -> Self {
        Self { steps: steps.into() }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Marker at `index`; out of range reads as silence.
    pub fn is_on(&self, index: usize) -> bool {
        self.steps.get(index).copied().unwrap_or(false)
    }

    pub fn steps(&self) -> &[bool] {
        &self.steps
    }
}

impl fmt::Display for StepSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, on) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(if *on { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Accent markers aligned step-for-step with a clave.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MetronomeSequence(StepSequence);

impl MetronomeSequence {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_on(&self, index: usize) -> bool {
        self.0.is_on(index)
    }

    pub fn steps(&self) -> &[bool] {
        self.0.steps()
    }
}

/// Expand onset counts ("3 3 2") into steps.
///
/// Each group `n` becomes n onsets separated by single rests, followed by two
/// trailing rests: `2n + 1` steps per group.
pub fn parse_sequence(text: &str) -> Result<StepSequence, ClaveError> {
    let mut steps = Vec::new();
    let mut groups = 0usize;

    for token in text.split_whitespace() {
        let n = token
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ClaveError::validation(format!("each group must be a positive integer (got '{token}')"))
            })?;

        // 2n + 1, checked before allocating
        let group_len = n
            .checked_mul(2)
            .and_then(|x| x.checked_add(1))
            .filter(|len| *len <= MAX_STEPS - steps.len())
            .ok_or_else(|| ClaveError::validation(format!("pattern longer than {MAX_STEPS} steps")))?;
        steps.reserve(group_len);

        for i in 0..n {
            steps.push(true);
            if i != n - 1 {
                steps.push(false);
            }
        }
        steps.extend([false, false]);
        groups += 1;
    }

    if groups == 0 {
        return Err(ClaveError::validation("enter at least one group, e.g. \"3 3 2\""));
    }
    Ok(StepSequence::from_steps(steps))
}

/// Alternating on/off demo pattern.
pub fn generate_uniform(length: usize) -> Result<StepSequence, ClaveError> {
    if length > MAX_STEPS {
        return Err(ClaveError::validation(format!(
            "length out of range (expected 0..={MAX_STEPS}, got {length})"
        )));
    }
    Ok(StepSequence::from_steps((0..length).map(|i| i % 2 == 0).collect()))
}

/// Accent every `subdivision` steps, starting on step 0.
pub fn derive_metronome(
    sequence: &StepSequence,
    subdivision: usize,
) -> Result<MetronomeSequence, ClaveError> {
    validate_subdivision(subdivision)?;
    let steps = (0..sequence.len()).map(|i| i % subdivision == 0).collect();
    Ok(MetronomeSequence(StepSequence::from_steps(steps)))
}

pub fn validate_subdivision(subdivision: usize) -> Result<(), ClaveError> {
    if (1..=MAX_SUBDIVISION).contains(&subdivision) {
        Ok(())
    } else {
        Err(ClaveError::validation(format!(
            "subdivision out of range (expected 1..={MAX_SUBDIVISION}, got {subdivision})"
        )))
    }
}
