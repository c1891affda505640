// Live playback parameters. The scheduler copies this struct once per step, so
// a write from an input handler lands whole or not at all.

use crate::error::ClaveError;
use crate::shared::{VOLUME_MAX, VOLUME_MIN};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeChannel {
    Master,
    Clave,
    Metronome,
}

impl VolumeChannel {
    pub fn label(self) -> &'static str {
        match self {
            VolumeChannel::Master => "MASTER",
            VolumeChannel::Clave => "CLAVE",
            VolumeChannel::Metronome => "METRO",
        }
    }
}

/// Three independent gains in [0, 1]; a voice sounds at voice * master.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeState {
    pub master: f32,
    pub clave: f32,
    pub metronome: f32,
}

impl Default for VolumeState {
    fn default() -> Self {
        Self {
            master: 1.0,
            clave: 0.8,
            metronome: 0.6,
        }
    }
}

impl VolumeState {
    pub fn get(&self, channel: VolumeChannel) -> f32 {
        match channel {
            VolumeChannel::Master => self.master,
            VolumeChannel::Clave => self.clave,
            VolumeChannel::Metronome => self.metronome,
        }
    }

    pub fn set(&mut self, channel: VolumeChannel, value: f32) -> Result<(), ClaveError> {
        validate_volume(value)?;
        match channel {
            VolumeChannel::Master => self.master = value,
            VolumeChannel::Clave => self.clave = value,
            VolumeChannel::Metronome => self.metronome = value,
        }
        Ok(())
    }

    pub fn clave_gain(&self) -> f32 {
        self.clave * self.master
    }

    pub fn metronome_gain(&self) -> f32 {
        self.metronome * self.master
    }
}

pub fn validate_volume(value: f32) -> Result<(), ClaveError> {
    if value.is_finite() && (VOLUME_MIN..=VOLUME_MAX).contains(&value) {
        Ok(())
    } else {
        Err(ClaveError::validation(format!(
            "volume out of range (expected {VOLUME_MIN}..={VOLUME_MAX}, got {value})"
        )))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackSettings {
    /// Beats per minute. Kept raw; validated when a step is scheduled.
    pub tempo: f64,
    pub looping: bool,
    pub metronome_muted: bool,
    pub volumes: VolumeState,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            looping: true,
            metronome_muted: false,
            volumes: VolumeState::default(),
        }
    }
}

/// Length of one step: the atomic step is half a beat.
pub fn seconds_per_subdivision(bpm: f64) -> Result<f64, ClaveError> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(ClaveError::validation(format!("invalid tempo ({bpm} BPM)")));
    }
    Ok(60.0 / bpm / 2.0)
}
