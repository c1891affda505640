// Startup configuration, read from <project_dir>/.clavetty/config.json.
// Only settings live here; generated sequences are never written to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ClaveError;
use crate::playback::{seconds_per_subdivision, validate_volume, PlaybackSettings, VolumeState};
use crate::scheduler::SchedulerConfig;
use crate::sequence::validate_subdivision;

const CLAVETTY_DIR: &str = ".clavetty";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub tempo: f64,
    pub subdivision: usize,
    pub looping: bool,
    pub metronome_muted: bool,
    pub master_volume: f32,
    pub clave_volume: f32,
    pub metronome_volume: f32,
    pub pattern: String, // generated on startup when non-empty

    // lookahead tuning
    pub schedule_ahead_ms: u64,
    pub wake_interval_ms: u64,
    pub start_lead_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let playback = PlaybackSettings::default();
        let scheduler = SchedulerConfig::default();
        Self {
            tempo: playback.tempo,
            subdivision: 4,
            looping: playback.looping,
            metronome_muted: playback.metronome_muted,
            master_volume: playback.volumes.master,
            clave_volume: playback.volumes.clave,
            metronome_volume: playback.volumes.metronome,
            pattern: "3 3 2".to_string(),
            schedule_ahead_ms: (scheduler.schedule_ahead * 1000.0) as u64,
            wake_interval_ms: scheduler.wake_interval.as_millis() as u64,
            start_lead_ms: (scheduler.start_lead * 1000.0) as u64,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ClaveError> {
        seconds_per_subdivision(self.tempo)?;
        validate_subdivision(self.subdivision)?;
        for v in [self.master_volume, self.clave_volume, self.metronome_volume] {
            validate_volume(v)?;
        }
        if self.wake_interval_ms == 0 {
            return Err(ClaveError::validation("wake_interval_ms must be positive"));
        }
        // a wake that arrives one interval late must still find audio queued
        if self.schedule_ahead_ms <= self.wake_interval_ms {
            return Err(ClaveError::validation(format!(
                "schedule_ahead_ms ({}) must exceed wake_interval_ms ({})",
                self.schedule_ahead_ms, self.wake_interval_ms
            )));
        }
        Ok(())
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            tempo: self.tempo,
            looping: self.looping,
            metronome_muted: self.metronome_muted,
            volumes: VolumeState {
                master: self.master_volume,
                clave: self.clave_volume,
                metronome: self.metronome_volume,
            },
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            schedule_ahead: self.schedule_ahead_ms as f64 / 1000.0,
            wake_interval: Duration::from_millis(self.wake_interval_ms),
            start_lead: self.start_lead_ms as f64 / 1000.0,
        }
    }
}

// <project_dir>/.clavetty
pub fn data_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(CLAVETTY_DIR)
}

fn config_file_path(project_dir: &Path) -> PathBuf {
    data_dir(project_dir).join(CONFIG_FILE)
}

/// Missing file means defaults; a file that is there must parse and validate.
pub fn load_config(project_dir: &Path) -> anyhow::Result<Config> {
    let path = config_file_path(project_dir);
    if !path.exists() {
        return Ok(Config::default());
    }
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config in {}", path.display()))?;
    Ok(config)
}

/// Write a starter config if there is none. Returns whether a file was written.
pub fn save_default_config(project_dir: &Path) -> anyhow::Result<bool> {
    let path = config_file_path(project_dir);
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .clavetty/ if needed
    }
    let json = serde_json::to_string_pretty(&Config::default())?;
    std::fs::write(&path, json)?;
    Ok(true)
}
