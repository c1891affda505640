use std::f32::consts::TAU;
use std::path::Path;

use anyhow::Context;

use super::frame::StereoFrame;

/// Decoded stereo audio at the device rate, ready for the engine.
#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>,
}

impl SampleBuffer {
    /// Load a WAV file and convert it to stereo at `target_rate`.
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<_, _>>()?
            }
        };

        let frames: Vec<StereoFrame> = match spec.channels {
            0 => anyhow::bail!("{} has no channels", path.display()),
            1 => samples.into_iter().map(StereoFrame::mono).collect(),
            n => samples
                .chunks_exact(n as usize)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect(),
        };

        Ok(Self {
            data: resample_linear(&frames, spec.sample_rate, target_rate),
        })
    }

    /// Short bright blip standing in for a clave hit.
    pub fn synth_note(sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        let len = (0.06 * sr) as usize;
        let data = (0..len)
            .map(|i| {
                let t = i as f32 / sr;
                let env = (-t * 70.0).exp();
                StereoFrame::mono(0.6 * env * (TAU * 1800.0 * t).sin())
            })
            .collect();
        Self { data }
    }

    /// Pitch-dropping sine thump for the metronome.
    pub fn synth_kick(sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        let len = (0.25 * sr) as usize;
        let mut phase = 0.0f32;
        let data = (0..len)
            .map(|i| {
                let t = i as f32 / sr;
                let freq = 50.0 + 100.0 * (-t * 30.0).exp();
                phase += TAU * freq / sr;
                let env = (-t * 14.0).exp();
                StereoFrame::mono(0.9 * env * phase.sin())
            })
            .collect();
        Self { data }
    }
}

// Linear interpolation is plenty for one-shot percussion
fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let last = frames.len() - 1;

    (0..out_len)
        .map(|i| {
            let src = i as f64 / ratio;
            let idx = (src.floor() as usize).min(last);
            let frac = (src - idx as f64) as f32;
            let a = frames[idx];
            let b = frames[(idx + 1).min(last)];
            StereoFrame {
                left: a.left + (b.left - a.left) * frac,
                right: a.right + (b.right - a.right) * frac,
            }
        })
        .collect()
}
