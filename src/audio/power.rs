use anyhow::Result;
use rustfft::{num_complex::Complex, FftPlanner};
use std::path::Path;

use super::decode::{decode_waveform, Waveform};
use crate::config::AudioConfig;
use crate::error::PipelineError;

/// One integrated spectral magnitude per video frame, in chronological order.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerSequence {
    pub values: Vec<f64>,
    pub fps: u32,
}

impl PowerSequence {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Largest value in this sequence, 0 when empty or non-finite.
    pub fn peak(&self) -> f64 {
        let peak = self.values.iter().copied().fold(0.0f64, f64::max);
        if peak.is_finite() { peak } else { 0.0 }
    }

    /// Values divided by this sequence's own peak. An all-zero sequence maps to zeros.
    pub fn normalized(&self) -> impl Iterator<Item = f64> + '_ {
        let peak = self.peak();
        self.values
            .iter()
            .map(move |&p| if peak > 0.0 { (p / peak).clamp(0.0, 1.0) } else { 0.0 })
    }

    pub fn duration(&self) -> f32 {
        self.values.len() as f32 / self.fps as f32
    }
}

/// Computes per-frame power with a fixed transform size.
pub struct PowerExtractor {
    fps: u32,
    n_fft: usize,
    window: Vec<f32>,
}

impl PowerExtractor {
    pub fn new(fps: u32, audio: &AudioConfig) -> Self {
        Self {
            fps,
            n_fft: audio.n_fft,
            window: hann_window(audio.n_fft),
        }
    }

    pub fn extract_file(&self, path: &Path) -> Result<PowerSequence> {
        let waveform = decode_waveform(path)?;
        if waveform.samples.len() < self.n_fft {
            return Err(PipelineError::AudioTooShort {
                path: path.to_path_buf(),
                samples: waveform.samples.len(),
                n_fft: self.n_fft,
            }
            .into());
        }
        let powers = self.extract(&waveform);
        log::info!(
            "Extracted {} power values ({:.1}s @ {}fps, peak {:.4})",
            powers.len(),
            powers.duration(),
            self.fps,
            powers.peak()
        );
        Ok(powers)
    }

    /// Centered STFT with hop `sample_rate / fps`, each frame's magnitude
    /// spectrum integrated over frequency with the trapezoidal rule.
    pub fn extract(&self, waveform: &Waveform) -> PowerSequence {
        let samples = &waveform.samples;
        let n_fft = self.n_fft;
        let half = n_fft / 2;
        let hop = (waveform.sample_rate / self.fps).max(1) as usize;
        let bin_width = waveform.sample_rate as f64 / n_fft as f64;

        let num_frames = if samples.is_empty() { 0 } else { 1 + samples.len() / hop };

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        let mut magnitudes = vec![0.0f64; half + 1];

        let values = (0..num_frames)
            .map(|frame_idx| {
                // Frame is centered on frame_idx * hop; out-of-range samples are zero
                let start = (frame_idx * hop) as isize - half as isize;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    let pos = start + i as isize;
                    let sample = if pos >= 0 && (pos as usize) < samples.len() {
                        samples[pos as usize]
                    } else {
                        0.0
                    };
                    *slot = Complex::new(sample * self.window[i], 0.0);
                }
                fft.process(&mut buffer);

                for (mag, c) in magnitudes.iter_mut().zip(buffer.iter()) {
                    *mag = c.norm() as f64;
                }
                trapezoid(&magnitudes, bin_width)
            })
            .collect();

        PowerSequence { values, fps: self.fps }
    }
}

/// Trapezoidal integral of uniformly spaced samples.
pub fn trapezoid(values: &[f64], dx: f64) -> f64 {
    values.windows(2).map(|w| (w[0] + w[1]) * 0.5 * dx).sum()
}

/// Periodic Hann window, the form used for spectral analysis.
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}
