//! Audio-modulated noise frames.
//!
//! Each frame adds Gaussian noise to the *previous* frame and blends the result
//! back toward the clean base image, weighted by the frame's normalized power.
//! The noise therefore accumulates across frames as a power-driven random walk
//! rather than being drawn fresh over the base image each time.

use anyhow::Result;
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::base::BaseImage;
use super::FrameSink;
use crate::audio::power::PowerSequence;
use crate::config::NoiseConfig;

pub struct NoiseSynthesizer<'a> {
    base: &'a BaseImage,
    params: NoiseConfig,
}

impl<'a> NoiseSynthesizer<'a> {
    pub fn new(base: &'a BaseImage, params: &NoiseConfig) -> Self {
        Self {
            base,
            params: params.clone(),
        }
    }

    /// Lazy frame sequence for one audio file. Seeded generators make the
    /// output reproducible; otherwise the generator is seeded from entropy.
    pub fn frames(&self, powers: &PowerSequence) -> NoiseFrames<'a, StdRng> {
        let rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.frames_with_rng(powers, rng)
    }

    pub fn frames_with_rng<R: Rng>(&self, powers: &PowerSequence, rng: R) -> NoiseFrames<'a, R> {
        NoiseFrames {
            base: self.base.pixels(),
            weights: powers.normalized().collect::<Vec<_>>().into_iter(),
            previous: None,
            rng,
            max_noise: self.params.max_noise,
            std_dev: self.params.std_dev,
            scale: self.params.scale,
        }
    }
}

/// One-shot iterator over synthesized frames. Holds the running "previous frame".
pub struct NoiseFrames<'a, R> {
    base: &'a RgbImage,
    weights: std::vec::IntoIter<f64>,
    previous: Option<RgbImage>,
    rng: R,
    max_noise: f64,
    std_dev: f64,
    scale: f64,
}

impl<R: Rng> Iterator for NoiseFrames<'_, R> {
    type Item = RgbImage;

    fn next(&mut self) -> Option<RgbImage> {
        let weight = self.weights.next()?;

        let frame = if weight == 0.0 {
            self.base.clone()
        } else {
            let mean = self.max_noise * weight;
            let mut noisy = self.previous.as_ref().unwrap_or(self.base).clone();
            for channel in noisy.iter_mut() {
                let z: f64 = self.rng.sample(StandardNormal);
                let noise = wrap_to_u8(self.scale * (mean + self.std_dev * z));
                *channel = channel.wrapping_add(noise);
            }
            for (out, &clean) in noisy.iter_mut().zip(self.base.iter()) {
                *out = blend(*out, clean, weight);
            }
            noisy
        };

        self.previous = Some(frame.clone());
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.weights.size_hint()
    }
}

impl<R: Rng> ExactSizeIterator for NoiseFrames<'_, R> {}

/// Push every frame into `sink`, calling `on_frame` with the running count.
pub fn render<I, S>(mut frames: I, sink: &mut S, mut on_frame: impl FnMut(usize)) -> Result<usize>
where
    I: Iterator<Item = RgbImage>,
    S: FrameSink + ?Sized,
{
    frames.try_fold(0usize, |written, frame| {
        sink.write_frame(&frame)?;
        on_frame(written + 1);
        Ok(written + 1)
    })
}

/// Truncate toward zero, then wrap modulo 256. Out-of-range noise wraps
/// instead of saturating.
fn wrap_to_u8(value: f64) -> u8 {
    value as i64 as u8
}

/// `noisy * weight + clean * (1 - weight)`, rounded half to even and saturated.
fn blend(noisy: u8, clean: u8, weight: f64) -> u8 {
    (noisy as f64 * weight + clean as f64 * (1.0 - weight))
        .round_ties_even()
        .clamp(0.0, 255.0) as u8
}
