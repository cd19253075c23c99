use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;

use crate::error::PipelineError;

/// The still image every video starts from. Read-only once loaded.
pub struct BaseImage {
    pixels: RgbImage,
}

impl BaseImage {
    pub fn open(path: &Path) -> Result<Self> {
        let pixels = image::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?
            .to_rgb8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(PipelineError::EmptyImage { path: path.to_path_buf() }.into());
        }
        log::info!("Base image: {} ({}x{})", path.display(), pixels.width(), pixels.height());
        Ok(Self::from_pixels(pixels))
    }

    pub fn from_pixels(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}
