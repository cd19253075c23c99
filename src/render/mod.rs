pub mod base;
pub mod noise;

use anyhow::Result;
use image::RgbImage;

/// Consumer of rendered frames, in presentation order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;
}

#[cfg(test)]
impl FrameSink for Vec<RgbImage> {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}
