use anyhow::{Context, Result};
use image::RgbImage;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

use crate::config::{MuxConfig, OutputConfig};
use crate::error::PipelineError;
use crate::render::FrameSink;

/// Streams raw RGB frames into an ffmpeg child that writes a video-only file.
pub struct SilentVideoWriter {
    child: Child,
    width: u32,
    height: u32,
}

impl SilentVideoWriter {
    pub fn create(
        output_path: &Path,
        width: u32,
        height: u32,
        output: &OutputConfig,
        mux: &MuxConfig,
    ) -> Result<Self> {
        let args = encode_args(output_path, width, height, output);

        let child = Command::new(&mux.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!("Failed to spawn {}. Is ffmpeg installed?", mux.ffmpeg.display())
            })?;

        log::debug!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            width,
            height,
            output.fps,
            output.video_codec
        );

        Ok(Self { child, width, height })
    }

    pub fn finish(mut self) -> Result<()> {
        let (status, stderr) = self.reap()?;
        if !status.success() {
            return Err(PipelineError::EncoderFailed { status, stderr }.into());
        }
        Ok(())
    }

    /// Close stdin to signal EOF, then collect stderr and the exit status.
    fn reap(&mut self) -> Result<(ExitStatus, String)> {
        drop(self.child.stdin.take());

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            pipe.read_to_string(&mut stderr).context("Failed to read ffmpeg stderr")?;
        }
        let status = self.child.wait().context("Failed to wait for ffmpeg")?;
        Ok((status, stderr))
    }
}

impl FrameSink for SilentVideoWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(PipelineError::FrameSizeMismatch {
                width: self.width,
                height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            }
            .into());
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        if let Err(write_err) = stdin.write_all(frame.as_raw()) {
            // A failed write usually means the encoder already exited; report why
            let (status, stderr) = self.reap()?;
            let err = anyhow::Error::new(write_err);
            if status.success() {
                return Err(err.context("Failed to write frame to ffmpeg"));
            }
            return Err(err.context(PipelineError::EncoderFailed { status, stderr }));
        }
        Ok(())
    }
}

impl Drop for SilentVideoWriter {
    fn drop(&mut self) {
        // Reached only when finish() was skipped; don't leave a zombie encoder behind
        if self.child.stdin.is_some() {
            drop(self.child.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn encode_args(output_path: &Path, width: u32, height: u32, output: &OutputConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel", "error",
        "-f", "rawvideo",
        "-pixel_format", "rgb24",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.extend([
        "-video_size".into(), format!("{}x{}", width, height).into(),
        "-framerate".into(), output.fps.to_string().into(),
        "-i".into(), "pipe:0".into(),
        "-an".into(),
        // yuv420p needs even dimensions
        "-vf".into(), "pad=ceil(iw/2)*2:ceil(ih/2)*2".into(),
        "-c:v".into(), output.video_codec.clone().into(),
        "-pix_fmt".into(), "yuv420p".into(),
        "-q:v".into(), "2".into(),
    ]);
    args.push(output_path.as_os_str().to_os_string());
    args
}
