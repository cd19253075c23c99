use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::ffmpeg::SilentVideoWriter;
use crate::config::{MuxConfig, OutputConfig};
use crate::error::PipelineError;
use crate::render::noise;

/// Video-only intermediate file, removed when dropped.
pub struct TempVideo {
    path: PathBuf,
}

impl TempVideo {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempVideo {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::info!("Removed temp file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temp file {}: {}", self.path.display(), e),
        }
    }
}

/// Output locations derived from the audio file name.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub temp: PathBuf,
    pub video: PathBuf,
}

impl OutputPaths {
    pub fn for_audio(audio: &Path, output_dir: &Path, extension: &str) -> Result<Self> {
        let stem = audio
            .file_stem()
            .with_context(|| format!("Audio path has no file name: {}", audio.display()))?;

        let mut temp_name = stem.to_os_string();
        temp_name.push("_temp.");
        temp_name.push(extension);

        let mut video_name = stem.to_os_string();
        video_name.push(".");
        video_name.push(extension);

        Ok(Self {
            temp: output_dir.join(temp_name),
            video: output_dir.join(video_name),
        })
    }
}

/// Encode `frames` to a silent video, then mux in the audio track. The
/// intermediate file is gone afterwards whether or not any step failed.
#[allow(clippy::too_many_arguments)]
pub fn assemble<I>(
    frames: I,
    width: u32,
    height: u32,
    audio: &Path,
    paths: &OutputPaths,
    output: &OutputConfig,
    mux_cfg: &MuxConfig,
    on_frame: impl FnMut(usize),
) -> Result<usize>
where
    I: Iterator<Item = image::RgbImage>,
{
    let temp = TempVideo::new(paths.temp.clone());

    let mut writer = SilentVideoWriter::create(temp.path(), width, height, output, mux_cfg)?;
    let written = noise::render(frames, &mut writer, on_frame)?;
    writer.finish()?;

    log::info!("Adding audio");
    mux(temp.path(), audio, &paths.video, mux_cfg)?;
    Ok(written)
}

/// Copy the video stream from `video` and re-encode the audio of `audio` into `output`.
pub fn mux(video: &Path, audio: &Path, output: &Path, cfg: &MuxConfig) -> Result<()> {
    let out = Command::new(&cfg.ffmpeg)
        .args(mux_args(video, audio, output, cfg))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to run {}. Is ffmpeg installed?", cfg.ffmpeg.display()))?;

    if !out.status.success() {
        // Don't leave a truncated video where a finished one is expected
        match std::fs::remove_file(output) {
            Ok(()) => log::info!("Removed partial output {}", output.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove partial output {}: {}", output.display(), e),
        }
        return Err(PipelineError::MuxFailed {
            output: output.to_path_buf(),
            status: out.status,
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
        .into());
    }
    Ok(())
}

fn mux_args(video: &Path, audio: &Path, output: &Path, cfg: &MuxConfig) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-loglevel".into(), "error".into(),
        "-i".into(), video.into(),
        "-i".into(), audio.into(),
        "-c:a".into(), cfg.audio_codec.clone().into(),
        "-c:v".into(), "copy".into(),
        "-map".into(), "0:v:0".into(),
        "-map".into(), "1:a:0".into(),
        output.into(),
    ]
}
