use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub mux: MuxConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// FFmpeg codec for the silent video stream
    #[serde(default = "default_video_codec")]
    pub video_codec: String,
    /// Container extension for temp and final videos
    #[serde(default = "default_extension")]
    pub extension: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoiseConfig {
    #[serde(default = "default_max_noise")]
    pub max_noise: f64,
    #[serde(default = "default_std_dev")]
    pub std_dev: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MuxConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            video_codec: default_video_codec(),
            extension: default_extension(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            n_fft: default_n_fft(),
            extensions: default_extensions(),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            max_noise: default_max_noise(),
            std_dev: default_std_dev(),
            scale: default_scale(),
            seed: None,
        }
    }
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            audio_codec: default_audio_codec(),
        }
    }
}

fn default_fps() -> u32 { 30 }
fn default_video_codec() -> String { "mpeg4".into() }
fn default_extension() -> String { "mp4".into() }
fn default_n_fft() -> usize { 256 }
fn default_extensions() -> Vec<String> { vec!["wav".into()] }
fn default_max_noise() -> f64 { 255.0 }
fn default_std_dev() -> f64 { 5.0 }
fn default_scale() -> f64 { 1.0 }
fn default_ffmpeg() -> PathBuf { PathBuf::from("ffmpeg") }
fn default_audio_codec() -> String { "aac".into() }

impl Config {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let invalid = |msg: String| -> Result<(), PipelineError> { Err(PipelineError::InvalidConfig(msg)) };

        if self.output.fps == 0 {
            return invalid("fps must be positive".into());
        }
        if self.output.extension.is_empty() {
            return invalid("output extension must not be empty".into());
        }
        if self.audio.n_fft < 2 || self.audio.n_fft % 2 != 0 {
            return invalid(format!("n_fft must be an even number >= 2, got {}", self.audio.n_fft));
        }
        if self.audio.extensions.is_empty() {
            return invalid("at least one input extension is required".into());
        }
        if !self.noise.std_dev.is_finite() || self.noise.std_dev < 0.0 {
            return invalid(format!("noise std_dev must be finite and >= 0, got {}", self.noise.std_dev));
        }
        if !self.noise.scale.is_finite() {
            return invalid(format!("noise scale must be finite, got {}", self.noise.scale));
        }
        if !self.noise.max_noise.is_finite() || self.noise.max_noise < 0.0 {
            return invalid(format!("max_noise must be finite and >= 0, got {}", self.noise.max_noise));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Explicit path, then ./noisewave.toml, then the per-user config locations.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("noisewave.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("noisewave").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("noisewave").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
