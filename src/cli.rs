use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "noisewave",
    about = "Generate noisy videos from a still image, pulsing with the power of each audio file"
)]
pub struct Cli {
    /// Directory containing audio files (.wav)
    #[arg(short, long)]
    pub directory: PathBuf,

    /// Image file to use as the base of every video
    #[arg(short, long = "image_path")]
    pub image_path: PathBuf,

    /// Directory where the videos are written
    #[arg(short, long)]
    pub output: PathBuf,

    /// Config file (defaults to ./noisewave.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Transform window size in samples
    #[arg(long)]
    pub n_fft: Option<usize>,

    /// Standard deviation of the per-pixel noise
    #[arg(long)]
    pub noise_std: Option<f64>,

    /// Scale factor applied to sampled noise
    #[arg(long)]
    pub noise_scale: Option<f64>,

    /// Seed for the noise generator, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// FFmpeg executable
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Continue with the remaining files when one fails
    #[arg(long)]
    pub keep_going: bool,
}

impl Cli {
    /// CLI values take precedence over the config file.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(fps) = self.fps {
            cfg.output.fps = fps;
        }
        if let Some(n_fft) = self.n_fft {
            cfg.audio.n_fft = n_fft;
        }
        if let Some(std_dev) = self.noise_std {
            cfg.noise.std_dev = std_dev;
        }
        if let Some(scale) = self.noise_scale {
            cfg.noise.scale = scale;
        }
        if self.seed.is_some() {
            cfg.noise.seed = self.seed;
        }
        if let Some(ref ffmpeg) = self.ffmpeg {
            cfg.mux.ffmpeg = ffmpeg.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_original_flag_names() {
        let cli = Cli::try_parse_from([
            "noisewave",
            "--directory", "sounds",
            "--image_path", "cover.png",
            "--output", "out",
        ])
        .unwrap();
        assert_eq!(cli.directory, PathBuf::from("sounds"));
        assert_eq!(cli.image_path, PathBuf::from("cover.png"));
        assert_eq!(cli.output, PathBuf::from("out"));
        assert!(!cli.keep_going);
    }

    #[test]
    fn short_flags_and_overrides() {
        let cli = Cli::try_parse_from([
            "noisewave", "-d", "a", "-i", "b.jpg", "-o", "c",
            "--fps", "24", "--noise-std", "2.5", "--seed", "9",
        ])
        .unwrap();
        let mut cfg = Config::default();
        cli.apply_overrides(&mut cfg);
        assert_eq!(cfg.output.fps, 24);
        assert_eq!(cfg.noise.std_dev, 2.5);
        assert_eq!(cfg.noise.seed, Some(9));
        assert_eq!(cfg.audio.n_fft, 256);
    }

    #[test]
    fn required_flags_are_enforced() {
        assert!(Cli::try_parse_from(["noisewave", "-d", "a", "-o", "c"]).is_err());
    }
}
