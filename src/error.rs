use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Failures the pipeline reports by kind; everything else travels as `anyhow` context.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input discovery found nothing to process
    #[error("No matching audio files found in {}", dir.display())]
    NoInputs { dir: PathBuf },

    #[error("Image has zero area: {}", path.display())]
    EmptyImage { path: PathBuf },

    #[error("No audio tracks found in {}", path.display())]
    NoAudioTrack { path: PathBuf },

    /// Fewer samples than one transform window
    #[error("Audio too short: {} has {samples} samples, need at least {n_fft}", path.display())]
    AudioTooShort {
        path: PathBuf,
        samples: usize,
        n_fft: usize,
    },

    #[error("Frame is {actual_width}x{actual_height}, encoder expects {width}x{height}")]
    FrameSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("FFmpeg exited with {status} while encoding frames:\n{stderr}")]
    EncoderFailed { status: ExitStatus, stderr: String },

    #[error("FFmpeg exited with {status} while muxing {}:\n{stderr}", output.display())]
    MuxFailed {
        output: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{failed} of {total} files failed")]
    BatchFailed { failed: usize, total: usize },
}
