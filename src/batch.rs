use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::audio::power::PowerExtractor;
use crate::config::Config;
use crate::encode::mux::{self, OutputPaths};
use crate::error::PipelineError;
use crate::render::base::BaseImage;
use crate::render::noise::NoiseSynthesizer;

pub struct BatchRequest<'a> {
    pub directory: &'a Path,
    pub image_path: &'a Path,
    pub output_dir: &'a Path,
    pub keep_going: bool,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outputs: Vec<PathBuf>,
}

/// Audio files directly inside `dir` whose extension is in `extensions`,
/// sorted by path.
pub fn discover_inputs(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));
        if matches {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(PipelineError::NoInputs { dir: dir.to_path_buf() }.into());
    }
    paths.sort();
    Ok(paths)
}

pub fn run(req: &BatchRequest, cfg: &Config) -> Result<BatchReport> {
    let inputs = discover_inputs(req.directory, &cfg.audio.extensions)?;
    log::info!("Found {} files.", inputs.len());

    let base = BaseImage::open(req.image_path)?;
    std::fs::create_dir_all(req.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", req.output_dir.display()))?;

    let extractor = PowerExtractor::new(cfg.output.fps, &cfg.audio);
    let synth = NoiseSynthesizer::new(&base, &cfg.noise);

    let total = inputs.len();
    let mut report = BatchReport::default();
    let mut failed = 0usize;

    for (i, audio) in inputs.iter().enumerate() {
        log::info!("[{}/{}] Processing {}...", i + 1, total, audio.display());
        match process_file(audio, req.output_dir, &extractor, &synth, &base, cfg) {
            Ok(video) => {
                log::info!("Done. Output: {}", video.display());
                report.outputs.push(video);
            }
            Err(err) if req.keep_going => {
                log::error!("Failed to process {}: {:#}", audio.display(), err);
                failed += 1;
            }
            Err(err) => {
                return Err(err.context(format!("Failed to process {}", audio.display())));
            }
        }
    }

    if failed > 0 {
        return Err(PipelineError::BatchFailed { failed, total }.into());
    }
    Ok(report)
}

fn process_file(
    audio: &Path,
    output_dir: &Path,
    extractor: &PowerExtractor,
    synth: &NoiseSynthesizer,
    base: &BaseImage,
    cfg: &Config,
) -> Result<PathBuf> {
    let powers = extractor.extract_file(audio)?;
    let paths = OutputPaths::for_audio(audio, output_dir, &cfg.output.extension)?;

    let pb = ProgressBar::new(powers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let result = mux::assemble(
        synth.frames(&powers),
        base.width(),
        base.height(),
        audio,
        &paths,
        &cfg.output,
        &cfg.mux,
        |n| pb.set_position(n as u64),
    );
    pb.finish_and_clear();

    let written = result?;
    log::debug!("Wrote {} frames for {}", written, audio.display());
    Ok(paths.video)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::encode::testing::{fake_ffmpeg, ENCODE_OK, MUX_COPY};
    use image::{Rgb, RgbImage};

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    fn write_silence(path: &Path, sample_rate: u32, samples: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn wav_only() -> Vec<String> {
        vec!["wav".to_string()]
    }

    #[test]
    fn discovers_sorted_wavs_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.wav");
        touch(dir.path(), "a.wav");
        touch(dir.path(), "C.WAV");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "wav");
        std::fs::create_dir(dir.path().join("nested.wav")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(&dir.path().join("sub"), "deep.wav");

        let found = discover_inputs(dir.path(), &wav_only()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["C.WAV", "a.wav", "b.wav"]);
    }

    #[test]
    fn empty_directory_is_no_inputs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md");
        let err = discover_inputs(dir.path(), &wav_only()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoInputs { .. })
        ));
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(discover_inputs(Path::new("/nonexistent/sounds"), &wav_only()).is_err());
    }

    #[test]
    fn no_inputs_writes_nothing() {
        let input = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let output = scratch.path().join("videos");
        let image = scratch.path().join("base.png");
        RgbImage::from_pixel(100, 100, Rgb([200, 30, 30])).save(&image).unwrap();

        let req = BatchRequest {
            directory: input.path(),
            image_path: &image,
            output_dir: &output,
            keep_going: false,
        };
        let err = run(&req, &Config::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoInputs { .. })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn bad_image_aborts_before_processing() {
        let input = tempfile::tempdir().unwrap();
        write_silence(&input.path().join("quiet.wav"), 8000, 8000);
        let scratch = tempfile::tempdir().unwrap();
        let image = scratch.path().join("broken.png");
        std::fs::write(&image, b"nope").unwrap();

        let req = BatchRequest {
            directory: input.path(),
            image_path: &image,
            output_dir: scratch.path(),
            keep_going: true,
        };
        assert!(run(&req, &Config::default()).is_err());
    }

    #[test]
    fn keep_going_reports_every_failure() {
        let input = tempfile::tempdir().unwrap();
        write_silence(&input.path().join("one.wav"), 8000, 8000);
        write_silence(&input.path().join("two.wav"), 8000, 8000);
        let scratch = tempfile::tempdir().unwrap();
        let output = scratch.path().join("out");
        let image = scratch.path().join("base.png");
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])).save(&image).unwrap();

        let mut cfg = Config::default();
        cfg.mux.ffmpeg = PathBuf::from("/nonexistent/bin/ffmpeg");

        let req = BatchRequest {
            directory: input.path(),
            image_path: &image,
            output_dir: &output,
            keep_going: true,
        };
        let err = run(&req, &cfg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::BatchFailed { failed: 2, total: 2 })
        ));
        // no intermediates left behind
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 0);
    }

    #[test]
    fn fail_fast_stops_at_first_error() {
        let input = tempfile::tempdir().unwrap();
        write_silence(&input.path().join("one.wav"), 8000, 8000);
        let scratch = tempfile::tempdir().unwrap();
        let image = scratch.path().join("base.png");
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])).save(&image).unwrap();

        let mut cfg = Config::default();
        cfg.mux.ffmpeg = PathBuf::from("/nonexistent/bin/ffmpeg");

        let req = BatchRequest {
            directory: input.path(),
            image_path: &image,
            output_dir: scratch.path(),
            keep_going: false,
        };
        let err = run(&req, &cfg).unwrap_err();
        assert!(format!("{:#}", err).contains("one.wav"));
    }

    #[cfg(unix)]
    #[test]
    fn silent_clip_becomes_one_video_of_the_base_image() {
        let input = tempfile::tempdir().unwrap();
        write_silence(&input.path().join("quiet.wav"), 22050, 22050);
        let scratch = tempfile::tempdir().unwrap();
        let output = scratch.path().join("videos");
        let image = scratch.path().join("base.png");
        RgbImage::from_pixel(100, 100, Rgb([200, 30, 30])).save(&image).unwrap();

        let mut cfg = Config::default();
        cfg.mux.ffmpeg = fake_ffmpeg(scratch.path(), ENCODE_OK, MUX_COPY);

        let req = BatchRequest {
            directory: input.path(),
            image_path: &image,
            output_dir: &output,
            keep_going: false,
        };
        let report = run(&req, &cfg).unwrap();

        assert_eq!(report.outputs, vec![output.join("quiet.mp4")]);
        let names: Vec<_> = std::fs::read_dir(&output)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("quiet.mp4")]);

        // raw stream passed through: 1 + 22050 / 735 frames, all equal to the base
        let bytes = std::fs::read(output.join("quiet.mp4")).unwrap();
        assert_eq!(bytes.len(), 31 * 100 * 100 * 3);
        assert!(bytes.chunks(3).all(|px| px == [200, 30, 30]));
    }
}
