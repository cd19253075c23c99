mod audio;
mod batch;
mod cli;
mod config;
mod encode;
mod error;
mod render;

use anyhow::Result;
use clap::Parser;

use batch::BatchRequest;
use cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Explicit --config path, or auto-detect noisewave.toml / user config
    let mut cfg = match config::find_config(cli.config.as_deref()) {
        Some(path) => match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(err) => {
                log::warn!("{:#}; using defaults", err);
                config::Config::default()
            }
        },
        None => config::Config::default(),
    };
    cli.apply_overrides(&mut cfg);
    cfg.validate()?;

    log::info!("Input directory: {}", cli.directory.display());
    log::info!("Image: {}", cli.image_path.display());
    log::info!("Output directory: {}", cli.output.display());
    log::info!(
        "{}fps, n_fft={}, noise std={} scale={}",
        cfg.output.fps,
        cfg.audio.n_fft,
        cfg.noise.std_dev,
        cfg.noise.scale
    );

    let req = BatchRequest {
        directory: &cli.directory,
        image_path: &cli.image_path,
        output_dir: &cli.output,
        keep_going: cli.keep_going,
    };
    let report = batch::run(&req, &cfg)?;

    log::info!("Finished {} videos in {}", report.outputs.len(), cli.output.display());
    Ok(())
}
