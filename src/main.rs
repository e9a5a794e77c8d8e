use clap::Parser;
use log::{error, info};
use skylit::app::{run_gui, run_headless};
use skylit::io::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "skylit")]
#[command(about = "Lit scene renderer with switchable cameras, spotlights and a day/night sky")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Render frames to disk instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Frame count for headless runs
    #[arg(long)]
    frames: Option<u64>,

    /// Output directory for headless frames
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .filter_module("eframe", log::LevelFilter::Warn)
        .filter_module("egui_glow", log::LevelFilter::Warn)
        .filter_module("egui_winit", log::LevelFilter::Warn)
        .filter_module("winit", log::LevelFilter::Warn)
        .filter_module("wgpu", log::LevelFilter::Warn)
        .filter_module("glutin", log::LevelFilter::Warn)
        .filter_module("sctk", log::LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            match Config::load(path) {
                Ok(config) => config,
                Err(err) => {
                    error!("{}", err);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    if let Some(frames) = cli.frames {
        config.headless.frames = frames;
    }
    if let Some(dir) = cli.output_dir {
        config.headless.output_dir = dir;
    }

    let result = if cli.headless {
        run_headless(&config)
    } else {
        run_gui(config)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
