mod app;
mod config;
mod error;
mod history;
mod labels;
mod overlay;
mod polygon;
mod session;
mod store;

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;

use crate::app::LabelingApp;
use crate::config::{AnnotatorConfig, LogLevel};
use crate::session::Session;

/// Paint class labels onto images by drawing polygons.
#[derive(Parser, Debug)]
#[command(name = "mask-annotate", version, about)]
struct Args {
    /// Image to open at startup
    image: Option<PathBuf>,

    /// Label mask to load after the image
    #[arg(long, requires = "image")]
    mask: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_logger(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_level_filter());
    // RUST_LOG wins over the configured level
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    }
    builder.init();
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match AnnotatorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => AnnotatorConfig::default(),
    };
    init_logger(config.log_level);

    let mut session = match Session::new(&config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.image {
        if let Err(e) = session.load_image(path) {
            eprintln!("Failed to load image {}: {}", path.display(), e);
            std::process::exit(1);
        }
        log::info!("Image loaded successfully.");
    }
    if let Some(path) = &args.mask {
        if let Err(e) = session.load_label_mask(path) {
            eprintln!("Failed to load label mask {}: {}", path.display(), e);
            std::process::exit(1);
        }
        log::info!("Label image loaded successfully.");
    }

    let title = match &args.image {
        Some(path) => format!(
            "Interactive Image Labeling Tool - {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        ),
        None => "Interactive Image Labeling Tool".to_string(),
    };

    let [cw, ch] = config.canvas_size;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([cw + 40.0, ch + 120.0])
            .with_title(&title),
        ..Default::default()
    };

    let canvas_size = config.canvas_size;
    if let Err(e) = eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(LabelingApp::new(session, canvas_size)))),
    ) {
        log::error!("Application error: {e}");
        std::process::exit(1);
    }
}
