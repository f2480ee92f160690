use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use log::{error, info, warn};
use rayon::prelude::*;

use hypha_morph_lib::image_io::get_png_files_in_dir;
use hypha_morph_lib::output::{write_metrics_csv, write_summary_csv};
use hypha_morph_lib::{load_image, process_image, Config, HyphaError, ImageResult, Result};

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "hypha_morph - Hyphal Skeleton Morphometrics")]
struct Args {
    /// Path to an input skeleton PNG or a directory of them
    #[clap(short, long)]
    input: Option<String>,

    /// Path to output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Path to configuration file
    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// Physical units per pixel (overwrites config)
    #[clap(short, long)]
    resolution: Option<f64>,

    /// Minimum branch length in physical units (overwrites config)
    #[clap(short, long)]
    min_branch_length: Option<f64>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Load configuration, falling back to defaults when there is no file
    let mut config = if Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        warn!("Config file '{}' not found, using defaults", args.config);
        Config::default()
    };

    if let Some(input) = args.input {
        config.input_path = input;
    }
    if let Some(output) = args.output {
        config.output_base_dir = output;
    }
    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    if let Some(min_branch_length) = args.min_branch_length {
        config.min_branch_length = min_branch_length;
    }

    config.validate()?;

    let start_time = Instant::now();
    let input_path = PathBuf::from(&config.input_path);

    let files = if input_path.is_file() {
        vec![input_path]
    } else if input_path.is_dir() {
        let png_files = get_png_files_in_dir(&input_path)?;
        info!("Found {} PNG files in {}", png_files.len(), input_path.display());
        png_files
    } else {
        return Err(HyphaError::InvalidPath(input_path));
    };

    info!(
        "Pruning branches shorter than {} px ({} units at {} units/px)",
        config.min_branch_length_px(),
        config.min_branch_length,
        config.resolution
    );

    let run = |path: &PathBuf| -> Option<ImageResult> {
        info!("Processing: {}", path.display());
        match load_image(path).and_then(|input_image| process_image(input_image, &config)) {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                None
            }
        }
    };

    let results: Vec<ImageResult> = if config.use_parallel {
        files.par_iter().filter_map(run).collect()
    } else {
        files.iter().filter_map(run).collect()
    };

    write_metrics_csv(&results, &config.output_base_dir)?;
    write_summary_csv(&results, &config.output_base_dir, config.confidence_level)?;

    info!(
        "Processed {} of {} images in {:.2} seconds",
        results.len(),
        files.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}
