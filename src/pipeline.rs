// src/pipeline.rs - Per-image processing: raster -> pruning -> metrics -> outputs

use std::fs;
use std::path::PathBuf;

use image::Rgb;
use log::{debug, info, warn};

use crate::config::Config;
use crate::errors::{HyphaError, Result};
use crate::hyphal_metrics::{analyse_with_style, HyphalMetrics, OverlayStyle};
use crate::image_io::{save_image, save_raster, InputImage};
use crate::output::write_branches_csv;
use crate::skeleton_pruner::SkeletonPruner;

/// Everything the batch report needs from one image
#[derive(Debug, Clone)]
pub struct ImageResult {
    pub filename: String,
    pub subfolder: String,
    pub metrics: HyphalMetrics,
    pub pixels_pruned: usize,
    pub branches_pruned: usize,
    pub retained_branches: usize,
}

/// Overlay colours and marker size from the configuration
pub fn overlay_style(config: &Config) -> OverlayStyle {
    OverlayStyle {
        skeleton: Rgb(config.skeleton_color_rgb),
        tip: Rgb(config.tip_color_rgb),
        branch_point: Rgb(config.branch_point_color_rgb),
        radius: config.annotation_radius,
    }
}

/// Process a single skeleton image.
///
/// Writes the pruned skeleton, the annotated overlay and, when configured,
/// the retained branches below `output_base_dir`. Pruning always covers the
/// whole image; the metrics only count pixels inside `config.regions` when
/// any are given. A non-binary image is reported as an error and nothing is
/// written for it.
pub fn process_image(input_image: InputImage, config: &Config) -> Result<ImageResult> {
    let polarity = config.foreground.polarity();
    let mut raster = input_image.to_raster(polarity)?;

    let InputImage { path, filename, .. } = input_image;
    let subfolder = path.parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .unwrap_or("root")
        .to_string();

    // Step 1: prune the skeleton in place
    let pruner = SkeletonPruner::new(config.prune_options());
    let report = match pruner.prune(&mut raster) {
        Ok(report) => report,
        Err(e @ HyphaError::NonBinaryRaster { .. }) => {
            warn!("Skipping {}: {}", path.display(), e);
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    debug!(
        "{}: pruned {} pixels in {} branches over {} passes",
        filename, report.pixels_removed, report.branches_removed, report.passes
    );

    // Step 2: metrics and overlay on the cleaned raster
    let analysis = analyse_with_style(&raster, config.resolution, &config.regions, &overlay_style(config));
    let metrics = analysis.metrics;
    info!(
        "{}: length {:.2}, tips {}, branch points {}, growth unit {:.2}",
        filename,
        metrics.total_length(),
        metrics.tips,
        metrics.branch_points,
        metrics.growth_unit()
    );

    // Step 3: image outputs
    let output_base = PathBuf::from(&config.output_base_dir);
    let pruned_dir = output_base.join("pruned");
    let overlay_dir = output_base.join("overlays");
    fs::create_dir_all(&pruned_dir)?;
    fs::create_dir_all(&overlay_dir)?;

    save_raster(&raster, pruned_dir.join(format!("{}.png", filename)))?;
    save_image(&analysis.overlay, overlay_dir.join(format!("{}.png", filename)))?;

    if config.record_branches {
        write_branches_csv(&report.branches, &output_base, &filename)?;
    }

    Ok(ImageResult {
        filename,
        subfolder,
        metrics,
        pixels_pruned: report.pixels_removed,
        branches_pruned: report.branches_removed,
        retained_branches: report.branches.len(),
    })
}
