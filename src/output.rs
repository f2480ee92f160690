use std::fs;
use std::path::Path;
use csv::Writer;

use crate::errors::Result;
use crate::pipeline::ImageResult;
use crate::skeleton_pruner::Branch;
use crate::statistics::DescriptiveStatistics;

/// Write one row of metrics per image
pub fn write_metrics_csv<P: AsRef<Path>>(results: &[ImageResult], output_dir: P) -> Result<()> {
    let output_path = output_dir.as_ref().join("metrics.csv");
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(&output_path)?;

    writer.write_record(&[
        "Subfolder",
        "Image",
        "Total_Length",
        "Total_Length_Px",
        "Tips",
        "Branch_Points",
        "Growth_Unit",
        "Pixels_Pruned",
        "Branches_Pruned",
        "Retained_Branches",
    ])?;

    for result in results {
        let m = &result.metrics;
        writer.write_record(&[
            result.subfolder.clone(),
            result.filename.clone(),
            format!("{:.6}", m.total_length()),
            m.total_length_px.to_string(),
            m.tips.to_string(),
            m.branch_points.to_string(),
            format!("{:.6}", m.growth_unit()),
            result.pixels_pruned.to_string(),
            result.branches_pruned.to_string(),
            result.retained_branches.to_string(),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

/// Write the retained branches of one image, one row per pixel
pub fn write_branches_csv<P: AsRef<Path>>(
    branches: &[Branch],
    output_dir: P,
    filename: &str,
) -> Result<()> {
    let output_path = output_dir.as_ref().join("branches").join(format!("{}.csv", filename));
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(&output_path)?;
    writer.write_record(&["Branch", "Index", "X", "Y"])?;

    for (branch_idx, branch) in branches.iter().enumerate() {
        for (point_idx, point) in branch.points.iter().enumerate() {
            writer.write_record(&[
                branch_idx.to_string(),
                point_idx.to_string(),
                point.x.to_string(),
                point.y.to_string(),
            ])?;
        }
    }

    writer.flush()?;

    Ok(())
}

/// Per-metric summary rows over a batch
pub fn summarize(results: &[ImageResult], alpha: f64) -> Vec<(&'static str, DescriptiveStatistics)> {
    let column = |f: fn(&ImageResult) -> f64| -> Vec<f64> { results.iter().map(f).collect() };

    vec![
        ("Total_Length", DescriptiveStatistics::compute(&column(|r| r.metrics.total_length()), alpha)),
        ("Tips", DescriptiveStatistics::compute(&column(|r| r.metrics.tips as f64), alpha)),
        ("Branch_Points", DescriptiveStatistics::compute(&column(|r| r.metrics.branch_points as f64), alpha)),
        ("Growth_Unit", DescriptiveStatistics::compute(&column(|r| r.metrics.growth_unit()), alpha)),
    ]
}

/// Write the batch summary: one row per metric column
pub fn write_summary_csv<P: AsRef<Path>>(results: &[ImageResult], output_dir: P, alpha: f64) -> Result<()> {
    let output_path = output_dir.as_ref().join("summary.csv");
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(&output_path)?;
    writer.write_record(&[
        "Metric", "N", "Excluded", "Mean", "Median", "SD", "Min", "Max", "P1", "P99", "CI", "Alpha",
    ])?;

    for (name, stats) in summarize(results, alpha) {
        writer.write_record(&[
            name.to_string(),
            stats.count.to_string(),
            stats.excluded.to_string(),
            format!("{:.6}", stats.mean),
            format!("{:.6}", stats.median),
            format!("{:.6}", stats.std_dev),
            format!("{:.6}", stats.min),
            format!("{:.6}", stats.max),
            format!("{:.6}", stats.percentile_1),
            format!("{:.6}", stats.percentile_99),
            format!("{:.6}", stats.confidence_interval),
            format!("{}", stats.alpha),
        ])?;
    }

    writer.flush()?;

    Ok(())
}
