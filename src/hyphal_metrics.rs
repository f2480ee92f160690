// src/hyphal_metrics.rs - Length, tip and branch-point tallies of a pruned skeleton

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::pixel_classifier::{is_dense_junction, is_endpoint};
use crate::raster::{BinaryRaster, Coord, Region};

/// Morphometrics of one skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct HyphalMetrics {
    /// Foreground pixel count
    pub total_length_px: usize,
    pub tips: usize,
    pub branch_points: usize,
    /// Length per tip in pixels, 0 when there are no tips
    pub growth_unit_px: f64,
    /// Physical units per pixel
    pub resolution: f64,
}

impl HyphalMetrics {
    pub fn total_length(&self) -> f64 {
        self.total_length_px as f64 * self.resolution
    }

    pub fn growth_unit(&self) -> f64 {
        self.growth_unit_px * self.resolution
    }
}

/// Colours and marker size of the annotated overlay
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub skeleton: Rgb<u8>,
    pub tip: Rgb<u8>,
    pub branch_point: Rgb<u8>,
    /// Marker radius; tips closer than this to the border are not counted
    pub radius: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            skeleton: Rgb([255, 255, 255]),
            tip: Rgb([255, 0, 0]),
            branch_point: Rgb([0, 128, 255]),
            radius: 3,
        }
    }
}

/// Result of one analysis: metrics plus the overlay they were drawn on
#[derive(Debug, Clone)]
pub struct Analysis {
    pub metrics: HyphalMetrics,
    pub tip_coords: Vec<Coord>,
    pub branch_point_coords: Vec<Coord>,
    pub overlay: RgbImage,
}

/// Analyse with the default overlay style
pub fn analyse(raster: &BinaryRaster, resolution: f64, regions: &[Region]) -> Analysis {
    analyse_with_style(raster, resolution, regions, &OverlayStyle::default())
}

/// Walk every foreground pixel inside `regions` (the whole raster when empty).
///
/// Tips are endpoints lying more than `style.radius` from every border.
/// Branch points use the junction-density heuristic, not the strict test
/// the tracer relies on.
pub fn analyse_with_style(
    raster: &BinaryRaster,
    resolution: f64,
    regions: &[Region],
    style: &OverlayStyle,
) -> Analysis {
    let (width, height) = raster.dimensions();
    let radius = style.radius as i64;
    let mut overlay = RgbImage::new(width, height);

    let mut total_length_px = 0usize;
    let mut tip_coords = Vec::new();
    let mut branch_point_coords = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let (xi, yi) = (x as i32, y as i32);
            if !raster.is_foreground(xi, yi) {
                continue;
            }
            if !regions.is_empty() && !regions.iter().any(|r| r.contains(x, y)) {
                continue;
            }

            total_length_px += 1;
            overlay.put_pixel(x, y, style.skeleton);

            if is_endpoint(raster, xi, yi) {
                let clear_of_border = x as i64 > radius
                    && y as i64 > radius
                    && (width as i64 - 1 - x as i64) > radius
                    && (height as i64 - 1 - y as i64) > radius;
                if clear_of_border {
                    tip_coords.push(Coord::new(xi, yi));
                }
            } else if is_dense_junction(raster, xi, yi) {
                branch_point_coords.push(Coord::new(xi, yi));
            }
        }
    }

    for c in &branch_point_coords {
        draw_filled_circle_mut(&mut overlay, (c.x, c.y), style.radius as i32, style.branch_point);
    }
    for c in &tip_coords {
        draw_filled_circle_mut(&mut overlay, (c.x, c.y), style.radius as i32, style.tip);
    }

    let tips = tip_coords.len();
    let growth_unit_px = if tips > 0 {
        total_length_px as f64 / tips as f64
    } else {
        0.0
    };

    Analysis {
        metrics: HyphalMetrics {
            total_length_px,
            tips,
            branch_points: branch_point_coords.len(),
            growth_unit_px,
            resolution,
        },
        tip_coords,
        branch_point_coords,
        overlay,
    }
}
