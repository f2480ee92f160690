// src/pixel_classifier.rs - Local topology tests on a single skeleton pixel
//
// Every predicate reads the raster only; mutation happens in the pruner.

use crate::raster::{BinaryRaster, Coord, NEIGHBOURS_CLOCKWISE};

/// Longest run of background neighbours above which a pixel is a line end
const ENDPOINT_MIN_BACKGROUND_RUN: usize = 5;

/// Direction implied by a branch-point match: the row above/below or the
/// column left/right holding two adjacent foreground pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStep {
    /// -1 for the row above, +1 for the row below
    Row(i32),
    /// -1 for the column to the left, +1 for the column to the right
    Column(i32),
}

impl BranchStep {
    /// Offset into a row-major buffer of the given width (`±width` or `±1`)
    pub fn linear_offset(self, width: u32) -> i64 {
        match self {
            BranchStep::Row(dy) => dy as i64 * width as i64,
            BranchStep::Column(dx) => dx as i64,
        }
    }

    /// The pixel one step from `from` in this direction
    pub fn apply(self, from: Coord) -> Coord {
        match self {
            BranchStep::Row(dy) => from.offset(0, dy),
            BranchStep::Column(dx) => from.offset(dx, 0),
        }
    }
}

/// Endpoint test by background run length.
///
/// The 8 neighbours are read clockwise and the sequence is doubled to 16
/// samples so a run wrapping past the starting neighbour is measured whole.
/// The pixel is an endpoint when the longest background run exceeds 5, i.e.
/// at most 2-3 contiguous foreground neighbours remain. Neighbours outside
/// the raster count as background.
pub fn is_endpoint(raster: &BinaryRaster, x: i32, y: i32) -> bool {
    let mut longest = 0usize;
    let mut run = 0usize;

    for i in 0..16 {
        let (dx, dy) = NEIGHBOURS_CLOCKWISE[i % 8];
        if raster.is_foreground(x + dx, y + dy) {
            run = 0;
        } else {
            run += 1;
            longest = longest.max(run);
        }
    }

    longest > ENDPOINT_MIN_BACKGROUND_RUN
}

/// Strict branch-point test used while tracing.
///
/// Looks for two horizontally adjacent foreground pixels (one of them
/// directly above/below) in the row above, then the row below; failing that,
/// two vertically adjacent ones in the column left, then right. A row or
/// column that leaves the raster is skipped as a non-match.
pub fn branch_point(raster: &BinaryRaster, x: i32, y: i32) -> Option<BranchStep> {
    for dy in [-1, 1] {
        if adjacent_pair_in_row(raster, x, y + dy) {
            return Some(BranchStep::Row(dy));
        }
    }

    for dx in [-1, 1] {
        if adjacent_pair_in_column(raster, x + dx, y) {
            return Some(BranchStep::Column(dx));
        }
    }

    None
}

fn adjacent_pair_in_row(raster: &BinaryRaster, x: i32, row: i32) -> bool {
    if !raster.in_bounds(x - 1, row) || !raster.in_bounds(x + 1, row) {
        return false;
    }

    let centre = raster.is_foreground(x, row);
    centre && (raster.is_foreground(x - 1, row) || raster.is_foreground(x + 1, row))
}

fn adjacent_pair_in_column(raster: &BinaryRaster, column: i32, y: i32) -> bool {
    if !raster.in_bounds(column, y - 1) || !raster.in_bounds(column, y + 1) {
        return false;
    }

    let centre = raster.is_foreground(column, y);
    centre && (raster.is_foreground(column, y - 1) || raster.is_foreground(column, y + 1))
}

/// Junction-density heuristic used when counting branch points for metrics.
///
/// True when the pixel has more than two foreground neighbours and
/// [`branch_point`] does *not* recognise it. This is deliberately distinct
/// from the strict test: the pixel next to a clean fork matches
/// `branch_point`, while the fork pixel itself is the one counted here.
pub fn is_dense_junction(raster: &BinaryRaster, x: i32, y: i32) -> bool {
    raster.foreground_neighbours(x, y) > 2 && branch_point(raster, x, y).is_none()
}

/// Local connectivity test for deleting a foreground pixel.
///
/// The 3x3 window around (x, y) is taken with its centre forced to
/// background. The pixel is removable iff every foreground pixel in the
/// window still touches (8-connectivity) another foreground pixel inside
/// the window. An isolated pixel has nothing to disconnect and is removable.
///
/// Only the window is inspected, not the whole component, so some thin
/// diagonal configurations can still be split.
pub fn can_remove(raster: &BinaryRaster, x: i32, y: i32) -> bool {
    let mut window = [[false; 3]; 3];
    for (wy, row) in window.iter_mut().enumerate() {
        for (wx, cell) in row.iter_mut().enumerate() {
            let (dx, dy) = (wx as i32 - 1, wy as i32 - 1);
            *cell = (dx, dy) != (0, 0) && raster.is_foreground(x + dx, y + dy);
        }
    }

    for wy in 0..3i32 {
        for wx in 0..3i32 {
            if !window[wy as usize][wx as usize] {
                continue;
            }

            let mut connected = false;
            'search: for ny in (wy - 1).max(0)..=(wy + 1).min(2) {
                for nx in (wx - 1).max(0)..=(wx + 1).min(2) {
                    if (nx, ny) != (wx, wy) && window[ny as usize][nx as usize] {
                        connected = true;
                        break 'search;
                    }
                }
            }

            if !connected {
                return false;
            }
        }
    }

    true
}
