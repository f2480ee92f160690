// src/branch_tracer.rs - Pixel-by-pixel branch walking with loop safeguards

use crate::pixel_classifier::branch_point;
use crate::raster::{BinaryRaster, Coord, NEIGHBOURS_CLOCKWISE};

/// Outcome of extending a path by one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStep {
    /// The pixel was appended; tracing goes on
    Continue(Coord),
    /// No further foreground pixel: the far end of the branch
    End,
    /// Several candidates and no recognisable branch-point direction
    BranchPointHit,
    /// The next pixel is already on the path. `distance` is the number of
    /// trailing pixels (from the first occurrence on) that must be kept.
    AbortedLoop { distance: usize },
}

/// How a finished trace terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    End,
    BranchPoint,
    AbortedLoop { distance: usize },
}

impl Termination {
    /// Number of leading path pixels that may be deleted when the branch is
    /// pruned. A branch point is kept, and an aborted trace keeps everything
    /// from the repeated pixel on so an undetected fork survives.
    pub fn deletable_len(self, traced_len: usize) -> usize {
        match self {
            Termination::End => traced_len,
            Termination::BranchPoint => traced_len.saturating_sub(1),
            Termination::AbortedLoop { distance } => traced_len.saturating_sub(distance),
        }
    }
}

/// A complete trace from a start pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub path: Vec<Coord>,
    pub termination: Termination,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// True if the walk went round a closed ring and came back to its start
    pub fn closes_at_start(&self) -> bool {
        let (first, last) = match (self.path.first(), self.path.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return false,
        };
        self.path.len() >= 3
            && self.termination == Termination::AbortedLoop { distance: self.path.len() }
            && (first.x - last.x).abs() <= 1
            && (first.y - last.y).abs() <= 1
    }
}

/// Walks skeleton branches on one raster.
///
/// `capacity` bounds a single path; it is the foreground count of the raster
/// at the time the tracer was made, so a path that reaches it must revisit.
#[derive(Debug, Clone, Copy)]
pub struct BranchTracer {
    capacity: usize,
}

impl BranchTracer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1) }
    }

    pub fn for_raster(raster: &BinaryRaster) -> Self {
        Self::new(raster.foreground_count())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Extend `path` by one pixel.
    ///
    /// Candidates are foreground neighbours of the tip other than the pixel
    /// before it. One candidate is taken as is. With several, the strict
    /// branch-point direction of the tip decides; the result is rejected if
    /// it is already on the path.
    pub fn extend(&self, path: &mut Vec<Coord>, raster: &BinaryRaster) -> TraceStep {
        let tip = match path.last() {
            Some(&tip) => tip,
            None => return TraceStep::End,
        };
        let previous = path.len().checked_sub(2).map(|i| path[i]);

        let mut candidates = NEIGHBOURS_CLOCKWISE
            .iter()
            .map(|&(dx, dy)| tip.offset(dx, dy))
            .filter(|&c| Some(c) != previous && raster.is_foreground_at(c));

        let first = match candidates.next() {
            Some(c) => c,
            None => return TraceStep::End,
        };

        let next = if candidates.next().is_none() {
            // Only the start can be reached again through a lone candidate
            if first == path[0] || path.len() >= self.capacity {
                return abort_at(path, first);
            }
            first
        } else {
            match branch_point(raster, tip.x, tip.y) {
                Some(step) => {
                    let next = step.apply(tip);
                    if path_search(path, next).is_some() || path.len() >= self.capacity {
                        return abort_at(path, next);
                    }
                    next
                }
                None => return TraceStep::BranchPointHit,
            }
        };

        path.push(next);
        TraceStep::Continue(next)
    }

    /// Trace from `start` until the path stops extending
    pub fn trace(&self, start: Coord, raster: &BinaryRaster) -> Trace {
        let mut path = Vec::with_capacity(self.capacity.min(1024));
        path.push(start);
        self.run(path, raster)
    }

    /// Trace from `start` in one direction only.
    ///
    /// The first clockwise foreground neighbour is taken as the second pixel,
    /// so a pixel inside a ring is not treated as an ambiguous junction. A
    /// closed ring walks back to `start` and aborts with the full path length.
    pub fn trace_around(&self, start: Coord, raster: &BinaryRaster) -> Trace {
        let mut path = Vec::with_capacity(self.capacity.min(1024));
        path.push(start);

        let second = NEIGHBOURS_CLOCKWISE
            .iter()
            .map(|&(dx, dy)| start.offset(dx, dy))
            .find(|&c| raster.is_foreground_at(c));
        match second {
            Some(c) => path.push(c),
            None => return Trace { path, termination: Termination::End },
        }

        self.run(path, raster)
    }

    fn run(&self, mut path: Vec<Coord>, raster: &BinaryRaster) -> Trace {
        let termination = loop {
            match self.extend(&mut path, raster) {
                TraceStep::Continue(_) => continue,
                TraceStep::End => break Termination::End,
                TraceStep::BranchPointHit => break Termination::BranchPoint,
                TraceStep::AbortedLoop { distance } => break Termination::AbortedLoop { distance },
            }
        };

        Trace { path, termination }
    }
}

/// Index of the first occurrence of `target` on the path
pub fn path_search(path: &[Coord], target: Coord) -> Option<usize> {
    path.iter().position(|&c| c == target)
}

fn abort_at(path: &[Coord], next: Coord) -> TraceStep {
    let distance = match path_search(path, next) {
        Some(i) => path.len() - i,
        None => path.len(),
    };
    TraceStep::AbortedLoop { distance }
}
