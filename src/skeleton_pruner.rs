// src/skeleton_pruner.rs - Artifact removal and short-branch pruning to a fixpoint

use std::collections::HashSet;

use log::debug;

use crate::branch_tracer::{BranchTracer, Termination, Trace};
use crate::errors::Result;
use crate::pixel_classifier::{can_remove, is_endpoint};
use crate::raster::{BinaryRaster, Coord, Region};

/// When the loop-mode fixpoint runs relative to endpoint pruning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopRemoval {
    Off,
    BeforeBranches,
    AfterBranches,
}

/// Which pixels start a trace during a branch pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartMode {
    Endpoints,
    /// Any foreground pixel, traced in one direction, so closed loops
    /// without endpoints are reached. Only short closed loops are touched.
    AnyForeground,
}

#[derive(Debug, Clone)]
pub struct PruneOptions {
    /// Branches traced shorter than this many pixels are deleted
    pub min_branch_length: usize,
    pub loop_removal: LoopRemoval,
    /// Delete every traced branch, decomposing the skeleton into segments
    pub remove_all: bool,
    /// Collect branch coordinate sequences in the report
    pub record_branches: bool,
    /// Added to recorded coordinates when the raster is a sub-region
    pub origin: Coord,
}

impl Default for PruneOptions {
    fn default() -> Self {
        Self {
            min_branch_length: 10,
            loop_removal: LoopRemoval::Off,
            remove_all: false,
            record_branches: false,
            origin: Coord::new(0, 0),
        }
    }
}

/// Ordered pixel path of one skeleton branch, in absolute coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub points: Vec<Coord>,
}

impl Branch {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Option<Coord> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Coord> {
        self.points.last().copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub foreground_before: usize,
    pub foreground_after: usize,
    pub pixels_removed: usize,
    pub branches_removed: usize,
    /// Branch passes executed over all fixpoint loops
    pub passes: usize,
    pub branches: Vec<Branch>,
}

pub struct SkeletonPruner {
    options: PruneOptions,
}

impl SkeletonPruner {
    pub fn new(options: PruneOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PruneOptions {
        &self.options
    }

    /// Prune `raster` in place.
    ///
    /// A raster holding any value other than its foreground or background is
    /// rejected before a single pixel changes.
    pub fn prune(&self, raster: &mut BinaryRaster) -> Result<PruneReport> {
        raster.check_binary()?;

        let mut report = PruneReport {
            foreground_before: raster.foreground_count(),
            ..PruneReport::default()
        };

        let (width, height) = raster.dimensions();
        let artifacts = prune_points(raster, Region::new(0, 0, width, height));
        report.pixels_removed += artifacts;
        debug!("Artifact pass removed {} pixels", artifacts);

        if self.options.loop_removal == LoopRemoval::BeforeBranches {
            self.run_to_fixpoint(raster, StartMode::AnyForeground, &mut report);
        }

        self.run_to_fixpoint(raster, StartMode::Endpoints, &mut report);

        if self.options.loop_removal == LoopRemoval::AfterBranches
            && self.run_to_fixpoint(raster, StartMode::AnyForeground, &mut report)
        {
            // Opened loops expose new endpoints
            self.run_to_fixpoint(raster, StartMode::Endpoints, &mut report);
        }

        report.foreground_after = raster.foreground_count();
        debug!(
            "Pruning finished after {} passes: {} -> {} foreground pixels",
            report.passes, report.foreground_before, report.foreground_after
        );

        Ok(report)
    }

    /// Repeat branch passes until one changes nothing; true if any did
    fn run_to_fixpoint(&self, raster: &mut BinaryRaster, mode: StartMode, report: &mut PruneReport) -> bool {
        let mut any_change = false;
        loop {
            report.passes += 1;
            if !self.prune_branches(raster, mode, report) {
                return any_change;
            }
            any_change = true;
        }
    }

    /// One branch pass over the raster interior; true if a pixel was deleted
    fn prune_branches(&self, raster: &mut BinaryRaster, mode: StartMode, report: &mut PruneReport) -> bool {
        let (width, height) = raster.dimensions();
        if width < 3 || height < 3 {
            return false;
        }

        let tracer = BranchTracer::for_raster(raster);
        let min_len = self.options.min_branch_length;
        let mut changed = false;

        // Endpoint passes define the retained branches; each pass replaces the last
        let recording = self.options.record_branches && mode == StartMode::Endpoints;
        if recording && !self.options.remove_all {
            report.branches.clear();
        }
        let mut seen_ends: HashSet<(Coord, Coord)> = HashSet::new();

        for y in 1..(height - 1) as i32 {
            for x in 1..(width - 1) as i32 {
                if !raster.is_foreground(x, y) {
                    continue;
                }
                if mode == StartMode::AnyForeground {
                    let trace = tracer.trace_around(Coord::new(x, y), raster);
                    changed |= open_short_loop(raster, &trace, min_len, report);
                    continue;
                }
                if !is_endpoint(raster, x, y) {
                    continue;
                }

                let trace = tracer.trace(Coord::new(x, y), raster);

                if trace.len() >= min_len {
                    if recording {
                        self.record(&trace, &mut seen_ends, &mut report.branches);
                    }
                    if self.options.remove_all {
                        changed |= delete_branch(raster, &trace, report);
                    }
                } else {
                    changed |= delete_branch(raster, &trace, report);
                }
            }
        }

        debug!("Branch pass ({:?}) changed raster: {}", mode, changed);
        changed
    }

    fn record(&self, trace: &Trace, seen_ends: &mut HashSet<(Coord, Coord)>, branches: &mut Vec<Branch>) {
        let (start, end) = match (trace.path.first(), trace.path.last()) {
            (Some(&s), Some(&e)) => (s, e),
            _ => return,
        };

        // The same segment traced from its far end
        if seen_ends.contains(&(end, start)) {
            return;
        }
        seen_ends.insert((start, end));

        let origin = self.options.origin;
        branches.push(Branch {
            points: trace.path.iter().map(|&c| c + origin).collect(),
        });
    }
}

/// Delete the deletable part of a traced branch and clean the residue
/// around the last pixel kept. True if anything was deleted.
fn delete_branch(raster: &mut BinaryRaster, trace: &Trace, report: &mut PruneReport) -> bool {
    let deletable = trace.termination.deletable_len(trace.len());
    if deletable == 0 {
        return false;
    }

    // A trace that ran into a loop may list a pixel twice
    let cleared = trace.path[..deletable].iter().filter(|&&c| raster.clear(c)).count();
    if cleared == 0 {
        return false;
    }
    report.pixels_removed += cleared;
    report.branches_removed += 1;

    let anchor = trace.path[deletable.min(trace.len() - 1)];
    report.pixels_removed += prune_points(raster, neighbourhood(anchor));

    if let Termination::AbortedLoop { distance } = trace.termination {
        debug!("Loop abort at {:?}: kept last {} pixels", anchor, distance);
    }

    true
}

/// Break a closed ring shorter than `min_len` at one of its plain pixels
/// (exactly two foreground neighbours) so the endpoint passes can take the
/// rest. Junction pixels on the ring are never cut.
fn open_short_loop(raster: &mut BinaryRaster, trace: &Trace, min_len: usize, report: &mut PruneReport) -> bool {
    if !trace.closes_at_start() || trace.len() >= min_len {
        return false;
    }

    let cut = trace.path[1..]
        .iter()
        .copied()
        .find(|c| raster.foreground_neighbours(c.x, c.y) == 2);
    let cut = match cut {
        Some(c) => c,
        None => return false,
    };

    if !raster.clear(cut) {
        return false;
    }
    report.pixels_removed += 1;
    debug!("Opened a {}-pixel loop at {:?}", trace.len(), cut);

    true
}

/// 3x3 region centred on `c`; `prune_points` clips it to the raster
fn neighbourhood(c: Coord) -> Region {
    let x0 = (c.x - 1).max(0);
    let y0 = (c.y - 1).max(0);
    Region::new(x0 as u32, y0 as u32, (c.x + 2 - x0) as u32, (c.y + 2 - y0) as u32)
}

/// Artifact pass: delete every foreground pixel in `region` whose removal
/// keeps its 3x3 neighbourhood connected. Returns the number deleted.
pub fn prune_points(raster: &mut BinaryRaster, region: Region) -> usize {
    let x_end = region.x.saturating_add(region.width).min(raster.width());
    let y_end = region.y.saturating_add(region.height).min(raster.height());
    let mut removed = 0;

    for y in region.y..y_end {
        for x in region.x..x_end {
            let (xi, yi) = (x as i32, y as i32);
            if raster.is_foreground(xi, yi) && can_remove(raster, xi, yi) {
                raster.clear(Coord::new(xi, yi));
                removed += 1;
            }
        }
    }

    removed
}

/// Split a skeleton into its branch segments without touching the input.
///
/// With a region the segments of that sub-raster are reported in the
/// coordinates of the full raster.
pub fn decompose(raster: &BinaryRaster, region: Option<Region>) -> Result<Vec<Branch>> {
    let (mut work, origin) = match region {
        Some(region) => (raster.crop(region)?, region.origin()),
        None => (raster.clone(), Coord::new(0, 0)),
    };

    let pruner = SkeletonPruner::new(PruneOptions {
        min_branch_length: 0,
        loop_removal: LoopRemoval::Off,
        remove_all: true,
        record_branches: true,
        origin,
    });

    Ok(pruner.prune(&mut work)?.branches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HyphaError;
    use crate::raster::test_support::*;

    /// Bar of 51 pixels at y=10 with a 3-pixel spur standing on x=27
    fn bar_with_spur() -> BinaryRaster {
        let mut raster = blank(60, 20);
        hline(&mut raster, 10, 2, 52);
        vline(&mut raster, 27, 7, 9);
        raster
    }

    fn pruner(min_branch_length: usize) -> SkeletonPruner {
        SkeletonPruner::new(PruneOptions {
            min_branch_length,
            ..PruneOptions::default()
        })
    }

    #[test]
    fn short_spur_is_removed_and_fork_kept() {
        let mut raster = bar_with_spur();
        assert_eq!(raster.foreground_count(), 54);

        let report = pruner(10).prune(&mut raster).expect("binary input");

        // The fork pixel under the spur is thinned away first, leaving
        // (27,9) as the junction; the spur above it goes.
        assert_eq!(raster.foreground_count(), 51);
        assert!(raster.is_foreground(27, 9));
        assert!(!raster.is_foreground(27, 8));
        assert!(!raster.is_foreground(27, 7));
        assert!(!raster.is_foreground(27, 10));
        assert!(raster.is_foreground(2, 10));
        assert!(raster.is_foreground(52, 10));

        assert_eq!(report.foreground_before, 54);
        assert_eq!(report.foreground_after, 51);
        assert_eq!(report.pixels_removed, 3);
        assert_eq!(report.branches_removed, 1);
    }

    #[test]
    fn pruning_is_idempotent() {
        let mut raster = bar_with_spur();
        let pruner = pruner(10);
        pruner.prune(&mut raster).expect("binary input");
        let once = raster.clone();

        let second = pruner.prune(&mut raster).expect("binary input");
        assert_eq!(second.pixels_removed, 0);
        assert_eq!(second.passes, 1);
        assert_eq!(raster, once);
    }

    #[test]
    fn foreground_never_grows() {
        let mut raster = bar_with_spur();
        vline(&mut raster, 40, 11, 18);
        hline(&mut raster, 15, 5, 9);

        let before = raster.foreground_count();
        let report = pruner(6).prune(&mut raster).expect("binary input");
        assert!(raster.foreground_count() <= before);
        assert_eq!(report.foreground_before - report.foreground_after, report.pixels_removed);
    }

    #[test]
    fn retained_branches_are_recorded_once_with_origin() {
        let mut raster = bar_with_spur();
        let pruner = SkeletonPruner::new(PruneOptions {
            min_branch_length: 10,
            record_branches: true,
            origin: Coord::new(100, 200),
            ..PruneOptions::default()
        });

        let report = pruner.prune(&mut raster).expect("binary input");

        assert_eq!(report.branches.len(), 1);
        let branch = &report.branches[0];
        assert_eq!(branch.len(), 51);
        assert_eq!(branch.start(), Some(Coord::new(102, 210)));
        assert_eq!(branch.end(), Some(Coord::new(152, 210)));
        assert!(branch.points.contains(&Coord::new(127, 209)));
    }

    #[test]
    fn short_isolated_fragment_disappears() {
        let mut raster = blank(20, 10);
        hline(&mut raster, 5, 3, 7);

        pruner(10).prune(&mut raster).expect("binary input");
        assert_eq!(raster.foreground_count(), 0);
    }

    #[test]
    fn non_binary_raster_is_left_untouched() {
        let mut raster = bar_with_spur();
        raster.set(0, 0, 128);
        let original = raster.clone();

        let result = pruner(10).prune(&mut raster);
        assert!(matches!(result, Err(HyphaError::NonBinaryRaster { value: 128, .. })));
        assert_eq!(raster, original);
    }

    /// Square outline 5..=9; the artifact pass thins it to a 12-pixel ring
    fn square_ring() -> BinaryRaster {
        let mut ring = blank(15, 15);
        hline(&mut ring, 5, 5, 9);
        hline(&mut ring, 9, 5, 9);
        vline(&mut ring, 5, 5, 9);
        vline(&mut ring, 9, 5, 9);
        ring
    }

    fn loop_pruner(min_branch_length: usize, loop_removal: LoopRemoval) -> SkeletonPruner {
        SkeletonPruner::new(PruneOptions {
            min_branch_length,
            loop_removal,
            ..PruneOptions::default()
        })
    }

    #[test]
    fn ring_survives_without_loop_removal() {
        let mut ring = square_ring();
        let report = pruner(20).prune(&mut ring).expect("binary input");

        // Only the square corners are thinned
        assert_eq!(ring.foreground_count(), 12);
        assert_eq!(report.pixels_removed, 4);
        assert_eq!(report.branches_removed, 0);
    }

    #[test]
    fn thinned_ring_traces_close_back_on_their_start() {
        let mut ring = square_ring();
        let (width, height) = ring.dimensions();
        prune_points(&mut ring, Region::new(0, 0, width, height));
        assert_eq!(ring.foreground_count(), 12);

        let tracer = BranchTracer::for_raster(&ring);
        let trace = tracer.trace_around(Coord::new(6, 5), &ring);
        assert_eq!(trace.len(), 12);
        assert_eq!(trace.termination, Termination::AbortedLoop { distance: 12 });
        assert!(trace.closes_at_start());
    }

    #[test]
    fn short_ring_is_removed_in_loop_mode() {
        for loop_removal in [LoopRemoval::BeforeBranches, LoopRemoval::AfterBranches] {
            let mut ring = square_ring();
            let report = loop_pruner(20, loop_removal).prune(&mut ring).expect("binary input");

            // Opened at (7,5), then the 11-pixel arc goes as a short branch
            assert_eq!(ring.foreground_count(), 0, "{:?}", loop_removal);
            assert_eq!(report.pixels_removed, 16);
            assert_eq!(report.branches_removed, 1);
        }
    }

    #[test]
    fn long_ring_is_kept_in_loop_mode() {
        let mut ring = square_ring();
        loop_pruner(5, LoopRemoval::AfterBranches).prune(&mut ring).expect("binary input");
        assert_eq!(ring.foreground_count(), 12);
    }

    #[test]
    fn loop_mode_leaves_open_branches_to_endpoint_passes() {
        let mut loop_mode = bar_with_spur();
        let mut plain = bar_with_spur();
        loop_pruner(10, LoopRemoval::BeforeBranches).prune(&mut loop_mode).expect("binary input");
        pruner(10).prune(&mut plain).expect("binary input");
        assert_eq!(loop_mode, plain);
    }

    #[test]
    fn lasso_ring_is_opened_beside_its_junction() {
        let mut lasso = blank(15, 40);
        hline(&mut lasso, 5, 5, 9);
        hline(&mut lasso, 9, 5, 9);
        vline(&mut lasso, 5, 5, 9);
        vline(&mut lasso, 9, 5, 9);
        // Long tail hanging from the bottom edge
        vline(&mut lasso, 7, 10, 35);

        loop_pruner(20, LoopRemoval::AfterBranches).prune(&mut lasso).expect("binary input");

        // (7,9) is thinned so (7,10) joins ring and tail; the ring is cut
        // next to that junction and the hook left over is long enough to stay
        assert!(lasso.is_foreground(7, 10));
        assert!(lasso.is_foreground(7, 35));
        assert!(!lasso.is_foreground(6, 9));
        assert!(lasso.is_foreground(8, 9));
        assert_eq!(lasso.foreground_count(), 36);
    }

    #[test]
    fn prune_points_thins_staircase() {
        let mut raster = raster_from_rows(&[
            ".......",
            ".#.....",
            "..##...",
            "...#...",
            "....#..",
            ".......",
        ]);
        let removed = prune_points(&mut raster, Region::new(0, 0, 7, 6));
        assert_eq!(removed, 1);
        assert!(!raster.is_foreground(3, 2));
        assert_eq!(raster.foreground_count(), 4);
    }

    #[test]
    fn decompose_reports_segments_and_keeps_input() {
        let raster = bar_with_spur();
        let branches = decompose(&raster, None).expect("binary input");

        let mut lengths: Vec<usize> = branches.iter().map(Branch::len).collect();
        lengths.sort_unstable();
        assert_eq!(lengths, vec![3, 51]);
        assert_eq!(raster.foreground_count(), 54);
    }

    #[test]
    fn decompose_region_uses_absolute_coordinates() {
        let mut raster = blank(40, 20);
        hline(&mut raster, 12, 22, 31);

        let branches = decompose(&raster, Some(Region::new(20, 10, 15, 5))).expect("fits");
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].len(), 10);
        assert_eq!(branches[0].start(), Some(Coord::new(22, 12)));
        assert_eq!(branches[0].end(), Some(Coord::new(31, 12)));
    }
}
