//! High-level polygon scanline rasterizer with anti-aliasing.
//!
//! Accepts polygon contours (move_to/line_to/close), feeds their edges
//! through a clipping policy into the cell accumulator, then sorts the cells
//! and sweeps them row by row into a `Scanline` container.
//!
//! Lifecycle: `Initial` while edges are added, `Sorted` once the cells have
//! been sorted (the first query does this implicitly), `Sweeping` after
//! `rewind_scanlines()` or `navigate_scanline()`, `Done` when the last row
//! has been swept. `reset()` returns to `Initial`.

use log::{debug, trace};

use crate::basics::{is_close, is_move_to, is_stop, is_vertex, FillingRule, RectI, VertexSource};
use crate::config::RasterizerConfig;
use crate::error::Result;
use crate::gamma::{GammaFunction, GammaTable};
use crate::rasterizer_cells_aa::{CellAa, RasterizerCellsAa};
use crate::rasterizer_sl_clip::{ClipCoord, RasConv, RasterizerClip, RasterizerSlClipInt};

// ============================================================================
// AA scale constants
// ============================================================================

const AA_SHIFT: u32 = 8;
const AA_SCALE: i64 = 1 << AA_SHIFT;
const AA_MASK: i64 = AA_SCALE - 1;
const AA_SCALE2: i64 = AA_SCALE * 2;
const AA_MASK2: i64 = AA_SCALE2 - 1;

/// Shift from a doubled 24.8 area (16 fractional bits plus one) to 8-bit alpha.
const AREA_SHIFT: u32 = 9;

// ============================================================================
// Scanline trait — the interface that sweep_scanline feeds data into
// ============================================================================

/// Trait for scanline containers that accumulate coverage data.
///
/// Implementations are `ScanlineP8` (packed), `ScanlineU8` (unpacked
/// per-pixel coverage) and `ScanlineBin` (binary, no coverage). Calls to
/// `add_cell`/`add_span` arrive in ascending, non-overlapping x order and
/// must stay within the range declared by `reset`.
pub trait Scanline {
    /// Declare the x range of the coming rows and clear all span data.
    fn reset(&mut self, min_x: i32, max_x: i32);

    /// Prepare for a new scanline, clearing all span data.
    fn reset_spans(&mut self);

    /// Add a single cell at position `x` with coverage `cover`.
    fn add_cell(&mut self, x: i32, cover: u32);

    /// Add a horizontal span of `len` pixels starting at `x`, all with `cover`.
    fn add_span(&mut self, x: i32, len: u32, cover: u32);

    /// Finalize the scanline at the given Y coordinate.
    fn finalize(&mut self, y: i32);

    /// Number of spans in this scanline (0 means empty).
    fn num_spans(&self) -> usize;

    /// The Y coordinate of this scanline.
    fn y(&self) -> i32;
}

/// Coverage of a span: one value for the whole run, or one per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanCovers<'a> {
    Solid(u8),
    PerPixel(&'a [u8]),
}

/// A run of `len` pixels starting at `x`, as read back from a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub x: i32,
    pub len: u32,
    pub covers: SpanCovers<'a>,
}

impl Span<'_> {
    /// Coverage of the `i`-th pixel of the span.
    #[inline]
    pub fn cover(&self, i: usize) -> u8 {
        match self.covers {
            SpanCovers::Solid(c) => c,
            SpanCovers::PerPixel(covers) => covers[i],
        }
    }

    /// One past the last x of the span.
    #[inline]
    pub fn end(&self) -> i32 {
        self.x + self.len as i32
    }
}

// ============================================================================
// Sweep state
// ============================================================================

/// Where a rasterizer is in its add/sort/sweep cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// Accepting edges.
    Initial,
    /// Cells sorted; rows can be queried but no sweep is in progress.
    Sorted,
    /// A sweep is in progress.
    Sweeping,
    /// Every row has been swept.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Initial,
    MoveTo,
    LineTo,
    Closed,
}

// ============================================================================
// RasterizerScanlineAa — the high-level polygon rasterizer
// ============================================================================

/// High-level polygon rasterizer with anti-aliased output.
///
/// `Clip` selects the clipping and coordinate conversion policy; it defaults
/// to integer clipping on 24.8 fixed-point coordinates.
///
/// Usage:
/// 1. Optionally set `filling_rule()`, `gamma()` and `clip_box()`
/// 2. Define contours with `move_to_d()` / `line_to_d()` or `add_path()`
/// 3. Call `rewind_scanlines()` then repeatedly `sweep_scanline()`
pub struct RasterizerScanlineAa<Clip: RasterizerClip = RasterizerSlClipInt> {
    outline: RasterizerCellsAa<CellAa>,
    clipper: Clip,
    filling_rule: FillingRule,
    gamma: GammaTable,
    auto_close: bool,
    start_x: ClipCoord<Clip>,
    start_y: ClipCoord<Clip>,
    status: Status,
    sweep: SweepState,
    scan_y: i32,
}

impl<Clip: RasterizerClip> RasterizerScanlineAa<Clip> {
    pub fn new() -> Self {
        Self {
            outline: RasterizerCellsAa::new(),
            clipper: Clip::default(),
            filling_rule: FillingRule::NonZero,
            gamma: GammaTable::identity(),
            auto_close: true,
            start_x: Default::default(),
            start_y: Default::default(),
            status: Status::Initial,
            sweep: SweepState::Initial,
            scan_y: 0,
        }
    }

    /// Build a rasterizer from a validated configuration.
    pub fn with_config(cfg: RasterizerConfig) -> Result<Self> {
        cfg.validate()?;
        let mut ras = Self::new();
        ras.outline.set_cell_block_limit(cfg.cell_block_limit);
        ras.filling_rule(cfg.filling_rule);
        ras.auto_close(cfg.auto_close);
        if let Some(gamma) = cfg.gamma {
            ras.gamma(gamma);
        }
        if let Some(cb) = cfg.clip_box {
            ras.clip_box(cb.x1, cb.y1, cb.x2, cb.y2);
        }
        Ok(ras)
    }

    /// Reset the rasterizer, discarding all polygon data.
    pub fn reset(&mut self) {
        self.outline.reset();
        self.status = Status::Initial;
        self.sweep = SweepState::Initial;
    }

    /// Set the filling rule (non-zero winding or even-odd).
    pub fn filling_rule(&mut self, rule: FillingRule) {
        self.filling_rule = rule;
    }

    /// Remap every emitted alpha through `table`.
    pub fn gamma(&mut self, table: GammaTable) {
        self.gamma = table;
    }

    /// Build the alpha table from a gamma function.
    pub fn gamma_fn<F: GammaFunction + ?Sized>(&mut self, f: &F) {
        self.gamma = GammaTable::from_fn(f);
    }

    /// Enable or disable automatic polygon closing on move_to.
    pub fn auto_close(&mut self, flag: bool) {
        self.auto_close = flag;
    }

    /// Set the clipping rectangle in pixel units.
    ///
    /// Only valid before the first edge of a pass or once its sweep is
    /// done; panics if edges of an unfinished pass are pending.
    pub fn clip_box(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.assert_no_pending_edges("clip_box");
        self.reset();
        self.clipper.clip_box(
            Clip::Conv::upscale(x1),
            Clip::Conv::upscale(y1),
            Clip::Conv::upscale(x2),
            Clip::Conv::upscale(y2),
        );
    }

    /// Disable clipping. Same restrictions as `clip_box()`.
    pub fn reset_clipping(&mut self) {
        self.assert_no_pending_edges("reset_clipping");
        self.reset();
        self.clipper.reset_clipping();
    }

    fn assert_no_pending_edges(&self, op: &str) {
        assert!(
            !matches!(self.status, Status::MoveTo | Status::LineTo),
            "{}() called while a contour is open",
            op
        );
        assert!(
            self.outline.bounds().is_none() || self.sweep == SweepState::Done,
            "{}() called with edges pending in the current pass; call reset() first",
            op
        );
    }

    /// Current stage of the add/sort/sweep cycle.
    pub fn state(&self) -> SweepState {
        self.sweep
    }

    // ========================================================================
    // Path building
    // ========================================================================

    /// Close the current polygon contour.
    pub fn close_polygon(&mut self) {
        if self.status == Status::LineTo {
            self.assert_accepting_edges("close_polygon");
            self.clipper
                .line_to(&mut self.outline, self.start_x, self.start_y);
            self.status = Status::Closed;
        }
    }

    fn assert_accepting_edges(&self, op: &str) {
        assert!(
            !self.outline.sorted(),
            "{}() after the cells were sorted; call reset() first",
            op
        );
    }

    /// A finished sweep starts a new pass on the next edge. Sorted cells of
    /// an unfinished pass can't take more edges.
    fn start_pass_if_done(&mut self, op: &str) {
        if !self.outline.sorted() {
            return;
        }
        if self.sweep == SweepState::Done {
            debug!(
                "{}: sweep done, discarding {} cells for a new pass",
                op,
                self.outline.total_cells()
            );
            self.reset();
        } else {
            self.assert_accepting_edges(op);
        }
    }

    fn begin_contour(&mut self, x: ClipCoord<Clip>, y: ClipCoord<Clip>) {
        self.start_pass_if_done("move_to");
        if self.auto_close {
            self.close_polygon();
        }
        self.start_x = x;
        self.start_y = y;
        self.clipper.move_to(x, y);
        self.status = Status::MoveTo;
    }

    fn continue_contour(&mut self, x: ClipCoord<Clip>, y: ClipCoord<Clip>) {
        self.assert_accepting_edges("line_to");
        self.clipper.line_to(&mut self.outline, x, y);
        self.status = Status::LineTo;
    }

    /// Move to a new position in 24.8 fixed-point coordinates.
    pub fn move_to(&mut self, x: i32, y: i32) {
        self.begin_contour(Clip::Conv::downscale(x), Clip::Conv::downscale(y));
    }

    /// Line to in 24.8 fixed-point coordinates.
    pub fn line_to(&mut self, x: i32, y: i32) {
        self.continue_contour(Clip::Conv::downscale(x), Clip::Conv::downscale(y));
    }

    /// Move to a new position in pixel units.
    pub fn move_to_d(&mut self, x: f64, y: f64) {
        self.begin_contour(Clip::Conv::upscale(x), Clip::Conv::upscale(y));
    }

    /// Line to in pixel units.
    pub fn line_to_d(&mut self, x: f64, y: f64) {
        self.continue_contour(Clip::Conv::upscale(x), Clip::Conv::upscale(y));
    }

    /// Add a vertex (dispatches to move_to, line_to, or close based on command).
    pub fn add_vertex(&mut self, x: f64, y: f64, cmd: u32) {
        if is_move_to(cmd) {
            self.move_to_d(x, y);
        } else if is_vertex(cmd) {
            self.line_to_d(x, y);
        } else if is_close(cmd) {
            self.close_polygon();
        }
    }

    fn add_edge(&mut self, x1: ClipCoord<Clip>, y1: ClipCoord<Clip>, x2: ClipCoord<Clip>, y2: ClipCoord<Clip>) {
        self.start_pass_if_done("edge");
        self.clipper.move_to(x1, y1);
        self.clipper.line_to(&mut self.outline, x2, y2);
        // A standalone edge leaves no contour open
        self.status = Status::Closed;
    }

    /// Add a single edge in 24.8 fixed-point coordinates.
    pub fn edge(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.add_edge(
            Clip::Conv::downscale(x1),
            Clip::Conv::downscale(y1),
            Clip::Conv::downscale(x2),
            Clip::Conv::downscale(y2),
        );
    }

    /// Add a single edge in pixel units.
    pub fn edge_d(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.add_edge(
            Clip::Conv::upscale(x1),
            Clip::Conv::upscale(y1),
            Clip::Conv::upscale(x2),
            Clip::Conv::upscale(y2),
        );
    }

    /// Add all vertices from a vertex source.
    pub fn add_path(&mut self, vs: &mut dyn VertexSource, path_id: u32) {
        let mut x = 0.0;
        let mut y = 0.0;

        vs.rewind(path_id);
        self.start_pass_if_done("add_path");
        loop {
            let cmd = vs.vertex(&mut x, &mut y);
            if is_stop(cmd) {
                break;
            }
            self.add_vertex(x, y, cmd);
        }
    }

    // ========================================================================
    // Bounding box
    // ========================================================================

    pub fn min_x(&self) -> i32 {
        self.outline.min_x()
    }
    pub fn min_y(&self) -> i32 {
        self.outline.min_y()
    }
    pub fn max_x(&self) -> i32 {
        self.outline.max_x()
    }
    pub fn max_y(&self) -> i32 {
        self.outline.max_y()
    }

    /// Pixel bounds of the accumulated edges, `None` if there are none.
    pub fn bounds(&self) -> Option<RectI> {
        self.outline.bounds()
    }

    /// Read access to the cell accumulator.
    pub fn outline(&self) -> &RasterizerCellsAa<CellAa> {
        &self.outline
    }

    // ========================================================================
    // Scanline sweeping
    // ========================================================================

    /// Close any open contour and sort the cells, without starting a sweep.
    pub fn sort(&mut self) {
        if self.auto_close {
            self.close_polygon();
        }
        self.outline.sort_cells();
        if self.sweep == SweepState::Initial {
            self.sweep = SweepState::Sorted;
        }
    }

    /// Sort cells and position the sweep on the first row.
    /// Returns `false` if there are no cells (nothing to render).
    pub fn rewind_scanlines(&mut self) -> bool {
        self.sort();
        if self.outline.total_cells() == 0 {
            self.sweep = SweepState::Done;
            return false;
        }
        self.scan_y = self.outline.min_y();
        self.sweep = SweepState::Sweeping;
        trace!(
            "rewind: sweeping rows {}..={}",
            self.outline.min_y(),
            self.outline.max_y()
        );
        true
    }

    /// Position the sweep on row `y` (for random access).
    /// Returns `false` if `y` is outside the accumulated rows.
    pub fn navigate_scanline(&mut self, y: i32) -> bool {
        self.sort();
        if self.outline.total_cells() == 0 || y < self.outline.min_y() || y > self.outline.max_y() {
            return false;
        }
        self.scan_y = y;
        self.sweep = SweepState::Sweeping;
        true
    }

    /// Convert a doubled area (cover << 9 plus cell area) to alpha, applying
    /// the filling rule and the gamma table.
    #[inline]
    pub fn calculate_alpha(&self, area: i64) -> u32 {
        let mut cover = area.abs() >> AREA_SHIFT;

        if self.filling_rule == FillingRule::EvenOdd {
            cover &= AA_MASK2;
            if cover > AA_SCALE {
                cover = AA_SCALE2 - cover;
            }
        }
        if cover > AA_MASK {
            cover = AA_MASK;
        }
        self.gamma.apply(cover as u32)
    }

    /// Extract the next non-empty scanline of anti-aliased coverage data.
    ///
    /// Returns `false` when all scanlines have been consumed. Panics if no
    /// sweep was started with `rewind_scanlines()` or `navigate_scanline()`.
    pub fn sweep_scanline<SL: Scanline>(&mut self, sl: &mut SL) -> bool {
        assert!(
            matches!(self.sweep, SweepState::Sweeping | SweepState::Done),
            "sweep_scanline() called before rewind_scanlines()"
        );
        loop {
            if self.scan_y > self.outline.max_y() {
                self.sweep = SweepState::Done;
                return false;
            }
            sl.reset_spans();
            self.render_row(self.scan_y, sl);
            if sl.num_spans() > 0 {
                break;
            }
            self.scan_y += 1;
        }

        sl.finalize(self.scan_y);
        self.scan_y += 1;
        true
    }

    /// Emit the spans of row `y` into `sl`.
    fn render_row<SL: Scanline>(&self, y: i32, sl: &mut SL) {
        let cells = self.outline.scanline_cells(y);
        let mut i = 0;
        let mut cover: i64 = 0;

        while i < cells.len() {
            let x = cells[i].x;
            let mut area = 0i64;
            let mut cell_cover = 0i64;

            // Accumulate all cells with the same X
            while i < cells.len() && cells[i].x == x {
                area += cells[i].area;
                cell_cover += cells[i].cover as i64;
                i += 1;
            }

            let partial = (cover << AREA_SHIFT) + area;
            cover += cell_cover;
            let full = cover << AREA_SHIFT;

            let mut span_x = x;
            if partial != full {
                let alpha = self.calculate_alpha(partial);
                if alpha != 0 {
                    sl.add_cell(x, alpha);
                }
                span_x = x + 1;
            }

            if let Some(next) = cells.get(i) {
                if next.x > span_x {
                    let alpha = self.calculate_alpha(full);
                    if alpha != 0 {
                        sl.add_span(span_x, (next.x - span_x) as u32, alpha);
                    }
                }
            }
        }
    }

    /// The alpha the sweep emits for pixel (`tx`, `ty`), or 0 if it emits
    /// nothing there. Sorts the cells if needed; an ongoing sweep is not
    /// disturbed.
    pub fn coverage_at(&mut self, tx: i32, ty: i32) -> u32 {
        self.sort();
        if self.outline.total_cells() == 0 {
            return 0;
        }

        let cells = self.outline.scanline_cells(ty);
        let mut i = 0;
        let mut cover: i64 = 0;

        while i < cells.len() {
            let x = cells[i].x;
            if x > tx {
                // In the gap before this cell; nothing precedes the first one
                return if i == 0 {
                    0
                } else {
                    self.calculate_alpha(cover << AREA_SHIFT)
                };
            }

            let mut area = 0i64;
            let mut cell_cover = 0i64;
            while i < cells.len() && cells[i].x == x {
                area += cells[i].area;
                cell_cover += cells[i].cover as i64;
                i += 1;
            }

            let partial = (cover << AREA_SHIFT) + area;
            cover += cell_cover;
            let full = cover << AREA_SHIFT;

            if x == tx {
                return if partial != full {
                    self.calculate_alpha(partial)
                } else if i < cells.len() {
                    self.calculate_alpha(full)
                } else {
                    0
                };
            }
        }
        0
    }

    /// Whether pixel (`tx`, `ty`) receives non-zero coverage.
    pub fn hit_test(&mut self, tx: i32, ty: i32) -> bool {
        self.coverage_at(tx, ty) != 0
    }
}

impl<Clip: RasterizerClip> Default for RasterizerScanlineAa<Clip> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::{
        PATH_CMD_END_POLY, PATH_CMD_LINE_TO, PATH_CMD_MOVE_TO, PATH_CMD_STOP, PATH_FLAGS_CLOSE,
        POLY_SUBPIXEL_SCALE,
    };
    use crate::gamma::GammaPower;
    use crate::rasterizer_sl_clip::{RasterizerSlClipDbl, RasterizerSlNoClip};

    const S: i32 = POLY_SUBPIXEL_SCALE as i32;

    /// Minimal scanline for testing: just records cells and spans.
    struct TestScanline {
        spans: Vec<(i32, u32, u32)>, // (x, len, cover)
        y_val: i32,
    }

    impl TestScanline {
        fn new() -> Self {
            Self {
                spans: Vec::new(),
                y_val: 0,
            }
        }
    }

    impl Scanline for TestScanline {
        fn reset(&mut self, _min_x: i32, _max_x: i32) {
            self.spans.clear();
        }
        fn reset_spans(&mut self) {
            self.spans.clear();
        }
        fn add_cell(&mut self, x: i32, cover: u32) {
            self.spans.push((x, 1, cover));
        }
        fn add_span(&mut self, x: i32, len: u32, cover: u32) {
            self.spans.push((x, len, cover));
        }
        fn finalize(&mut self, y: i32) {
            self.y_val = y;
        }
        fn num_spans(&self) -> usize {
            self.spans.len()
        }
        fn y(&self) -> i32 {
            self.y_val
        }
    }

    /// Polygon vertices as a path command stream.
    struct Polygon {
        pts: Vec<(f64, f64)>,
        idx: usize,
    }

    impl Polygon {
        fn new(pts: &[(f64, f64)]) -> Self {
            Self {
                pts: pts.to_vec(),
                idx: 0,
            }
        }
    }

    impl VertexSource for Polygon {
        fn rewind(&mut self, _path_id: u32) {
            self.idx = 0;
        }
        fn vertex(&mut self, x: &mut f64, y: &mut f64) -> u32 {
            let i = self.idx;
            self.idx += 1;
            if i < self.pts.len() {
                *x = self.pts[i].0;
                *y = self.pts[i].1;
                if i == 0 {
                    PATH_CMD_MOVE_TO
                } else {
                    PATH_CMD_LINE_TO
                }
            } else if i == self.pts.len() {
                PATH_CMD_END_POLY | PATH_FLAGS_CLOSE
            } else {
                PATH_CMD_STOP
            }
        }
    }

    fn rect<C: RasterizerClip>(ras: &mut RasterizerScanlineAa<C>, x1: f64, y1: f64, x2: f64, y2: f64) {
        ras.move_to_d(x1, y1);
        ras.line_to_d(x2, y1);
        ras.line_to_d(x2, y2);
        ras.line_to_d(x1, y2);
        ras.close_polygon();
    }

    fn sweep_all<C: RasterizerClip>(ras: &mut RasterizerScanlineAa<C>) -> Vec<(i32, Vec<(i32, u32, u32)>)> {
        let mut rows = Vec::new();
        if ras.rewind_scanlines() {
            let mut sl = TestScanline::new();
            sl.reset(ras.min_x(), ras.max_x());
            while ras.sweep_scanline(&mut sl) {
                rows.push((sl.y(), sl.spans.clone()));
            }
        }
        rows
    }

    #[test]
    fn test_new_rasterizer() {
        let ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        assert_eq!(ras.min_x(), i32::MAX);
        assert_eq!(ras.min_y(), i32::MAX);
        assert_eq!(ras.bounds(), None);
        assert_eq!(ras.state(), SweepState::Initial);
    }

    #[test]
    fn test_filling_rule() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.filling_rule(FillingRule::EvenOdd);
        assert_eq!(ras.filling_rule, FillingRule::EvenOdd);
    }

    #[test]
    fn test_calculate_alpha_nonzero() {
        let ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        // Full coverage: one full cell of cover, doubled
        let full_area = (S as i64) << AREA_SHIFT;
        assert_eq!(ras.calculate_alpha(full_area), 255);
        assert_eq!(ras.calculate_alpha(full_area / 2), 128);
    }

    #[test]
    fn test_calculate_alpha_zero_area() {
        let ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        assert_eq!(ras.calculate_alpha(0), 0);
    }

    #[test]
    fn test_calculate_alpha_negative_area() {
        let ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        let area = 256 * 256;
        assert_eq!(ras.calculate_alpha(area), ras.calculate_alpha(-area));

        // Areas off the 512 grid truncate to the same alpha either way
        assert_eq!(ras.calculate_alpha(area + 1), 128);
        assert_eq!(ras.calculate_alpha(-(area + 1)), 128);
        assert_eq!(ras.calculate_alpha(-1), 0);
        assert_eq!(ras.calculate_alpha(-511), 0);
        assert_eq!(ras.calculate_alpha(-513), 1);
    }

    #[test]
    fn test_calculate_alpha_even_odd() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.filling_rule(FillingRule::EvenOdd);
        let full_area = (S as i64) << AREA_SHIFT;
        assert_eq!(ras.calculate_alpha(full_area * 2), 0);
        assert_eq!(ras.calculate_alpha(full_area * 3), 255);
        ras.filling_rule(FillingRule::NonZero);
        assert_eq!(ras.calculate_alpha(full_area * 2), 255);
    }

    #[test]
    fn test_calculate_alpha_applies_gamma() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.gamma_fn(&GammaPower::new(2.0));
        let full_area = (S as i64) << AREA_SHIFT;
        assert_eq!(ras.calculate_alpha(full_area), 255);
        assert_eq!(ras.calculate_alpha(full_area / 2), 64);
    }

    #[test]
    fn test_rect_sweep_exact() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 2.0, 2.0, 5.0, 4.0);
        let rows = sweep_all(&mut ras);
        assert_eq!(
            rows,
            vec![(2, vec![(2, 3, 255)]), (3, vec![(2, 3, 255)])]
        );
        assert_eq!(ras.state(), SweepState::Done);
    }

    #[test]
    fn test_half_pixel_rect() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 2.5, 2.0, 5.5, 4.0);
        let rows = sweep_all(&mut ras);
        assert_eq!(rows.len(), 2);
        for (_, spans) in rows {
            assert_eq!(spans, vec![(2, 1, 128), (3, 2, 255), (5, 1, 128)]);
        }
    }

    #[test]
    fn test_triangle_sweep() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        // Triangle: (10,10) -> (20,10) -> (15,20) -> close
        ras.move_to(10 * S, 10 * S);
        ras.line_to(20 * S, 10 * S);
        ras.line_to(15 * S, 20 * S);
        ras.close_polygon();

        assert!(ras.rewind_scanlines());

        let mut sl = TestScanline::new();
        let mut count = 0;
        let mut last_y = i32::MIN;
        while ras.sweep_scanline(&mut sl) {
            count += 1;
            assert!(sl.num_spans() > 0);
            assert!(sl.y() > last_y);
            last_y = sl.y();
            for pair in sl.spans.windows(2) {
                assert!(pair[0].0 + pair[0].1 as i32 <= pair[1].0);
            }
        }
        assert_eq!(count, 10);
        assert_eq!(ras.min_y(), 10);
        assert_eq!(ras.max_y(), 20);
    }

    #[test]
    fn test_triangle_hit_test() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        // Triangle: (10,10) -> (30,10) -> (20,30)
        ras.move_to(10 * S, 10 * S);
        ras.line_to(30 * S, 10 * S);
        ras.line_to(20 * S, 30 * S);

        assert!(ras.hit_test(20, 15));
        assert!(!ras.hit_test(0, 0));
        assert!(!ras.hit_test(100, 100));
        assert_eq!(ras.state(), SweepState::Sorted);
    }

    #[test]
    fn test_coverage_at_matches_sweep() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.move_to_d(3.3, 1.7);
        ras.line_to_d(17.8, 4.1);
        ras.line_to_d(9.2, 14.6);
        let rows = sweep_all(&mut ras);
        assert!(!rows.is_empty());

        for (y, spans) in rows {
            let mut expected = std::collections::HashMap::new();
            for (x, len, cover) in spans {
                for px in x..x + len as i32 {
                    expected.insert(px, cover);
                }
            }
            for x in ras.min_x() - 1..=ras.max_x() + 1 {
                let want = expected.get(&x).copied().unwrap_or(0);
                assert_eq!(ras.coverage_at(x, y), want, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_coverage_at_does_not_disturb_sweep() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 4.0, 3.0);
        assert!(ras.rewind_scanlines());
        let mut sl = TestScanline::new();
        assert!(ras.sweep_scanline(&mut sl));
        assert_eq!(sl.y(), 0);
        assert_eq!(ras.coverage_at(1, 2), 255);
        assert!(ras.sweep_scanline(&mut sl));
        assert_eq!(sl.y(), 1);
        assert_eq!(ras.state(), SweepState::Sweeping);
    }

    #[test]
    fn test_move_to_d_line_to_d() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.move_to_d(10.0, 10.0);
        ras.line_to_d(20.0, 10.0);
        ras.line_to_d(15.0, 20.0);

        assert!(ras.rewind_scanlines());
        assert_eq!(ras.state(), SweepState::Sweeping);
    }

    #[test]
    fn test_edge_and_edge_d_agree() {
        let mut a: RasterizerScanlineAa = RasterizerScanlineAa::new();
        a.edge_d(10.0, 10.0, 20.0, 20.0);
        a.edge_d(20.0, 20.0, 10.0, 20.0);
        a.edge_d(10.0, 20.0, 10.0, 10.0);

        let mut b: RasterizerScanlineAa = RasterizerScanlineAa::new();
        b.edge(10 * S, 10 * S, 20 * S, 20 * S);
        b.edge(20 * S, 20 * S, 10 * S, 20 * S);
        b.edge(10 * S, 20 * S, 10 * S, 10 * S);

        let rows = sweep_all(&mut a);
        assert!(!rows.is_empty());
        assert_eq!(rows, sweep_all(&mut b));
    }

    #[test]
    fn test_add_path() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        let mut path = Polygon::new(&[(10.0, 10.0), (50.0, 10.0), (30.0, 50.0)]);
        ras.add_path(&mut path, 0);

        let mut manual: RasterizerScanlineAa = RasterizerScanlineAa::new();
        manual.move_to_d(10.0, 10.0);
        manual.line_to_d(50.0, 10.0);
        manual.line_to_d(30.0, 50.0);
        manual.close_polygon();

        let rows = sweep_all(&mut ras);
        assert_eq!(rows.len(), 40);
        assert_eq!(rows, sweep_all(&mut manual));
    }

    #[test]
    fn test_empty_rasterizer_no_scanlines() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        assert!(!ras.rewind_scanlines());
        assert_eq!(ras.state(), SweepState::Done);
        assert!(!ras.hit_test(0, 0));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.move_to(10 * S, 10 * S);
        ras.line_to(20 * S, 10 * S);
        ras.line_to(15 * S, 20 * S);
        ras.reset();
        assert_eq!(ras.state(), SweepState::Initial);
        assert!(!ras.rewind_scanlines());
    }

    #[test]
    fn test_move_to_after_sweep_starts_new_pass() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        assert_eq!(sweep_all(&mut ras).len(), 2);
        rect(&mut ras, 10.0, 10.0, 12.0, 11.0);
        assert_eq!(ras.state(), SweepState::Initial);
        let rows = sweep_all(&mut ras);
        assert_eq!(rows, vec![(10, vec![(10, 2, 255)])]);
    }

    #[test]
    #[should_panic(expected = "before rewind_scanlines")]
    fn test_sweep_before_rewind_panics() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        let mut sl = TestScanline::new();
        ras.sweep_scanline(&mut sl);
    }

    #[test]
    #[should_panic(expected = "after the cells were sorted")]
    fn test_move_to_after_hit_test_panics() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        assert!(ras.hit_test(1, 1));
        ras.move_to_d(5.0, 5.0);
    }

    #[test]
    #[should_panic(expected = "after the cells were sorted")]
    fn test_edge_during_sweep_panics() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        assert!(ras.rewind_scanlines());
        ras.edge_d(5.0, 5.0, 6.0, 6.0);
    }

    #[test]
    fn test_reset_after_hit_test_accepts_edges() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        assert!(ras.hit_test(1, 1));
        ras.reset();
        rect(&mut ras, 5.0, 5.0, 6.0, 6.0);
        assert!(!ras.hit_test(1, 1));
        assert!(ras.hit_test(5, 5));
    }

    #[test]
    #[should_panic(expected = "after the cells were sorted")]
    fn test_line_to_after_sort_panics() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        ras.sort();
        ras.line_to_d(5.0, 5.0);
    }

    #[test]
    #[should_panic(expected = "contour is open")]
    fn test_clip_box_with_open_contour_panics() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.move_to_d(0.0, 0.0);
        ras.line_to_d(5.0, 0.0);
        ras.clip_box(0.0, 0.0, 10.0, 10.0);
    }

    #[test]
    fn test_clip_box() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.clip_box(0.0, 0.0, 50.0, 50.0);

        // Triangle extending beyond clip box
        ras.move_to_d(10.0, 10.0);
        ras.line_to_d(100.0, 10.0);
        ras.line_to_d(50.0, 100.0);

        assert!(ras.rewind_scanlines());
        assert!(ras.max_y() <= 50);
        assert!(ras.max_x() <= 50);
    }

    #[test]
    #[should_panic(expected = "edges pending in the current pass")]
    fn test_clip_box_with_pending_edges_panics() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        ras.clip_box(0.0, 0.0, 1.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "edges pending in the current pass")]
    fn test_reset_clipping_with_sorted_edges_panics() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.clip_box(0.0, 0.0, 1.0, 1.0);
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        ras.sort();
        ras.reset_clipping();
    }

    #[test]
    fn test_clip_box_after_reset_or_finished_sweep() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        ras.reset();
        ras.clip_box(0.0, 0.0, 1.0, 1.0);
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        assert_eq!(sweep_all(&mut ras), vec![(0, vec![(0, 1, 255)])]);

        // The sweep is done, so the clip box may change for the next pass
        assert_eq!(ras.state(), SweepState::Done);
        ras.reset_clipping();
        assert_eq!(ras.bounds(), None);
        rect(&mut ras, 0.0, 0.0, 2.0, 2.0);
        assert_eq!(sweep_all(&mut ras).len(), 2);
    }

    #[test]
    fn test_navigate_scanline() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.move_to(10 * S, 10 * S);
        ras.line_to(20 * S, 10 * S);
        ras.line_to(15 * S, 20 * S);

        assert!(ras.navigate_scanline(15));
        let mut sl = TestScanline::new();
        assert!(ras.sweep_scanline(&mut sl));
        assert_eq!(sl.y(), 15);

        assert!(!ras.navigate_scanline(0));
        assert!(!ras.navigate_scanline(100));
    }

    #[test]
    fn test_auto_close_on_rewind() {
        let mut open: RasterizerScanlineAa = RasterizerScanlineAa::new();
        open.move_to_d(10.0, 10.0);
        open.line_to_d(20.0, 10.0);
        open.line_to_d(15.0, 20.0);

        let mut closed: RasterizerScanlineAa = RasterizerScanlineAa::new();
        closed.move_to_d(10.0, 10.0);
        closed.line_to_d(20.0, 10.0);
        closed.line_to_d(15.0, 20.0);
        closed.close_polygon();

        assert_eq!(sweep_all(&mut open), sweep_all(&mut closed));
    }

    #[test]
    fn test_auto_close_disabled_leaves_contour_open() {
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
        ras.auto_close(false);
        // The lone edge's cover never cancels, and nothing is emitted past
        // the last cell of a row
        ras.move_to_d(2.0, 0.0);
        ras.line_to_d(2.0, 1.0);
        ras.line_to_d(6.0, 1.0);
        let rows = sweep_all(&mut ras);
        assert_eq!(rows, Vec::new());
        assert_eq!(ras.outline().total_cells(), 1);
    }

    #[test]
    fn test_with_config() {
        let cfg = RasterizerConfig::new()
            .with_filling_rule(FillingRule::EvenOdd)
            .with_clip_box(0.0, 0.0, 3.0, 3.0)
            .with_cell_block_limit(4);
        let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::with_config(cfg).unwrap();
        assert_eq!(ras.filling_rule, FillingRule::EvenOdd);
        assert_eq!(ras.outline().cell_block_limit(), 4);
        rect(&mut ras, 1.0, 1.0, 10.0, 10.0);
        assert_eq!(ras.max_x(), 3);
        assert_eq!(ras.max_y(), 3);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let cfg = RasterizerConfig::new().with_cell_block_limit(0);
        assert!(RasterizerScanlineAa::<RasterizerSlClipInt>::with_config(cfg).is_err());
    }

    #[test]
    fn test_dbl_and_no_clip_agree_with_int() {
        let pts = [(1.25, 0.5), (9.75, 3.0), (4.5, 8.25)];

        let mut int: RasterizerScanlineAa = RasterizerScanlineAa::new();
        let mut dbl: RasterizerScanlineAa<RasterizerSlClipDbl> = RasterizerScanlineAa::new();
        let mut none: RasterizerScanlineAa<RasterizerSlNoClip> = RasterizerScanlineAa::new();
        int.add_path(&mut Polygon::new(&pts), 0);
        dbl.add_path(&mut Polygon::new(&pts), 0);
        none.add_path(&mut Polygon::new(&pts), 0);

        let rows = sweep_all(&mut int);
        assert!(!rows.is_empty());
        assert_eq!(rows, sweep_all(&mut dbl));
        assert_eq!(rows, sweep_all(&mut none));
    }
}
