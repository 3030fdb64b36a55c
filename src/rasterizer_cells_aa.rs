//! Anti-aliased cell rasterizer engine.
//!
//! Converts edges (line segments in 24.8 fixed-point coordinates) into
//! pixel cells carrying an exact coverage integral. This is the core
//! computational engine used by `RasterizerScanlineAa`.
//!
//! Every edge is split at each pixel-row boundary it crosses and, within a
//! row, at each pixel-column boundary. A sub-segment that stays inside one
//! cell and runs vertically by `delta` subpixels, entering at fractional x
//! `fx1` and leaving at `fx2`, contributes
//!
//! ```text
//! cover += delta
//! area  += delta * (2 * POLY_SUBPIXEL_SCALE - fx1 - fx2)
//! ```
//!
//! i.e. `area` is twice the signed trapezoid between the sub-segment and the
//! cell's right edge. The sweep turns the running cover of the cells to the
//! left plus this area into the pixel's alpha.

use log::{debug, trace, warn};

use crate::array::BlockVec;
use crate::basics::{RectI, POLY_SUBPIXEL_MASK, POLY_SUBPIXEL_SCALE, POLY_SUBPIXEL_SHIFT};

/// log2 of the number of cells per arena block.
pub const CELL_BLOCK_SHIFT: u32 = 12;
/// Number of cells per arena block.
pub const CELL_BLOCK_SIZE: usize = 1 << CELL_BLOCK_SHIFT;
/// Default maximum number of arena blocks (4M cells).
pub const CELL_BLOCK_LIMIT: usize = 1024;

/// Limit for dx magnitude before recursive subdivision in `line()`.
const DX_LIMIT: i64 = 16384 << POLY_SUBPIXEL_SHIFT;

const SCALE: i32 = POLY_SUBPIXEL_SCALE as i32;
const MASK: i32 = POLY_SUBPIXEL_MASK as i32;

/// Twice the signed area between a sub-segment and the right edge of its
/// cell, for a vertical run of `delta` entering at `fx1` and leaving at `fx2`.
#[inline]
fn trapezoid_area(fx1: i32, fx2: i32, delta: i32) -> i64 {
    (2 * SCALE - fx1 - fx2) as i64 * delta as i64
}

// ============================================================================
// RasterCell — the cell interface the accumulator is generic over
// ============================================================================

/// A pixel cell the accumulator can write into.
///
/// The style hooks let a cell type carry extra identity (for example fill
/// styles); two contributions only merge when both position and style match.
pub trait RasterCell: Copy + Default {
    /// Reset to the sentinel "no cell" state.
    fn initial(&mut self);

    /// Copy style information from `other`.
    fn style(&mut self, other: &Self);

    /// Returns `true` if this cell differs from position (ex, ey) or `style`.
    fn not_equal(&self, ex: i32, ey: i32, style: &Self) -> bool;

    /// Move to a new pixel, zeroing the accumulated coverage.
    fn move_to(&mut self, x: i32, y: i32);

    /// Add a cover/area contribution.
    fn accumulate(&mut self, cover: i32, area: i64);

    fn x(&self) -> i32;
    fn y(&self) -> i32;
    fn cover(&self) -> i32;
    fn area(&self) -> i64;

    #[inline]
    fn is_empty(&self) -> bool {
        self.cover() == 0 && self.area() == 0
    }
}

// ============================================================================
// CellAa — a single pixel cell with coverage data
// ============================================================================

/// A pixel cell storing accumulated coverage and area from edges.
///
/// - `cover`: net winding contribution (sum of dy across this cell)
/// - `area`: sum of doubled trapezoid areas, measured from the cell's
///   right edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAa {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i64,
}

impl Default for CellAa {
    fn default() -> Self {
        Self {
            x: i32::MAX,
            y: i32::MAX,
            cover: 0,
            area: 0,
        }
    }
}

impl RasterCell for CellAa {
    #[inline]
    fn initial(&mut self) {
        *self = Self::default();
    }

    #[inline]
    fn style(&mut self, _other: &Self) {}

    #[inline]
    fn not_equal(&self, ex: i32, ey: i32, _style: &Self) -> bool {
        (ex as u32).wrapping_sub(self.x as u32) | (ey as u32).wrapping_sub(self.y as u32) != 0
    }

    #[inline]
    fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.cover = 0;
        self.area = 0;
    }

    #[inline]
    fn accumulate(&mut self, cover: i32, area: i64) {
        self.cover += cover;
        self.area += area;
    }

    #[inline]
    fn x(&self) -> i32 {
        self.x
    }
    #[inline]
    fn y(&self) -> i32 {
        self.y
    }
    #[inline]
    fn cover(&self) -> i32 {
        self.cover
    }
    #[inline]
    fn area(&self) -> i64 {
        self.area
    }
}

// ============================================================================
// CellStyleAa — cell with left/right style indices
// ============================================================================

/// A pixel cell tagged with the styles on the left and right of the edges
/// that produced it, for layered (compound) rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyleAa {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i64,
    pub left: i16,
    pub right: i16,
}

impl CellStyleAa {
    /// A style-only cell, suitable for `RasterizerCellsAa::style`.
    pub fn with_styles(left: i16, right: i16) -> Self {
        Self {
            left,
            right,
            ..Self::default()
        }
    }
}

impl Default for CellStyleAa {
    fn default() -> Self {
        Self {
            x: i32::MAX,
            y: i32::MAX,
            cover: 0,
            area: 0,
            left: -1,
            right: -1,
        }
    }
}

impl RasterCell for CellStyleAa {
    #[inline]
    fn initial(&mut self) {
        *self = Self::default();
    }

    #[inline]
    fn style(&mut self, other: &Self) {
        self.left = other.left;
        self.right = other.right;
    }

    #[inline]
    fn not_equal(&self, ex: i32, ey: i32, style: &Self) -> bool {
        (ex as u32).wrapping_sub(self.x as u32)
            | (ey as u32).wrapping_sub(self.y as u32)
            | (self.left as u32).wrapping_sub(style.left as u32)
            | (self.right as u32).wrapping_sub(style.right as u32)
            != 0
    }

    #[inline]
    fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.cover = 0;
        self.area = 0;
    }

    #[inline]
    fn accumulate(&mut self, cover: i32, area: i64) {
        self.cover += cover;
        self.area += area;
    }

    #[inline]
    fn x(&self) -> i32 {
        self.x
    }
    #[inline]
    fn y(&self) -> i32 {
        self.y
    }
    #[inline]
    fn cover(&self) -> i32 {
        self.cover
    }
    #[inline]
    fn area(&self) -> i64 {
        self.area
    }
}

// ============================================================================
// SortedY — per-scanline index into the sorted cell array
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct SortedY {
    start: u32,
    num: u32,
}

// ============================================================================
// RasterizerCellsAa — the edge-to-cell conversion engine
// ============================================================================

/// Converts line segments (edges) into anti-aliased pixel cells.
///
/// Cells accumulate in a block arena (`BlockVec`) that is reused across
/// passes. `sort_cells()` copies them into one row-major buffer sorted by
/// y then x, and rows are then exposed as slices of that buffer.
pub struct RasterizerCellsAa<C: RasterCell = CellAa> {
    cells: BlockVec<C>,
    sorted_cells: Vec<C>,
    sorted_y: Vec<SortedY>,
    curr_cell: C,
    style_cell: C,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    sorted: bool,
    overflowed: bool,
}

impl<C: RasterCell> RasterizerCellsAa<C> {
    /// Create a new empty cell rasterizer with the default block limit.
    pub fn new() -> Self {
        Self::with_cell_block_limit(CELL_BLOCK_LIMIT)
    }

    /// Create a cell rasterizer that stores at most
    /// `limit * CELL_BLOCK_SIZE` cells per pass.
    pub fn with_cell_block_limit(limit: usize) -> Self {
        Self {
            cells: BlockVec::with_block_limit(CELL_BLOCK_SHIFT, limit),
            sorted_cells: Vec::new(),
            sorted_y: Vec::new(),
            curr_cell: C::default(),
            style_cell: C::default(),
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
            sorted: false,
            overflowed: false,
        }
    }

    /// Reset the rasterizer, discarding all cells. Arena blocks are kept.
    pub fn reset(&mut self) {
        trace!("cells reset: dropping {} cells", self.cells.len());
        self.cells.clear();
        self.sorted_cells.clear();
        self.sorted_y.clear();
        self.curr_cell.initial();
        self.style_cell.initial();
        self.min_x = i32::MAX;
        self.min_y = i32::MAX;
        self.max_x = i32::MIN;
        self.max_y = i32::MIN;
        self.sorted = false;
        self.overflowed = false;
    }

    /// Set the style carried by subsequently created cells.
    #[inline]
    pub fn style(&mut self, style_cell: &C) {
        self.style_cell.style(style_cell);
    }

    pub fn cell_block_limit(&self) -> usize {
        self.cells.block_limit()
    }

    pub fn set_cell_block_limit(&mut self, limit: usize) {
        self.cells.set_block_limit(limit);
    }

    #[inline]
    pub fn min_x(&self) -> i32 {
        self.min_x
    }
    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.max_x
    }
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Pixel bounds of every edge added since the last reset, or `None` if
    /// nothing was added.
    pub fn bounds(&self) -> Option<RectI> {
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return None;
        }
        Some(RectI::new(self.min_x, self.min_y, self.max_x, self.max_y))
    }

    /// Total number of accumulated cells.
    #[inline]
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Whether cells have been sorted.
    #[inline]
    pub fn sorted(&self) -> bool {
        self.sorted
    }

    /// Number of cells on scanline `y` (only valid after `sort_cells()`).
    #[inline]
    pub fn scanline_num_cells(&self, y: i32) -> usize {
        self.scanline_cells(y).len()
    }

    /// Cells of scanline `y`, sorted by x. Empty for rows without cells.
    ///
    /// Panics if the cells have not been sorted.
    pub fn scanline_cells(&self, y: i32) -> &[C] {
        assert!(self.sorted, "scanline cells queried before sort_cells()");
        let row = y as i64 - self.min_y as i64;
        if row < 0 {
            return &[];
        }
        match self.sorted_y.get(row as usize) {
            Some(sy) => &self.sorted_cells[sy.start as usize..(sy.start + sy.num) as usize],
            None => &[],
        }
    }

    /// The whole row-major sorted cell buffer (empty before sorting).
    #[inline]
    pub fn sorted_cells(&self) -> &[C] {
        &self.sorted_cells
    }

    /// Iterate over the accumulated cells in creation order.
    pub fn cells(&self) -> impl Iterator<Item = &C> + '_ {
        self.cells.iter()
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    /// Flush the current cell into the arena if it has non-zero data.
    #[inline]
    fn add_curr_cell(&mut self) {
        if !self.curr_cell.is_empty() && !self.cells.push(self.curr_cell) && !self.overflowed {
            self.overflowed = true;
            warn!(
                "cell arena limit of {} blocks reached; further cells are dropped",
                self.cells.block_limit()
            );
        }
    }

    /// Move to a new cell position, flushing the previous cell if needed.
    #[inline]
    fn set_curr_cell(&mut self, x: i32, y: i32) {
        if self.curr_cell.not_equal(x, y, &self.style_cell) {
            self.add_curr_cell();
            self.curr_cell.style(&self.style_cell);
            self.curr_cell.move_to(x, y);
        }
    }

    /// Render a segment that stays within scanline row `ey`.
    ///
    /// `x1`, `x2` are in 24.8 fixed-point; `y1`, `y2` are fractional y within
    /// the row (0..=POLY_SUBPIXEL_SCALE).
    fn render_hline(&mut self, ey: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let fx1 = x1 & MASK;
        let fx2 = x2 & MASK;

        // Horizontal: no coverage, just move to the target cell
        if y1 == y2 {
            self.set_curr_cell(ex2, ey);
            return;
        }

        // Everything in a single cell
        if ex1 == ex2 {
            let delta = y2 - y1;
            self.curr_cell.accumulate(delta, trapezoid_area(fx1, fx2, delta));
            return;
        }

        // Run of adjacent cells on the same row
        let mut p = (SCALE - fx1) as i64 * (y2 - y1) as i64;
        let mut first = SCALE;
        let mut incr = 1_i32;
        let mut dx = x2 as i64 - x1 as i64;

        if dx < 0 {
            p = fx1 as i64 * (y2 - y1) as i64;
            first = 0;
            incr = -1;
            dx = -dx;
        }

        let mut delta = (p / dx) as i32;
        let mut modulo = p % dx;
        if modulo < 0 {
            delta -= 1;
            modulo += dx;
        }

        self.curr_cell.accumulate(delta, trapezoid_area(fx1, first, delta));

        let mut ex1 = ex1 + incr;
        self.set_curr_cell(ex1, ey);
        let mut y1 = y1 + delta;

        if ex1 != ex2 {
            p = SCALE as i64 * (y2 - y1 + delta) as i64;
            let mut lift = (p / dx) as i32;
            let mut rem = p % dx;
            if rem < 0 {
                lift -= 1;
                rem += dx;
            }
            modulo -= dx;

            while ex1 != ex2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dx;
                    delta += 1;
                }
                self.curr_cell.accumulate(delta, trapezoid_area(0, SCALE, delta));
                y1 += delta;
                ex1 += incr;
                self.set_curr_cell(ex1, ey);
            }
        }

        delta = y2 - y1;
        self.curr_cell
            .accumulate(delta, trapezoid_area(SCALE - first, fx2, delta));
    }

    #[inline]
    fn extend_bounds(&mut self, ex: i32, ey: i32) {
        self.min_x = self.min_x.min(ex);
        self.max_x = self.max_x.max(ex);
        self.min_y = self.min_y.min(ey);
        self.max_y = self.max_y.max(ey);
    }

    // ========================================================================
    // Edge accumulation
    // ========================================================================

    /// Add a line segment in 24.8 fixed-point coordinates.
    ///
    /// Panics if the cells are already sorted; `reset()` starts a new pass.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        assert!(
            !self.sorted,
            "edge added after sort_cells() without an intervening reset()"
        );

        let dx = x2 as i64 - x1 as i64;
        if dx >= DX_LIMIT || dx <= -DX_LIMIT {
            let cx = ((x1 as i64 + x2 as i64) >> 1) as i32;
            let cy = ((y1 as i64 + y2 as i64) >> 1) as i32;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }

        let dy = y2 as i64 - y1 as i64;
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let mut ey1 = y1 >> POLY_SUBPIXEL_SHIFT;
        let ey2 = y2 >> POLY_SUBPIXEL_SHIFT;
        let fy1 = y1 & MASK;
        let fy2 = y2 & MASK;

        self.extend_bounds(ex1, ey1);
        self.extend_bounds(ex2, ey2);

        self.set_curr_cell(ex1, ey1);

        // Everything on a single row
        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        // Vertical line: one cell per row, same fractional x throughout
        let mut incr = 1_i32;
        if dx == 0 {
            let ex = x1 >> POLY_SUBPIXEL_SHIFT;
            let fx = x1 & MASK;

            let mut first = SCALE;
            if dy < 0 {
                first = 0;
                incr = -1;
            }

            let mut delta = first - fy1;
            self.curr_cell.accumulate(delta, trapezoid_area(fx, fx, delta));

            ey1 += incr;
            self.set_curr_cell(ex, ey1);

            delta = first + first - SCALE;
            let area = trapezoid_area(fx, fx, delta);
            while ey1 != ey2 {
                self.curr_cell.accumulate(delta, area);
                ey1 += incr;
                self.set_curr_cell(ex, ey1);
            }
            delta = fy2 - SCALE + first;
            self.curr_cell.accumulate(delta, trapezoid_area(fx, fx, delta));
            return;
        }

        // General case: several rows
        let mut p = (SCALE as i64 - fy1 as i64) * dx;
        let mut first = SCALE;
        let mut dy_abs = dy;

        if dy < 0 {
            p = fy1 as i64 * dx;
            first = 0;
            incr = -1;
            dy_abs = -dy;
        }

        let mut delta = (p / dy_abs) as i32;
        let mut modulo = p % dy_abs;
        if modulo < 0 {
            delta -= 1;
            modulo += dy_abs;
        }

        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);

        ey1 += incr;
        self.set_curr_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey1);

        if ey1 != ey2 {
            p = SCALE as i64 * dx;
            let mut lift = (p / dy_abs) as i32;
            let mut rem = p % dy_abs;
            if rem < 0 {
                lift -= 1;
                rem += dy_abs;
            }
            modulo -= dy_abs;

            while ey1 != ey2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dy_abs;
                    delta += 1;
                }

                let x_to = x_from + delta;
                self.render_hline(ey1, x_from, SCALE - first, x_to, first);
                x_from = x_to;

                ey1 += incr;
                self.set_curr_cell(x_from >> POLY_SUBPIXEL_SHIFT, ey1);
            }
        }
        self.render_hline(ey1, x_from, SCALE - first, x2, fy2);
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    /// Sort all accumulated cells by Y then X.
    ///
    /// After sorting, rows can be queried via `scanline_cells()`. Calling it
    /// again without adding edges is a no-op.
    pub fn sort_cells(&mut self) {
        if self.sorted {
            return;
        }

        self.add_curr_cell();
        self.curr_cell.initial();
        self.sorted = true;

        let num_cells = self.cells.len();
        if num_cells == 0 {
            return;
        }

        // Y-histogram, then convert counts to starting offsets
        let num_rows = (self.max_y as i64 - self.min_y as i64 + 1) as usize;
        self.sorted_y.clear();
        self.sorted_y.resize(num_rows, SortedY::default());
        for cell in self.cells.iter() {
            self.sorted_y[(cell.y() - self.min_y) as usize].start += 1;
        }

        let mut start = 0u32;
        for sy in &mut self.sorted_y {
            let count = sy.start;
            sy.start = start;
            start += count;
        }

        // Scatter cells into their rows
        self.sorted_cells.clear();
        self.sorted_cells.resize(num_cells, C::default());
        for cell in self.cells.iter() {
            let sy = &mut self.sorted_y[(cell.y() - self.min_y) as usize];
            self.sorted_cells[(sy.start + sy.num) as usize] = *cell;
            sy.num += 1;
        }

        // Sort each row by X
        for sy in &self.sorted_y {
            if sy.num > 1 {
                let row = &mut self.sorted_cells[sy.start as usize..(sy.start + sy.num) as usize];
                row.sort_unstable_by_key(|c| c.x());
            }
        }

        debug!(
            "sorted {} cells into rows {}..={}",
            num_cells, self.min_y, self.max_y
        );
    }
}

impl<C: RasterCell> Default for RasterizerCellsAa<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
