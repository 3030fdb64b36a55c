//! Coordinate conversion and clipping policies for the scanline rasterizer.
//!
//! A clipping policy receives `move_to`/`line_to` in its own coordinate
//! type, optionally clips each segment against a clip box, converts the
//! surviving pieces to 24.8 fixed-point and forwards them to the cell
//! accumulator. The numeric behavior is factored into a `RasConv`:
//!
//! - `RasConvInt`: round to 24.8 up front, clip in integers (default)
//! - `RasConvIntSat`: like `RasConvInt`, also saturating clip intersections
//! - `RasConvInt3x`: integer, with x tripled for LCD subpixel output
//! - `RasConvDbl`: clip in `f64`, round to 24.8 only when emitting
//! - `RasConvDbl3x`: double precision with x tripled
//!
//! Every policy saturates its input to `±POLY_MAX_COORD` subpixels, so the
//! differences taken while clipping always fit in an `i32`. Coordinates in
//! range convert exactly the same way under every policy.
//!
//! Policies are type parameters of `RasterizerScanlineAa`, so the choice is
//! fixed for the rasterizer's lifetime.

use core::ops::{Add, Sub};

use crate::basics::{iround, saturation_iround, Rect, POLY_MAX_COORD, POLY_SUBPIXEL_SCALE};
use crate::clip_liang_barsky::{
    clipping_flags, clipping_flags_y, CLIPPING_FLAGS_X_CLIPPED, CLIPPING_FLAGS_Y1_CLIPPED,
    CLIPPING_FLAGS_Y2_CLIPPED, CLIPPING_FLAGS_Y_CLIPPED,
};
use crate::rasterizer_cells_aa::{RasterCell, RasterizerCellsAa};

const SCALE_F: f64 = POLY_SUBPIXEL_SCALE as f64;

// ============================================================================
// RasConv — numeric conversion policy
// ============================================================================

/// Numeric policy: the coordinate type clipping happens in, and how it maps
/// to and from 24.8 fixed-point.
pub trait RasConv {
    type Coord: Copy + Default + PartialOrd + Add<Output = Self::Coord> + Sub<Output = Self::Coord>;

    /// `a * b / c`, used to intersect an edge with a clip boundary.
    fn mul_div(a: Self::Coord, b: Self::Coord, c: Self::Coord) -> Self::Coord;

    /// Final 24.8 x coordinate handed to the accumulator.
    fn xi(v: Self::Coord) -> i32;

    /// Final 24.8 y coordinate handed to the accumulator.
    fn yi(v: Self::Coord) -> i32;

    /// Convert a user-space (pixel unit) value to the clipping coordinate.
    fn upscale(v: f64) -> Self::Coord;

    /// Convert a 24.8 fixed-point value to the clipping coordinate.
    fn downscale(v: i32) -> Self::Coord;
}

/// Clamp a 24.8 value to the range every policy clips in.
#[inline]
fn saturate(v: i64) -> i32 {
    v.clamp(-(POLY_MAX_COORD as i64), POLY_MAX_COORD as i64) as i32
}

/// Integer clipping on pre-rounded 24.8 coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasConvInt;

impl RasConv for RasConvInt {
    type Coord = i32;

    #[inline]
    fn mul_div(a: i32, b: i32, c: i32) -> i32 {
        iround(a as f64 * b as f64 / c as f64)
    }
    #[inline]
    fn xi(v: i32) -> i32 {
        v
    }
    #[inline]
    fn yi(v: i32) -> i32 {
        v
    }
    #[inline]
    fn upscale(v: f64) -> i32 {
        saturation_iround(POLY_MAX_COORD, v * SCALE_F)
    }
    #[inline]
    fn downscale(v: i32) -> i32 {
        saturate(v as i64)
    }
}

/// Integer clipping with saturation to `±POLY_MAX_COORD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasConvIntSat;

impl RasConv for RasConvIntSat {
    type Coord = i32;

    #[inline]
    fn mul_div(a: i32, b: i32, c: i32) -> i32 {
        saturation_iround(POLY_MAX_COORD, a as f64 * b as f64 / c as f64)
    }
    #[inline]
    fn xi(v: i32) -> i32 {
        v
    }
    #[inline]
    fn yi(v: i32) -> i32 {
        v
    }
    #[inline]
    fn upscale(v: f64) -> i32 {
        saturation_iround(POLY_MAX_COORD, v * SCALE_F)
    }
    #[inline]
    fn downscale(v: i32) -> i32 {
        saturate(v as i64)
    }
}

/// Integer clipping with horizontal resolution tripled on output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasConvInt3x;

impl RasConv for RasConvInt3x {
    type Coord = i32;

    #[inline]
    fn mul_div(a: i32, b: i32, c: i32) -> i32 {
        iround(a as f64 * b as f64 / c as f64)
    }
    #[inline]
    fn xi(v: i32) -> i32 {
        saturate(v as i64 * 3)
    }
    #[inline]
    fn yi(v: i32) -> i32 {
        v
    }
    #[inline]
    fn upscale(v: f64) -> i32 {
        saturation_iround(POLY_MAX_COORD, v * SCALE_F)
    }
    #[inline]
    fn downscale(v: i32) -> i32 {
        saturate(v as i64)
    }
}

/// Double-precision clipping, rounded to 24.8 only on output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasConvDbl;

impl RasConv for RasConvDbl {
    type Coord = f64;

    #[inline]
    fn mul_div(a: f64, b: f64, c: f64) -> f64 {
        a * b / c
    }
    #[inline]
    fn xi(v: f64) -> i32 {
        saturation_iround(POLY_MAX_COORD, v * SCALE_F)
    }
    #[inline]
    fn yi(v: f64) -> i32 {
        saturation_iround(POLY_MAX_COORD, v * SCALE_F)
    }
    #[inline]
    fn upscale(v: f64) -> f64 {
        v
    }
    #[inline]
    fn downscale(v: i32) -> f64 {
        v as f64 / SCALE_F
    }
}

/// Double-precision clipping with horizontal resolution tripled on output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasConvDbl3x;

impl RasConv for RasConvDbl3x {
    type Coord = f64;

    #[inline]
    fn mul_div(a: f64, b: f64, c: f64) -> f64 {
        a * b / c
    }
    #[inline]
    fn xi(v: f64) -> i32 {
        saturation_iround(POLY_MAX_COORD, v * SCALE_F * 3.0)
    }
    #[inline]
    fn yi(v: f64) -> i32 {
        saturation_iround(POLY_MAX_COORD, v * SCALE_F)
    }
    #[inline]
    fn upscale(v: f64) -> f64 {
        v
    }
    #[inline]
    fn downscale(v: i32) -> f64 {
        v as f64 / SCALE_F
    }
}

// ============================================================================
// RasterizerClip — the clipping policy interface
// ============================================================================

/// Coordinate type of a clipping policy.
pub type ClipCoord<Clip> = <<Clip as RasterizerClip>::Conv as RasConv>::Coord;

/// Feeds segments into a cell accumulator, clipping them on the way.
pub trait RasterizerClip: Default {
    type Conv: RasConv;

    /// Disable clipping.
    fn reset_clipping(&mut self);

    /// Set the clip box, in the policy's coordinate type.
    fn clip_box(&mut self, x1: ClipCoord<Self>, y1: ClipCoord<Self>, x2: ClipCoord<Self>, y2: ClipCoord<Self>);

    /// Start a new sub-path at (x1, y1).
    fn move_to(&mut self, x1: ClipCoord<Self>, y1: ClipCoord<Self>);

    /// Emit the segment from the previous point to (x2, y2).
    fn line_to<C: RasterCell>(&mut self, ras: &mut RasterizerCellsAa<C>, x2: ClipCoord<Self>, y2: ClipCoord<Self>);
}

/// Forward a converted segment, dropping it if it collapsed to a point.
#[inline]
fn emit<C: RasterCell>(ras: &mut RasterizerCellsAa<C>, x1: i32, y1: i32, x2: i32, y2: i32) {
    if x1 != x2 || y1 != y2 {
        ras.line(x1, y1, x2, y2);
    }
}

// ============================================================================
// RasterizerSlClip — clipping against a box
// ============================================================================

/// Clips segments against a box, then converts them with `Conv`.
///
/// Parts of an edge left or right of the box are not discarded: they are
/// projected onto the nearest vertical boundary, which keeps the winding
/// of every row intact. Parts above or below the box are dropped.
pub struct RasterizerSlClip<Conv: RasConv> {
    clip_box: Rect<Conv::Coord>,
    x1: Conv::Coord,
    y1: Conv::Coord,
    f1: u32,
    clipping: bool,
}

/// Integer clipping (the default policy).
pub type RasterizerSlClipInt = RasterizerSlClip<RasConvInt>;
/// Integer clipping with saturation of out-of-range coordinates.
pub type RasterizerSlClipIntSat = RasterizerSlClip<RasConvIntSat>;
/// Integer clipping for 3x horizontal (LCD) resolution.
pub type RasterizerSlClipInt3x = RasterizerSlClip<RasConvInt3x>;
/// Double-precision clipping.
pub type RasterizerSlClipDbl = RasterizerSlClip<RasConvDbl>;
/// Double-precision clipping for 3x horizontal (LCD) resolution.
pub type RasterizerSlClipDbl3x = RasterizerSlClip<RasConvDbl3x>;

impl<Conv: RasConv> RasterizerSlClip<Conv> {
    pub fn new() -> Self {
        let zero = Conv::Coord::default();
        Self {
            clip_box: Rect::new(zero, zero, zero, zero),
            x1: zero,
            y1: zero,
            f1: 0,
            clipping: false,
        }
    }

    /// Whether a clip box is active.
    pub fn clipping(&self) -> bool {
        self.clipping
    }

    /// Clip a segment in Y and emit it to the accumulator.
    #[allow(clippy::too_many_arguments)]
    fn line_clip_y<C: RasterCell>(
        &self,
        ras: &mut RasterizerCellsAa<C>,
        x1: Conv::Coord,
        y1: Conv::Coord,
        x2: Conv::Coord,
        y2: Conv::Coord,
        f1: u32,
        f2: u32,
    ) {
        let f1 = f1 & CLIPPING_FLAGS_Y_CLIPPED;
        let f2 = f2 & CLIPPING_FLAGS_Y_CLIPPED;

        if (f1 | f2) == 0 {
            // Fully visible
            emit(ras, Conv::xi(x1), Conv::yi(y1), Conv::xi(x2), Conv::yi(y2));
        } else if f1 != f2 {
            // Partially visible: move the invisible end(s) onto y1/y2
            let cb = &self.clip_box;
            let (mut tx1, mut ty1, mut tx2, mut ty2) = (x1, y1, x2, y2);

            if f1 & CLIPPING_FLAGS_Y1_CLIPPED != 0 {
                // y1 < clip.y1
                tx1 = x1 + Conv::mul_div(cb.y1 - y1, x2 - x1, y2 - y1);
                ty1 = cb.y1;
            }
            if f1 & CLIPPING_FLAGS_Y2_CLIPPED != 0 {
                // y1 > clip.y2
                tx1 = x1 + Conv::mul_div(cb.y2 - y1, x2 - x1, y2 - y1);
                ty1 = cb.y2;
            }
            if f2 & CLIPPING_FLAGS_Y1_CLIPPED != 0 {
                // y2 < clip.y1
                tx2 = x1 + Conv::mul_div(cb.y1 - y1, x2 - x1, y2 - y1);
                ty2 = cb.y1;
            }
            if f2 & CLIPPING_FLAGS_Y2_CLIPPED != 0 {
                // y2 > clip.y2
                tx2 = x1 + Conv::mul_div(cb.y2 - y1, x2 - x1, y2 - y1);
                ty2 = cb.y2;
            }

            emit(ras, Conv::xi(tx1), Conv::yi(ty1), Conv::xi(tx2), Conv::yi(ty2));
        }
        // else: both invisible by Y on the same side
    }
}

impl<Conv: RasConv> Default for RasterizerSlClip<Conv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Conv: RasConv> RasterizerClip for RasterizerSlClip<Conv> {
    type Conv = Conv;

    fn reset_clipping(&mut self) {
        self.clipping = false;
    }

    fn clip_box(&mut self, x1: Conv::Coord, y1: Conv::Coord, x2: Conv::Coord, y2: Conv::Coord) {
        self.clip_box = Rect::new(x1, y1, x2, y2);
        self.clip_box.normalize();
        self.clipping = true;
    }

    fn move_to(&mut self, x1: Conv::Coord, y1: Conv::Coord) {
        self.x1 = x1;
        self.y1 = y1;
        if self.clipping {
            self.f1 = clipping_flags(x1, y1, &self.clip_box);
        }
    }

    fn line_to<C: RasterCell>(&mut self, ras: &mut RasterizerCellsAa<C>, x2: Conv::Coord, y2: Conv::Coord) {
        if !self.clipping {
            emit(ras, Conv::xi(self.x1), Conv::yi(self.y1), Conv::xi(x2), Conv::yi(y2));
            self.x1 = x2;
            self.y1 = y2;
            return;
        }

        let f2 = clipping_flags(x2, y2, &self.clip_box);

        // Both endpoints invisible by Y on the same side
        let fy1 = self.f1 & CLIPPING_FLAGS_Y_CLIPPED;
        if fy1 == f2 & CLIPPING_FLAGS_Y_CLIPPED && fy1 != 0 {
            self.x1 = x2;
            self.y1 = y2;
            self.f1 = f2;
            return;
        }

        let (x1, y1, f1) = (self.x1, self.y1, self.f1);
        let cb_x1 = self.clip_box.x1;
        let cb_x2 = self.clip_box.x2;
        let y_at = |bx: Conv::Coord| y1 + Conv::mul_div(bx - x1, y2 - y1, x2 - x1);
        let flags_y = |y: Conv::Coord| clipping_flags_y(y, &self.clip_box);

        // Case index: bits 3..2 are x1's X flags, bits 1..0 are x2's
        match ((f1 & CLIPPING_FLAGS_X_CLIPPED) << 1) | (f2 & CLIPPING_FLAGS_X_CLIPPED) {
            0 => {
                // Visible by X
                self.line_clip_y(ras, x1, y1, x2, y2, f1, f2);
            }
            1 => {
                // x2 > clip.x2
                let y3 = y_at(cb_x2);
                let f3 = flags_y(y3);
                self.line_clip_y(ras, x1, y1, cb_x2, y3, f1, f3);
                self.line_clip_y(ras, cb_x2, y3, cb_x2, y2, f3, f2);
            }
            2 => {
                // x1 > clip.x2
                let y3 = y_at(cb_x2);
                let f3 = flags_y(y3);
                self.line_clip_y(ras, cb_x2, y1, cb_x2, y3, f1, f3);
                self.line_clip_y(ras, cb_x2, y3, x2, y2, f3, f2);
            }
            3 => {
                // x1 > clip.x2 && x2 > clip.x2
                self.line_clip_y(ras, cb_x2, y1, cb_x2, y2, f1, f2);
            }
            4 => {
                // x2 < clip.x1
                let y3 = y_at(cb_x1);
                let f3 = flags_y(y3);
                self.line_clip_y(ras, x1, y1, cb_x1, y3, f1, f3);
                self.line_clip_y(ras, cb_x1, y3, cb_x1, y2, f3, f2);
            }
            6 => {
                // x1 > clip.x2 && x2 < clip.x1
                let y3 = y_at(cb_x2);
                let y4 = y_at(cb_x1);
                let f3 = flags_y(y3);
                let f4 = flags_y(y4);
                self.line_clip_y(ras, cb_x2, y1, cb_x2, y3, f1, f3);
                self.line_clip_y(ras, cb_x2, y3, cb_x1, y4, f3, f4);
                self.line_clip_y(ras, cb_x1, y4, cb_x1, y2, f4, f2);
            }
            8 => {
                // x1 < clip.x1
                let y3 = y_at(cb_x1);
                let f3 = flags_y(y3);
                self.line_clip_y(ras, cb_x1, y1, cb_x1, y3, f1, f3);
                self.line_clip_y(ras, cb_x1, y3, x2, y2, f3, f2);
            }
            9 => {
                // x1 < clip.x1 && x2 > clip.x2
                let y3 = y_at(cb_x1);
                let y4 = y_at(cb_x2);
                let f3 = flags_y(y3);
                let f4 = flags_y(y4);
                self.line_clip_y(ras, cb_x1, y1, cb_x1, y3, f1, f3);
                self.line_clip_y(ras, cb_x1, y3, cb_x2, y4, f3, f4);
                self.line_clip_y(ras, cb_x2, y4, cb_x2, y2, f4, f2);
            }
            12 => {
                // x1 < clip.x1 && x2 < clip.x1
                self.line_clip_y(ras, cb_x1, y1, cb_x1, y2, f1, f2);
            }
            _ => {
                // 5, 7, 10, 11: x flags are mutually exclusive per point
            }
        }
        self.f1 = f2;
        self.x1 = x2;
        self.y1 = y2;
    }
}

// ============================================================================
// RasterizerSlNoClip — passthrough (no clipping)
// ============================================================================

/// Policy that never clips: integer 24.8 coordinates go straight to the
/// accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterizerSlNoClip {
    x1: i32,
    y1: i32,
}

impl RasterizerSlNoClip {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RasterizerClip for RasterizerSlNoClip {
    type Conv = RasConvInt;

    fn reset_clipping(&mut self) {}

    fn clip_box(&mut self, _x1: i32, _y1: i32, _x2: i32, _y2: i32) {}

    fn move_to(&mut self, x1: i32, y1: i32) {
        self.x1 = x1;
        self.y1 = y1;
    }

    fn line_to<C: RasterCell>(&mut self, ras: &mut RasterizerCellsAa<C>, x2: i32, y2: i32) {
        emit(ras, self.x1, self.y1, x2, y2);
        self.x1 = x2;
        self.y1 = y2;
    }
}

// ============================================================================
// Public helpers
// ============================================================================

/// Upscale a pixel-unit coordinate to 24.8 fixed-point.
pub fn poly_coord(v: f64) -> i32 {
    RasConvInt::upscale(v)
}

// ============================================================================
// Tests
// ============================================================================
