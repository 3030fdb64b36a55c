//! # agg-raster
//!
//! The anti-aliased scanline rasterization core of an AGG-style 2D
//! rendering pipeline: polygon outlines go in, per-row coverage spans come
//! out.
//!
//! - Exact per-cell area integration in 24.8 fixed-point
//! - Non-zero and even-odd filling rules
//! - Optional gamma remapping of the final alpha
//! - Clipping against a box, in integer or double precision
//! - Packed, unpacked and binary scanline containers
//!
//! ## Architecture
//!
//! 1. **Clipper** (`rasterizer_sl_clip`): converts and clips edges
//! 2. **Cell accumulator** (`rasterizer_cells_aa`): turns edges into cells
//!    carrying cover and area
//! 3. **Sweep engine** (`rasterizer_scanline_aa`): sorts the cells and
//!    converts each row into alpha spans
//! 4. **Scanline container** (`scanline_p`, `scanline_u`, `scanline_bin`):
//!    holds one row of spans for a downstream renderer
//!
//! ```
//! use agg_raster::rasterizer_scanline_aa::{RasterizerScanlineAa, Scanline};
//! use agg_raster::scanline_p::ScanlineP8;
//!
//! let mut ras: RasterizerScanlineAa = RasterizerScanlineAa::new();
//! ras.move_to_d(2.0, 2.0);
//! ras.line_to_d(5.0, 2.0);
//! ras.line_to_d(5.0, 4.0);
//! ras.line_to_d(2.0, 4.0);
//! ras.close_polygon();
//!
//! let mut sl = ScanlineP8::new();
//! if ras.rewind_scanlines() {
//!     sl.reset(ras.min_x(), ras.max_x());
//!     while ras.sweep_scanline(&mut sl) {
//!         for span in sl.spans() {
//!             assert_eq!((span.x, span.len, span.cover(0)), (2, 3, 255));
//!         }
//!     }
//! }
//! ```

// Foundation types
pub mod array;
pub mod basics;
pub mod config;
pub mod error;
pub mod gamma;

// Scanline rasterizer
pub mod clip_liang_barsky;
pub mod rasterizer_cells_aa;
pub mod rasterizer_scanline_aa;
pub mod rasterizer_sl_clip;

// Scanline containers
pub mod scanline_bin;
pub mod scanline_p;
pub mod scanline_u;

pub use error::{RasterError, Result};
