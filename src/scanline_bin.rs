//! Binary scanline container (ScanlineBin).
//!
//! The simplest scanline type: no coverage data, each span just records X
//! and length. Any pixel the sweep emits, whatever its alpha, is "in". Used
//! for non-anti-aliased rendering, masks and hit regions.

use crate::rasterizer_scanline_aa::Scanline;

const NO_X: i32 = 0x7FFF_FFF0;

/// A horizontal span in a binary scanline (no coverage data).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinSpan {
    pub x: i32,
    pub len: i32,
}

impl BinSpan {
    /// One past the last x of the span.
    #[inline]
    pub fn end(&self) -> i32 {
        self.x + self.len
    }
}

/// Binary scanline container: on/off spans, adjacent runs merged.
pub struct ScanlineBin {
    min_x: i32,
    max_x: i32,
    last_x: i32,
    y_val: i32,
    spans: Vec<BinSpan>,
}

impl ScanlineBin {
    /// An empty container. Call `reset` to declare the x range before use.
    pub fn new() -> Self {
        Self {
            min_x: 0,
            max_x: -1,
            last_x: NO_X,
            y_val: 0,
            spans: Vec::new(),
        }
    }

    /// The spans of the current row, in ascending x.
    pub fn spans(&self) -> &[BinSpan] {
        &self.spans
    }

    fn push_run(&mut self, x: i32, len: u32) {
        let ok = x >= self.min_x && x as i64 + len as i64 - 1 <= self.max_x as i64;
        debug_assert!(
            ok,
            "span [{}, {}) outside scanline range [{}, {}]",
            x,
            x as i64 + len as i64,
            self.min_x,
            self.max_x
        );
        if !ok || len == 0 {
            return;
        }

        let n = self.spans.len();
        if x == self.last_x.wrapping_add(1) && n > 0 {
            self.spans[n - 1].len += len as i32;
        } else {
            self.spans.push(BinSpan {
                x,
                len: len as i32,
            });
        }
        self.last_x = x + (len as i32 - 1);
    }
}

impl Scanline for ScanlineBin {
    fn reset(&mut self, min_x: i32, max_x: i32) {
        self.min_x = min_x;
        self.max_x = max_x;
        self.reset_spans();
    }

    fn reset_spans(&mut self) {
        self.last_x = NO_X;
        self.spans.clear();
    }

    fn add_cell(&mut self, x: i32, _cover: u32) {
        self.push_run(x, 1);
    }

    fn add_span(&mut self, x: i32, len: u32, _cover: u32) {
        self.push_run(x, len);
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

impl Default for ScanlineBin {
    fn default() -> Self {
        Self::new()
    }
}
