//! Unpacked scanline container (ScanlineU8).
//!
//! Stores one coverage byte per pixel in a flat array indexed by
//! `x - min_x`, with spans referencing into it. Solid spans are expanded,
//! so every span exposes per-pixel coverage.

use crate::rasterizer_scanline_aa::{Scanline, Span, SpanCovers};

const NO_X: i32 = 0x7FFF_FFF0;

// ============================================================================
// ScanlineSpan — a horizontal run within a scanline
// ============================================================================

/// A horizontal span within an unpacked scanline. `cover_offset` indexes the
/// first of `len` cover bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanlineSpan {
    pub x: i32,
    pub len: i32,
    pub cover_offset: usize,
}

// ============================================================================
// ScanlineU8 — unpacked scanline with per-pixel coverage
// ============================================================================

/// Unpacked scanline container with per-pixel u8 coverage values.
///
/// Usage protocol:
/// 1. `reset(min_x, max_x)`: size the covers array for the x range
/// 2. `add_cell()` / `add_span()`: accumulate span data in ascending x
/// 3. `finalize(y)`: set the Y coordinate
/// 4. Iterate with `spans()` for rendering
/// 5. `reset_spans()`: prepare for the next scanline
pub struct ScanlineU8 {
    min_x: i32,
    max_x: i32,
    last_x: i32,
    y_val: i32,
    covers: Vec<u8>,
    spans: Vec<ScanlineSpan>,
}

impl ScanlineU8 {
    /// An empty container. Call `reset` to declare the x range before use.
    pub fn new() -> Self {
        Self {
            min_x: 0,
            max_x: -1,
            last_x: NO_X,
            y_val: 0,
            covers: Vec::new(),
            spans: Vec::new(),
        }
    }

    /// Raw spans, in ascending x.
    pub fn raw_spans(&self) -> &[ScanlineSpan] {
        &self.spans
    }

    /// The covers array, indexed by `x - min_x`.
    pub fn covers(&self) -> &[u8] {
        &self.covers
    }

    /// Iterate over the spans of the current row.
    pub fn spans(&self) -> impl Iterator<Item = Span<'_>> + '_ {
        self.spans.iter().map(move |s| {
            let end = s.cover_offset + s.len as usize;
            Span {
                x: s.x,
                len: s.len as u32,
                covers: SpanCovers::PerPixel(&self.covers[s.cover_offset..end]),
            }
        })
    }

    fn accepts(&self, x: i32, len: u32) -> bool {
        let ok = x >= self.min_x && x as i64 + len as i64 - 1 <= self.max_x as i64;
        debug_assert!(
            ok,
            "span [{}, {}) outside scanline range [{}, {}]",
            x,
            x as i64 + len as i64,
            self.min_x,
            self.max_x
        );
        ok
    }

    fn push_run(&mut self, x: i32, len: u32) {
        let offset = (x - self.min_x) as usize;
        let n = self.spans.len();
        if x == self.last_x.wrapping_add(1) && n > 0 {
            self.spans[n - 1].len += len as i32;
        } else {
            self.spans.push(ScanlineSpan {
                x,
                len: len as i32,
                cover_offset: offset,
            });
        }
        self.last_x = x + (len as i32 - 1);
    }
}

impl Scanline for ScanlineU8 {
    fn reset(&mut self, min_x: i32, max_x: i32) {
        let max_len = (max_x as i64 - min_x as i64 + 2).max(0) as usize;
        if max_len > self.covers.len() {
            self.covers.resize(max_len, 0);
        }
        self.min_x = min_x;
        self.max_x = max_x;
        self.reset_spans();
    }

    fn reset_spans(&mut self) {
        self.last_x = NO_X;
        self.spans.clear();
    }

    fn add_cell(&mut self, x: i32, cover: u32) {
        if !self.accepts(x, 1) {
            return;
        }
        self.covers[(x - self.min_x) as usize] = cover as u8;
        self.push_run(x, 1);
    }

    fn add_span(&mut self, x: i32, len: u32, cover: u32) {
        if len == 0 || !self.accepts(x, len) {
            return;
        }
        let start = (x - self.min_x) as usize;
        self.covers[start..start + len as usize].fill(cover as u8);
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

impl Default for ScanlineU8 {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
