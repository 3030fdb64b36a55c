//! Packed scanline container (ScanlineP8).
//!
//! Stores coverage in a packed form: runs of distinct per-pixel values keep
//! one byte per pixel, while solid runs (uniform coverage) keep a single
//! byte, so large filled areas cost one span regardless of width.

use crate::rasterizer_scanline_aa::{Scanline, Span, SpanCovers};

const NO_X: i32 = 0x7FFF_FFF0;

// ============================================================================
// PackedSpan — a span in a packed scanline
// ============================================================================

/// A span in a packed scanline.
///
/// - `len > 0`: per-pixel covers, `cover_offset` indexes into the covers
///   array for `len` values
/// - `len < 0`: solid span of `-len` pixels, all with the single cover value
///   at `cover_offset`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackedSpan {
    pub x: i32,
    pub len: i32,
    pub cover_offset: usize,
}

// ============================================================================
// ScanlineP8 — packed scanline with RLE for solid spans
// ============================================================================

/// Packed scanline container with run-length encoding of solid spans.
///
/// Adjacent solid spans with the same coverage are merged, and adjacent
/// single cells are merged into one per-pixel span.
pub struct ScanlineP8 {
    min_x: i32,
    max_x: i32,
    last_x: i32,
    y_val: i32,
    covers: Vec<u8>,
    spans: Vec<PackedSpan>,
}

impl ScanlineP8 {
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

    /// Raw packed spans, in ascending x.
    pub fn packed_spans(&self) -> &[PackedSpan] {
        &self.spans
    }

    /// The covers array the packed spans index into.
    pub fn covers(&self) -> &[u8] {
        &self.covers
    }

    /// Iterate over the spans of the current row.
    pub fn spans(&self) -> impl Iterator<Item = Span<'_>> + '_ {
        self.spans.iter().map(move |s| {
            if s.len < 0 {
                Span {
                    x: s.x,
                    len: s.len.unsigned_abs(),
                    covers: SpanCovers::Solid(self.covers[s.cover_offset]),
                }
            } else {
                let end = s.cover_offset + s.len as usize;
                Span {
                    x: s.x,
                    len: s.len as u32,
                    covers: SpanCovers::PerPixel(&self.covers[s.cover_offset..end]),
                }
            }
        })
    }

    /// Whether `[x, x + len)` lies inside the declared range.
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
}

impl Scanline for ScanlineP8 {
    fn reset(&mut self, min_x: i32, max_x: i32) {
        self.min_x = min_x;
        self.max_x = max_x;
        self.reset_spans();
    }

    fn reset_spans(&mut self) {
        self.last_x = NO_X;
        self.covers.clear();
        self.spans.clear();
    }

    fn add_cell(&mut self, x: i32, cover: u32) {
        if !self.accepts(x, 1) {
            return;
        }
        let n = self.spans.len();
        if x == self.last_x.wrapping_add(1) && n > 0 && self.spans[n - 1].len > 0 {
            self.spans[n - 1].len += 1;
        } else {
            self.spans.push(PackedSpan {
                x,
                len: 1,
                cover_offset: self.covers.len(),
            });
        }
        self.covers.push(cover as u8);
        self.last_x = x;
    }

    fn add_span(&mut self, x: i32, len: u32, cover: u32) {
        if len == 0 || !self.accepts(x, len) {
            return;
        }
        let cover = cover as u8;
        let n = self.spans.len();
        if x == self.last_x.wrapping_add(1)
            && n > 0
            && self.spans[n - 1].len < 0
            && self.covers[self.spans[n - 1].cover_offset] == cover
        {
            // Extend the existing solid span
            self.spans[n - 1].len -= len as i32;
        } else {
            self.spans.push(PackedSpan {
                x,
                len: -(len as i32),
                cover_offset: self.covers.len(),
            });
            self.covers.push(cover);
        }
        self.last_x = x + (len as i32 - 1);
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

impl Default for ScanlineP8 {
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

    fn scanline() -> ScanlineP8 {
        let mut sl = ScanlineP8::new();
        sl.reset(0, 100);
        sl
    }

    #[test]
    fn test_new() {
        let sl = ScanlineP8::new();
        assert_eq!(sl.num_spans(), 0);
        assert_eq!(sl.spans().count(), 0);
    }

    #[test]
    fn test_add_cell() {
        let mut sl = scanline();
        sl.add_cell(10, 128);
        assert_eq!(sl.num_spans(), 1);
        let spans = sl.packed_spans();
        assert_eq!(spans[0].x, 10);
        assert_eq!(spans[0].len, 1); // positive = per-pixel
        assert_eq!(sl.covers()[spans[0].cover_offset], 128);
    }

    #[test]
    fn test_adjacent_cells_form_per_pixel_span() {
        let mut sl = scanline();
        sl.add_cell(10, 100);
        sl.add_cell(11, 200);
        sl.add_cell(12, 150);
        assert_eq!(sl.num_spans(), 1);
        let span = sl.spans().next().unwrap();
        assert_eq!(span.x, 10);
        assert_eq!(span.len, 3);
        assert_eq!(span.covers, SpanCovers::PerPixel(&[100, 200, 150]));
        assert_eq!(span.cover(1), 200);
    }

    #[test]
    fn test_add_span_creates_solid_span() {
        let mut sl = scanline();
        sl.add_span(5, 10, 255);
        assert_eq!(sl.num_spans(), 1);
        assert_eq!(sl.packed_spans()[0].len, -10); // negative = solid span
        let span = sl.spans().next().unwrap();
        assert_eq!(span.x, 5);
        assert_eq!(span.len, 10);
        assert_eq!(span.end(), 15);
        assert_eq!(span.covers, SpanCovers::Solid(255));
        assert_eq!(span.cover(7), 255);
    }

    #[test]
    fn test_adjacent_solid_spans_merge() {
        let mut sl = scanline();
        sl.add_span(5, 10, 255);
        sl.add_span(15, 5, 255); // adjacent, same cover → merge
        assert_eq!(sl.num_spans(), 1);
        assert_eq!(sl.packed_spans()[0].len, -15);
    }

    #[test]
    fn test_adjacent_solid_spans_different_cover_no_merge() {
        let mut sl = scanline();
        sl.add_span(5, 10, 255);
        sl.add_span(15, 5, 128);
        assert_eq!(sl.num_spans(), 2);
    }

    #[test]
    fn test_gap_prevents_merge() {
        let mut sl = scanline();
        sl.add_span(5, 2, 255);
        sl.add_span(8, 2, 255);
        assert_eq!(sl.num_spans(), 2);
    }

    #[test]
    fn test_cell_after_solid_span_new_span() {
        let mut sl = scanline();
        sl.add_span(5, 3, 200);
        sl.add_cell(8, 100);
        assert_eq!(sl.num_spans(), 2);
        let spans: Vec<_> = sl.spans().collect();
        assert_eq!(spans[0].covers, SpanCovers::Solid(200));
        assert_eq!(spans[1].covers, SpanCovers::PerPixel(&[100]));
    }

    #[test]
    fn test_mixed_row() {
        let mut sl = scanline();
        sl.add_cell(2, 128);
        sl.add_span(3, 2, 255);
        sl.add_cell(5, 128);
        sl.finalize(7);
        assert_eq!(sl.y(), 7);
        let got: Vec<(i32, u32, Vec<u8>)> = sl
            .spans()
            .map(|s| (s.x, s.len, (0..s.len as usize).map(|i| s.cover(i)).collect()))
            .collect();
        assert_eq!(
            got,
            vec![(2, 1, vec![128]), (3, 2, vec![255, 255]), (5, 1, vec![128])]
        );
    }

    #[test]
    fn test_reset_spans() {
        let mut sl = scanline();
        sl.add_cell(10, 128);
        sl.reset_spans();
        assert_eq!(sl.num_spans(), 0);
        assert!(sl.covers().is_empty());
        // The declared range survives
        sl.add_cell(100, 1);
        assert_eq!(sl.num_spans(), 1);
    }

    #[test]
    fn test_zero_length_span_ignored() {
        let mut sl = scanline();
        sl.add_span(10, 0, 255);
        assert_eq!(sl.num_spans(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside scanline range")]
    fn test_out_of_range_cell_asserts() {
        let mut sl = scanline();
        sl.add_cell(101, 255);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside scanline range")]
    fn test_out_of_range_span_asserts() {
        let mut sl = scanline();
        sl.add_span(95, 10, 255);
    }
}
