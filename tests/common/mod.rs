#![allow(dead_code)]

use std::collections::BTreeMap;

use agg_raster::basics::{
    VertexSource, PATH_CMD_END_POLY, PATH_CMD_LINE_TO, PATH_CMD_MOVE_TO, PATH_CMD_STOP,
    PATH_FLAGS_CLOSE,
};
use agg_raster::rasterizer_scanline_aa::{RasterizerScanlineAa, Scanline, SpanCovers};
use agg_raster::rasterizer_sl_clip::RasterizerClip;
use agg_raster::scanline_bin::ScanlineBin;
use agg_raster::scanline_p::ScanlineP8;
use agg_raster::scanline_u::ScanlineU8;

/// A closed polygon as a path command stream.
pub struct Polygon {
    pts: Vec<(f64, f64)>,
    idx: usize,
}

impl Polygon {
    pub fn new(pts: &[(f64, f64)]) -> Self {
        Self {
            pts: pts.to_vec(),
            idx: 0,
        }
    }

    pub fn reversed(pts: &[(f64, f64)]) -> Self {
        let mut pts = pts.to_vec();
        pts.reverse();
        Self { pts, idx: 0 }
    }
}

impl VertexSource for Polygon {
    fn rewind(&mut self, _path_id: u32) {
        self.idx = 0;
    }

    fn vertex(&mut self, x: &mut f64, y: &mut f64) -> u32 {
        let i = self.idx;
        self.idx += 1;
        match i.cmp(&self.pts.len()) {
            std::cmp::Ordering::Less => {
                *x = self.pts[i].0;
                *y = self.pts[i].1;
                if i == 0 {
                    PATH_CMD_MOVE_TO
                } else {
                    PATH_CMD_LINE_TO
                }
            }
            std::cmp::Ordering::Equal => PATH_CMD_END_POLY | PATH_FLAGS_CLOSE,
            std::cmp::Ordering::Greater => PATH_CMD_STOP,
        }
    }
}

pub fn add_polygon<C: RasterizerClip>(ras: &mut RasterizerScanlineAa<C>, pts: &[(f64, f64)]) {
    ras.add_path(&mut Polygon::new(pts), 0);
}

pub fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<(f64, f64)> {
    vec![(x1, y1), (x2, y1), (x2, y2), (x1, y2)]
}

/// A regular polygon with `n` vertices.
pub fn regular(cx: f64, cy: f64, r: f64, n: usize) -> Vec<(f64, f64)> {
    (0..n)
        .map(|i| {
            let a = i as f64 * std::f64::consts::TAU / n as f64;
            (cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

/// One packed row: (y, spans as (x, len, covers)). Solid spans carry a
/// single cover byte.
pub type PackedRow = (i32, Vec<(i32, u32, Vec<u8>)>);

pub fn sweep_packed<C: RasterizerClip>(ras: &mut RasterizerScanlineAa<C>) -> Vec<PackedRow> {
    let mut rows = Vec::new();
    if !ras.rewind_scanlines() {
        return rows;
    }
    let mut sl = ScanlineP8::new();
    sl.reset(ras.min_x(), ras.max_x());
    while ras.sweep_scanline(&mut sl) {
        let spans = sl
            .spans()
            .map(|s| {
                let covers = match s.covers {
                    SpanCovers::Solid(c) => vec![c],
                    SpanCovers::PerPixel(c) => c.to_vec(),
                };
                (s.x, s.len, covers)
            })
            .collect();
        rows.push((sl.y(), spans));
    }
    rows
}

/// Every emitted pixel and its alpha, via the unpacked container.
pub fn sweep_pixels<C: RasterizerClip>(ras: &mut RasterizerScanlineAa<C>) -> BTreeMap<(i32, i32), u8> {
    let mut pixels = BTreeMap::new();
    if !ras.rewind_scanlines() {
        return pixels;
    }
    let mut sl = ScanlineU8::new();
    sl.reset(ras.min_x(), ras.max_x());
    while ras.sweep_scanline(&mut sl) {
        for span in sl.spans() {
            for i in 0..span.len as usize {
                pixels.insert((span.x + i as i32, sl.y()), span.cover(i));
            }
        }
    }
    pixels
}

/// Covered extents per row, via the binary container.
pub fn sweep_binary<C: RasterizerClip>(ras: &mut RasterizerScanlineAa<C>) -> Vec<(i32, Vec<(i32, i32)>)> {
    let mut rows = Vec::new();
    if !ras.rewind_scanlines() {
        return rows;
    }
    let mut sl = ScanlineBin::new();
    sl.reset(ras.min_x(), ras.max_x());
    while ras.sweep_scanline(&mut sl) {
        rows.push((sl.y(), sl.spans().iter().map(|s| (s.x, s.len)).collect()));
    }
    rows
}

/// Shoelace area of a simple polygon.
pub fn polygon_area(pts: &[(f64, f64)]) -> f64 {
    let n = pts.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x1, y1) = pts[i];
        let (x2, y2) = pts[(i + 1) % n];
        sum += x1 * y2 - x2 * y1;
    }
    sum.abs() / 2.0
}

pub fn polygon_perimeter(pts: &[(f64, f64)]) -> f64 {
    let n = pts.len();
    (0..n)
        .map(|i| {
            let (x1, y1) = pts[i];
            let (x2, y2) = pts[(i + 1) % n];
            ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
        })
        .sum()
}
