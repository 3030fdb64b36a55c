//! Gamma correction functions and the alpha lookup table.
//!
//! The sweep engine can remap every emitted alpha through a 256-entry
//! `GammaTable`. Tables are built from one of the gamma functions below or
//! supplied directly. There is no shared global table; each rasterizer owns
//! its own copy and defaults to the identity.

use crate::basics::uround;
use crate::error::{RasterError, Result};

const AA_MASK: f64 = 255.0;

// ============================================================================
// Gamma function trait
// ============================================================================

/// A transfer curve over normalized coverage `0.0..=1.0`.
pub trait GammaFunction {
    fn call(&self, x: f64) -> f64;
}

/// No gamma correction — returns input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct GammaNone;

impl GammaFunction for GammaNone {
    #[inline]
    fn call(&self, x: f64) -> f64 {
        x
    }
}

// ============================================================================
// Gamma power
// ============================================================================

/// Power-law gamma correction: `x^gamma`.
#[derive(Debug, Clone, Copy)]
pub struct GammaPower {
    gamma: f64,
}

impl GammaPower {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn set_gamma(&mut self, g: f64) {
        self.gamma = g;
    }
}

impl Default for GammaPower {
    fn default() -> Self {
        Self { gamma: 1.0 }
    }
}

impl GammaFunction for GammaPower {
    #[inline]
    fn call(&self, x: f64) -> f64 {
        x.powf(self.gamma)
    }
}

// ============================================================================
// Gamma threshold
// ============================================================================

/// Threshold gamma: returns 0 if x < threshold, 1 otherwise.
/// Turns anti-aliased coverage into hard edges.
#[derive(Debug, Clone, Copy)]
pub struct GammaThreshold {
    threshold: f64,
}

impl GammaThreshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, t: f64) {
        self.threshold = t;
    }
}

impl Default for GammaThreshold {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl GammaFunction for GammaThreshold {
    #[inline]
    fn call(&self, x: f64) -> f64 {
        if x < self.threshold {
            0.0
        } else {
            1.0
        }
    }
}

// ============================================================================
// Gamma linear
// ============================================================================

/// Linear ramp gamma: 0 below `start`, 1 above `end`, linear between.
#[derive(Debug, Clone, Copy)]
pub struct GammaLinear {
    start: f64,
    end: f64,
}

impl GammaLinear {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn set(&mut self, s: f64, e: f64) {
        self.start = s;
        self.end = e;
    }
}

impl Default for GammaLinear {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
        }
    }
}

impl GammaFunction for GammaLinear {
    #[inline]
    fn call(&self, x: f64) -> f64 {
        if x < self.start {
            0.0
        } else if x > self.end {
            1.0
        } else {
            (x - self.start) / (self.end - self.start)
        }
    }
}

// ============================================================================
// Gamma multiply
// ============================================================================

/// Multiplicative gamma: `min(x * multiplier, 1.0)`.
#[derive(Debug, Clone, Copy)]
pub struct GammaMultiply {
    mul: f64,
}

impl GammaMultiply {
    pub fn new(mul: f64) -> Self {
        Self { mul }
    }

    pub fn value(&self) -> f64 {
        self.mul
    }

    pub fn set_value(&mut self, v: f64) {
        self.mul = v;
    }
}

impl Default for GammaMultiply {
    fn default() -> Self {
        Self { mul: 1.0 }
    }
}

impl GammaFunction for GammaMultiply {
    #[inline]
    fn call(&self, x: f64) -> f64 {
        let y = x * self.mul;
        if y > 1.0 {
            1.0
        } else {
            y
        }
    }
}

// ============================================================================
// GammaTable — 256-entry alpha remapping
// ============================================================================

/// Lookup table applied to the final 0..=255 alpha of every emitted pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaTable {
    table: [u8; 256],
}

impl GammaTable {
    /// The identity table.
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = i as u8;
        }
        Self { table }
    }

    /// Sample `f` at every alpha level.
    pub fn from_fn<F: GammaFunction + ?Sized>(f: &F) -> Self {
        let mut table = [0u8; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let v = f.call(i as f64 / AA_MASK).clamp(0.0, 1.0);
            *entry = uround(v * AA_MASK) as u8;
        }
        Self { table }
    }

    /// Use an explicit table. `values` must have exactly 256 entries.
    pub fn from_slice(values: &[u8]) -> Result<Self> {
        let table: [u8; 256] = values
            .try_into()
            .map_err(|_| RasterError::InvalidGammaTableLength { len: values.len() })?;
        Ok(Self { table })
    }

    /// Like `from_slice`, but also rejects tables that ever decrease.
    pub fn monotonic(values: &[u8]) -> Result<Self> {
        let lut = Self::from_slice(values)?;
        if let Some(index) = lut.table.windows(2).position(|w| w[1] < w[0]) {
            return Err(RasterError::NonMonotonicGamma { index: index + 1 });
        }
        Ok(lut)
    }

    pub fn is_identity(&self) -> bool {
        self.table.iter().enumerate().all(|(i, &v)| v as usize == i)
    }

    /// Remap an alpha value. `alpha` must be at most 255.
    #[inline]
    pub fn apply(&self, alpha: u32) -> u32 {
        self.table[alpha as usize] as u32
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.table
    }
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_gamma_none() {
        let g = GammaNone;
        assert!((g.call(0.0) - 0.0).abs() < EPSILON);
        assert!((g.call(0.5) - 0.5).abs() < EPSILON);
        assert!((g.call(1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_gamma_power_square() {
        let g = GammaPower::new(2.0);
        assert!((g.call(0.5) - 0.25).abs() < EPSILON);
        assert!((g.call(0.0) - 0.0).abs() < EPSILON);
        assert!((g.call(1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_gamma_threshold() {
        let g = GammaThreshold::new(0.5);
        assert_eq!(g.call(0.3), 0.0);
        assert_eq!(g.call(0.5), 1.0);
        assert_eq!(g.call(0.7), 1.0);
    }

    #[test]
    fn test_gamma_linear() {
        let g = GammaLinear::new(0.2, 0.8);
        assert_eq!(g.call(0.1), 0.0);
        assert_eq!(g.call(0.9), 1.0);
        assert!((g.call(0.5) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_gamma_multiply() {
        let g = GammaMultiply::new(2.0);
        assert!((g.call(0.3) - 0.6).abs() < EPSILON);
        assert_eq!(g.call(0.7), 1.0);
    }

    #[test]
    fn test_identity_table() {
        let lut = GammaTable::default();
        assert!(lut.is_identity());
        assert_eq!(lut.apply(0), 0);
        assert_eq!(lut.apply(128), 128);
        assert_eq!(lut.apply(255), 255);
        assert_eq!(GammaTable::from_fn(&GammaNone), lut);
    }

    #[test]
    fn test_table_from_power() {
        let lut = GammaTable::from_fn(&GammaPower::new(2.0));
        assert!(!lut.is_identity());
        assert_eq!(lut.apply(0), 0);
        assert_eq!(lut.apply(255), 255);
        // (128/255)^2 * 255 ≈ 64.25
        assert_eq!(lut.apply(128), 64);
    }

    #[test]
    fn test_table_from_threshold() {
        let lut = GammaTable::from_fn(&GammaThreshold::new(0.5));
        assert_eq!(lut.apply(127), 0);
        assert_eq!(lut.apply(128), 255);
    }

    #[test]
    fn test_table_clamps_out_of_range_functions() {
        struct Overshoot;
        impl GammaFunction for Overshoot {
            fn call(&self, x: f64) -> f64 {
                x * 3.0 - 1.0
            }
        }
        let lut = GammaTable::from_fn(&Overshoot);
        assert_eq!(lut.apply(0), 0);
        assert_eq!(lut.apply(255), 255);
    }

    #[test]
    fn test_from_slice_length() {
        assert_eq!(
            GammaTable::from_slice(&[0u8; 10]),
            Err(RasterError::InvalidGammaTableLength { len: 10 })
        );
        let values: Vec<u8> = (0..=255u8).rev().collect();
        let lut = GammaTable::from_slice(&values).unwrap();
        assert_eq!(lut.apply(0), 255);
        assert_eq!(lut.as_slice().len(), 256);
    }

    #[test]
    fn test_monotonic_check() {
        let mut values: Vec<u8> = (0..=255u8).collect();
        assert!(GammaTable::monotonic(&values).is_ok());
        values[40] = 0;
        assert_eq!(
            GammaTable::monotonic(&values),
            Err(RasterError::NonMonotonicGamma { index: 40 })
        );
    }
}
