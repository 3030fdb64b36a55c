//! Construction-time configuration for `RasterizerScanlineAa`.

use crate::basics::{FillingRule, RectD};
use crate::error::{RasterError, Result};
use crate::gamma::GammaTable;
use crate::rasterizer_cells_aa::CELL_BLOCK_LIMIT;

/// Settings applied by `RasterizerScanlineAa::with_config`.
///
/// The clipping strategy is not part of the configuration; it is the
/// rasterizer's `Clip` type parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizerConfig {
    pub filling_rule: FillingRule,
    /// Alpha remapping table. `None` leaves alpha unchanged.
    pub gamma: Option<GammaTable>,
    /// Clip box in pixel units. `None` disables clipping.
    pub clip_box: Option<RectD>,
    /// Close open contours on `move_to` and before sorting.
    pub auto_close: bool,
    /// Maximum number of cell arena blocks per pass.
    pub cell_block_limit: usize,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            filling_rule: FillingRule::NonZero,
            gamma: None,
            clip_box: None,
            auto_close: true,
            cell_block_limit: CELL_BLOCK_LIMIT,
        }
    }
}

impl RasterizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filling_rule(mut self, rule: FillingRule) -> Self {
        self.filling_rule = rule;
        self
    }

    pub fn with_gamma(mut self, gamma: GammaTable) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_clip_box(mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        self.clip_box = Some(RectD::new(x1, y1, x2, y2));
        self
    }

    pub fn with_auto_close(mut self, flag: bool) -> Self {
        self.auto_close = flag;
        self
    }

    pub fn with_cell_block_limit(mut self, limit: usize) -> Self {
        self.cell_block_limit = limit;
        self
    }

    /// Check the settings without building a rasterizer.
    pub fn validate(&self) -> Result<()> {
        if let Some(cb) = &self.clip_box {
            if ![cb.x1, cb.y1, cb.x2, cb.y2].iter().all(|v| v.is_finite()) {
                return Err(RasterError::InvalidClipBox {
                    x1: cb.x1,
                    y1: cb.y1,
                    x2: cb.x2,
                    y2: cb.y2,
                });
            }
        }
        if self.cell_block_limit == 0 {
            return Err(RasterError::InvalidCellBlockLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamma::GammaPower;

    #[test]
    fn test_defaults() {
        let cfg = RasterizerConfig::default();
        assert_eq!(cfg.filling_rule, FillingRule::NonZero);
        assert!(cfg.gamma.is_none());
        assert!(cfg.clip_box.is_none());
        assert!(cfg.auto_close);
        assert_eq!(cfg.cell_block_limit, 1024);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let cfg = RasterizerConfig::new()
            .with_filling_rule(FillingRule::EvenOdd)
            .with_gamma(GammaTable::from_fn(&GammaPower::new(1.5)))
            .with_clip_box(0.0, 0.0, 640.0, 480.0)
            .with_auto_close(false)
            .with_cell_block_limit(8);
        assert_eq!(cfg.filling_rule, FillingRule::EvenOdd);
        assert!(cfg.gamma.is_some());
        assert_eq!(cfg.clip_box, Some(RectD::new(0.0, 0.0, 640.0, 480.0)));
        assert!(!cfg.auto_close);
        assert_eq!(cfg.cell_block_limit, 8);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_non_finite_clip_box_rejected() {
        let cfg = RasterizerConfig::new().with_clip_box(0.0, f64::NAN, 10.0, 10.0);
        assert!(matches!(
            cfg.validate(),
            Err(RasterError::InvalidClipBox { x1, .. }) if x1 == 0.0
        ));
        let cfg = RasterizerConfig::new().with_clip_box(0.0, 0.0, f64::INFINITY, 10.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_block_limit_rejected() {
        let cfg = RasterizerConfig::new().with_cell_block_limit(0);
        assert_eq!(cfg.validate(), Err(RasterError::InvalidCellBlockLimit));
    }
}
