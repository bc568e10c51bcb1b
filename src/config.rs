//! Analysis configuration.
//!
//! Collects the tunables shared by the wasm surface and the CLI. Can be built
//! programmatically or loaded from JSON:
//!
//! ```no_run
//! use cerrado_cover_wasm::AnalysisConfig;
//! use std::path::Path;
//!
//! let config = AnalysisConfig::from_json_file(Path::new("cerrado.json"))?;
//! config.validate()?;
//! # Ok::<(), cerrado_cover_wasm::AnalysisError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aggregate::ImageAggregator;
use crate::error::{AnalysisError, Result};
use crate::grid::SpatialGridMapper;
use crate::key::FieldContext;
use crate::overlay::DEFAULT_ALPHA;
use crate::pixel::AcquisitionMode;
use crate::validator::PrecisionValidator;

/// Default longer-side cap before analysis.
pub const DEFAULT_MAX_SIDE: u32 = 800;
pub const DEFAULT_GRID_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Longer-side cap applied before every analysis. Throughput only.
    pub max_side: u32,

    /// Acquisition geometry for the whole-image classifier.
    pub mode: AcquisitionMode,

    /// Cells per side for spatial mapping.
    pub grid_size: u32,

    /// Waterlogged soil observed in the field.
    pub wet_context: bool,

    /// Rock outcrops observed in the field; forces the rocky branch of the key.
    pub rock_override: bool,

    /// Cell tint opacity for overlays, `[0, 1]`.
    pub overlay_alpha: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
            mode: AcquisitionMode::Aerial,
            grid_size: DEFAULT_GRID_SIZE,
            wet_context: false,
            rock_override: false,
            overlay_alpha: DEFAULT_ALPHA,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_side == 0 {
            return Err(AnalysisError::invalid("max_side", self.max_side));
        }
        if self.grid_size == 0 {
            return Err(AnalysisError::invalid("grid_size", self.grid_size));
        }
        if !(0.0..=1.0).contains(&self.overlay_alpha) {
            return Err(AnalysisError::invalid("overlay_alpha", self.overlay_alpha));
        }
        Ok(())
    }

    pub fn field_context(&self) -> FieldContext {
        FieldContext {
            wet: self.wet_context,
            rock_override: self.rock_override,
        }
    }

    pub fn aggregator(&self) -> ImageAggregator {
        ImageAggregator::new(self.mode, Some(self.max_side))
    }

    pub fn validator(&self) -> PrecisionValidator {
        PrecisionValidator::new(Some(self.max_side))
    }

    pub fn grid_mapper(&self) -> SpatialGridMapper {
        SpatialGridMapper::new(self.grid_size, self.field_context(), Some(self.max_side))
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
