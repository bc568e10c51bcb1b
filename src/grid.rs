//! Spatial grid mapping.
//!
//! Splits the image into `grid_size × grid_size` equal cells, measures
//! vegetation (NGRDI) and mineral (Lab + roughness) cover per cell and labels
//! each cell with the dichotomous key. Leftover pixels past the last full
//! row/column are not covered.

use std::borrow::Cow;

use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::frame::{capped_dimensions, downscale_to_cap};
use crate::key::{FieldContext, Physiognomy, classify};
use crate::pixel::{NGRDI_VEGETATION, ngrdi};
use crate::rock::{LabRoughnessPolicy, PixelSample, RockLikelihood};
use crate::texture::{RoughnessMap, laplacian_map};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Vegetation cover in percent.
    pub veg_fraction: f32,
    /// Mineral (IMR) cover in percent.
    pub mineral_fraction: f32,
    pub physiognomy: Physiognomy,
    pub label: String,
    /// `#RRGGBB`
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub physiognomy: Physiognomy,
    pub label: String,
    /// Portuguese formation name.
    pub local_name: String,
    pub color: String,
}

/// Labeled cells plus the distinct labels they use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridMap {
    /// Dimensions of the image the grid was laid over.
    pub width: u32,
    pub height: u32,
    pub grid_size: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub cells: Vec<GridCell>,
    pub legend: Vec<LegendEntry>,
}

impl GridMap {
    pub fn cell(&self, row: u32, col: u32) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SpatialGridMapper {
    pub grid_size: u32,
    pub context: FieldContext,
    pub policy: LabRoughnessPolicy,
    pub max_side: Option<u32>,
}

impl Default for SpatialGridMapper {
    fn default() -> Self {
        Self {
            grid_size: 10,
            context: FieldContext::default(),
            policy: LabRoughnessPolicy::CELL_MINERAL,
            max_side: None,
        }
    }
}

impl SpatialGridMapper {
    pub fn new(grid_size: u32, context: FieldContext, max_side: Option<u32>) -> Self {
        Self {
            grid_size,
            context,
            max_side,
            ..Self::default()
        }
    }

    /// Map `img`. The returned grid refers to the (possibly downscaled)
    /// analysis image; see [`GridMap::width`].
    pub fn map(&self, img: &RgbImage) -> Result<GridMap> {
        if self.grid_size == 0 {
            return Err(AnalysisError::invalid("grid_size", self.grid_size));
        }
        let (src_w, src_h) = img.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(AnalysisError::EmptyBuffer);
        }
        let work: Cow<'_, RgbImage> = match self.max_side {
            Some(cap) if capped_dimensions(src_w, src_h, cap) != (src_w, src_h) => {
                Cow::Owned(downscale_to_cap(img, cap))
            }
            _ => Cow::Borrowed(img),
        };
        let (width, height) = work.dimensions();
        let cell_width = width / self.grid_size;
        let cell_height = height / self.grid_size;

        let mut grid = GridMap {
            width,
            height,
            grid_size: self.grid_size,
            cell_width,
            cell_height,
            cells: Vec::new(),
            legend: Vec::new(),
        };
        if cell_width == 0 || cell_height == 0 {
            debug!("grid {0}x{0} does not fit {1}x{2}; no cells", self.grid_size, width, height);
            return Ok(grid);
        }

        // one roughness pass shared by every cell
        let roughness = laplacian_map(&work);

        for row in 0..self.grid_size {
            for col in 0..self.grid_size {
                let (x, y) = (col * cell_width, row * cell_height);
                let (veg, mineral) = self.cell_fractions(&work, &roughness, x, y, cell_width, cell_height);
                let physiognomy = classify(veg, mineral, self.context);

                if !grid.legend.iter().any(|e| e.physiognomy == physiognomy) {
                    grid.legend.push(LegendEntry {
                        physiognomy,
                        label: physiognomy.label().to_string(),
                        local_name: physiognomy.local_name().to_string(),
                        color: physiognomy.color(),
                    });
                }
                grid.cells.push(GridCell {
                    row,
                    col,
                    x,
                    y,
                    w: cell_width,
                    h: cell_height,
                    veg_fraction: veg,
                    mineral_fraction: mineral,
                    physiognomy,
                    label: physiognomy.label().to_string(),
                    color: physiognomy.color(),
                });
            }
        }

        debug!(
            "grid {0}x{0} over {1}x{2}: {3} cells, {4} legend entries",
            self.grid_size,
            width,
            height,
            grid.cells.len(),
            grid.legend.len()
        );
        Ok(grid)
    }

    fn cell_fractions(
        &self,
        img: &RgbImage,
        roughness: &RoughnessMap,
        x0: u32,
        y0: u32,
        w: u32,
        h: u32,
    ) -> (f32, f32) {
        let mut veg = 0u32;
        let mut mineral = 0u32;
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let rgb = img.get_pixel(x, y).0;
                if ngrdi(rgb) > NGRDI_VEGETATION {
                    veg += 1;
                }
                let sample = PixelSample::new(rgb).with_roughness(roughness.get(x, y));
                if self.policy.is_rock(&sample) {
                    mineral += 1;
                }
            }
        }
        let total = (w * h) as f32;
        (veg as f32 / total * 100.0, mineral as f32 / total * 100.0)
    }
}
