//! Precision validator: a stricter, second-opinion rock detector.
//!
//! Rock pixels must be bright in Lab, close to neutral, and locally rough.
//! Tree cover comes from Excess Green. The two percentages pick one of the
//! rupestre / deep-soil formations below.

use std::borrow::Cow;

use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::hex;
use crate::error::{AnalysisError, Result};
use crate::frame::{capped_dimensions, downscale_to_cap};
use crate::pixel::{EXG_VEGETATION, excess_green};
use crate::rock::{LabRoughnessPolicy, PixelSample, RockLikelihood};
use crate::texture::laplacian_map;

/// Rock cover (%) above which the rupestre branch applies.
pub const ROCK_BRANCH_THRESHOLD: f64 = 8.0;

/// Outcomes of the validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formation {
    /// Rock with almost no trees.
    PureRockyGrassland,
    RockySavanna,
    DenseRockySavanna,
    /// No meaningful rock, enough trees.
    DeepSoilTypicalSavanna,
    /// Fallback: neither rock nor trees.
    OpenGrassland,
}

impl Formation {
    pub fn label(self) -> &'static str {
        match self {
            Formation::PureRockyGrassland => "Campo Rupestre (pure rocky grassland)",
            Formation::RockySavanna => "Cerrado Rupestre (rocky savanna)",
            Formation::DenseRockySavanna => "Dense Cerrado Rupestre (dense rocky savanna)",
            Formation::DeepSoilTypicalSavanna => "Typical Cerrado (deep soil)",
            Formation::OpenGrassland => "Campo Limpo / Sujo (open grassland)",
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            Formation::PureRockyGrassland => [148, 163, 184],
            Formation::RockySavanna => [217, 119, 6],
            Formation::DenseRockySavanna => [146, 64, 14],
            Formation::DeepSoilTypicalSavanna => [22, 163, 74],
            Formation::OpenGrassland => [234, 179, 8],
        }
    }

    pub fn is_rupestre(self) -> bool {
        matches!(
            self,
            Formation::PureRockyGrassland | Formation::RockySavanna | Formation::DenseRockySavanna
        )
    }
}

/// Pick the formation from rock and tree cover percentages.
pub fn formation_for(rock_percentage: f64, tree_percentage: f64) -> Formation {
    if rock_percentage > ROCK_BRANCH_THRESHOLD {
        if tree_percentage < 5.0 {
            Formation::PureRockyGrassland
        } else if tree_percentage <= 40.0 {
            Formation::RockySavanna
        } else {
            Formation::DenseRockySavanna
        }
    } else if tree_percentage > 20.0 {
        Formation::DeepSoilTypicalSavanna
    } else {
        Formation::OpenGrassland
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub formation: Formation,
    pub label: String,
    pub rock_percentage: f64,
    pub tree_percentage: f64,
    /// `#RRGGBB`
    pub color: String,
}

impl ValidationResult {
    fn new(formation: Formation, rock_percentage: f64, tree_percentage: f64) -> Self {
        Self {
            formation,
            label: formation.label().to_string(),
            rock_percentage,
            tree_percentage,
            color: hex(formation.rgb()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PrecisionValidator {
    pub policy: LabRoughnessPolicy,
    pub max_side: Option<u32>,
}

impl Default for PrecisionValidator {
    fn default() -> Self {
        Self {
            policy: LabRoughnessPolicy::VALIDATION,
            max_side: None,
        }
    }
}

impl PrecisionValidator {
    pub fn new(max_side: Option<u32>) -> Self {
        Self {
            max_side,
            ..Self::default()
        }
    }

    pub fn validate(&self, img: &RgbImage) -> Result<ValidationResult> {
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

        let roughness = laplacian_map(&work);
        let mut rock = 0u64;
        let mut trees = 0u64;

        for (x, y, px) in work.enumerate_pixels() {
            let rgb = px.0;
            if excess_green(rgb) > EXG_VEGETATION {
                trees += 1;
            }
            let sample = PixelSample::new(rgb).with_roughness(roughness.get(x, y));
            if self.policy.is_rock(&sample) {
                rock += 1;
            }
        }

        let (w, h) = work.dimensions();
        let total = (w as u64 * h as u64) as f64;
        let rock_percentage = rock as f64 / total * 100.0;
        let tree_percentage = trees as f64 / total * 100.0;
        let formation = formation_for(rock_percentage, tree_percentage);
        debug!(
            "validator {}x{} policy={} rock={:.2}% trees={:.2}% -> {:?}",
            w,
            h,
            self.policy.name(),
            rock_percentage,
            tree_percentage,
            formation
        );
        Ok(ValidationResult::new(formation, rock_percentage, tree_percentage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn formation_precedence() {
        assert_eq!(formation_for(9.0, 2.0), Formation::PureRockyGrassland);
        assert_eq!(formation_for(9.0, 5.0), Formation::RockySavanna);
        assert_eq!(formation_for(9.0, 40.0), Formation::RockySavanna);
        assert_eq!(formation_for(9.0, 41.0), Formation::DenseRockySavanna);
        assert_eq!(formation_for(8.0, 60.0), Formation::DeepSoilTypicalSavanna);
        assert_eq!(formation_for(0.0, 20.0), Formation::OpenGrassland);
    }

    #[test]
    fn flat_bright_surface_is_not_rock() {
        // bright and neutral, but perfectly smooth
        let img = RgbImage::from_pixel(20, 20, Rgb([235, 235, 235]));
        let result = PrecisionValidator::default().validate(&img).unwrap();
        assert_eq!(result.rock_percentage, 0.0);
        assert_eq!(result.formation, Formation::OpenGrassland);
    }

    #[test]
    fn rough_pale_outcrop_is_rupestre() {
        // alternating pale grays: neutral, bright, high local contrast
        let img = RgbImage::from_fn(30, 30, |x, y| {
            if (x + y) % 2 == 0 { Rgb([245, 245, 245]) } else { Rgb([190, 190, 190]) }
        });
        let result = PrecisionValidator::default().validate(&img).unwrap();
        assert!(result.rock_percentage > 80.0, "rock = {}", result.rock_percentage);
        assert_eq!(result.tree_percentage, 0.0);
        assert_eq!(result.formation, Formation::PureRockyGrassland);
        assert!(result.formation.is_rupestre());
        assert_eq!(result.color, "#94A3B8");
    }

    #[test]
    fn green_canopy_is_deep_soil_savanna() {
        let img = RgbImage::from_pixel(16, 16, Rgb([40, 140, 50]));
        let result = PrecisionValidator::default().validate(&img).unwrap();
        assert_eq!(result.tree_percentage, 100.0);
        assert_eq!(result.formation, Formation::DeepSoilTypicalSavanna);
    }
}
