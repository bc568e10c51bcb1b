//! Per-pixel spectral indices and the whole-image pixel classifier.

use serde::{Deserialize, Serialize};

use crate::color::HsvColor;
use crate::rock::{BrightNeutralPolicy, PixelSample, RockLikelihood};

/// Added to denominators so ratio indices stay finite on black pixels.
pub const INDEX_EPSILON: f32 = 1e-5;

/// ExG above this is vegetation.
pub const EXG_VEGETATION: f32 = 0.05;
/// RI above this is bare soil.
pub const RI_SOIL: f32 = 1.5;
/// NGRDI above this counts toward the per-cell vegetation fraction.
pub const NGRDI_VEGETATION: f32 = 0.03;

/// Hue window (exclusive, degrees) rejected as rock in close-range mode.
pub const CLOSE_RANGE_SKY_HUES: (f32, f32) = (180.0, 260.0);

#[inline(always)]
fn normalized([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

/// Excess Green, `2G - R - B` on normalized channels.
#[inline]
pub fn excess_green(rgb: [u8; 3]) -> f32 {
    let (r, g, b) = normalized(rgb);
    2.0 * g - r - b
}

/// Redness Index, `R² / (G·B³ + ε)` on normalized channels.
#[inline]
pub fn redness_index(rgb: [u8; 3]) -> f32 {
    let (r, g, b) = normalized(rgb);
    (r * r) / (g * b * b * b + INDEX_EPSILON)
}

/// Mean normalized brightness.
#[inline]
pub fn ndi(rgb: [u8; 3]) -> f32 {
    let (r, g, b) = normalized(rgb);
    (r + g + b) / 3.0
}

/// Normalized Green-Red Difference Index, `(G - R) / (G + R + ε)`.
#[inline]
pub fn ngrdi(rgb: [u8; 3]) -> f32 {
    let (r, g, _) = normalized(rgb);
    (g - r) / (g + r + INDEX_EPSILON)
}

/// How the photograph was taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Overhead / drone imagery.
    #[default]
    Aerial,
    /// Handheld, oblique capture; sky and water can look like pale rock.
    CloseRange,
}

/// Exactly one class per pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelClass {
    Vegetation,
    Soil,
    Rock,
    None,
}

impl PixelClass {
    /// Mask color painted for this class, if any.
    pub fn mask_color(self) -> Option<[u8; 3]> {
        match self {
            PixelClass::Vegetation => Some([0, 255, 0]),
            PixelClass::Soil => Some([255, 165, 0]),
            PixelClass::Rock => Some([0, 255, 255]),
            PixelClass::None => None,
        }
    }
}

/// First-match-wins classifier: vegetation, then soil, then rock.
#[derive(Clone, Copy, Debug, Default)]
pub struct PixelClassifier {
    pub mode: AcquisitionMode,
    pub rock: BrightNeutralPolicy,
}

impl PixelClassifier {
    pub fn new(mode: AcquisitionMode) -> Self {
        Self {
            mode,
            rock: BrightNeutralPolicy::default(),
        }
    }

    pub fn classify(&self, rgb: [u8; 3], hsv: &HsvColor) -> PixelClass {
        if excess_green(rgb) > EXG_VEGETATION {
            return PixelClass::Vegetation;
        }
        if redness_index(rgb) > RI_SOIL {
            return PixelClass::Soil;
        }
        let sample = PixelSample::new(rgb).with_hsv(*hsv);
        if !self.rock.is_rock(&sample) {
            return PixelClass::None;
        }
        let (lo, hi) = CLOSE_RANGE_SKY_HUES;
        if self.mode == AcquisitionMode::CloseRange && hsv.h > lo && hsv.h < hi {
            return PixelClass::None;
        }
        PixelClass::Rock
    }
}
