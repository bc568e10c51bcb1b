//! Rock-likelihood policies.
//!
//! Three detectors decide whether a pixel looks like exposed rock or mineral
//! substrate, each tuned for the scale it runs at. They share one trait but keep
//! their own thresholds; do not merge them.

use crate::color::{HsvColor, rgb_to_hsv, rgb_to_lab};
use crate::pixel::ndi;

/// Everything a policy may look at for one pixel.
#[derive(Clone, Copy, Debug)]
pub struct PixelSample {
    pub rgb: [u8; 3],
    /// Precomputed HSV, if the caller already has it.
    pub hsv: Option<HsvColor>,
    /// Local roughness from the Laplacian map (0 on borders or when unused).
    pub roughness: f32,
}

impl PixelSample {
    pub fn new(rgb: [u8; 3]) -> Self {
        Self { rgb, hsv: None, roughness: 0.0 }
    }

    pub fn with_hsv(mut self, hsv: HsvColor) -> Self {
        self.hsv = Some(hsv);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// HSV saturation in `[0, 100]`.
    pub fn saturation(&self) -> f32 {
        match self.hsv {
            Some(hsv) => hsv.s,
            None => rgb_to_hsv(self.rgb[0], self.rgb[1], self.rgb[2]).s,
        }
    }

    /// Mean of the normalized channels (NDI).
    #[inline]
    pub fn brightness(&self) -> f32 {
        ndi(self.rgb)
    }
}

/// A rule that flags a pixel as rock/mineral substrate.
pub trait RockLikelihood {
    fn name(&self) -> &'static str;
    fn is_rock(&self, sample: &PixelSample) -> bool;
}

/// Whole-image rule: bright (NDI) and washed out (low HSV saturation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrightNeutralPolicy {
    /// NDI must exceed this (normalized mean brightness).
    pub min_brightness: f32,
    /// Saturation must stay below this, as a fraction in `[0, 1]`.
    pub max_saturation: f32,
}

impl Default for BrightNeutralPolicy {
    fn default() -> Self {
        Self {
            min_brightness: 0.6,
            max_saturation: 0.3,
        }
    }
}

impl RockLikelihood for BrightNeutralPolicy {
    fn name(&self) -> &'static str {
        "bright-neutral"
    }

    fn is_rock(&self, sample: &PixelSample) -> bool {
        sample.brightness() > self.min_brightness && sample.saturation() / 100.0 < self.max_saturation
    }
}

/// Lab lightness + achromaticity + local roughness, all three required.
///
/// Used by the precision validator and, with different thresholds, as the
/// per-cell mineral index (IMR) of the grid mapper.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabRoughnessPolicy {
    pub name: &'static str,
    /// 8-bit scaled L must exceed this.
    pub min_lightness: f32,
    /// Distance from the neutral a/b point must stay below this.
    pub max_chromaticity: f32,
    /// Laplacian magnitude must exceed this.
    pub min_roughness: f32,
}

impl LabRoughnessPolicy {
    /// Whole-image validation thresholds.
    pub const VALIDATION: Self = Self {
        name: "validation",
        min_lightness: 140.0,
        max_chromaticity: 15.0,
        min_roughness: 10.0,
    };

    /// Per-cell mineral index thresholds.
    pub const CELL_MINERAL: Self = Self {
        name: "cell-mineral",
        min_lightness: 150.0,
        max_chromaticity: 18.0,
        min_roughness: 15.0,
    };
}

impl RockLikelihood for LabRoughnessPolicy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_rock(&self, sample: &PixelSample) -> bool {
        // roughness is the cheapest gate
        if sample.roughness <= self.min_roughness {
            return false;
        }
        let lab = rgb_to_lab(sample.rgb[0], sample.rgb[1], sample.rgb[2]);
        lab.l > self.min_lightness && lab.chromaticity() < self.max_chromaticity
    }
}
