//! Whole-image cover analysis.
//!
//! Runs the pixel classifier over every pixel, paints one mask per class and
//! derives coverage percentages, a texture score, mean saturation, a soil
//! mineralogy heuristic and the rupestre (rock-outcrop) hypothesis.

use std::borrow::Cow;

use image::{Rgba, RgbaImage, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::rgb_to_hsv;
use crate::error::{AnalysisError, Result};
use crate::frame::{capped_dimensions, downscale_to_cap};
use crate::pixel::{AcquisitionMode, PixelClass, PixelClassifier};
use crate::texture::laplacian_variance;

/// Mean |R - B| below this reads as quartzitic, above as iron-stained.
pub const SOIL_RED_BLUE_SPLIT: f64 = 15.0;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Coarse soil mineralogy from the red/blue balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    MineralQuartzitic,
    FerruginousOxidic,
}

impl SoilType {
    pub fn label(self) -> &'static str {
        match self {
            SoilType::MineralQuartzitic => "Mineral / Quartzitic",
            SoilType::FerruginousOxidic => "Ferruginous / Oxidic",
        }
    }
}

/// Secondary rock-outcrop hypothesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RupestrePrediction {
    /// Lots of rock, almost no vegetation.
    CampoRupestre,
    /// Lots of rock with sparse woody cover.
    CerradoRupestre,
    /// Inferred from texture and dull color only.
    TextureCampoRupestre,
}

impl RupestrePrediction {
    /// Display text. The texture-only label keeps its historical "high
    /// probability" wording; it is not a confidence value.
    pub fn label(self) -> &'static str {
        match self {
            RupestrePrediction::CampoRupestre => "Campo Rupestre (grassland on rock)",
            RupestrePrediction::CerradoRupestre => "Cerrado Rupestre (savanna on rock)",
            RupestrePrediction::TextureCampoRupestre => "High probability of Campo Rupestre (texture)",
        }
    }

    /// True when the hypothesis came from the texture rule rather than rock cover.
    pub fn is_texture_inferred(self) -> bool {
        matches!(self, RupestrePrediction::TextureCampoRupestre)
    }
}

/// Summary statistics for one analysed image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    /// Analysed (post-downscale) dimensions.
    pub width: u32,
    pub height: u32,
    pub vegetation_pixels: u64,
    pub soil_pixels: u64,
    pub rock_pixels: u64,
    /// Vegetation cover, % of all pixels.
    pub coverage: f64,
    pub soil_percentage: f64,
    pub rock_percentage: f64,
    /// Variance of the signed Laplacian.
    pub texture_score: f64,
    /// Mean HSV saturation in `[0, 100]`.
    pub avg_saturation: f64,
    pub soil_type: SoilType,
    pub rupestre_prediction: Option<RupestrePrediction>,
}

/// Caller-owned per-class visualization buffers, same size as the analysed image.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassMasks {
    pub vegetation: RgbaImage,
    pub soil: RgbaImage,
    pub rock: RgbaImage,
}

impl ClassMasks {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            vegetation: RgbaImage::from_pixel(width, height, TRANSPARENT),
            soil: RgbaImage::from_pixel(width, height, TRANSPARENT),
            rock: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.vegetation.dimensions()
    }

    fn clear(&mut self) {
        for mask in [&mut self.vegetation, &mut self.soil, &mut self.rock] {
            for px in mask.pixels_mut() {
                *px = TRANSPARENT;
            }
        }
    }

    fn paint(&mut self, x: u32, y: u32, class: PixelClass) {
        let target = match class {
            PixelClass::Vegetation => &mut self.vegetation,
            PixelClass::Soil => &mut self.soil,
            PixelClass::Rock => &mut self.rock,
            PixelClass::None => return,
        };
        if let Some([r, g, b]) = class.mask_color() {
            target.put_pixel(x, y, Rgba([r, g, b, 255]));
        }
    }
}

/// Summary plus the masks it was computed alongside.
#[derive(Clone, Debug)]
pub struct ImageAnalysis {
    pub summary: ImageSummary,
    pub masks: ClassMasks,
}

/// Picks the rupestre hypothesis; the first matching rule wins.
pub fn rupestre_prediction(
    rock_percentage: f64,
    coverage: f64,
    texture_score: f64,
    avg_saturation: f64,
) -> Option<RupestrePrediction> {
    if rock_percentage > 30.0 && coverage < 5.0 {
        Some(RupestrePrediction::CampoRupestre)
    } else if rock_percentage > 30.0 && (5.0..=20.0).contains(&coverage) {
        Some(RupestrePrediction::CerradoRupestre)
    } else if texture_score > 500.0 && avg_saturation < 40.0 && coverage < 10.0 {
        Some(RupestrePrediction::TextureCampoRupestre)
    } else {
        None
    }
}

/// Soil mineralogy from mean red and blue channels (0-255).
pub fn soil_type(mean_red: f64, mean_blue: f64) -> SoilType {
    if (mean_red - mean_blue).abs() < SOIL_RED_BLUE_SPLIT {
        SoilType::MineralQuartzitic
    } else {
        SoilType::FerruginousOxidic
    }
}

/// Whole-image analyzer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageAggregator {
    pub classifier: PixelClassifier,
    /// Longer-side cap applied before analysis; `None` analyses at full size.
    pub max_side: Option<u32>,
}

impl ImageAggregator {
    pub fn new(mode: AcquisitionMode, max_side: Option<u32>) -> Self {
        Self {
            classifier: PixelClassifier::new(mode),
            max_side,
        }
    }

    /// Dimensions the masks must have for `img`.
    pub fn analysis_dimensions(&self, img: &RgbImage) -> (u32, u32) {
        let (w, h) = img.dimensions();
        match self.max_side {
            Some(cap) => capped_dimensions(w, h, cap),
            None => (w, h),
        }
    }

    fn working_image<'a>(&self, img: &'a RgbImage) -> Cow<'a, RgbImage> {
        match self.max_side {
            Some(cap) if self.analysis_dimensions(img) != img.dimensions() => Cow::Owned(downscale_to_cap(img, cap)),
            _ => Cow::Borrowed(img),
        }
    }

    /// Analyse `img`, allocating fresh masks.
    pub fn analyze(&self, img: &RgbImage) -> Result<ImageAnalysis> {
        let (w, h) = self.analysis_dimensions(img);
        let mut masks = ClassMasks::new(w, h);
        let summary = self.analyze_into(img, &mut masks)?;
        Ok(ImageAnalysis { summary, masks })
    }

    /// Analyse `img`, painting into caller-owned masks. Previous mask contents
    /// are cleared.
    pub fn analyze_into(&self, img: &RgbImage, masks: &mut ClassMasks) -> Result<ImageSummary> {
        let (src_w, src_h) = img.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(AnalysisError::EmptyBuffer);
        }
        let work = self.working_image(img);
        let (width, height) = work.dimensions();
        let (mask_width, mask_height) = masks.dimensions();
        if (mask_width, mask_height) != (width, height) {
            return Err(AnalysisError::MaskDimensionMismatch {
                width,
                height,
                mask_width,
                mask_height,
            });
        }
        masks.clear();

        let mut counts = [0u64; 3];
        let mut sum_red = 0.0f64;
        let mut sum_blue = 0.0f64;
        let mut sum_saturation = 0.0f64;

        for (x, y, px) in work.enumerate_pixels() {
            let rgb = px.0;
            let hsv = rgb_to_hsv(rgb[0], rgb[1], rgb[2]);
            sum_red += rgb[0] as f64;
            sum_blue += rgb[2] as f64;
            sum_saturation += hsv.s as f64;

            let class = self.classifier.classify(rgb, &hsv);
            match class {
                PixelClass::Vegetation => counts[0] += 1,
                PixelClass::Soil => counts[1] += 1,
                PixelClass::Rock => counts[2] += 1,
                PixelClass::None => continue,
            }
            masks.paint(x, y, class);
        }

        let total = (width as u64 * height as u64) as f64;
        let pct = |n: u64| n as f64 / total * 100.0;
        let coverage = pct(counts[0]);
        let soil_percentage = pct(counts[1]);
        let rock_percentage = pct(counts[2]);
        let avg_saturation = sum_saturation / total;
        let texture_score = laplacian_variance(&work);

        let summary = ImageSummary {
            width,
            height,
            vegetation_pixels: counts[0],
            soil_pixels: counts[1],
            rock_pixels: counts[2],
            coverage,
            soil_percentage,
            rock_percentage,
            texture_score,
            avg_saturation,
            soil_type: soil_type(sum_red / total, sum_blue / total),
            rupestre_prediction: rupestre_prediction(rock_percentage, coverage, texture_score, avg_saturation),
        };
        debug!(
            "aggregate {}x{} mode={:?} veg={:.1}% soil={:.1}% rock={:.1}% texture={:.1} -> {:?}",
            width,
            height,
            self.classifier.mode,
            coverage,
            soil_percentage,
            rock_percentage,
            texture_score,
            summary.rupestre_prediction
        );
        Ok(summary)
    }
}
