//! Terrain cover analysis for Cerrado field photographs.
//!
//! Derives per-pixel spectral indices (ExG, RI, NDI, NGRDI), Lab lightness and
//! chromaticity, and a Laplacian roughness measure, then maps the aggregated
//! statistics onto Cerrado phytophysiognomies.
//!
//! Three independent analyses are exposed, both to JavaScript (wasm-bindgen)
//! and natively:
//! - whole-image cover: [`ImageAggregator`] → [`ImageSummary`] + class masks
//! - rupestre validation: [`PrecisionValidator`] → [`ValidationResult`]
//! - spatial mapping: [`SpatialGridMapper`] → [`GridMap`] (+ optional overlay)

use wasm_bindgen::prelude::*;
use image::{DynamicImage, RgbImage};
use js_sys::{Array, Object, Reflect, Uint8Array};
#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result as AnyResult};

pub mod aggregate;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod grid;
pub mod key;
pub mod overlay;
pub mod pixel;
pub mod rock;
pub mod texture;
pub mod validator;

pub use aggregate::{ClassMasks, ImageAggregator, ImageAnalysis, ImageSummary, RupestrePrediction, SoilType};
pub use color::{HsvColor, Lab8, rgb_to_hsv, rgb_to_lab};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use frame::{decode, downscale_to_cap, frame_from_rgb, frame_from_rgba};
pub use grid::{GridCell, GridMap, LegendEntry, SpatialGridMapper};
pub use key::{FieldContext, Physiognomy, classify};
pub use overlay::render_overlay;
pub use pixel::{AcquisitionMode, PixelClass, PixelClassifier};
pub use rock::{BrightNeutralPolicy, LabRoughnessPolicy, PixelSample, RockLikelihood};
pub use texture::{RoughnessMap, laplacian_map, laplacian_variance};
pub use validator::{Formation, PrecisionValidator, ValidationResult};

// ------------------------------------------------------------
// Shared helpers
// ------------------------------------------------------------

/// PNG-encode the three class masks (vegetation, soil, rock).
pub fn encode_masks(masks: &ClassMasks) -> Result<[Vec<u8>; 3]> {
    Ok([
        frame::encode_png(&DynamicImage::ImageRgba8(masks.vegetation.clone()), "vegetation mask")?,
        frame::encode_png(&DynamicImage::ImageRgba8(masks.soil.clone()), "soil mask")?,
        frame::encode_png(&DynamicImage::ImageRgba8(masks.rock.clone()), "rock mask")?,
    ])
}

/// Whole-image analysis of a row-major RGBA buffer (e.g. canvas `ImageData`).
pub fn analyze_rgba(width: u32, height: u32, rgba: &[u8], config: &AnalysisConfig) -> Result<ImageAnalysis> {
    config.validate()?;
    let frame = frame_from_rgba(width, height, rgba)?;
    config.aggregator().analyze(&frame)
}

/// Decode, downscale once, map the grid and composite the overlay on the
/// same analysis-size image.
pub fn map_with_overlay(input: &[u8], config: &AnalysisConfig) -> Result<(GridMap, Vec<u8>)> {
    config.validate()?;
    let frame = decode(input)?;
    let work: RgbImage = downscale_to_cap(&frame, config.max_side);
    // already within the cap, so the mapper borrows `work` as is
    let grid = config.grid_mapper().map(&work)?;
    let overlay = render_overlay(&work, &grid, config.overlay_alpha);
    let png = frame::encode_png(&DynamicImage::ImageRgba8(overlay), "overlay")?;
    Ok((grid, png))
}

// ------------------------------------------------------------
// JavaScript surface
// ------------------------------------------------------------

fn js_err(e: AnalysisError) -> JsValue {
    JsValue::from_str(&e.user_message())
}

fn set(obj: &Object, key: &str, value: &JsValue) -> std::result::Result<(), JsValue> {
    Reflect::set(obj, &JsValue::from_str(key), value).map(|_| ())
}

fn config_for(max_side: Option<u32>) -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    if let Some(cap) = max_side {
        config.max_side = cap;
    }
    config
}

fn analysis_config(close_range: bool, max_side: Option<u32>) -> AnalysisConfig {
    let mut config = config_for(max_side);
    config.mode = if close_range { AcquisitionMode::CloseRange } else { AcquisitionMode::Aerial };
    config
}

/// Whole-image cover analysis of an encoded image.
///
/// Returns `{ width, height, coverage, soilPercentage, rockPercentage,
/// textureScore, avgSaturation, soilType, rupestrePrediction, vegetationMask,
/// soilMask, rockMask }`; masks are PNG bytes at the analysed size.
#[wasm_bindgen]
pub fn analyze_image(input: Vec<u8>, close_range: bool, max_side: Option<u32>) -> std::result::Result<Object, JsValue> {
    let config = analysis_config(close_range, max_side);
    config.validate().map_err(js_err)?;

    let frame = decode(&input).map_err(js_err)?;
    let analysis = config.aggregator().analyze(&frame).map_err(js_err)?;
    analysis_object(&analysis)
}

/// Same as [`analyze_image`] for an already decoded RGBA buffer, such as
/// `ImageData.data` from a canvas.
#[wasm_bindgen]
pub fn analyze_pixels(
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    close_range: bool,
    max_side: Option<u32>,
) -> std::result::Result<Object, JsValue> {
    let config = analysis_config(close_range, max_side);
    let analysis = analyze_rgba(width, height, &rgba, &config).map_err(js_err)?;
    analysis_object(&analysis)
}

fn analysis_object(analysis: &ImageAnalysis) -> std::result::Result<Object, JsValue> {
    let [veg_png, soil_png, rock_png] = encode_masks(&analysis.masks).map_err(js_err)?;
    let s = &analysis.summary;

    let result = Object::new();
    set(&result, "width", &JsValue::from(s.width))?;
    set(&result, "height", &JsValue::from(s.height))?;
    set(&result, "coverage", &JsValue::from_f64(s.coverage))?;
    set(&result, "soilPercentage", &JsValue::from_f64(s.soil_percentage))?;
    set(&result, "rockPercentage", &JsValue::from_f64(s.rock_percentage))?;
    set(&result, "textureScore", &JsValue::from_f64(s.texture_score))?;
    set(&result, "avgSaturation", &JsValue::from_f64(s.avg_saturation))?;
    set(&result, "soilType", &JsValue::from_str(s.soil_type.label()))?;
    let rupestre = match s.rupestre_prediction {
        Some(p) => JsValue::from_str(p.label()),
        None => JsValue::NULL,
    };
    set(&result, "rupestrePrediction", &rupestre)?;
    set(&result, "vegetationMask", &Uint8Array::from(veg_png.as_slice()))?;
    set(&result, "soilMask", &Uint8Array::from(soil_png.as_slice()))?;
    set(&result, "rockMask", &Uint8Array::from(rock_png.as_slice()))?;
    Ok(result)
}

/// Second-opinion rupestre validation.
///
/// Returns `{ label, rockPercentage, treePercentage, color }`.
#[wasm_bindgen]
pub fn validate_rupestre(input: Vec<u8>, max_side: Option<u32>) -> std::result::Result<Object, JsValue> {
    let config = config_for(max_side);
    config.validate().map_err(js_err)?;

    let frame = decode(&input).map_err(js_err)?;
    let v = config.validator().validate(&frame).map_err(js_err)?;

    let result = Object::new();
    set(&result, "label", &JsValue::from_str(&v.label))?;
    set(&result, "rockPercentage", &JsValue::from_f64(v.rock_percentage))?;
    set(&result, "treePercentage", &JsValue::from_f64(v.tree_percentage))?;
    set(&result, "color", &JsValue::from_str(&v.color))?;
    Ok(result)
}

/// Spatial phytophysiognomy map.
///
/// Returns `{ width, height, cells: [{x, y, w, h, label, color, vegFraction,
/// mineralFraction}], legend: [{label, localName, color}], overlay }` where `overlay` is a
/// PNG of the analysed image with tinted cells and grid lines.
#[wasm_bindgen]
pub fn map_spatial(
    input: Vec<u8>,
    grid_size: u32,
    wet_soil: bool,
    rocks: bool,
    max_side: Option<u32>,
) -> std::result::Result<Object, JsValue> {
    let mut config = config_for(max_side);
    config.grid_size = grid_size;
    config.wet_context = wet_soil;
    config.rock_override = rocks;

    let (grid, overlay_png) = map_with_overlay(&input, &config).map_err(js_err)?;

    let cells_js = Array::new();
    for cell in &grid.cells {
        let c = Object::new();
        set(&c, "x", &JsValue::from(cell.x))?;
        set(&c, "y", &JsValue::from(cell.y))?;
        set(&c, "w", &JsValue::from(cell.w))?;
        set(&c, "h", &JsValue::from(cell.h))?;
        set(&c, "label", &JsValue::from_str(&cell.label))?;
        set(&c, "color", &JsValue::from_str(&cell.color))?;
        set(&c, "vegFraction", &JsValue::from_f64(cell.veg_fraction as f64))?;
        set(&c, "mineralFraction", &JsValue::from_f64(cell.mineral_fraction as f64))?;
        cells_js.push(&c);
    }

    let legend_js = Array::new();
    for entry in &grid.legend {
        let e = Object::new();
        set(&e, "label", &JsValue::from_str(&entry.label))?;
        set(&e, "localName", &JsValue::from_str(&entry.local_name))?;
        set(&e, "color", &JsValue::from_str(&entry.color))?;
        legend_js.push(&e);
    }

    let result = Object::new();
    set(&result, "width", &JsValue::from(grid.width))?;
    set(&result, "height", &JsValue::from(grid.height))?;
    set(&result, "cells", &cells_js)?;
    set(&result, "legend", &legend_js)?;
    set(&result, "overlay", &Uint8Array::from(overlay_png.as_slice()))?;
    Ok(result)
}

// ------------------------------------------------------------
// Native surface
// ------------------------------------------------------------

#[cfg(not(target_arch = "wasm32"))]
pub fn analyze_bytes(input: &[u8], config: &AnalysisConfig) -> AnyResult<ImageAnalysis> {
    config.validate()?;
    let frame = decode(input).context("decoding input image")?;
    let analysis = config.aggregator().analyze(&frame)?;
    Ok(analysis)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn validate_bytes(input: &[u8], config: &AnalysisConfig) -> AnyResult<ValidationResult> {
    config.validate()?;
    let frame = decode(input).context("decoding input image")?;
    Ok(config.validator().validate(&frame)?)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn map_bytes(input: &[u8], config: &AnalysisConfig) -> AnyResult<(GridMap, Vec<u8>)> {
    map_with_overlay(input, config).context("spatial mapping failed")
}
