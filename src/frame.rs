//! Pixel-buffer intake and the throughput downscale.

use image::{DynamicImage, GenericImageView, RgbImage, imageops::FilterType};
use log::debug;

use crate::error::{AnalysisError, Result};

fn check_buffer(width: u32, height: u32, channels: usize, len: usize) -> Result<()> {
    if width == 0 || height == 0 || len == 0 {
        return Err(AnalysisError::EmptyBuffer);
    }
    let expected = width as usize * height as usize * channels;
    if len != expected {
        return Err(AnalysisError::BufferSizeMismatch { expected, actual: len });
    }
    Ok(())
}

/// Build an RGB frame from row-major RGBA bytes. Alpha is discarded.
pub fn frame_from_rgba(width: u32, height: u32, data: &[u8]) -> Result<RgbImage> {
    check_buffer(width, height, 4, data.len())?;
    let rgb: Vec<u8> = data
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(width, height, rgb).ok_or(AnalysisError::EmptyBuffer)
}

/// Build an RGB frame from row-major RGB bytes.
pub fn frame_from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<RgbImage> {
    check_buffer(width, height, 3, data.len())?;
    RgbImage::from_raw(width, height, data).ok_or(AnalysisError::EmptyBuffer)
}

/// Decode an encoded image (PNG, JPEG, ...) into an RGB frame.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyBuffer);
    }
    let img = image::load_from_memory(bytes)?;
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(AnalysisError::EmptyBuffer);
    }
    Ok(img.to_rgb8())
}

/// Target size whose longer side is at most `max_side`, keeping aspect ratio.
pub fn capped_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side {
        return (width, height);
    }
    let ratio = max_side as f32 / longest as f32;
    let w = ((width as f32) * ratio).round().max(1.0) as u32;
    let h = ((height as f32) * ratio).round().max(1.0) as u32;
    (w.min(max_side), h.min(max_side))
}

/// Shrink so the longer side is at most `max_side`. Smaller images pass through.
pub fn downscale_to_cap(img: &RgbImage, max_side: u32) -> RgbImage {
    let (orig_w, orig_h) = img.dimensions();
    let (w, h) = capped_dimensions(orig_w, orig_h, max_side);
    if (w, h) == (orig_w, orig_h) {
        return img.clone();
    }
    debug!("downscale {orig_w}x{orig_h} -> {w}x{h} (cap {max_side})");
    image::imageops::resize(img, w, h, FilterType::Triangle)
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage, what: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut cursor = std::io::Cursor::new(&mut buf);
        img.write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| AnalysisError::Encode {
                what: what.to_string(),
                message: e.to_string(),
            })?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn rgba_intake_drops_alpha() {
        let data = [10, 20, 30, 0, 40, 50, 60, 255];
        let frame = frame_from_rgba(2, 1, &data).unwrap();
        assert_eq!(frame.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(frame.get_pixel(1, 0), &Rgb([40, 50, 60]));
    }

    #[test]
    fn empty_buffers_are_hard_failures() {
        assert!(matches!(frame_from_rgba(0, 0, &[]), Err(AnalysisError::EmptyBuffer)));
        assert!(matches!(frame_from_rgb(4, 4, Vec::new()), Err(AnalysisError::EmptyBuffer)));
        assert!(matches!(decode(&[]), Err(AnalysisError::EmptyBuffer)));
    }

    #[test]
    fn short_buffer_reports_mismatch() {
        let err = frame_from_rgb(2, 2, vec![0; 9]).unwrap_err();
        match err {
            AnalysisError::BufferSizeMismatch { expected, actual } => {
                assert_eq!(expected, 12);
                assert_eq!(actual, 9);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(decode(b"not an image"), Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn cap_preserves_aspect_ratio() {
        assert_eq!(capped_dimensions(1600, 800, 800), (800, 400));
        assert_eq!(capped_dimensions(300, 1200, 600), (150, 600));
        assert_eq!(capped_dimensions(640, 480, 800), (640, 480));
        assert_eq!(capped_dimensions(5000, 1, 100), (100, 1));
    }

    #[test]
    fn downscale_keeps_uniform_color() {
        let img = RgbImage::from_pixel(400, 200, Rgb([0, 255, 0]));
        let small = downscale_to_cap(&img, 100);
        assert_eq!(small.dimensions(), (100, 50));
        assert!(small.pixels().all(|p| p == &Rgb([0, 255, 0])));
    }

    #[test]
    fn png_roundtrip_through_decode() {
        let img = RgbImage::from_pixel(3, 2, Rgb([7, 8, 9]));
        let png = encode_png(&DynamicImage::ImageRgb8(img.clone()), "frame").unwrap();
        assert_eq!(decode(&png).unwrap(), img);
    }
}
