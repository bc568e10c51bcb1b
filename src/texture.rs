//! Laplacian texture measures.
//!
//! Two related but distinct quantities live here:
//! - [`laplacian_map`]: per-pixel `|∇²|` over a cached grayscale buffer, used as
//!   local roughness by the Lab-based rock policies.
//! - [`laplacian_variance`]: variance of the *signed* Laplacian over the whole
//!   image, used as a global texture score.
//!
//! Both use the 4-neighbour kernel and are undefined on the one-pixel border.

use image::RgbImage;

#[inline(always)]
fn luma(px: &[u8]) -> f32 {
    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
}

/// One luma value per pixel, row-major.
#[derive(Clone, Debug)]
pub struct Grayscale {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl Grayscale {
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.as_raw().chunks_exact(3).map(luma).collect();
        Self { width, height, data }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }
}

/// Non-negative roughness per pixel; border pixels hold 0.
#[derive(Clone, Debug)]
pub struct RoughnessMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl RoughnessMap {
    #[inline]
    pub fn is_interior(&self, x: u32, y: u32) -> bool {
        x > 0 && y > 0 && x + 1 < self.width && y + 1 < self.height
    }

    /// Roughness at (x, y). Border pixels read as 0.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }
}

/// Absolute 4-neighbour Laplacian of the grayscale image.
pub fn laplacian_map(img: &RgbImage) -> RoughnessMap {
    let gray = Grayscale::from_rgb(img);
    let (w, h) = (gray.width, gray.height);
    let mut data = vec![0.0f32; (w as usize) * (h as usize)];

    if w >= 3 && h >= 3 {
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let center = gray.get(x, y);
                // top + bottom + left + right - 4 * center, summed as differences
                // so flat regions give exactly 0
                let lap = (gray.get(x, y - 1) - center)
                    + (gray.get(x, y + 1) - center)
                    + (gray.get(x - 1, y) - center)
                    + (gray.get(x + 1, y) - center);
                data[(y * w + x) as usize] = lap.abs();
            }
        }
    }

    RoughnessMap { width: w, height: h, data }
}

/// Variance of the signed Laplacian over interior pixels, read directly from
/// the RGB channels. Returns 0 for images without an interior.
pub fn laplacian_variance(img: &RgbImage) -> f64 {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }

    let raw = img.as_raw();
    let stride = (w * 3) as usize;
    let at = |x: u32, y: u32| -> f64 {
        let idx = y as usize * stride + x as usize * 3;
        luma(&raw[idx..idx + 3]) as f64
    };

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0usize;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let c = at(x, y);
            // same kernel as `laplacian_map`, in f64
            let lap = (at(x, y - 1) - c) + (at(x, y + 1) - c) + (at(x - 1, y) - c) + (at(x + 1, y) - c);
            sum += lap;
            sum_sq += lap * lap;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checker(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| if (x + y) % 2 == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) })
    }

    #[test]
    fn uniform_image_has_no_texture() {
        let img = RgbImage::from_pixel(16, 12, Rgb([128, 128, 128]));
        assert_eq!(laplacian_variance(&img), 0.0);
        let map = laplacian_map(&img);
        assert!(map.data.iter().all(|&v| v.abs() < 1e-3));
    }

    #[test]
    fn border_pixels_stay_zero() {
        let map = laplacian_map(&checker(8, 6));
        for y in 0..6 {
            for x in 0..8 {
                if !map.is_interior(x, y) {
                    assert_eq!(map.get(x, y), 0.0, "border ({x},{y}) should be 0");
                } else {
                    assert!(map.get(x, y) > 1000.0);
                }
            }
        }
    }

    #[test]
    fn isolated_spike_matches_kernel() {
        let mut img = RgbImage::from_pixel(5, 5, Rgb([0, 0, 0]));
        img.put_pixel(2, 2, Rgb([100, 100, 100]));
        let map = laplacian_map(&img);
        // center: |0 - 4*100|, each neighbour: |100 - 0|
        assert!((map.get(2, 2) - 400.0).abs() < 0.1);
        assert!((map.get(2, 1) - 100.0).abs() < 0.1);
        assert!((map.get(1, 1)).abs() < 0.1);
    }

    #[test]
    fn matches_textbook_kernel() {
        let img = RgbImage::from_fn(9, 7, |x, y| {
            Rgb([(x * 29 + y * 7) as u8, (y * 31) as u8, ((x * y * 5) % 256) as u8])
        });
        let gray = Grayscale::from_rgb(&img);
        let map = laplacian_map(&img);
        for y in 1..6 {
            for x in 1..8 {
                let textbook = gray.get(x, y - 1) + gray.get(x, y + 1) + gray.get(x - 1, y) + gray.get(x + 1, y)
                    - 4.0 * gray.get(x, y);
                assert!((map.get(x, y) - textbook.abs()).abs() < 1e-2, "({x},{y})");
            }
        }
    }

    #[test]
    fn checkerboard_variance_is_large() {
        assert!(laplacian_variance(&checker(20, 20)) > 500.0);
    }

    #[test]
    fn tiny_images_are_defined() {
        let img = RgbImage::from_pixel(2, 2, Rgb([10, 200, 30]));
        assert_eq!(laplacian_variance(&img), 0.0);
        assert_eq!(laplacian_map(&img).data.len(), 4);
    }
}
