//! Color space conversions used by every classifier.
//!
//! HSV comes straight from `palette`. Lab is computed from `palette`'s sRGB
//! linearization followed by an explicit D65 XYZ transform and the classic
//! Lab nonlinearity, then rescaled to the 8-bit convention the thresholds in
//! this crate were tuned against: `L * 2.55`, `a + 128`, `b + 128`.

use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

/// D65 reference white in CIE XYZ.
pub const D65_WHITE: [f32; 3] = [0.95047, 1.0, 1.08883];

/// Linear sRGB -> XYZ (D65).
const SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

const LAB_EPSILON: f32 = 0.008856;
const LAB_SLOPE: f32 = 7.787;
const LAB_OFFSET: f32 = 16.0 / 116.0;

/// Neutral point of the 8-bit a/b axes.
pub const LAB_NEUTRAL: f32 = 128.0;

/// Hue in degrees `[0, 360)`, saturation and value in `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HsvColor {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

/// CIE L*a*b* rescaled to 8-bit ranges. Not clamped: saturated colors can
/// land slightly outside `[0, 255]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lab8 {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl Lab8 {
    /// Distance of (a, b) from the neutral point (128, 128).
    #[inline]
    pub fn chromaticity(&self) -> f32 {
        let da = self.a - LAB_NEUTRAL;
        let db = self.b - LAB_NEUTRAL;
        (da * da + db * db).sqrt()
    }
}

/// Convert 8-bit RGB to HSV. Hue is 0 for achromatic input.
#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> HsvColor {
    let rgb: Srgb<f32> = Srgb::new(r, g, b).into_format();
    let hsv = Hsv::from_color(rgb);
    HsvColor {
        h: hsv.hue.into_positive_degrees(),
        s: hsv.saturation * 100.0,
        v: hsv.value * 100.0,
    }
}

#[inline(always)]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_SLOPE * t + LAB_OFFSET
    }
}

/// Convert 8-bit RGB to 8-bit scaled Lab.
#[inline]
pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab8 {
    let rgb: Srgb<f32> = Srgb::new(r, g, b).into_format();
    let lin = rgb.into_linear::<f32>();
    let c = [lin.red, lin.green, lin.blue];

    let mut xyz = [0.0f32; 3];
    for (i, row) in SRGB_TO_XYZ.iter().enumerate() {
        xyz[i] = (row[0] * c[0] + row[1] * c[1] + row[2] * c[2]) / D65_WHITE[i];
    }

    let fx = lab_f(xyz[0]);
    let fy = lab_f(xyz[1]);
    let fz = lab_f(xyz[2]);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);

    Lab8 {
        l: l * 2.55,
        a: a + LAB_NEUTRAL,
        b: b + LAB_NEUTRAL,
    }
}

/// Format an RGB triple as `#RRGGBB`.
pub fn hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn neutral_gray_has_no_saturation_or_chroma() {
        for k in [0u8, 1, 64, 128, 200, 255] {
            let hsv = rgb_to_hsv(k, k, k);
            assert_eq!(hsv.s, 0.0, "gray {k} should be unsaturated");
            assert_eq!(hsv.h, 0.0);

            let lab = rgb_to_lab(k, k, k);
            assert_abs_diff_eq!(lab.a, 128.0, epsilon = 0.1);
            assert_abs_diff_eq!(lab.b, 128.0, epsilon = 0.1);
            assert!(lab.chromaticity() < 0.1, "gray {k} chroma {}", lab.chromaticity());
        }
    }

    #[test]
    fn black_and_white_extremes() {
        let black = rgb_to_hsv(0, 0, 0);
        assert_eq!(black.v, 0.0);
        assert_eq!(black.s, 0.0);

        let white = rgb_to_lab(255, 255, 255);
        assert_abs_diff_eq!(white.l, 255.0, epsilon = 0.5);

        let black_lab = rgb_to_lab(0, 0, 0);
        assert_abs_diff_eq!(black_lab.l, 0.0, epsilon = 0.01);
    }

    #[test]
    fn primary_hues() {
        assert_abs_diff_eq!(rgb_to_hsv(255, 0, 0).h, 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(rgb_to_hsv(0, 255, 0).h, 120.0, epsilon = 0.01);
        assert_abs_diff_eq!(rgb_to_hsv(0, 0, 255).h, 240.0, epsilon = 0.01);

        let green = rgb_to_hsv(0, 255, 0);
        assert_abs_diff_eq!(green.s, 100.0, epsilon = 0.01);
        assert_abs_diff_eq!(green.v, 100.0, epsilon = 0.01);
    }

    #[test]
    fn saturated_colors_leave_neutral_axis() {
        let red = rgb_to_lab(255, 0, 0);
        assert!(red.a > 128.0 + 60.0, "red a = {}", red.a);

        let blue = rgb_to_lab(0, 0, 255);
        assert!(blue.b < 128.0 - 80.0, "blue b = {}", blue.b);
        assert!(blue.chromaticity() > 100.0);
    }

    #[test]
    fn conversions_are_deterministic() {
        let a = rgb_to_lab(37, 142, 201);
        let b = rgb_to_lab(37, 142, 201);
        assert_eq!(a.l.to_bits(), b.l.to_bits());
        assert_eq!(a.a.to_bits(), b.a.to_bits());
        assert_eq!(a.b.to_bits(), b.b.to_bits());
        assert_eq!(rgb_to_hsv(90, 10, 33), rgb_to_hsv(90, 10, 33));
    }

    #[test]
    fn hex_is_uppercase() {
        assert_eq!(hex([0, 255, 165]), "#00FFA5");
    }
}
