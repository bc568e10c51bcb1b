use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Uniform image of one color.
pub fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(rgb))
}

/// Pale, finely speckled outcrop: neutral grays alternating pixel by pixel.
pub fn outcrop(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 { Rgb([245, 245, 242]) } else { Rgb([190, 190, 188]) }
    })
}

/// Left `veg_cols` columns green canopy, the rest red laterite soil.
pub fn canopy_over_soil(width: u32, height: u32, veg_cols: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < veg_cols { Rgb([35, 150, 45]) } else { Rgb([175, 85, 45]) }
    })
}

pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode synthetic scene");
    buf
}
