//! Grid overlay compositing for display.
//!
//! Blends each cell's formation color over the photo and draws cell borders.
//! Cell rectangles are rescaled when the base image is larger than the grid's
//! analysis image.

use image::{Rgba, RgbaImage, RgbImage};

use crate::grid::GridMap;

pub const DEFAULT_ALPHA: f32 = 0.45;

const GRID_LINE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[inline(always)]
fn blend(base: u8, over: u8, alpha: f32) -> u8 {
    (base as f32 * (1.0 - alpha) + over as f32 * alpha).round().clamp(0.0, 255.0) as u8
}

#[inline(always)]
fn scale(v: u32, to: u32, from: u32) -> u32 {
    ((v as u64 * to as u64) / from.max(1) as u64) as u32
}

/// Composite `grid` over `base`. `alpha` is clamped to `[0, 1]`.
pub fn render_overlay(base: &RgbImage, grid: &GridMap, alpha: f32) -> RgbaImage {
    let alpha = alpha.clamp(0.0, 1.0);
    let (bw, bh) = base.dimensions();
    let mut out = RgbaImage::from_fn(bw, bh, |x, y| {
        let [r, g, b] = base.get_pixel(x, y).0;
        Rgba([r, g, b, 255])
    });

    for cell in &grid.cells {
        let x0 = scale(cell.x, bw, grid.width);
        let y0 = scale(cell.y, bh, grid.height);
        let x1 = scale(cell.x + cell.w, bw, grid.width).min(bw);
        let y1 = scale(cell.y + cell.h, bh, grid.height).min(bh);
        let [cr, cg, cb] = cell.physiognomy.rgb();

        for y in y0..y1 {
            for x in x0..x1 {
                let on_border = x == x0 || y == y0 || x + 1 == x1 || y + 1 == y1;
                if on_border {
                    out.put_pixel(x, y, GRID_LINE);
                    continue;
                }
                let px = out.get_pixel_mut(x, y);
                px.0 = [blend(px.0[0], cr, alpha), blend(px.0[1], cg, alpha), blend(px.0[2], cb, alpha), 255];
            }
        }
    }
    out
}
