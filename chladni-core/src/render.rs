//! Rasterizes a contour into square line art and writes it as PNG.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::contour::{Contour, Point};
use crate::error::Result;

/// Line colour of the figure.
pub const LINE_COLOR: Rgba<u8> = Rgba([0x1f, 0x77, 0xb4, 0xff]);
const BACKGROUND: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
/// Stroke width in pixels.
pub const LINE_WIDTH: f64 = 2.0;
/// Blank border around the plate as a fraction of the image side.
const MARGIN: f64 = 0.02;

/// Draws the contour on a white `size_px × size_px` canvas.
///
/// The plate fills the canvas apart from a thin border, with `y` pointing
/// up. There are no axes, ticks or labels.
pub fn render_contour(contour: &Contour, size_px: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(size_px, size_px, BACKGROUND);
    if size_px == 0 || contour.side_length <= 0.0 {
        return img;
    }

    let side = size_px as f64;
    let inner = side * (1.0 - 2.0 * MARGIN);
    let to_pixel = |p: &Point| {
        let u = p.x / contour.side_length;
        let v = p.y / contour.side_length;
        (side * MARGIN + u * inner, side * MARGIN + (1.0 - v) * inner)
    };

    for line in &contour.polylines {
        for pair in line.windows(2) {
            draw_segment(&mut img, to_pixel(&pair[0]), to_pixel(&pair[1]));
        }
    }
    img
}

/// Renders the contour and encodes it as PNG bytes.
pub fn encode_png(contour: &Contour, size_px: u32) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    render_contour(contour, size_px).write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Renders the contour and writes it to a PNG file.
pub fn save_png(contour: &Contour, path: impl AsRef<Path>, size_px: u32) -> Result<()> {
    std::fs::write(path, encode_png(contour, size_px)?)?;
    Ok(())
}

/// Stamps round brushes along a segment every half pixel.
fn draw_segment(img: &mut RgbaImage, from: (f64, f64), to: (f64, f64)) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = ((dx.hypot(dy) * 2.0).ceil() as usize).max(1);
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        stamp(img, from.0 + t * dx, from.1 + t * dy);
    }
}

fn stamp(img: &mut RgbaImage, cx: f64, cy: f64) {
    let radius = LINE_WIDTH / 2.0;
    let (w, h) = (img.width() as i64, img.height() as i64);
    let x0 = (cx - radius).floor() as i64;
    let x1 = (cx + radius).ceil() as i64;
    let y0 = (cy - radius).floor() as i64;
    let y1 = (cy + radius).ceil() as i64;
    for y in y0.max(0)..=y1.min(h - 1) {
        for x in x0.max(0)..=x1.min(w - 1) {
            // Distance from the pixel centre to the brush centre.
            let (px, py) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
            if px * px + py * py <= radius * radius {
                img.put_pixel(x as u32, y as u32, LINE_COLOR);
            }
        }
    }
}
