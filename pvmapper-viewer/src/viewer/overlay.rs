//! Detection overlay drawn onto rendered frames.

use image::{Rgb, RgbImage};
use pvmapper_core::Quadrilateral;

/// Outline color of the detection quadrilateral.
pub const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Outline width in pixels.
pub const OVERLAY_STROKE: u32 = 3;

/// Draws the closed outline of `quad` onto `image`.
///
/// Parts of the outline outside the image are clipped.
pub fn draw_quadrilateral(image: &mut RgbImage, quad: &Quadrilateral, color: Rgb<u8>, stroke: u32) {
    for (from, to) in quad.edges() {
        draw_line(image, from, to, color, stroke);
    }
}

/// Bresenham line with a square pen of width `stroke`.
fn draw_line(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>, stroke: u32) {
    let (mut x, mut y) = (i64::from(from.0), i64::from(from.1));
    let (x1, y1) = (i64::from(to.0), i64::from(to.1));
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        stamp(image, x, y, color, stroke);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn stamp(image: &mut RgbImage, cx: i64, cy: i64, color: Rgb<u8>, stroke: u32) {
    let stroke = i64::from(stroke.max(1));
    let lo = -(stroke - 1) / 2;
    let hi = stroke / 2;
    for y in (cy + lo)..=(cy + hi) {
        for x in (cx + lo)..=(cx + hi) {
            if let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y)) {
                if px < image.width() && py < image.height() {
                    image.put_pixel(px, py, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_is_closed() {
        let mut image = RgbImage::new(20, 20);
        let quad = Quadrilateral::new([(2, 2), (12, 2), (12, 12), (2, 12)]);
        draw_quadrilateral(&mut image, &quad, OVERLAY_COLOR, 1);

        for &(x, y) in quad.points() {
            assert_eq!(*image.get_pixel(x as u32, y as u32), OVERLAY_COLOR);
        }
        assert_eq!(*image.get_pixel(7, 2), OVERLAY_COLOR);
        assert_eq!(*image.get_pixel(2, 7), OVERLAY_COLOR);
        assert_eq!(*image.get_pixel(7, 7), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_stroke_width() {
        let mut image = RgbImage::new(20, 20);
        let quad = Quadrilateral::new([(5, 5), (15, 5), (15, 15), (5, 15)]);
        draw_quadrilateral(&mut image, &quad, OVERLAY_COLOR, 3);
        assert_eq!(*image.get_pixel(10, 4), OVERLAY_COLOR);
        assert_eq!(*image.get_pixel(10, 6), OVERLAY_COLOR);
        assert_eq!(*image.get_pixel(10, 7), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_outline_outside_image_is_clipped() {
        let mut image = RgbImage::new(4, 4);
        let quad = Quadrilateral::new([(-10, -10), (30, -10), (30, 2), (-10, 2)]);
        draw_quadrilateral(&mut image, &quad, OVERLAY_COLOR, 1);
        assert_eq!(*image.get_pixel(1, 2), OVERLAY_COLOR);
        assert_eq!(*image.get_pixel(1, 1), Rgb([0, 0, 0]));
    }
}
