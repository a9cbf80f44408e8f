// Rasterizer: turns an ordered list of polygons into an RGBA image
//
// Drawing functions come from imageproc; the alpha compositing on top of
// them is ours, because `draw_polygon_mut` overwrites pixels instead of
// blending them.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

use crate::genes::{Color, Point, Polygon};

/// Every canvas starts out opaque white
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Mask value marking a covered pixel
const COVERED: Luma<u8> = Luma([255]);

/// Render polygons in order onto a white `width x height` canvas
///
/// Later polygons are composited over earlier ones with the Porter-Duff
/// "over" operation, channel by channel:
/// - result_color = src_alpha * src_color + (1 - src_alpha) * dst_color
/// - result_alpha stays 255, since the background is opaque
///
/// Rendering is deterministic: the same polygons always give the same
/// pixels.
pub fn rasterize<'a, I>(width: u32, height: u32, polygons: I) -> RgbaImage
where
    I: IntoIterator<Item = Polygon<'a>>,
{
    let mut img = RgbaImage::from_pixel(width, height, BACKGROUND);
    if width == 0 || height == 0 {
        return img;
    }

    // One coverage mask reused for every translucent polygon. `composite`
    // clears the pixels it consumes, so it is blank again afterwards.
    let mut mask = GrayImage::new(width, height);

    for polygon in polygons {
        if polygon.color.a == 0 {
            continue;
        }

        let outline = outline(polygon.points);
        match outline.as_slice() {
            [] => {}
            // Everything collapsed onto one pixel
            [only] => blend_point(&mut img, *only, polygon.color),
            // Fully opaque: nothing to blend, draw straight onto the canvas
            _ if polygon.color.a == u8::MAX => {
                draw_polygon_mut(&mut img, &outline, Rgba(polygon.color.to_rgba()));
            }
            _ => {
                draw_polygon_mut(&mut mask, &outline, COVERED);
                composite(&mut img, &mut mask, polygon.color);
            }
        }
    }

    img
}

/// Convert points to imageproc's type, dropping repeated vertices
///
/// `draw_polygon_mut` panics when the first and last points are equal, so
/// consecutive duplicates and any closing duplicate are removed first.
fn outline(points: &[Point]) -> Vec<PixelPoint<i32>> {
    let mut outline: Vec<PixelPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let p = PixelPoint::new(p.x, p.y);
        if outline.last() != Some(&p) {
            outline.push(p);
        }
    }
    while outline.len() > 1 && outline.first() == outline.last() {
        outline.pop();
    }
    outline
}

/// Blend every covered mask pixel onto the image, then clear the mask
fn composite(img: &mut RgbaImage, mask: &mut GrayImage, color: Color) {
    for (x, y, coverage) in mask.enumerate_pixels_mut() {
        if coverage.0[0] == 0 {
            continue;
        }
        coverage.0[0] = 0;
        blend(img.get_pixel_mut(x, y), color);
    }
}

fn blend_point(img: &mut RgbaImage, point: PixelPoint<i32>, color: Color) {
    let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
        return;
    };
    if x < img.width() && y < img.height() {
        blend(img.get_pixel_mut(x, y), color);
    }
}

fn blend(dst: &mut Rgba<u8>, color: Color) {
    let src_alpha = color.a as f32 / 255.0;
    let inv_alpha = 1.0 - src_alpha;
    let src = color.to_rgba();

    for channel in 0..3 {
        let mixed = src[channel] as f32 * src_alpha + dst.0[channel] as f32 * inv_alpha;
        dst.0[channel] = mixed as u8;
    }
    dst.0[3] = u8::MAX;
}
