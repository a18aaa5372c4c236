//! Raster rotation with bounding box expansion
//!
//! Rotation is counter-clockwise on screen for positive angles and samples
//! the source by inverse mapping with nearest-neighbour lookup, so every
//! destination pixel is either a copy of a source pixel or transparent. The
//! destination is the smallest box containing the rotated footprint, with
//! the rotated content centred in it.
//!
//! A box that grows or shrinks by an odd amount cannot stay centred on a
//! whole pixel, so re-centring rounds half a pixel one way. Undoing a
//! rotation rounds the other way with [`restored_offset`], keeping a round
//! trip within a pixel of where it started.

use crate::geometry::point::Point;
use image::{Rgba, RgbaImage};

// Extents within this of an integer are treated as that integer, so exact
// quarter turns do not grow the box by a pixel of floating point noise
const EXTENT_SNAP: f64 = 1e-6;

/// Normalise an angle in degrees to `[0, 360)`
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Whether rotating by `degrees` leaves a buffer unchanged
pub fn is_identity(degrees: f64) -> bool {
    normalize_degrees(degrees).abs() < f64::EPSILON
}

/// Size of the box containing a `width`×`height` rectangle rotated by `degrees`
pub fn rotated_dimensions(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    if is_identity(degrees) {
        return (width, height);
    }
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (f64::from(width), f64::from(height));

    let new_width = (w.mul_add(cos, h * sin) - EXTENT_SNAP).ceil().max(1.0);
    let new_height = (w.mul_add(sin, h * cos) - EXTENT_SNAP).ceil().max(1.0);
    (new_width as u32, new_height as u32)
}

/// Rotate an RGBA buffer, expanding it to fit and filling new area transparent
pub fn rotate_expanded(image: &RgbaImage, degrees: f64) -> RgbaImage {
    if is_identity(degrees) {
        return image.clone();
    }

    let (width, height) = image.dimensions();
    let (new_width, new_height) = rotated_dimensions(width, height, degrees);
    let mut rotated = RgbaImage::from_pixel(new_width, new_height, Rgba([0, 0, 0, 0]));

    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin(), radians.cos());
    let source_center = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let target_center = (f64::from(new_width) / 2.0, f64::from(new_height) / 2.0);

    for (x, y, pixel) in rotated.enumerate_pixels_mut() {
        // Destination pixel centre relative to the destination centre
        let dx = f64::from(x) + 0.5 - target_center.0;
        let dy = f64::from(y) + 0.5 - target_center.1;

        // Inverse of the screen-space counter-clockwise rotation
        let sx = dx.mul_add(cos, -(dy * sin)) + source_center.0;
        let sy = dx.mul_add(sin, dy * cos) + source_center.1;

        if sx < 0.0 || sy < 0.0 {
            continue;
        }
        if let Some(source) = image.get_pixel_checked(sx.floor() as u32, sy.floor() as u32) {
            *pixel = *source;
        }
    }

    rotated
}

/// Offset that keeps a re-sized buffer centred on the same screen position
///
/// `new = old − ⌊(new_size − old_size) / 2⌋` componentwise.
pub fn recentered_offset(
    offset: Point<i64>,
    old_size: (u32, u32),
    new_size: (u32, u32),
) -> Point<i64> {
    let grow_x = (i64::from(new_size.0) - i64::from(old_size.0)).div_euclid(2);
    let grow_y = (i64::from(new_size.1) - i64::from(old_size.1)).div_euclid(2);
    Point::new(offset.x - grow_x, offset.y - grow_y)
}

/// Offset of a buffer whose rotation has been undone
///
/// `new = old − ⌈(new_size − old_size) / 2⌉` componentwise, the inverse of
/// [`recentered_offset`]: re-centring from `a` to `b` and restoring from `b`
/// back to `a` returns the starting offset.
pub fn restored_offset(
    offset: Point<i64>,
    stored_size: (u32, u32),
    upright_size: (u32, u32),
) -> Point<i64> {
    let grow_x = i64::from(upright_size.0) - i64::from(stored_size.0);
    let grow_y = i64::from(upright_size.1) - i64::from(stored_size.1);
    Point::new(offset.x - (grow_x + 1).div_euclid(2), offset.y - (grow_y + 1).div_euclid(2))
}
