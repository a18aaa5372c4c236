//! Rebuilding an image from its fragment dataset
//!
//! The canvas starts as a half-transparent grayscale copy of the original so
//! gaps left by removed or eroded fragments stay visible. Each ledger record
//! then has its rotation undone and its opaque pixels painted at the
//! recorded placement; later records win where fragments overlap.

use crate::geometry::Point;
use crate::geometry::rotation::{restored_offset, rotate_expanded};
use crate::io::configuration::BACKDROP_ALPHA;
use crate::io::error::{Result, WithContext};
use crate::io::image::{load_rgba, save_png};
use crate::io::ledger::{FragmentRecord, read_ledger};
use crate::io::output::RunLayout;
use crate::math::color::luma;
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::{debug, info, warn};

/// Composite produced from a dataset
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Canvas the size of the original image
    pub image: RgbaImage,
    /// Records whose fragment was painted
    pub painted: usize,
    /// Identifiers of records whose fragment image was missing
    pub skipped: Vec<String>,
}

/// Grayscale, half-transparent copy of the original
pub fn backdrop(original: &RgbaImage) -> RgbaImage {
    let (width, height) = original.dimensions();
    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b, _] = original.get_pixel_checked(x, y).map_or([0; 4], |p| p.0);
        let gray = luma([r, g, b]);
        Rgba([gray, gray, gray, BACKDROP_ALPHA])
    })
}

/// Undo a stored fragment's rotation and work out where it goes
///
/// Returns the upright pixels and their top-left position in source
/// coordinates. Undoing the rotation resizes the buffer again, so the stored
/// offset is shifted back by the inverse of the re-centring applied when the
/// fragment was rotated.
pub fn restore_fragment(stored: &RgbaImage, record: &FragmentRecord) -> (RgbaImage, Point<i64>) {
    let upright = rotate_expanded(stored, -record.angle);
    let placement = restored_offset(record.offset, stored.dimensions(), upright.dimensions());
    (upright, placement)
}

/// Copy every pixel with nonzero alpha onto the canvas at `placement`
///
/// Pixels landing outside the canvas are dropped.
pub fn paint_fragment(canvas: &mut RgbaImage, pixels: &RgbaImage, placement: Point<i64>) {
    let (width, height) = canvas.dimensions();
    for (x, y, pixel) in pixels.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        let target_x = placement.x + i64::from(x);
        let target_y = placement.y + i64::from(y);
        let (Ok(tx), Ok(ty)) = (u32::try_from(target_x), u32::try_from(target_y)) else {
            continue;
        };
        if tx < width && ty < height {
            canvas.put_pixel(tx, ty, *pixel);
        }
    }
}

/// Composite every recorded fragment found in `fragment_dir` over the original
///
/// Records whose image file does not exist are skipped with a warning, since
/// datasets routinely miss deliberately removed fragments.
///
/// # Errors
///
/// Returns an error if a fragment image exists but cannot be decoded
pub fn reconstruct(
    original: &RgbaImage,
    fragment_dir: &Path,
    records: &[FragmentRecord],
) -> Result<Reconstruction> {
    let mut image = backdrop(original);
    let mut painted = 0;
    let mut skipped = Vec::new();

    for record in records {
        let path = fragment_dir.join(format!("{}.png", record.id));
        if !path.is_file() {
            warn!(id = %record.id, path = %path.display(), "fragment image missing, skipped");
            skipped.push(record.id.clone());
            continue;
        }
        let stored = load_rgba(&path).in_stage("reconstruction", &path)?;
        let (upright, placement) = restore_fragment(&stored, record);
        paint_fragment(&mut image, &upright, placement);
        painted += 1;
    }

    debug!(painted, skipped = skipped.len(), "fragments composited");
    Ok(Reconstruction {
        image,
        painted,
        skipped,
    })
}

/// Reconstruct a dataset folder and save the composite inside it
///
/// # Errors
///
/// Returns an error if:
/// - The original image or the ledger cannot be read
/// - A fragment image cannot be decoded
/// - The composite cannot be written
pub fn reconstruct_dataset(image_path: &Path, dataset_dir: &Path) -> Result<Reconstruction> {
    let layout = RunLayout::at(dataset_dir);
    let original = load_rgba(image_path).in_stage("reconstruction", image_path)?;
    let records = read_ledger(&layout.ledger_path()).in_stage("reconstruction", dataset_dir)?;

    let reconstruction = reconstruct(&original, &layout.fragments, &records)?;
    let output = layout.reconstruction_path();
    save_png(&reconstruction.image, &output).in_stage("reconstruction", &output)?;
    info!(
        path = %output.display(),
        painted = reconstruction.painted,
        skipped = reconstruction.skipped.len(),
        "reconstruction written"
    );
    Ok(reconstruction)
}
