//! Per-cell fragment extraction
//!
//! Each cell becomes a buffer cropped to the cell's tight bounding box. Member
//! pixels are copied from the source at `(x − min_x, y − min_y)`; the rest of
//! the box stays fully transparent.

use crate::fragment::Fragment;
use crate::geometry::partition::PixelBounds;
use crate::geometry::{Partition, Point, Site, SiteId};
use crate::io::error::{Result, invalid_parameter};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Cut one fragment per site out of `source`
///
/// Fragments come out in site order. A site that owns no pixel yields no
/// fragment.
///
/// # Errors
///
/// Returns an error if the partition and the source image differ in size
pub fn extract_fragments(
    partition: &Partition,
    sites: &[Site],
    source: &RgbaImage,
) -> Result<Vec<Fragment>> {
    check_dimensions(partition, source)?;

    let mut fragments = Vec::with_capacity(sites.len());
    for site in sites {
        let Some(bounds) = partition.bounds(site.id) else {
            debug!(site = %site.id, "site owns no pixels, no fragment extracted");
            continue;
        };

        fragments.push(Fragment {
            cells: vec![site.id],
            anchor: site.position.to_f64(),
            offset: Point::new(i64::from(bounds.min.x), i64::from(bounds.min.y)),
            pixels: render_cells(partition, &[site.id], source, bounds),
            rotation: 0.0,
        });
    }

    Ok(fragments)
}

/// Render the union of `cells` into a transparent buffer covering `bounds`
///
/// Pixels of the listed cells that fall outside `bounds` are ignored.
pub fn render_cells(
    partition: &Partition,
    cells: &[SiteId],
    source: &RgbaImage,
    bounds: PixelBounds,
) -> RgbaImage {
    let mut buffer = RgbaImage::from_pixel(bounds.width(), bounds.height(), Rgba([0, 0, 0, 0]));

    for &cell in cells {
        for pixel in partition.cell(cell) {
            let Some(color) = source.get_pixel_checked(pixel.x, pixel.y) else {
                continue;
            };
            let (Some(local_x), Some(local_y)) = (
                pixel.x.checked_sub(bounds.min.x),
                pixel.y.checked_sub(bounds.min.y),
            ) else {
                continue;
            };
            if local_x < buffer.width() && local_y < buffer.height() {
                buffer.put_pixel(local_x, local_y, *color);
            }
        }
    }

    buffer
}

fn check_dimensions(partition: &Partition, source: &RgbaImage) -> Result<()> {
    let source_size = source.dimensions();
    let grid_size = (partition.width(), partition.height());
    if source_size == grid_size {
        Ok(())
    } else {
        Err(invalid_parameter(
            "source",
            &format!("{}x{}", source_size.0, source_size.1),
            &format!("partition covers {}x{}", grid_size.0, grid_size.1),
        ))
    }
}
