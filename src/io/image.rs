//! Image loading and PNG export

use crate::io::error::{FragmentationError, Result, file_system_error};
use image::RgbaImage;
use std::path::Path;

/// Load any supported image format as 8-bit RGBA
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| FragmentationError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(img.to_rgba8())
}

/// Save an RGBA buffer as PNG, creating the parent directory if needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the specified path
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| file_system_error(parent, "create directory", e))?;
        }
    }

    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| FragmentationError::ImageExport {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Whether a path carries one of the given extensions, ignoring case
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
