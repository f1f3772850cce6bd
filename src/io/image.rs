//! PNG export of rendered tile images

use crate::io::error::{HypertileError, Result};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Path of the image for `tile_index` inside `image_dir`
pub fn tile_image_path(image_dir: &Path, tile_index: u64) -> PathBuf {
    image_dir.join(format!("tile{tile_index}.png"))
}

/// Save one tile image as PNG, creating the directory if needed
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image cannot
/// be encoded and written
pub fn save_tile_image(image_dir: &Path, tile_index: u64, image: &RgbaImage) -> Result<PathBuf> {
    std::fs::create_dir_all(image_dir).map_err(|e| HypertileError::Persistence {
        path: image_dir.to_path_buf(),
        operation: "create directory",
        source: e,
    })?;

    let path = tile_image_path(image_dir, tile_index);
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|e| HypertileError::ImageExport {
            path: path.clone(),
            source: e,
        })?;
    Ok(path)
}

/// Save a batch of images for consecutive tile indices starting at `first_index`
///
/// Either every image is written or, on failure, the ones already written
/// are removed again before the error is returned.
///
/// # Errors
///
/// Returns the first save failure
pub fn save_tile_images(
    image_dir: &Path,
    first_index: u64,
    images: &[RgbaImage],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(images.len());
    for (offset, image) in images.iter().enumerate() {
        match save_tile_image(image_dir, first_index + offset as u64, image) {
            Ok(path) => written.push(path),
            Err(error) => {
                remove_files(&written);
                return Err(error);
            }
        }
    }
    Ok(written)
}

/// Remove files written by an aborted batch; failures are logged, not raised
pub fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(error) = std::fs::remove_file(path) {
            warn!(path = %path.display(), %error, "failed to remove image of rolled-back tile");
        }
    }
}
