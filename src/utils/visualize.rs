//! Image grid helpers for previews and latent space sweeps

use std::path::Path;

use tch::{Device, Kind, Tensor};
use tracing::debug;

use crate::error::{Error, Result};

/// Tile `rows * cols` images into a single image
///
/// # Arguments
///
/// * `images` - Tensor of shape (rows * cols, channels, height, width)
///
/// # Returns
///
/// Tensor of shape (channels, rows * height, cols * width), filled row by row
pub fn tile_images(images: &Tensor, rows: i64, cols: i64) -> Result<Tensor> {
    let size = images.size();
    if size.len() != 4 {
        return Err(Error::mismatch("image tensor rank", 4, size.len()));
    }

    let (n, c, h, w) = (size[0], size[1], size[2], size[3]);
    if n != rows * cols {
        return Err(Error::mismatch(
            "grid cells",
            (rows * cols).max(0) as usize,
            n as usize,
        ));
    }

    Ok(images
        .reshape([rows, cols, c, h, w])
        .permute([2, 0, 3, 1, 4])
        .reshape([c, rows * h, cols * w]))
}

/// Tile images in `[0, 1]` and write them as an 8-bit image file
///
/// The format follows the file extension (png, jpg).
pub fn save_grid<P: AsRef<Path>>(images: &Tensor, rows: i64, cols: i64, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let grid = tile_images(&images.to_device(Device::Cpu), rows, cols)?;
    let grid = (grid * 255.0).clamp(0.0, 255.0).to_kind(Kind::Uint8);

    tch::vision::image::save(&grid, path)?;
    debug!("Wrote {}x{} image grid to {}", rows, cols, path.display());
    Ok(())
}
