//! PNG export of a rendered frame (feature `screenshot`).

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::ppu::{NES_HEIGHT, NES_WIDTH};

/// Convert a packed 0x00RRGGBB frame into an RGB image. Missing pixels are black.
pub fn to_image(frame: &[u32]) -> RgbImage {
    RgbImage::from_fn(NES_WIDTH as u32, NES_HEIGHT as u32, |x, y| {
        let pixel = frame
            .get(y as usize * NES_WIDTH + x as usize)
            .copied()
            .unwrap_or(0);
        Rgb([(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8])
    })
}

pub fn save_png<P: AsRef<Path>>(frame: &[u32], path: P) -> Result<(), image::ImageError> {
    let path = path.as_ref();
    to_image(frame).save_with_format(path, ImageFormat::Png)?;
    log::info!("screenshot written to {}", path.display());
    Ok(())
}
