//! torget-image: pure photo rescaling.
//!
//! No I/O and no clocks; the same input bytes and width always produce the
//! same output bytes, so responses are safe to cache.

use std::io::Cursor;

use image::imageops::FilterType;
use image::ImageFormat;
use torget_core::{Error, Result};

/// Rescale photo bytes to fit a square bounding box of `target_width`.
///
/// A `target_width` of 0 means "original": the input bytes are returned
/// unchanged without being decoded. Otherwise the image is decoded, resized
/// so its longer side equals `target_width` (aspect ratio preserved,
/// upscaling included), and re-encoded as JPEG.
pub fn render(data: &[u8], target_width: u32) -> Result<Vec<u8>> {
    if target_width == 0 {
        return Ok(data.to_vec());
    }

    let img = image::load_from_memory(data)
        .map_err(|e| Error::Decode(format!("unreadable image: {e}")))?;

    let resized = img.resize(target_width, target_width, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| Error::Decode(format!("jpeg encode: {e}")))?;

    Ok(out.into_inner())
}

/// Sniff the content type of original photo bytes from their magic numbers.
///
/// Used when serving unscaled photos, where the stored bytes go out as-is.
pub fn content_type(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        _ => "application/octet-stream",
    }
}
