use std::path::Path;

use image::{ExtendedColorType, ImageEncoder};

use crate::error::RenderError;

/// Writes an already-composited RGBA8 buffer (see [`crate::post::composite`])
/// to a PNG file. Kept as the only module that depends on the `image`
/// crate, so the core pipeline never needs to know how the final frame is
/// encoded.
pub fn write_png(path: &Path, rgba: &[u8], cols: usize, rows: usize) -> Result<(), RenderError> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::png::PngEncoder::new(writer);
    encoder.write_image(rgba, cols as u32, rows as u32, ExtendedColorType::Rgba8)?;
    Ok(())
}
