use std::path::Path;

use crate::error::{RenderError, Result};
use crate::texture::{Gradient, ScalarField};

/// Reads a `width` x `height` field stored as raw little-endian `f32`,
/// row 0 first.
pub fn load_field(path: impl AsRef<Path>, width: u32, height: u32) -> Result<ScalarField> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(RenderError::InvalidField(format!(
            "{} is {} bytes, not a whole number of f32",
            path.display(),
            bytes.len()
        )));
    }
    let values = bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    log::info!("loaded {}x{} field from {}", width, height, path.display());
    ScalarField::new(width, height, values)
}

/// Writes a field in the format [`load_field`] reads.
pub fn save_field(path: impl AsRef<Path>, field: &ScalarField) -> Result<()> {
    let bytes: Vec<u8> = field
        .values()
        .iter()
        .flat_map(|value| value.to_le_bytes())
        .collect();
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Reads a ramp image; the first row, left to right, becomes the gradient.
pub fn load_gradient(path: impl AsRef<Path>) -> Result<Gradient> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba32f();
    let texels = image
        .rows()
        .next()
        .map(|row| row.map(|pixel| pixel.0).collect())
        .unwrap_or_default();
    log::info!("loaded gradient from {}", path.display());
    Gradient::new(texels)
}
