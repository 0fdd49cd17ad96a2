//! Boundary to the decode backend.

use anyhow::{Context, Result};
use imageproc::image::load_from_memory;

use crate::image::PipelineImage;

/// Decode image bytes into a pipeline image.
///
/// Wraps the image crate's load_from_memory; the result starts in the
/// `Needed` decompression state like any bitmap that has not yet been
/// normalized.
pub fn decode(data: &[u8]) -> Result<PipelineImage> {
    let bitmap = load_from_memory(data).context("Failed to decode image bytes")?;
    Ok(PipelineImage::new(bitmap))
}
