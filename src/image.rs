//! Bitmap currency of the pipeline: the decompression-state wrapper and
//! the progressive-decode container.

use imageproc::image::{DynamicImage, GenericImageView};

/// Opaque bitmap handle produced by the decode backend.
pub type Bitmap = DynamicImage;

/// Whether a bitmap has been normalized into its directly-drawable layout.
///
/// Any bitmap that did not come out of a decompression pass is assumed to
/// still need normalization, including the output of structural transforms
/// like scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompressionState {
    #[default]
    Needed,
    Done,
}

/// A bitmap plus its decompression state.
///
/// The state travels with the image through the pipeline instead of being
/// attached out-of-band to the bitmap object. It is deliberately excluded
/// from equality: two images with the same pixels compare equal regardless
/// of whether either has been decompressed yet.
#[derive(Debug, Clone)]
pub struct PipelineImage {
    bitmap: Bitmap,
    state: DecompressionState,
}

impl PipelineImage {
    /// Wrap a freshly produced bitmap; it starts in the `Needed` state.
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            state: DecompressionState::default(),
        }
    }

    pub fn with_state(bitmap: Bitmap, state: DecompressionState) -> Self {
        Self { bitmap, state }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }

    /// Width and height in device pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }

    pub fn has_alpha(&self) -> bool {
        self.bitmap.color().has_alpha()
    }

    pub fn state(&self) -> DecompressionState {
        self.state
    }

    pub fn is_decompressed(&self) -> bool {
        self.state == DecompressionState::Done
    }
}

impl PartialEq for PipelineImage {
    // Pixel data only; the decompression state is not part of image identity.
    fn eq(&self, other: &Self) -> bool {
        self.bitmap.dimensions() == other.bitmap.dimensions()
            && self.bitmap.color() == other.bitmap.color()
            && self.bitmap.as_bytes() == other.bitmap.as_bytes()
    }
}

impl From<Bitmap> for PipelineImage {
    fn from(bitmap: Bitmap) -> Self {
        Self::new(bitmap)
    }
}

/// One decode pass of a (possibly progressive) image load.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContainer {
    pub image: PipelineImage,
    /// Whether this is the last, highest-quality decode pass.
    pub is_final: bool,
    /// 1-based progressive scan index; `None` for non-progressive sources.
    pub scan_number: Option<u32>,
}

impl ImageContainer {
    /// A container for a non-progressive, final image.
    pub fn new(image: PipelineImage) -> Self {
        Self {
            image,
            is_final: true,
            scan_number: None,
        }
    }

    /// A container for one scan of a progressive load.
    pub fn progressive(image: PipelineImage, scan_number: u32, is_final: bool) -> Self {
        Self {
            image,
            is_final,
            scan_number: Some(scan_number),
        }
    }
}
