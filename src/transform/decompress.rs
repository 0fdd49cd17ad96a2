//! One-time normalization of a bitmap into its directly-drawable layout.

use imageproc::image::DynamicImage;

use super::Transform;
use crate::image::{Bitmap, DecompressionState, PipelineImage};
use crate::request::ProcessingContext;

/// Ensures a bitmap is in the canonical 8-bit layout before later use,
/// at most once per image instance.
///
/// Decoding large compressed formats can leave a bitmap in a form that
/// is expensive to draw; normalizing it off the rendering path avoids
/// stutter later. Carries no parameters, so all instances are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DecompressTransform;

impl Transform for DecompressTransform {
    fn process(&self, image: PipelineImage, _ctx: &ProcessingContext<'_>) -> Option<PipelineImage> {
        if image.is_decompressed() {
            return Some(image);
        }

        let (width, height) = image.dimensions();
        log::trace!("decompressing {width}x{height} bitmap");
        let bitmap = normalize(image.into_bitmap());
        Some(PipelineImage::with_state(bitmap, DecompressionState::Done))
    }

    fn identifier(&self) -> String {
        "decompress".to_string()
    }
}

/// Canonical layout: 8-bit RGB for opaque sources, 8-bit RGBA otherwise.
fn normalize(bitmap: Bitmap) -> Bitmap {
    match bitmap {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => bitmap,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ImageRequest;
    use imageproc::image::{GrayImage, Luma};

    fn gray(width: u32, height: u32) -> PipelineImage {
        PipelineImage::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            width,
            height,
            Luma([90]),
        )))
    }

    #[test]
    fn marks_image_done_and_normalizes_layout() {
        let req = ImageRequest::new("https://example.com/image.jpg");
        let ctx = ProcessingContext::new(&req, true, None);

        let out = DecompressTransform.process(gray(6, 6), &ctx).unwrap();
        assert_eq!(out.state(), DecompressionState::Done);
        assert!(matches!(out.bitmap(), DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn second_application_is_a_no_op() {
        let req = ImageRequest::new("https://example.com/image.jpg");
        let ctx = ProcessingContext::new(&req, true, None);

        let once = DecompressTransform.process(gray(6, 6), &ctx).unwrap();
        let twice = DecompressTransform.process(once.clone(), &ctx).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.state(), DecompressionState::Done);
    }

    #[test]
    fn all_instances_are_equal() {
        assert_eq!(DecompressTransform, DecompressTransform);
        assert_eq!(DecompressTransform.identifier(), "decompress");
    }
}
