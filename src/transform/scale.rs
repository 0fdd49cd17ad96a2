//! Aspect-ratio-preserving scaling backed by fast_image_resize.

use std::fmt;

use fast_image_resize as fr;
use imageproc::image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::Transform;
use crate::image::{Bitmap, PipelineImage};
use crate::request::ProcessingContext;

/// A size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    /// Sentinel that disables resizing altogether.
    pub const MAX: PixelSize = PixelSize {
        width: u32::MAX,
        height: u32::MAX,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel size for a display surface given its point size and device
    /// pixel ratio.
    pub fn from_points(width_pts: f32, height_pts: f32, pixel_ratio: f32) -> Self {
        Self {
            width: (width_pts * pixel_ratio).round() as u32,
            height: (height_pts * pixel_ratio).round() as u32,
        }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == PixelSize::MAX {
            f.write_str("max")
        } else {
            write!(f, "{}x{}", self.width, self.height)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentMode {
    /// Cover the target entirely; overflow is the caller's to clip.
    Fill,
    /// Stay contained within the target; may leave blank margins.
    Fit,
}

impl ContentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentMode::Fill => "fill",
            ContentMode::Fit => "fit",
        }
    }
}

/// Scales an image to a target size, preserving aspect ratio.
///
/// Never enlarges the source unless `upscale` is requested. All three
/// parameters participate in identity; two scale transforms differing
/// only in `upscale` produce different output and must not collide in a
/// cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaleTransform {
    target: PixelSize,
    mode: ContentMode,
    upscale: bool,
}

impl ScaleTransform {
    pub fn new(target: PixelSize, mode: ContentMode) -> Self {
        Self {
            target,
            mode,
            upscale: false,
        }
    }

    pub fn with_upscale(mut self, upscale: bool) -> Self {
        self.upscale = upscale;
        self
    }

    pub fn target(&self) -> PixelSize {
        self.target
    }

    pub fn mode(&self) -> ContentMode {
        self.mode
    }

    pub fn upscale(&self) -> bool {
        self.upscale
    }

    fn effective_scale(&self, width: u32, height: u32) -> f32 {
        let scale_h = self.target.width as f32 / width as f32;
        let scale_v = self.target.height as f32 / height as f32;
        let raw = match self.mode {
            ContentMode::Fill => scale_h.max(scale_v),
            ContentMode::Fit => scale_h.min(scale_v),
        };
        if self.upscale {
            raw
        } else {
            raw.min(1.0)
        }
    }
}

impl Transform for ScaleTransform {
    /// Failure here is soft: a source without usable pixels or a failed
    /// resample passes the original image through unchanged, on the
    /// principle that an unscaled image beats no image.
    fn process(&self, image: PipelineImage, _ctx: &ProcessingContext<'_>) -> Option<PipelineImage> {
        if self.target == PixelSize::MAX {
            return Some(image);
        }

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || self.target.width == 0 || self.target.height == 0 {
            log::warn!(
                "scale skipped, degenerate dimensions: {}x{} -> {}",
                width,
                height,
                self.target
            );
            return Some(image);
        }

        let scale = self.effective_scale(width, height);
        let dst_width = (scale * width as f32).round() as u32;
        let dst_height = (scale * height as f32).round() as u32;
        if (dst_width, dst_height) == (width, height) {
            return Some(image);
        }

        log::trace!("scaling {width}x{height} -> {dst_width}x{dst_height}");
        match resample(image.bitmap(), dst_width, dst_height, scale) {
            // Structural alteration: the output needs decompression again.
            Ok(bitmap) => Some(PipelineImage::new(bitmap)),
            Err(e) => {
                log::warn!("resample failed, passing image through: {e:#}");
                Some(image)
            }
        }
    }

    fn identifier(&self) -> String {
        format!(
            "scale?size={},mode={},upscale={}",
            self.target,
            self.mode.as_str(),
            self.upscale
        )
    }
}

/// Resample `src` into a new bitmap of the given size.
///
/// Opaque sources go through a 3-channel layout; sources with alpha go
/// through 4-channel with premultiply before and divide after, which
/// avoids dark fringing on translucent edges.
fn resample(src: &Bitmap, dst_width: u32, dst_height: u32, scale: f32) -> anyhow::Result<Bitmap> {
    let (width, height) = src.dimensions();
    let has_alpha = src.color().has_alpha();

    let (pixel_type, src_pixels) = if has_alpha {
        (fr::PixelType::U8x4, src.to_rgba8().into_raw())
    } else {
        (fr::PixelType::U8x3, src.to_rgb8().into_raw())
    };

    let mut src_image = fr::images::Image::from_vec_u8(width, height, src_pixels, pixel_type)?;
    let mut dst_image = fr::images::Image::new(dst_width, dst_height, pixel_type);

    let mul_div = fr::MulDiv::default();
    if has_alpha {
        mul_div.multiply_alpha_inplace(&mut src_image)?;
    }

    // Lanczos3 preserves detail when downscaling; CatmullRom is smoother
    // when upscaling.
    let algorithm = if scale < 1.0 {
        fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3)
    } else {
        fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom)
    };

    let mut resizer = fr::Resizer::new();
    resizer.resize(
        &src_image,
        &mut dst_image,
        Some(&fr::ResizeOptions::new().resize_alg(algorithm)),
    )?;

    if has_alpha {
        mul_div.divide_alpha_inplace(&mut dst_image)?;
    }

    // Release the source buffer before converting the destination.
    drop(src_image);

    let pixels = dst_image.into_vec();
    let bitmap = if has_alpha {
        RgbaImage::from_raw(dst_width, dst_height, pixels).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(dst_width, dst_height, pixels).map(DynamicImage::ImageRgb8)
    };

    bitmap.ok_or_else(|| anyhow::anyhow!("resampled buffer does not fit {dst_width}x{dst_height}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DecompressionState;
    use crate::request::ImageRequest;
    use imageproc::image::{GrayImage, Rgb, Rgba};

    fn rgb_image(width: u32, height: u32) -> PipelineImage {
        PipelineImage::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([100, 150, 200]),
        )))
    }

    fn rgba_image(width: u32, height: u32) -> PipelineImage {
        PipelineImage::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([100, 150, 200, 128]),
        )))
    }

    fn process(transform: ScaleTransform, image: PipelineImage) -> PipelineImage {
        let req = ImageRequest::new("https://example.com/image.jpg");
        let ctx = ProcessingContext::new(&req, true, None);
        transform.process(image, &ctx).unwrap()
    }

    #[test]
    fn fit_scales_to_contain_target() {
        let out = process(
            ScaleTransform::new(PixelSize::new(500, 500), ContentMode::Fit),
            rgb_image(1000, 500),
        );
        assert_eq!(out.dimensions(), (500, 250));
    }

    #[test]
    fn fill_scales_to_cover_target() {
        // max(0.5, 1.0) = 1.0, already capped: output unchanged.
        let out = process(
            ScaleTransform::new(PixelSize::new(500, 500), ContentMode::Fill),
            rgb_image(1000, 500),
        );
        assert_eq!(out.dimensions(), (1000, 500));
    }

    #[test]
    fn never_enlarges_without_upscale() {
        let out = process(
            ScaleTransform::new(PixelSize::new(500, 500), ContentMode::Fit),
            rgb_image(100, 100),
        );
        assert_eq!(out.dimensions(), (100, 100));
    }

    #[test]
    fn upscale_enlarges_when_requested() {
        let out = process(
            ScaleTransform::new(PixelSize::new(500, 500), ContentMode::Fit).with_upscale(true),
            rgb_image(100, 100),
        );
        assert_eq!(out.dimensions(), (500, 500));
    }

    #[test]
    fn max_sentinel_disables_resizing() {
        let img = rgb_image(1000, 500);
        let out = process(
            ScaleTransform::new(PixelSize::MAX, ContentMode::Fit),
            img.clone(),
        );
        assert_eq!(out, img);
    }

    #[test]
    fn degenerate_source_passes_through() {
        let img = PipelineImage::new(DynamicImage::ImageRgb8(
            RgbImage::from_raw(0, 0, Vec::new()).unwrap(),
        ));
        let out = process(
            ScaleTransform::new(PixelSize::new(500, 500), ContentMode::Fit),
            img.clone(),
        );
        assert_eq!(out, img);
    }

    #[test]
    fn zero_target_passes_through() {
        let img = rgb_image(100, 100);
        let out = process(
            ScaleTransform::new(PixelSize::new(0, 500), ContentMode::Fit),
            img.clone(),
        );
        assert_eq!(out, img);
    }

    #[test]
    fn opaque_source_stays_opaque() {
        let gray = PipelineImage::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            400,
            400,
            imageproc::image::Luma([90]),
        )));
        let out = process(
            ScaleTransform::new(PixelSize::new(200, 200), ContentMode::Fit),
            gray,
        );
        assert!(!out.has_alpha());
        assert_eq!(out.dimensions(), (200, 200));
    }

    #[test]
    fn alpha_source_keeps_alpha() {
        let out = process(
            ScaleTransform::new(PixelSize::new(200, 200), ContentMode::Fit),
            rgba_image(400, 400),
        );
        assert!(out.has_alpha());
        assert_eq!(out.dimensions(), (200, 200));
    }

    #[test]
    fn scaled_output_needs_decompression_again() {
        let done = PipelineImage::with_state(
            rgb_image(400, 400).into_bitmap(),
            DecompressionState::Done,
        );
        let out = process(
            ScaleTransform::new(PixelSize::new(200, 200), ContentMode::Fit),
            done,
        );
        assert_eq!(out.state(), DecompressionState::Needed);
    }

    #[test]
    fn identity_includes_all_parameters() {
        let base = ScaleTransform::new(PixelSize::new(500, 500), ContentMode::Fit);
        assert_ne!(base, base.with_upscale(true));
        assert_ne!(
            base,
            ScaleTransform::new(PixelSize::new(500, 500), ContentMode::Fill)
        );
        assert_ne!(
            base,
            ScaleTransform::new(PixelSize::new(500, 501), ContentMode::Fit)
        );
    }

    #[test]
    fn pixel_size_from_points_applies_ratio() {
        assert_eq!(
            PixelSize::from_points(200.0, 100.5, 2.0),
            PixelSize::new(400, 201)
        );
    }
}
