//! Image-transformation layer for image-loading pipelines.
//!
//! Transforms are pure `(image, context) -> Option<image>` functions with
//! a stable identity, composable into an ordered [`TransformChain`] whose
//! identity is usable as a cache-key component. Scaling and one-time
//! bitmap decompression are built in; anything else plugs in through
//! [`CustomTransform`].

pub mod decode;
pub mod image;
pub mod pipeline;
pub mod request;
pub mod transform;

// Re-export commonly used types
pub use image::{Bitmap, DecompressionState, ImageContainer, PipelineImage};
pub use request::{ImageRequest, ProcessingContext};
pub use transform::{
    ContentMode, CustomTransform, DecompressTransform, ImageTransform, PixelSize, ScaleTransform,
    Transform, TransformChain,
};
