//! Image transforms: the transform contract, type-erased storage with
//! value equality, and ordered composition.

mod decompress;
mod scale;

pub use decompress::DecompressTransform;
pub use scale::{ContentMode, PixelSize, ScaleTransform};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::image::PipelineImage;
use crate::request::ProcessingContext;

/// A pure image-to-image function with a stable identity.
///
/// `None` signals an unrecoverable failure for this image. A transform
/// that decides not to modify its input still returns `Some(unchanged)`;
/// absence is never used to mean "no-op".
pub trait Transform {
    fn process(&self, image: PipelineImage, ctx: &ProcessingContext<'_>) -> Option<PipelineImage>;

    /// Human-readable identifier, stable across runs. Suitable for a
    /// persisted cache key; equality and hashing use the cheaper
    /// structural identity instead.
    fn identifier(&self) -> String;
}

type CustomFn =
    dyn Fn(PipelineImage, &ProcessingContext<'_>) -> Option<PipelineImage> + Send + Sync;

/// An ad-hoc transform wrapping a caller-supplied function.
///
/// Identity is the key alone: two custom transforms with equal keys are
/// considered interchangeable even if their functions differ. Keeping
/// that promise is the caller's responsibility.
#[derive(Clone)]
pub struct CustomTransform {
    key: String,
    func: Arc<CustomFn>,
}

impl CustomTransform {
    pub fn new<F>(key: impl Into<String>, func: F) -> Self
    where
        F: Fn(PipelineImage, &ProcessingContext<'_>) -> Option<PipelineImage>
            + Send
            + Sync
            + 'static,
    {
        Self {
            key: key.into(),
            func: Arc::new(func),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Transform for CustomTransform {
    fn process(&self, image: PipelineImage, ctx: &ProcessingContext<'_>) -> Option<PipelineImage> {
        (self.func)(image, ctx)
    }

    fn identifier(&self) -> String {
        format!("custom?key={}", self.key)
    }
}

impl PartialEq for CustomTransform {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for CustomTransform {}

impl Hash for CustomTransform {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for CustomTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTransform")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// A transform of any known kind, storable in ordered collections and
/// usable as a map key.
///
/// Comparing values of different kinds is always `false`; derived
/// hashing covers the discriminant, so distinct kinds never collide by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageTransform {
    Scale(ScaleTransform),
    Decompress(DecompressTransform),
    Custom(CustomTransform),
}

impl Transform for ImageTransform {
    fn process(&self, image: PipelineImage, ctx: &ProcessingContext<'_>) -> Option<PipelineImage> {
        match self {
            ImageTransform::Scale(t) => t.process(image, ctx),
            ImageTransform::Decompress(t) => t.process(image, ctx),
            ImageTransform::Custom(t) => t.process(image, ctx),
        }
    }

    fn identifier(&self) -> String {
        match self {
            ImageTransform::Scale(t) => t.identifier(),
            ImageTransform::Decompress(t) => t.identifier(),
            ImageTransform::Custom(t) => t.identifier(),
        }
    }
}

impl From<ScaleTransform> for ImageTransform {
    fn from(t: ScaleTransform) -> Self {
        ImageTransform::Scale(t)
    }
}

impl From<DecompressTransform> for ImageTransform {
    fn from(t: DecompressTransform) -> Self {
        ImageTransform::Decompress(t)
    }
}

impl From<CustomTransform> for ImageTransform {
    fn from(t: CustomTransform) -> Self {
        ImageTransform::Custom(t)
    }
}

/// An ordered, identity-comparable chain of transforms.
///
/// The empty chain is valid and acts as the identity function.
#[derive(Debug, Clone, Eq, Default)]
pub struct TransformChain {
    members: Vec<ImageTransform>,
}

impl TransformChain {
    pub fn new(members: Vec<ImageTransform>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[ImageTransform] {
        &self.members
    }

    /// Format-stable string identity, usable in a persisted cache key.
    pub fn cache_key(&self) -> String {
        self.members
            .iter()
            .map(|t| t.identifier())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Transform for TransformChain {
    /// Threads the image through each member in order; the first member
    /// to fail short-circuits the rest of the chain.
    fn process(&self, image: PipelineImage, ctx: &ProcessingContext<'_>) -> Option<PipelineImage> {
        self.members
            .iter()
            .try_fold(image, |img, member| member.process(img, ctx))
    }

    fn identifier(&self) -> String {
        self.cache_key()
    }
}

impl PartialEq for TransformChain {
    fn eq(&self, other: &Self) -> bool {
        // Count check first for cheap rejection; order matters.
        self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(&other.members)
                .all(|(a, b)| a == b)
    }
}

impl Hash for TransformChain {
    // Combines member identities in order; no string building involved.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.members.hash(state);
    }
}

impl FromIterator<ImageTransform> for TransformChain {
    fn from_iter<I: IntoIterator<Item = ImageTransform>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
