//! The request being processed and the per-invocation context handed to
//! transforms.

use crate::image::ImageContainer;
use crate::transform::PixelSize;

/// The load request an image belongs to. Opaque to transforms; the
/// target-size hint is consumed by the caller when configuring a scale
/// transform, not parsed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRequest {
    url: String,
    target_hint: Option<PixelSize>,
}

impl ImageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target_hint: None,
        }
    }

    pub fn with_target_hint(mut self, target: PixelSize) -> Self {
        self.target_hint = Some(target);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn target_hint(&self) -> Option<PixelSize> {
        self.target_hint
    }
}

/// Immutable context for a single `process` call, built fresh per
/// invocation and discarded right after.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingContext<'a> {
    pub request: &'a ImageRequest,
    /// Whether this is the last decode pass of a progressive load.
    pub is_final: bool,
    /// 1-based progressive scan index, if any.
    pub scan_number: Option<u32>,
}

impl<'a> ProcessingContext<'a> {
    pub fn new(request: &'a ImageRequest, is_final: bool, scan_number: Option<u32>) -> Self {
        Self {
            request,
            is_final,
            scan_number,
        }
    }

    pub fn for_container(request: &'a ImageRequest, container: &ImageContainer) -> Self {
        Self::new(request, container.is_final, container.scan_number)
    }
}
