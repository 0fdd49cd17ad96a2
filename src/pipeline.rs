//! Applying a transform chain to decoded images.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::image::{ImageContainer, PipelineImage};
use crate::request::{ImageRequest, ProcessingContext};
use crate::transform::{Transform, TransformChain};

/// Run the chain over one decode pass. A fresh context is built for the
/// call and dropped right after; `None` means no usable image could be
/// produced.
pub fn process_container(
    chain: &TransformChain,
    request: &ImageRequest,
    container: ImageContainer,
) -> Option<PipelineImage> {
    let ctx = ProcessingContext::for_container(request, &container);
    log::trace!(
        "applying {} transform(s) to {} (final: {}, scan: {:?})",
        chain.len(),
        request.url(),
        ctx.is_final,
        ctx.scan_number,
    );
    chain.process(container.image, &ctx)
}

/// Run the chain over a batch of containers in parallel. Transforms hold
/// no mutable state, so one chain is shared across worker threads; each
/// container still flows through the chain alone. Results keep the input
/// order.
pub fn process_batch(
    chain: &TransformChain,
    request: &ImageRequest,
    containers: Vec<ImageContainer>,
) -> Vec<Option<PipelineImage>> {
    log::debug!(
        "processing {} container(s) with {} thread(s)",
        containers.len(),
        rayon::current_num_threads()
    );

    containers
        .into_par_iter()
        .map(|container| process_container(chain, request, container))
        .collect()
}
