/// Collect links from every provider for a document and fold them into one
/// ordered, non-overlapping list.
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::document::TextDocument;
use crate::errors::ProviderError;
use crate::link::Link;
use crate::merge::merge;
use crate::provider::{LinkProvider, RawLink};
use crate::range::{compare_starts, intersects_or_touches};

/// Receives provider failures that must not abort aggregation.
pub trait ErrorSink: Send + Sync {
    fn report(&self, provider: &str, error: &ProviderError);
}

/// Logs unexpected provider failures.
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, provider: &str, error: &ProviderError) {
        warn!(provider, error = %error, "aggregate: link provider failed");
    }
}

/// Query all `providers` concurrently and merge their links.
///
/// `providers` is most dominant first, as returned by
/// `ProviderRegistry::providers_for`. Results are folded least dominant
/// first, so a more dominant provider's link replaces any overlapping link
/// from a less dominant one no matter which call finishes first.
pub async fn get_links(
    document: &TextDocument,
    providers: &[Arc<dyn LinkProvider>],
    token: &CancellationToken,
    sink: &dyn ErrorSink,
) -> Vec<Link> {
    let calls = providers.iter().rev().map(|provider| {
        // Building the future may panic too, so the call itself runs inside the guard.
        let call =
            AssertUnwindSafe(async move { provider.provide_links(document, token).await })
                .catch_unwind();
        async move {
            let result = call.await.unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ProviderError::Panicked(message))
            });
            (provider, result)
        }
    });
    let results = join_all(calls).await;

    let mut links = Vec::new();
    for (provider, result) in results {
        match result {
            Ok(raw) => {
                let new_links = normalize(provider.id(), raw)
                    .into_iter()
                    .map(|r| Link::new(r, provider.clone()))
                    .collect();
                links = merge(links, new_links);
            }
            Err(ProviderError::Cancelled) => {
                debug!(provider = provider.id(), "aggregate: provider call cancelled");
            }
            Err(e) => sink.report(provider.id(), &e),
        }
    }

    debug!(uri = %document.uri, count = links.len(), "aggregate: links computed");
    links
}

/// Sort a provider's links by start and drop any that overlap an earlier one.
fn normalize(provider: &str, mut raw: Vec<RawLink>) -> Vec<RawLink> {
    raw.sort_by(|a, b| compare_starts(&a.range, &b.range));
    let mut out: Vec<RawLink> = Vec::with_capacity(raw.len());
    for link in raw {
        if let Some(prev) = out.last() {
            if intersects_or_touches(&prev.range, &link.range) {
                debug!(provider, range = ?link.range, "aggregate: dropping overlapping link");
                continue;
            }
        }
        out.push(link);
    }
    out
}
