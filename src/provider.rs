/// Link provider capability contract.
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::Range;

use crate::document::TextDocument;
use crate::errors::ProviderError;

/// A link occurrence as reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    pub range: Range,
    /// Target address, if known without a resolve round-trip.
    pub url: Option<String>,
    /// Opaque payload the provider uses to resolve this link later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RawLink {
    pub fn new(range: Range, url: Option<String>) -> Self {
        Self {
            range,
            url,
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Detects links in a document.
#[tower_lsp::async_trait]
pub trait LinkProvider: Send + Sync {
    /// Stable name used in logs and diagnostic reports.
    fn id(&self) -> &str;

    /// Return the links in `document`, sorted by start and non-overlapping.
    async fn provide_links(
        &self,
        document: &TextDocument,
        token: &CancellationToken,
    ) -> Result<Vec<RawLink>, ProviderError>;

    /// The resolve capability, for providers that fill in targets lazily.
    fn resolver(&self) -> Option<&dyn ResolveLink> {
        None
    }
}

/// Lazily computes a link's target.
#[tower_lsp::async_trait]
pub trait ResolveLink: Send + Sync {
    /// Return a refined link, or `None` if nothing more is known.
    async fn resolve_link(
        &self,
        link: &RawLink,
        token: &CancellationToken,
    ) -> Result<Option<RawLink>, ProviderError>;
}
