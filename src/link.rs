/// Link entity: one provider-reported link plus its owning provider.
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Range, Url};
use tracing::debug;

use crate::errors::{ResolveError, ResolveErrorKind};
use crate::provider::{LinkProvider, RawLink};

/// Where a link is in its resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionState {
    Unresolved,
    Resolved(Url),
    Failed(ResolveErrorKind),
}

#[derive(Clone)]
pub struct Link {
    raw: RawLink,
    provider: Arc<dyn LinkProvider>,
    state: ResolutionState,
}

/// The externally visible shape of a link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkView {
    pub range: Range,
    pub url: Option<String>,
}

impl Link {
    pub fn new(raw: RawLink, provider: Arc<dyn LinkProvider>) -> Self {
        Self {
            raw,
            provider,
            state: ResolutionState::Unresolved,
        }
    }

    pub fn range(&self) -> Range {
        self.raw.range
    }

    pub fn url(&self) -> Option<&str> {
        self.raw.url.as_deref()
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub fn view(&self) -> LinkView {
        LinkView {
            range: self.raw.range,
            url: self.raw.url.clone(),
        }
    }

    /// Resolve this link to its target address.
    ///
    /// A link with a url is parsed directly. Otherwise the owning provider is
    /// asked to refine it, and the refined link replaces this one's data.
    /// This repeats until a url appears, the provider makes no progress, or
    /// `max_hops` round-trips have been spent.
    pub async fn resolve(
        &mut self,
        token: &CancellationToken,
        max_hops: usize,
    ) -> Result<Url, ResolveError> {
        if let ResolutionState::Resolved(url) = &self.state {
            return Ok(url.clone());
        }
        let result = self.run_resolution(token, max_hops).await;
        self.state = match &result {
            Ok(url) => ResolutionState::Resolved(url.clone()),
            Err(e) => ResolutionState::Failed(e.kind()),
        };
        result
    }

    async fn run_resolution(
        &mut self,
        token: &CancellationToken,
        max_hops: usize,
    ) -> Result<Url, ResolveError> {
        let mut hops = 0;
        loop {
            if let Some(url) = &self.raw.url {
                return Url::parse(url).map_err(|e| ResolveError::InvalidAddress {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }

            let Some(resolver) = self.provider.resolver() else {
                return Err(ResolveError::MissingTarget);
            };
            if hops == max_hops {
                return Err(ResolveError::TooManyHops(hops));
            }
            hops += 1;

            debug!(provider = self.provider.id(), hop = hops, "link: asking provider to resolve");
            let Some(mut refined) = resolver.resolve_link(&self.raw, token).await? else {
                return Err(ResolveError::MissingTarget);
            };
            // The range was handed out with the link list and stays fixed.
            refined.range = self.raw.range;
            if refined == self.raw {
                return Err(ResolveError::MissingTarget);
            }
            self.raw = refined;
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("range", &self.raw.range)
            .field("url", &self.raw.url)
            .field("provider", &self.provider.id())
            .field("state", &self.state)
            .finish()
    }
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}
