/// DocumentLink provider: aggregates links from all registered providers and
/// resolves their targets on demand.
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tracing::{debug, warn};

use crate::aggregate::{self, TracingSink};
use crate::errors::ResolveError;
use crate::link::Link;
use crate::state::BackendState;

/// LSP `RequestFailed`.
const REQUEST_FAILED: i64 = -32803;

/// Where a returned `DocumentLink` came from, round-tripped through the client.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct LinkData {
    uri: Url,
    version: i32,
    index: usize,
}

/// Run every provider registered for `uri` and fold their links.
///
/// Returns `None` when `uri` is not an open document.
pub(crate) async fn collect(state: &BackendState, uri: &Url) -> Option<(i32, Vec<Link>)> {
    let document = state.document(uri)?;
    let providers = state.providers_for(&document);
    let token = CancellationToken::new();
    // Dropping the request future cancels the token, so blocking work spawned by providers stops too.
    let _guard = token.clone().drop_guard();
    let links = aggregate::get_links(&document, &providers, &token, &TracingSink).await;
    Some((document.version, links))
}

/// Build the `textDocument/documentLink` response for a document.
pub(crate) async fn provide(state: &BackendState, uri: &Url) -> Option<Vec<DocumentLink>> {
    let (version, links) = collect(state, uri).await?;
    let result = links
        .iter()
        .enumerate()
        .map(|(index, link)| to_document_link(uri, version, index, link))
        .collect();
    state.store_links(uri, version, links);
    Some(result)
}

fn to_document_link(uri: &Url, version: i32, index: usize, link: &Link) -> DocumentLink {
    let target = link.url().and_then(|u| Url::parse(u).ok());
    let data = LinkData {
        uri: uri.clone(),
        version,
        index,
    };
    DocumentLink {
        range: link.range(),
        target,
        tooltip: None,
        data: serde_json::to_value(data).ok(),
    }
}

/// Handle `documentLink/resolve`.
pub(crate) async fn resolve(state: &BackendState, mut link: DocumentLink) -> Result<DocumentLink> {
    if link.target.is_some() {
        return Ok(link);
    }
    let Some(data) = link.data.clone() else {
        return Err(Error::invalid_params("document link has no resolve data"));
    };
    let data: LinkData = serde_json::from_value(data)
        .map_err(|e| Error::invalid_params(format!("malformed document link data: {e}")))?;
    let Some(mut cached) = state.cached_link(&data.uri, data.version, data.index) else {
        return Err(Error::invalid_params("document link is out of date"));
    };

    let max_hops = state.settings().max_resolve_hops;
    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();
    let result = cached.resolve(&token, max_hops).await;
    state.update_link(&data.uri, data.version, data.index, cached);

    match result {
        Ok(target) => {
            debug!(uri = %data.uri, index = data.index, target = %target, "document_links: resolved");
            link.target = Some(target);
            Ok(link)
        }
        Err(e) => {
            warn!(uri = %data.uri, index = data.index, error = %e, "document_links: resolve failed");
            Err(request_failed(&e))
        }
    }
}

fn request_failed(error: &ResolveError) -> Error {
    Error {
        code: ErrorCode::ServerError(REQUEST_FAILED),
        message: error.to_string().into(),
        data: Some(serde_json::json!({ "kind": format!("{:?}", error.kind()) })),
    }
}
