use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tracing::debug;

use crate::document_links;
use crate::link::LinkView;
use crate::state::BackendState;

pub const EXECUTE_LINK_PROVIDER: &str = "doclinks.executeLinkProvider";

/// Execute a custom workspace command.
pub async fn execute(
    client: &Client,
    state: &BackendState,
    params: &ExecuteCommandParams,
) -> Result<Option<serde_json::Value>> {
    match params.command.as_str() {
        EXECUTE_LINK_PROVIDER => Ok(execute_link_provider(state, &params.arguments).await),
        _ => {
            client
                .log_message(
                    MessageType::WARNING,
                    format!("Unknown command: {}", params.command),
                )
                .await;
            Ok(None)
        }
    }
}

/// Compute the link list for the document named by `args[0]`.
///
/// Yields `None` when the argument is not a URI or names no open document.
async fn execute_link_provider(
    state: &BackendState,
    args: &[serde_json::Value],
) -> Option<serde_json::Value> {
    let uri = args
        .first()
        .and_then(|v| v.as_str())
        .and_then(|s| Url::parse(s).ok());
    let Some(uri) = uri else {
        debug!(args = ?args, "commands: executeLinkProvider without a document URI");
        return None;
    };
    let (_, links) = document_links::collect(state, &uri).await?;
    let views: Vec<LinkView> = links.iter().map(|l| l.view()).collect();
    serde_json::to_value(views).ok()
}
