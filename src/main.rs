use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod commands;
mod config;
mod document;
mod document_links;
mod errors;
mod link;
mod merge;
mod provider;
mod providers;
mod range;
mod registry;
mod server;
mod state;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(server::LinkLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
