use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::commands;
use crate::config::LinkSettings;
use crate::document::TextDocument;
use crate::state::BackendState;

pub struct LinkLanguageServer {
    client: Client,
    state: BackendState,
}

impl LinkLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            state: BackendState::new(),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for LinkLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Workspace root from the first folder, else rootUri
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| &folder.uri)
            .or(params.root_uri.as_ref())
            .and_then(|uri| uri.to_file_path().ok());
        let settings = LinkSettings::from_options(params.initialization_options.as_ref());
        self.state.configure(root, settings);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                document_link_provider: Some(DocumentLinkOptions {
                    resolve_provider: Some(true),
                    work_done_progress_options: Default::default(),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![commands::EXECUTE_LINK_PROVIDER.into()],
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "doclinks LSP initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.state.documents.insert(
            doc.uri.clone(),
            TextDocument::new(doc.uri, doc.language_id, doc.version, &doc.text),
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(mut doc) = self.state.documents.get_mut(&uri) {
            doc.apply_changes(params.text_document.version, params.content_changes);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.state.close_document(&params.text_document.uri);
    }

    async fn document_link(&self, params: DocumentLinkParams) -> Result<Option<Vec<DocumentLink>>> {
        Ok(crate::document_links::provide(&self.state, &params.text_document.uri).await)
    }

    async fn document_link_resolve(&self, params: DocumentLink) -> Result<DocumentLink> {
        crate::document_links::resolve(&self.state, params).await
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<serde_json::Value>> {
        commands::execute(&self.client, &self.state, &params).await
    }
}
