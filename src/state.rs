use dashmap::DashMap;
use tower_lsp::lsp_types::Url;
use tracing::info;

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::LinkSettings;
use crate::document::TextDocument;
use crate::link::Link;
use crate::provider::LinkProvider;
use crate::providers::{BodyLinkProvider, UrlLinkProvider};
use crate::registry::{DocumentSelector, ProviderId, ProviderRegistry};

/// Links computed for one version of a document.
pub struct LinkSnapshot {
    pub version: i32,
    pub links: Vec<Link>,
}

/// Shared backend state for the LSP server.
///
/// Holds settings, registered link providers, open documents, and the most
/// recent link list per document (kept so that `documentLink/resolve` can
/// reach the originating provider).
pub struct BackendState {
    pub settings: RwLock<LinkSettings>,
    pub registry: RwLock<ProviderRegistry>,
    pub documents: DashMap<Url, TextDocument>,
    pub links: DashMap<Url, LinkSnapshot>,
    /// Providers registered by `configure`, replaced on the next call.
    builtins: RwLock<Vec<ProviderId>>,
}

impl BackendState {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(LinkSettings::default()),
            registry: RwLock::new(ProviderRegistry::new()),
            documents: DashMap::new(),
            links: DashMap::new(),
            builtins: RwLock::new(Vec::new()),
        }
    }

    /// Store the settings and register the built-in providers.
    pub fn configure(&self, root: Option<PathBuf>, settings: LinkSettings) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let mut builtins = self.builtins.write().unwrap_or_else(PoisonError::into_inner);
        for id in builtins.drain(..) {
            registry.unregister(id);
        }
        if settings.url_links {
            builtins.push(registry.register(DocumentSelector::any(), Arc::new(UrlLinkProvider)));
        }
        if settings.body_links {
            builtins.push(registry.register(
                DocumentSelector::language("markdown"),
                Arc::new(BodyLinkProvider::new(root.clone())),
            ));
        }
        info!(
            root = ?root,
            providers = registry.len(),
            "state: configured link providers"
        );
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn settings(&self) -> LinkSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn document(&self, uri: &Url) -> Option<TextDocument> {
        self.documents.get(uri).map(|d| d.clone())
    }

    pub fn providers_for(&self, document: &TextDocument) -> Vec<Arc<dyn LinkProvider>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .providers_for(document)
    }

    pub fn close_document(&self, uri: &Url) {
        self.documents.remove(uri);
        self.links.remove(uri);
    }

    pub fn store_links(&self, uri: &Url, version: i32, links: Vec<Link>) {
        self.links.insert(uri.clone(), LinkSnapshot { version, links });
    }

    /// A copy of the cached link at `index`, if the snapshot is for `version`.
    pub fn cached_link(&self, uri: &Url, version: i32, index: usize) -> Option<Link> {
        let snapshot = self.links.get(uri)?;
        if snapshot.version != version {
            return None;
        }
        snapshot.links.get(index).cloned()
    }

    /// Write a resolved link back; ignored if the snapshot has moved on.
    pub fn update_link(&self, uri: &Url, version: i32, index: usize, link: Link) -> bool {
        let Some(mut snapshot) = self.links.get_mut(uri) else {
            return false;
        };
        if snapshot.version != version {
            return false;
        }
        match snapshot.links.get_mut(index) {
            Some(slot) => {
                *slot = link;
                true
            }
            None => false,
        }
    }
}
