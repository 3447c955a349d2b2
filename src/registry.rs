use std::sync::Arc;

use tracing::debug;

use crate::document::TextDocument;
use crate::provider::LinkProvider;

/// Which documents a provider applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSelector {
    /// Language id, or `*`/`None` for any language.
    pub language: Option<String>,
    /// URI scheme, or `None` for any scheme.
    pub scheme: Option<String>,
}

impl DocumentSelector {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            scheme: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// How well this selector matches `document`; 0 means no match.
    pub fn score(&self, document: &TextDocument) -> u32 {
        if let Some(scheme) = &self.scheme {
            if scheme != document.uri.scheme() {
                return 0;
            }
        }
        match self.language.as_deref() {
            Some("*") | None => 5,
            Some(lang) if lang == document.language_id => 10,
            Some(_) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderId(u64);

struct Entry {
    id: ProviderId,
    selector: DocumentSelector,
    provider: Arc<dyn LinkProvider>,
}

/// Registered link providers, in registration order.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        selector: DocumentSelector,
        provider: Arc<dyn LinkProvider>,
    ) -> ProviderId {
        let id = ProviderId(self.next_id);
        self.next_id += 1;
        debug!(provider = provider.id(), ?selector, "registry: registered link provider");
        self.entries.push(Entry {
            id,
            selector,
            provider,
        });
        id
    }

    pub fn unregister(&mut self, id: ProviderId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Providers matching `document`, most dominant first.
    ///
    /// Higher selector score dominates; among equal scores the later
    /// registration dominates.
    pub fn providers_for(&self, document: &TextDocument) -> Vec<Arc<dyn LinkProvider>> {
        let mut matching: Vec<(u32, ProviderId, &Arc<dyn LinkProvider>)> = self
            .entries
            .iter()
            .filter_map(|e| {
                let score = e.selector.score(document);
                (score > 0).then_some((score, e.id, &e.provider))
            })
            .collect();
        matching.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        matching.into_iter().map(|(_, _, p)| p.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::provider::RawLink;
    use tokio_util::sync::CancellationToken;
    use tower_lsp::lsp_types::Url;

    struct Named(&'static str);

    #[tower_lsp::async_trait]
    impl LinkProvider for Named {
        fn id(&self) -> &str {
            self.0
        }

        async fn provide_links(
            &self,
            _document: &TextDocument,
            _token: &CancellationToken,
        ) -> Result<Vec<RawLink>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn markdown_doc() -> TextDocument {
        TextDocument::new(Url::parse("file:///a.md").unwrap(), "markdown", 1, "")
    }

    fn ids(providers: &[Arc<dyn LinkProvider>]) -> Vec<&str> {
        providers.iter().map(|p| p.id()).collect()
    }

    #[test]
    fn selector_scores() {
        let doc = markdown_doc();
        assert_eq!(DocumentSelector::language("markdown").score(&doc), 10);
        assert_eq!(DocumentSelector::language("*").score(&doc), 5);
        assert_eq!(DocumentSelector::any().score(&doc), 5);
        assert_eq!(DocumentSelector::language("rust").score(&doc), 0);
        assert_eq!(DocumentSelector::any().with_scheme("untitled").score(&doc), 0);
        assert_eq!(DocumentSelector::language("markdown").with_scheme("file").score(&doc), 10);
    }

    #[test]
    fn later_registration_dominates_equal_score() {
        let mut registry = ProviderRegistry::new();
        registry.register(DocumentSelector::any(), Arc::new(Named("low")));
        registry.register(DocumentSelector::any(), Arc::new(Named("high")));
        assert_eq!(ids(&registry.providers_for(&markdown_doc())), vec!["high", "low"]);
    }

    #[test]
    fn exact_language_dominates_wildcard() {
        let mut registry = ProviderRegistry::new();
        registry.register(DocumentSelector::language("markdown"), Arc::new(Named("md")));
        registry.register(DocumentSelector::any(), Arc::new(Named("any")));
        registry.register(DocumentSelector::language("rust"), Arc::new(Named("rust")));
        assert_eq!(ids(&registry.providers_for(&markdown_doc())), vec!["md", "any"]);
    }

    #[test]
    fn unregister_removes_provider() {
        let mut registry = ProviderRegistry::new();
        let id = registry.register(DocumentSelector::any(), Arc::new(Named("gone")));
        registry.register(DocumentSelector::any(), Arc::new(Named("kept")));
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(ids(&registry.providers_for(&markdown_doc())), vec!["kept"]);
    }
}
