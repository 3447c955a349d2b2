use serde::Deserialize;
use tracing::warn;

/// Client-supplied settings, read from `initializationOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkSettings {
    /// Upper bound on provider round-trips for one `resolve`.
    pub max_resolve_hops: usize,
    /// Register the bare URL provider.
    pub url_links: bool,
    /// Register the wikilink / markdown link provider.
    pub body_links: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            max_resolve_hops: 8,
            url_links: true,
            body_links: true,
        }
    }
}

impl LinkSettings {
    pub fn from_options(options: Option<&serde_json::Value>) -> Self {
        let Some(value) = options else {
            return Self::default();
        };
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(mut settings) => {
                if settings.max_resolve_hops == 0 {
                    warn!("config: maxResolveHops must be at least 1, using default");
                    settings.max_resolve_hops = Self::default().max_resolve_hops;
                }
                settings
            }
            Err(e) => {
                warn!(error = %e, "config: invalid initializationOptions, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_options_use_defaults() {
        assert_eq!(LinkSettings::from_options(None), LinkSettings::default());
    }

    #[test]
    fn partial_options_fill_in_defaults() {
        let settings = LinkSettings::from_options(Some(&json!({"maxResolveHops": 2})));
        assert_eq!(settings.max_resolve_hops, 2);
        assert!(settings.url_links);
        assert!(settings.body_links);
    }

    #[test]
    fn invalid_options_fall_back_to_defaults() {
        let settings = LinkSettings::from_options(Some(&json!({"urlLinks": "yes"})));
        assert_eq!(settings, LinkSettings::default());
    }

    #[test]
    fn zero_hop_limit_falls_back_to_default() {
        let settings = LinkSettings::from_options(Some(&json!({"maxResolveHops": 0, "urlLinks": false})));
        assert_eq!(settings.max_resolve_hops, LinkSettings::default().max_resolve_hops);
        assert!(!settings.url_links);
    }
}
