use thiserror::Error;

/// Failure of a single provider call (`provide_links` or `resolve_link`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider failed: {0}")]
    Failed(String),

    #[error("provider call cancelled")]
    Cancelled,

    #[error("provider panicked: {0}")]
    Panicked(String),
}

/// Failure of `Link::resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("invalid link address {url:?}: {reason}")]
    InvalidAddress { url: String, reason: String },

    #[error("link has no target")]
    MissingTarget,

    #[error("link resolution did not settle after {0} hops")]
    TooManyHops(usize),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Discriminant of a `ResolveError`, recorded on a failed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    InvalidAddress,
    MissingTarget,
    TooManyHops,
    Provider,
}

impl ResolveError {
    pub fn kind(&self) -> ResolveErrorKind {
        match self {
            Self::InvalidAddress { .. } => ResolveErrorKind::InvalidAddress,
            Self::MissingTarget => ResolveErrorKind::MissingTarget,
            Self::TooManyHops(_) => ResolveErrorKind::TooManyHops,
            Self::Provider(_) => ResolveErrorKind::Provider,
        }
    }
}
