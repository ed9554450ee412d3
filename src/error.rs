use thiserror::Error;

/// Reasons a single feed could not be turned into items.
///
/// These never reach a client; the fetcher logs them and degrades to an
/// empty item list.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("malformed feed: {0}")]
    Malformed(String),

    #[error("feed has no entries")]
    Empty,

    #[error("feed body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("feed processing panicked: {0}")]
    Panicked(String),
}

impl From<feed_rs::parser::ParseFeedError> for FetchError {
    fn from(err: feed_rs::parser::ParseFeedError) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Catalog misconfiguration or broken selection state.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("catalog has no categories")]
    EmptyCatalog,

    #[error("category '{0}' has no feeds")]
    EmptyCategory(String),

    #[error("selection state lock poisoned")]
    Poisoned,
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
