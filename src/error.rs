use thiserror::Error;

/// Crate-level errors for setup and configuration plumbing.
///
/// Event-system operations use [`EventError`](crate::events::types::EventError);
/// this type covers everything outside the dispatch path.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or rejected configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for crate-level operations
pub type Result<T> = std::result::Result<T, Error>;
