use thiserror::Error;

/// Unified result type for the gridboard crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced at the layout engine's API boundary.
///
/// The packing and gesture core never fails; these only report misuse such as
/// unknown item ids or malformed configuration.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("item `{0}` not found")]
    ItemNotFound(String),
    #[error("item `{0}` is already registered")]
    DuplicateItem(String),
    #[error("invalid grid configuration: {0}")]
    InvalidConfig(String),
    #[error("configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
