//! Error types for page decoration

use thiserror::Error;

use crate::dom::Container;

/// Result type alias for decoration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decorating a document
#[derive(Error, Debug)]
pub enum Error {
    /// The document has no head or body to append into
    #[error("Document has no {0} container")]
    MissingContainer(Container),

    /// A node id that does not belong to the document
    #[error("Invalid node id: {0}")]
    InvalidNode(usize),

    /// Tree mutation that would produce a cycle or attach to a non-element
    #[error("Hierarchy request failed: {0}")]
    HierarchyRequest(String),

    /// Failed to parse HTML or CSS input
    #[error("Parse failed: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to load a page
    #[error("Failed to load page: {0}")]
    LoadError(String),

    /// Filesystem or stream error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
