//! Error types for the document vectorizer.
//!
//! Every fallible operation in this crate returns [`Result`], whose error side is
//! [`VectorizerError`]. None of these errors are retried: a batch run stops at the
//! first one.

use std::io;

use thiserror::Error;

/// The main error type for vectorizer operations.
#[derive(Error, Debug)]
pub enum VectorizerError {
    /// Lookup of a token that is not in the model vocabulary.
    /// Callers filter by `contains` first, so this indicates a contract violation.
    #[error("Unknown token: {0:?}")]
    UnknownToken(String),

    /// A document has no token known to the model.
    #[error("Document {source_id}#{row_index} has no vocabulary tokens")]
    EmptyDocument { source_id: String, row_index: u64 },

    /// The weighted sum of a document is zero or not finite.
    #[error("Document {source_id}#{row_index} produced a degenerate vector for method {method}")]
    DegenerateVector {
        source_id: String,
        row_index: u64,
        method: String,
    },

    /// Unknown scoring method name.
    #[error("Unsupported method: {0:?}")]
    UnsupportedMethod(String),

    /// A method needs a resource (IDF table, projection) that was not supplied.
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// The grouped vector store could not be opened, read or written.
    #[error("Store I/O error: {0}")]
    StoreIo(String),

    /// A result batch violates the row alignment invariant.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// Malformed word-vector model, projection or IDF file.
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// Malformed input document stream.
    #[error("Input error: {0}")]
    Input(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for operations that may fail with VectorizerError.
pub type Result<T> = std::result::Result<T, VectorizerError>;

impl VectorizerError {
    /// Create a new store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        VectorizerError::StoreIo(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        VectorizerError::Model(msg.into())
    }

    /// Create a new config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        VectorizerError::Config(msg.into())
    }

    /// Create a new input error.
    pub fn input<S: Into<String>>(msg: S) -> Self {
        VectorizerError::Input(msg.into())
    }

    /// Create a new missing resource error.
    pub fn missing<S: Into<String>>(msg: S) -> Self {
        VectorizerError::MissingResource(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_document_location() {
        let err = VectorizerError::EmptyDocument {
            source_id: "abstracts".to_string(),
            row_index: 7,
        };
        assert_eq!(err.to_string(), "Document abstracts#7 has no vocabulary tokens");

        let err = VectorizerError::UnsupportedMethod("bm25".to_string());
        assert_eq!(err.to_string(), "Unsupported method: \"bm25\"");
    }

    #[test]
    fn io_errors_convert() {
        fn fails() -> Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(VectorizerError::Io(_))));
    }
}
