//! This crate builds document embeddings from a pretrained word-vector model.
pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod store;
pub mod utils;
pub mod vectorizer;

/// Word Vector Model
/// Read-only adapter over pretrained word vectors.
/// It provides:
/// - vocabulary membership
/// - per-token vector lookup
/// - per-token corpus count
/// - a stable dense index per token
/// - an optional projection basis (one row per token) used by the `projected` method
///
/// Loaded from word2vec text format or CBOR; see `WordVectorModel::load`.
/// Share it between threads with `Arc`.
pub use model::WordVectorModel;

/// Scoring Method
/// How a document's tokens are weighted before their vectors are summed:
/// - `unique`: 1.0 per distinct token
/// - `simple`: in-document count
/// - `tf_idf`: IDF × in-document count
/// - `projected`: TF-IDF weights over projected vectors
///
/// Also accepted: `TF_IDF` and `kSVD`.
pub use vectorizer::weighting::Method;

/// Document Scorer
/// Turns one document into one unit-length vector for a given method.
/// Whitespace tokens outside the vocabulary are ignored; a document with no
/// known token is an `EmptyDocument` error.
///
/// # Thread Safety
/// Read-only after construction; one instance can serve every rayon worker.
pub use vectorizer::scorer::DocumentScorer;

/// IDF Table and Corpus
/// `IdfTable` is the precomputed per-token IDF used by the TF-IDF methods.
/// It is normally supplied from outside; `IdfTable::from_corpus` derives one
/// from the document frequencies collected by a `Corpus`.
pub use vectorizer::corpus::Corpus;
pub use vectorizer::idf::IdfTable;

/// Token Frequency structure
/// In-document token counts, kept in first-seen order.
pub use vectorizer::token::TokenFrequency;

/// Documents and results
/// - `Document`: input `(text, row_index, source_id)`
/// - `ScoredDocument`: its vector under one method
/// - `ResultBatch`: every scored document of one method
pub use vectorizer::{Document, ResultBatch, ScoredDocument};

/// Map-Reduce Driver
/// Runs one pass over a `DocumentSource` per configured method and flushes
/// each pass to the store before the next starts.
pub use driver::source::{DocumentSource, FnSource, JsonLinesSource, MemorySource};
pub use driver::MapReduce;

/// Grouped Vector Store
/// `store[source_id][method]` = matrix of document vectors in `row_index` order.
pub use store::{FlushReport, VectorStore};

pub use config::Config;
pub use error::{Result, VectorizerError};
pub use utils::matrix::Matrix;
