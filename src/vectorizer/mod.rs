pub mod corpus;
pub mod idf;
pub mod scorer;
pub mod token;
pub mod weighting;

use serde::{Deserialize, Serialize};

use crate::vectorizer::weighting::Method;

/// One input document
/// `row_index` is unique within its `source_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub row_index: u64,
    pub source_id: String,
}

impl Document {
    pub fn new(text: impl Into<String>, row_index: u64, source_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            row_index,
            source_id: source_id.into(),
        }
    }
}

/// Unit-length embedding of one document under one method
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub vector: Vec<f32>,
    pub row_index: u64,
    pub source_id: String,
    pub method: Method,
}

/// All scored documents of one method over the whole corpus
/// 処理順は不定、並べ替えは flush 時に行う
#[derive(Debug, Clone)]
pub struct ResultBatch {
    pub method: Method,
    pub documents: Vec<ScoredDocument>,
}

impl ResultBatch {
    pub fn with_documents(method: Method, documents: Vec<ScoredDocument>) -> Self {
        Self { method, documents }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
