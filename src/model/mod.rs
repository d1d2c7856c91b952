//! Read-only adapter over a pretrained word-vector model.

pub mod loader;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};
use crate::utils::matrix::Matrix;

/// Pretrained word vectors
///
/// Holds:
/// - the vocabulary, in model order. A token's position is its dense index
/// - the corpus count of each token
/// - one vector per token (`vectors.row(index)`)
/// - an optional projection basis, one row per token, injected from outside
///
/// Immutable after construction; share it across scoring workers with `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordVectorModel {
    vocab: IndexMap<String, u64>,
    vectors: Matrix,
    #[serde(default)]
    projection: Option<Matrix>,
}

impl WordVectorModel {
    /// Build a model from `(token, vector)` pairs
    /// Counts start at 0; see `with_counts`.
    ///
    /// # Arguments
    /// * `dimension` - width of every vector
    /// * `entries` - tokens and their vectors, in index order
    pub fn from_entries<I, S>(dimension: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut vocab = IndexMap::new();
        let mut data = Vec::new();
        for (token, vector) in entries {
            let token = token.into();
            if vector.len() != dimension {
                return Err(VectorizerError::model(format!(
                    "vector for {token:?} has width {}, expected {dimension}",
                    vector.len()
                )));
            }
            if vocab.insert(token.clone(), 0).is_some() {
                return Err(VectorizerError::model(format!("duplicate token {token:?}")));
            }
            data.extend(vector);
        }
        let vectors = Matrix::new(vocab.len(), dimension, data)?;
        Ok(Self { vocab, vectors, projection: None })
    }

    /// Set corpus counts. Tokens outside the vocabulary are ignored.
    pub fn with_counts<I, S>(mut self, counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        for (token, count) in counts {
            if let Some(c) = self.vocab.get_mut(token.as_ref()) {
                *c = count;
            }
        }
        self
    }

    /// Attach the projection basis used by the `projected` method.
    /// Row `i` belongs to the token with index `i`.
    pub fn with_projection(mut self, projection: Matrix) -> Result<Self> {
        if projection.rows() != self.vocab.len() {
            return Err(VectorizerError::model(format!(
                "projection has {} rows but the vocabulary has {} tokens",
                projection.rows(),
                self.vocab.len()
            )));
        }
        self.projection = Some(projection);
        Ok(self)
    }

    /// Check the shape invariants after deserialization
    pub(crate) fn validate(&self) -> Result<()> {
        if self.vectors.rows() != self.vocab.len() {
            return Err(VectorizerError::model(format!(
                "model has {} tokens but {} vectors",
                self.vocab.len(),
                self.vectors.rows()
            )));
        }
        if let Some(p) = &self.projection {
            if p.rows() != self.vocab.len() {
                return Err(VectorizerError::model(format!(
                    "projection has {} rows but the vocabulary has {} tokens",
                    p.rows(),
                    self.vocab.len()
                )));
            }
        }
        Ok(())
    }

    /// Vector width
    #[inline]
    pub fn dimension(&self) -> usize {
        self.vectors.cols()
    }

    /// Width of the projected vectors, if a projection is attached
    #[inline]
    pub fn projection_dimension(&self) -> Option<usize> {
        self.projection.as_ref().map(Matrix::cols)
    }

    #[inline]
    pub fn has_projection(&self) -> bool {
        self.projection.is_some()
    }

    /// Vocabulary size
    #[inline]
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// Check if the token is in the vocabulary
    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.vocab.contains_key(token)
    }

    /// Dense index of a token
    #[inline]
    pub fn index(&self, token: &str) -> Result<usize> {
        self.vocab
            .get_index_of(token)
            .ok_or_else(|| VectorizerError::UnknownToken(token.to_string()))
    }

    /// Word vector of a token
    #[inline]
    pub fn vector(&self, token: &str) -> Result<&[f32]> {
        let idx = self.index(token)?;
        // vocab と vectors の行数は常に一致する
        self.vectors
            .row(idx)
            .ok_or_else(|| VectorizerError::UnknownToken(token.to_string()))
    }

    /// Corpus count of a token (0 for unknown tokens or when counts were not loaded)
    #[inline]
    pub fn count(&self, token: &str) -> u64 {
        self.vocab.get(token).copied().unwrap_or(0)
    }

    /// Projected vector of a token
    pub fn projected(&self, token: &str) -> Result<&[f32]> {
        let projection = self
            .projection
            .as_ref()
            .ok_or_else(|| VectorizerError::missing("no projection attached to the model"))?;
        let idx = self.index(token)?;
        projection
            .row(idx)
            .ok_or_else(|| VectorizerError::UnknownToken(token.to_string()))
    }

    /// Iterate over the vocabulary in index order
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.vocab.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> WordVectorModel {
        WordVectorModel::from_entries(
            2,
            vec![("cell", vec![1.0, 0.0]), ("gene", vec![0.0, 1.0]), ("rna", vec![0.6, 0.8])],
        )
        .unwrap()
    }

    #[test]
    fn lookup_and_index_are_consistent() {
        let m = model();
        assert_eq!(m.dimension(), 2);
        assert_eq!(m.len(), 3);
        assert!(m.contains("gene"));
        assert!(!m.contains("protein"));
        assert_eq!(m.index("rna").unwrap(), 2);
        assert_eq!(m.vector("gene").unwrap(), &[0.0, 1.0]);
        assert_eq!(m.tokens().collect::<Vec<_>>(), vec!["cell", "gene", "rna"]);
    }

    #[test]
    fn unknown_token_is_an_error() {
        let m = model();
        assert!(matches!(m.vector("protein"), Err(VectorizerError::UnknownToken(t)) if t == "protein"));
        assert!(m.index("protein").is_err());
    }

    #[test]
    fn counts_only_touch_known_tokens() {
        let m = model().with_counts(vec![("cell", 12u64), ("protein", 4)]);
        assert_eq!(m.count("cell"), 12);
        assert_eq!(m.count("gene"), 0);
        assert_eq!(m.count("protein"), 0);
    }

    #[test]
    fn rejects_bad_entries() {
        let dup = WordVectorModel::from_entries(1, vec![("a", vec![1.0]), ("a", vec![2.0])]);
        assert!(dup.is_err());
        let width = WordVectorModel::from_entries(2, vec![("a", vec![1.0])]);
        assert!(width.is_err());
    }

    #[test]
    fn projection_rows_follow_index() {
        let m = model();
        assert!(matches!(m.projected("cell"), Err(VectorizerError::MissingResource(_))));

        let basis = Matrix::from_rows(1, [[10.0], [20.0], [30.0]]).unwrap();
        let m = m.with_projection(basis).unwrap();
        assert_eq!(m.projection_dimension(), Some(1));
        assert_eq!(m.projected("rna").unwrap(), &[30.0]);

        let short = Matrix::from_rows(1, [[1.0]]).unwrap();
        assert!(model().with_projection(short).is_err());
    }
}
