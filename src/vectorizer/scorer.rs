use std::sync::Arc;

use crate::error::{Result, VectorizerError};
use crate::model::WordVectorModel;
use crate::utils::math::{axpy, div_scalar, l2_norm};
use crate::vectorizer::idf::IdfTable;
use crate::vectorizer::token::TokenFrequency;
use crate::vectorizer::weighting::Method;
use crate::vectorizer::{Document, ScoredDocument};

/// allowed deviation of a scored vector's norm from 1
pub const NORM_TOLERANCE: f64 = 1e-6;

/// Turns one document into one unit vector
///
/// The scorer only reads the model and the IDF table, so a single instance can
/// be shared by any number of rayon workers.
#[derive(Debug, Clone)]
pub struct DocumentScorer {
    model: Arc<WordVectorModel>,
    idf: Option<Arc<IdfTable>>,
}

impl DocumentScorer {
    pub fn new(model: Arc<WordVectorModel>) -> Self {
        Self { model, idf: None }
    }

    /// Attach the IDF table used by `tf_idf` and `projected`
    pub fn with_idf(mut self, idf: Arc<IdfTable>) -> Self {
        self.idf = Some(idf);
        self
    }

    pub fn model(&self) -> &WordVectorModel {
        &self.model
    }

    /// Check that every resource `method` needs is present
    pub fn validate(&self, method: Method) -> Result<()> {
        if method.needs_idf() && self.idf.is_none() {
            return Err(VectorizerError::missing(format!("method {method} needs an IDF table")));
        }
        if method.needs_projection() && !self.model.has_projection() {
            return Err(VectorizerError::missing(format!(
                "method {method} needs a projection attached to the model"
            )));
        }
        Ok(())
    }

    /// Width of the vectors `method` produces
    pub fn output_dimension(&self, method: Method) -> Option<usize> {
        if method.needs_projection() {
            self.model.projection_dimension()
        } else {
            Some(self.model.dimension())
        }
    }

    /// Score one document
    ///
    /// # Errors
    /// * `EmptyDocument` - no token of the text is in the vocabulary
    /// * `DegenerateVector` - the weighted sum has zero or non-finite norm
    pub fn score(&self, doc: &Document, method: Method) -> Result<ScoredDocument> {
        let freq = TokenFrequency::from_text(&doc.text, |t| self.model.contains(t));
        if freq.is_empty() {
            return Err(VectorizerError::EmptyDocument {
                source_id: doc.source_id.clone(),
                row_index: doc.row_index,
            });
        }

        let weights = method.weights(&freq, self.idf.as_deref())?;
        let dim = self
            .output_dimension(method)
            .ok_or_else(|| VectorizerError::missing("no projection attached to the model"))?;

        // f64 で集計してから f32 に落とす
        let mut acc = vec![0.0f64; dim];
        for (token, weight) in weights {
            let v = if method.needs_projection() {
                self.model.projected(token)?
            } else {
                self.model.vector(token)?
            };
            axpy(weight, v, &mut acc);
        }

        let norm = l2_norm(&acc);
        if !norm.is_finite() || norm == 0.0 {
            return Err(VectorizerError::DegenerateVector {
                source_id: doc.source_id.clone(),
                row_index: doc.row_index,
                method: method.to_string(),
            });
        }
        div_scalar(&mut acc, norm);
        let vector: Vec<f32> = acc.into_iter().map(|x| x as f32).collect();
        debug_assert!({
            let n = vector.iter().map(|&x| (x as f64).powi(2)).sum::<f64>().sqrt();
            (n - 1.0).abs() <= NORM_TOLERANCE
        });

        Ok(ScoredDocument {
            vector,
            row_index: doc.row_index,
            source_id: doc.source_id.clone(),
            method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::matrix::Matrix;

    fn model() -> Arc<WordVectorModel> {
        let model = WordVectorModel::from_entries(
            3,
            vec![
                ("a", vec![1.0, 0.0, 0.0]),
                ("b", vec![0.0, 1.0, 0.0]),
                ("c", vec![0.3, -0.2, 0.9]),
                ("zero", vec![0.0, 0.0, 0.0]),
            ],
        )
        .unwrap();
        let basis = Matrix::from_rows(2, [[1.0, 1.0], [1.0, -1.0], [0.0, 2.0], [5.0, 5.0]]).unwrap();
        Arc::new(model.with_projection(basis).unwrap())
    }

    fn scorer() -> DocumentScorer {
        let idf = IdfTable::from_pairs(vec![("a", 2.0), ("b", 0.5), ("c", 1.0), ("zero", 1.0)]).unwrap();
        DocumentScorer::new(model()).with_idf(Arc::new(idf))
    }

    fn norm(v: &[f32]) -> f64 {
        v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
    }

    #[test]
    fn every_method_yields_unit_vectors() {
        let s = scorer();
        let texts = ["a", "a b c", "c c c b unknown", "b a a a a"];
        for method in Method::ALL {
            for (i, text) in texts.iter().enumerate() {
                let out = s.score(&Document::new(*text, i as u64, "t"), method).unwrap();
                assert!((norm(&out.vector) - 1.0).abs() <= NORM_TOLERANCE, "{method} {text}");
                assert_eq!(out.vector.len(), s.output_dimension(method).unwrap());
                assert_eq!(out.row_index, i as u64);
                assert_eq!(out.source_id, "t");
                assert_eq!(out.method, method);
            }
        }
    }

    #[test]
    fn unique_ignores_repetition() {
        let s = scorer();
        let x = s.score(&Document::new("a a a b", 0, "t"), Method::Unique).unwrap();
        let y = s.score(&Document::new("a b", 0, "t"), Method::Unique).unwrap();
        assert_eq!(x.vector, y.vector);
    }

    #[test]
    fn simple_follows_repetition() {
        let s = scorer();
        let x = s.score(&Document::new("a a b", 0, "t"), Method::Simple).unwrap();
        let y = s.score(&Document::new("a b", 0, "t"), Method::Simple).unwrap();
        assert_ne!(x.vector, y.vector);
        // 2a + b を正規化したもの
        let expected = [2.0 / 5f64.sqrt(), 1.0 / 5f64.sqrt(), 0.0];
        for (got, want) in x.vector.iter().zip(expected) {
            assert!((*got as f64 - want).abs() < 1e-6);
        }
    }

    #[test]
    fn tf_idf_applies_table() {
        let s = scorer();
        // 2.0 * a + 0.5 * 2 * b = (2, 1, 0)
        let x = s.score(&Document::new("a b b", 0, "t"), Method::TfIdf).unwrap();
        let y = s.score(&Document::new("a a b", 0, "t"), Method::Simple).unwrap();
        for (p, q) in x.vector.iter().zip(y.vector.iter()) {
            assert!((p - q).abs() < 1e-6);
        }
    }

    #[test]
    fn projected_uses_basis_rows() {
        let s = scorer();
        // idf(a)=2 → 2 * (1, 1) = (2, 2)
        let x = s.score(&Document::new("a", 0, "t"), Method::Projected).unwrap();
        assert_eq!(x.vector.len(), 2);
        assert!((x.vector[0] - x.vector[1]).abs() < 1e-7);
        assert!((x.vector[0] as f64 - 0.5f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn unknown_only_documents_are_empty_for_every_method() {
        let s = scorer();
        for method in Method::ALL {
            let err = s.score(&Document::new("x y  z", 4, "src"), method).unwrap_err();
            assert!(matches!(
                err,
                VectorizerError::EmptyDocument { ref source_id, row_index: 4 } if source_id == "src"
            ));
            let err = s.score(&Document::new("", 5, "src"), method).unwrap_err();
            assert!(matches!(err, VectorizerError::EmptyDocument { .. }));
        }
    }

    #[test]
    fn zero_sum_is_degenerate() {
        let s = scorer();
        let err = s.score(&Document::new("zero zero", 1, "t"), Method::Simple).unwrap_err();
        assert!(matches!(err, VectorizerError::DegenerateVector { .. }));

        // IDF が全部 0 のテーブル
        let idf = IdfTable::from_pairs(vec![("a", 0.0), ("b", 0.0)]).unwrap();
        let s = DocumentScorer::new(model()).with_idf(Arc::new(idf));
        let err = s.score(&Document::new("a b", 2, "t"), Method::TfIdf).unwrap_err();
        assert!(matches!(err, VectorizerError::DegenerateVector { row_index: 2, .. }));
    }

    #[test]
    fn validate_reports_missing_resources() {
        let bare = WordVectorModel::from_entries(1, vec![("a", vec![1.0])]).unwrap();
        let s = DocumentScorer::new(Arc::new(bare));
        assert!(s.validate(Method::Unique).is_ok());
        assert!(s.validate(Method::Simple).is_ok());
        assert!(matches!(s.validate(Method::TfIdf), Err(VectorizerError::MissingResource(_))));
        let s = s.with_idf(Arc::new(IdfTable::new()));
        assert!(s.validate(Method::TfIdf).is_ok());
        assert!(matches!(s.validate(Method::Projected), Err(VectorizerError::MissingResource(_))));
    }
}
