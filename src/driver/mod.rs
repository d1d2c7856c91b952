//! Method-by-method map-reduce over a document source.
//!
//! For every configured method, in order: take a fresh pass from the source,
//! score every document (optionally on the rayon pool), then flush the batch to
//! the store. The next pass starts only after the flush returned. The first
//! failing document aborts the whole run.

pub mod source;

use std::sync::Arc;
use std::time::Instant;

use log::info;
use rayon::prelude::*;

use crate::driver::source::DocumentSource;
use crate::error::Result;
use crate::store::{FlushReport, VectorStore};
use crate::vectorizer::scorer::DocumentScorer;
use crate::vectorizer::weighting::Method;
use crate::vectorizer::{Document, ResultBatch, ScoredDocument};

/// Map-reduce driver
///
/// `S`: document source, re-read once per method
/// `F`: pure per-document scoring function
pub struct MapReduce<S, F>
where
    S: DocumentSource,
    F: Fn(&Document, Method) -> Result<ScoredDocument> + Send + Sync,
{
    source: S,
    score: F,
    store: VectorStore,
    methods: Vec<Method>,
    parallel: bool,
}

impl<S, F> MapReduce<S, F>
where
    S: DocumentSource,
    F: Fn(&Document, Method) -> Result<ScoredDocument> + Send + Sync,
{
    pub fn new(source: S, score: F, store: VectorStore, methods: Vec<Method>, parallel: bool) -> Self {
        Self {
            source,
            score,
            store,
            methods,
            parallel,
        }
    }

    /// Score the whole corpus with one method, without writing anything
    pub fn collect(&self, method: Method) -> Result<ResultBatch> {
        let pass = self.source.pass()?;
        let score = &self.score;
        let documents = if self.parallel {
            // 完了順は不定、並びは flush 時に揃える
            pass.par_bridge()
                .map(|doc| score(&doc?, method))
                .collect::<Result<Vec<_>>>()?
        } else {
            pass.map(|doc| score(&doc?, method))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(ResultBatch::with_documents(method, documents))
    }

    /// One pass plus flush
    pub fn run_method(&self, method: Method) -> Result<FlushReport> {
        info!("Scoring {method}");
        let start = Instant::now();
        let batch = self.collect(method)?;
        info!("scored {} documents with {method} in {:.2?}", batch.len(), start.elapsed());
        self.store.flush(&batch)
    }

    /// Every configured method in order
    pub fn run(&self) -> Result<Vec<FlushReport>> {
        self.methods.iter().map(|&m| self.run_method(m)).collect()
    }
}

/// Driver over a `DocumentScorer`
/// method 名の解析と必要なリソースの確認は、ドキュメントを読む前に行う
pub fn with_scorer<S, N>(
    source: S,
    scorer: Arc<DocumentScorer>,
    store: VectorStore,
    method_names: &[N],
    parallel: bool,
) -> Result<MapReduce<S, impl Fn(&Document, Method) -> Result<ScoredDocument> + Send + Sync>>
where
    S: DocumentSource,
    N: AsRef<str>,
{
    let methods = Method::parse_all(method_names)?;
    for &m in &methods {
        scorer.validate(m)?;
    }
    let score = move |doc: &Document, method: Method| scorer.score(doc, method);
    Ok(MapReduce::new(source, score, store, methods, parallel))
}
