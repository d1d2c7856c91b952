use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use dashmap::DashMap;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::driver::source::DocumentSource;
use crate::error::Result;

/// keep document count and per-token document frequency in a thread-safe way
/// base data for `IdfTable::from_corpus`
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Corpus {
    /// number of documents added
    pub doc_num: AtomicU64,
    /// number of documents each token appears in
    pub token_doc_freq: DashMap<Box<str>, u64, RandomState>,
}

impl Clone for Corpus {
    fn clone(&self) -> Self {
        Self {
            doc_num: AtomicU64::new(self.doc_num.load(Ordering::Acquire)),
            token_doc_freq: self.token_doc_freq.clone(),
        }
    }
}

impl Corpus {
    /// Create a new instance
    pub fn new() -> Self {
        Self {
            doc_num: AtomicU64::new(0),
            token_doc_freq: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add one document's distinct tokens
    pub fn add_set<T>(&self, tokens: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num.fetch_add(1, Ordering::Relaxed);
        for token in tokens {
            self.token_doc_freq
                .entry(token.as_ref().into())
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    /// Add a document by its text (whitespace tokens, duplicates counted once)
    pub fn add_text(&self, text: &str) {
        let mut seen: Vec<&str> = text.split_whitespace().collect();
        seen.sort_unstable();
        seen.dedup();
        self.add_set(&seen);
    }

    /// Build a corpus from one full pass over a document source
    /// documents are counted in parallel
    pub fn from_source<S>(source: &S) -> Result<Self>
    where
        S: DocumentSource + ?Sized,
    {
        let corpus = Corpus::new();
        source
            .pass()?
            .par_bridge()
            .try_for_each(|doc| -> Result<()> {
                corpus.add_text(&doc?.text);
                Ok(())
            })?;
        info!(
            "counted {} documents, {} distinct tokens",
            corpus.get_doc_num(),
            corpus.vocab_size()
        );
        Ok(corpus)
    }

    /// Get the number of documents in the corpus
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num.load(Ordering::Relaxed)
    }

    /// Get the document frequency of a token
    pub fn get_doc_freq(&self, token: &str) -> u64 {
        self.token_doc_freq.get(token).map_or(0, |count| *count)
    }

    /// Get the current vocabulary size (number of unique tokens)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.token_doc_freq.len()
    }

    /// Merge another corpus into self
    pub fn merge_corpus(&self, other: &Corpus) {
        for entry in other.token_doc_freq.iter() {
            let count_other = *entry.value();
            self.token_doc_freq
                .entry(entry.key().clone())
                .and_modify(|count| *count += count_other)
                .or_insert(count_other);
        }
        self.doc_num
            .fetch_add(other.doc_num.load(Ordering::Relaxed), Ordering::Relaxed);
    }
}
