//! Restartable document streams.
//!
//! A [`DocumentSource`] hands out a fresh, lazily produced pass over the same
//! finite document set each time [`DocumentSource::pass`] is called.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, VectorizerError};
use crate::vectorizer::Document;

/// One pass over a source
pub type DocumentIter<'a> = Box<dyn Iterator<Item = Result<Document>> + Send + 'a>;

/// Factory of document passes
pub trait DocumentSource: Send + Sync {
    /// Start a new pass from the beginning
    fn pass(&self) -> Result<DocumentIter<'_>>;
}

/// Documents held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: Arc<Vec<Document>>,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: Arc::new(documents),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentSource for MemorySource {
    fn pass(&self) -> Result<DocumentIter<'_>> {
        Ok(Box::new(self.documents.iter().cloned().map(Ok)))
    }
}

/// JSON lines file, one `{"text", "row_index", "source_id"}` object per line
/// 毎回ファイルを開き直して先頭から読む
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for JsonLinesSource {
    fn pass(&self) -> Result<DocumentIter<'_>> {
        let file = File::open(&self.path).map_err(|e| {
            VectorizerError::input(format!("cannot open {}: {e}", self.path.display()))
        })?;
        let iter = BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(|(i, line)| match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(serde_json::from_str::<Document>(&line).map_err(|e| {
                    VectorizerError::input(format!("line {}: {e}", i + 1))
                })),
                Err(e) => Some(Err(e.into())),
            });
        Ok(Box::new(iter))
    }
}

/// Wraps a closure returning a fresh iterator
pub struct FnSource<F>(pub F);

impl<F, I> DocumentSource for FnSource<F>
where
    F: Fn() -> Result<I> + Send + Sync,
    I: Iterator<Item = Result<Document>> + Send + 'static,
{
    fn pass(&self) -> Result<DocumentIter<'_>> {
        Ok(Box::new((self.0)()?))
    }
}
