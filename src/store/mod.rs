//! Grouped vector store.
//!
//! One file holds `group (source_id) -> dataset (method) -> matrix`. Row `i` of a
//! matrix is the document with the `i`-th smallest `row_index` of that source.
//!
//! A flush applies every group in memory and then replaces the file with one
//! write-then-rename while holding a [`StoreLock`]. A failed flush therefore
//! leaves every group fully old, a successful one every group fully new.

pub mod codec;
pub mod lock;

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Result, VectorizerError};
use crate::store::codec::Dataset;
use crate::store::lock::StoreLock;
use crate::utils::matrix::Matrix;
use crate::vectorizer::{ResultBatch, ScoredDocument};

const FORMAT_VERSION: u32 = 1;

/// on-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    groups: IndexMap<String, IndexMap<String, Dataset>>,
}

/// Result of one flush
#[derive(Debug, Clone, PartialEq)]
pub struct FlushReport {
    pub method: String,
    /// (source_id, rows, cols) per written group
    pub groups: Vec<(String, usize, usize)>,
    /// size of the store file written by this flush
    pub bytes_written: u64,
}

impl FlushReport {
    pub fn documents(&self) -> usize {
        self.groups.iter().map(|(_, rows, _)| rows).sum()
    }
}

/// Handle to a grouped vector store file
/// ファイルは flush / read のたびに開いて閉じる
#[derive(Debug, Clone)]
pub struct VectorStore {
    path: PathBuf,
}

impl VectorStore {
    /// Open (or prepare to create) the store at `path`
    /// An existing file must be a readable store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                VectorizerError::store(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let store = Self { path };
        store.read_file()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one method's batch, replacing that method's dataset in every
    /// group the batch touches. Other datasets are copied through unchanged.
    pub fn flush(&self, batch: &ResultBatch) -> Result<FlushReport> {
        let method = batch.method.as_str();
        let datasets = partition(&batch.documents)?
            .into_iter()
            .map(|(source_id, matrix)| -> Result<_> { Ok((source_id, Dataset::encode(&matrix)?)) })
            .collect::<Result<Vec<_>>>()?;

        let _lock = StoreLock::acquire(&self.path)?;
        let mut file = self.read_file()?;
        let mut groups = Vec::with_capacity(datasets.len());
        for (source_id, dataset) in datasets {
            let (rows, cols) = dataset.shape();
            file.groups
                .entry(source_id.clone())
                .or_default()
                .insert(method.to_string(), dataset);
            debug!("replaced {source_id}/{method} ({rows}x{cols})");
            groups.push((source_id, rows, cols));
        }
        // 書き出しは flush ごとに一回
        let report = FlushReport {
            method: method.to_string(),
            groups,
            bytes_written: self.write_file(&file)?,
        };
        info!(
            "flushed {} documents for {method} into {} groups of {}",
            report.documents(),
            report.groups.len(),
            self.path.display()
        );
        Ok(report)
    }

    /// Write a single matrix as `store[source_id][method]`
    pub fn write_matrix(&self, source_id: &str, method: &str, matrix: &Matrix) -> Result<()> {
        let dataset = Dataset::encode(matrix)?;
        let _lock = StoreLock::acquire(&self.path)?;
        let mut file = self.read_file()?;
        file.groups
            .entry(source_id.to_string())
            .or_default()
            .insert(method.to_string(), dataset);
        self.write_file(&file)?;
        Ok(())
    }

    /// Read `store[source_id][method]`
    pub fn read(&self, source_id: &str, method: impl AsRef<str>) -> Result<Matrix> {
        self.dataset(source_id, method)?.decode()
    }

    /// Compressed dataset as stored
    pub fn dataset(&self, source_id: &str, method: impl AsRef<str>) -> Result<Dataset> {
        let method = method.as_ref();
        let mut file = self.read_file()?;
        file.groups
            .get_mut(source_id)
            .and_then(|g| g.swap_remove(method))
            .ok_or_else(|| VectorizerError::store(format!("no dataset {source_id}/{method}")))
    }

    /// Group names (source ids)
    pub fn groups(&self) -> Result<Vec<String>> {
        Ok(self.read_file()?.groups.into_keys().collect())
    }

    /// Dataset names (methods) of a group, empty if the group does not exist
    pub fn methods(&self, source_id: &str) -> Result<Vec<String>> {
        Ok(self
            .read_file()?
            .groups
            .swap_remove(source_id)
            .map(|g| g.into_keys().collect())
            .unwrap_or_default())
    }

    /// (source_id, method, shape) of every dataset
    pub fn summary(&self) -> Result<Vec<(String, String, (usize, usize))>> {
        let file = self.read_file()?;
        Ok(file
            .groups
            .iter()
            .flat_map(|(group, datasets)| {
                datasets
                    .iter()
                    .map(move |(method, d)| (group.clone(), method.clone(), d.shape()))
            })
            .collect())
    }

    /// Delete one dataset. Returns false if it did not exist.
    /// 空になったグループも消す
    pub fn remove(&self, source_id: &str, method: impl AsRef<str>) -> Result<bool> {
        let _lock = StoreLock::acquire(&self.path)?;
        let mut file = self.read_file()?;
        let Some(group) = file.groups.get_mut(source_id) else {
            return Ok(false);
        };
        if group.shift_remove(method.as_ref()).is_none() {
            return Ok(false);
        }
        if group.is_empty() {
            file.groups.shift_remove(source_id);
        }
        self.write_file(&file)?;
        Ok(true)
    }

    fn read_file(&self) -> Result<StoreFile> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(StoreFile {
                    version: FORMAT_VERSION,
                    groups: IndexMap::new(),
                })
            }
            Err(e) => {
                return Err(VectorizerError::store(format!("cannot open {}: {e}", self.path.display())))
            }
        };
        let store: StoreFile = serde_cbor::from_reader(BufReader::new(file))
            .map_err(|e| VectorizerError::store(format!("corrupt store {}: {e}", self.path.display())))?;
        if store.version != FORMAT_VERSION {
            return Err(VectorizerError::store(format!(
                "unsupported store version {} in {}",
                store.version,
                self.path.display()
            )));
        }
        Ok(store)
    }

    /// write-then-rename, returns the number of bytes written
    fn write_file(&self, store: &StoreFile) -> Result<u64> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let io_err = |e: std::io::Error| VectorizerError::store(format!("cannot write {}: {e}", self.path.display()));

        let bytes = serde_cbor::to_vec(store)
            .map_err(|e| VectorizerError::store(format!("cannot encode store: {e}")))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(bytes.len() as u64)
    }
}

/// Split by source, sort by row index and stack
/// group 順は source_id の辞書順
fn partition(documents: &[ScoredDocument]) -> Result<IndexMap<String, Matrix>> {
    let mut grouped: IndexMap<&str, Vec<&ScoredDocument>> = IndexMap::new();
    for doc in documents {
        grouped.entry(doc.source_id.as_str()).or_default().push(doc);
    }
    grouped.sort_keys();

    let mut out = IndexMap::with_capacity(grouped.len());
    for (source_id, mut docs) in grouped {
        docs.sort_by_key(|d| d.row_index);
        if let Some(w) = docs.windows(2).find(|w| w[0].row_index == w[1].row_index) {
            return Err(VectorizerError::InvalidBatch(format!(
                "duplicate row_index {} in source {source_id}",
                w[0].row_index
            )));
        }
        let cols = docs.first().map_or(0, |d| d.vector.len());
        let matrix = Matrix::from_rows(cols, docs.iter().map(|d| d.vector.as_slice()))
            .map_err(|e| VectorizerError::InvalidBatch(format!("source {source_id}: {e}")))?;
        out.insert(source_id.to_string(), matrix);
    }
    Ok(out)
}
