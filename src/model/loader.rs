//! Model, count and projection file formats.
//!
//! - `*.cbor`: a serialized [`WordVectorModel`] / [`Matrix`]
//! - otherwise word2vec text format: a `<vocab_size> <dimension>` header,
//!   then `token v1 v2 ... vN` per line
//! - counts: `token count` per line (word2vec `-save-vocab` output)
//! - projection text: one whitespace separated row per line, in vocabulary order

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

use log::info;

use crate::error::{Result, VectorizerError};
use crate::model::WordVectorModel;
use crate::utils::matrix::Matrix;

fn is_cbor(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("cbor"))
}

fn parse_f32(field: &str, line_no: usize) -> Result<f32> {
    field
        .parse::<f32>()
        .map_err(|e| VectorizerError::model(format!("line {line_no}: bad number {field:?}: {e}")))
}

impl WordVectorModel {
    /// Load a model, choosing the format from the file extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let model = if is_cbor(path) {
            let model: WordVectorModel = serde_cbor::from_reader(reader)
                .map_err(|e| VectorizerError::model(format!("{}: {e}", path.display())))?;
            model.validate()?;
            model
        } else {
            Self::read_word2vec_text(reader)?
        };
        info!(
            "loaded model {} ({} tokens, dimension {})",
            path.display(),
            model.len(),
            model.dimension()
        );
        Ok(model)
    }

    /// Parse word2vec text format
    pub fn read_word2vec_text<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let header = lines
            .next()
            .ok_or_else(|| VectorizerError::model("empty model file"))??;
        let mut fields = header.split_whitespace();
        let (vocab_size, dimension) = match (fields.next(), fields.next(), fields.next()) {
            (Some(n), Some(d), None) => {
                let n = n.parse::<usize>().map_err(|e| VectorizerError::model(format!("header: {e}")))?;
                let d = d.parse::<usize>().map_err(|e| VectorizerError::model(format!("header: {e}")))?;
                (n, d)
            }
            _ => return Err(VectorizerError::model(format!("bad header {header:?}"))),
        };

        let mut entries = Vec::with_capacity(vocab_size);
        for (i, line) in lines.enumerate() {
            let line = line?;
            let line_no = i + 2;
            let mut fields = line.split_whitespace();
            let Some(token) = fields.next() else { continue };
            let vector = fields
                .map(|f| parse_f32(f, line_no))
                .collect::<Result<Vec<f32>>>()?;
            entries.push((token.to_string(), vector));
        }
        if entries.len() != vocab_size {
            return Err(VectorizerError::model(format!(
                "header declares {vocab_size} tokens but {} were read",
                entries.len()
            )));
        }
        Self::from_entries(dimension, entries)
    }

    /// Write the model as CBOR
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_cbor::to_writer(writer, self)
            .map_err(|e| VectorizerError::model(format!("{}: {e}", path.as_ref().display())))
    }

    /// Load a count file and apply it
    pub fn load_counts<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let counts = read_counts(BufReader::new(File::open(path.as_ref())?))?;
        Ok(self.with_counts(counts))
    }
}

/// Parse `token count` lines
pub fn read_counts<R: BufRead>(reader: R) -> Result<Vec<(String, u64)>> {
    let mut counts = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (None, _, _) => continue,
            (Some(token), Some(count), None) => {
                let count = count.parse::<u64>().map_err(|e| {
                    VectorizerError::model(format!("line {}: bad count {count:?}: {e}", i + 1))
                })?;
                counts.push((token.to_string(), count));
            }
            _ => return Err(VectorizerError::model(format!("line {}: expected `token count`", i + 1))),
        }
    }
    Ok(counts)
}

/// Load a projection basis
pub fn load_projection<P: AsRef<Path>>(path: P) -> Result<Matrix> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    if is_cbor(path) {
        return serde_cbor::from_reader(reader)
            .map_err(|e| VectorizerError::model(format!("{}: {e}", path.display())));
    }
    read_projection_text(reader)
}

/// Parse whitespace separated rows
pub fn read_projection_text<R: BufRead>(reader: R) -> Result<Matrix> {
    let mut rows = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|f| parse_f32(f, i + 1))
            .collect::<Result<Vec<f32>>>()?;
        rows.push(row);
    }
    let cols = rows.first().map_or(0, Vec::len);
    Matrix::from_rows(cols, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEXT_MODEL: &str = "3 2\ncell 1.0 0.0\ngene 0.0 1.0\nrna 0.6 0.8\n";

    #[test]
    fn reads_word2vec_text() {
        let m = WordVectorModel::read_word2vec_text(Cursor::new(TEXT_MODEL)).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.dimension(), 2);
        assert_eq!(m.vector("rna").unwrap(), &[0.6, 0.8]);
        assert_eq!(m.index("gene").unwrap(), 1);
    }

    #[test]
    fn rejects_malformed_text() {
        let short = "3 2\ncell 1.0 0.0\n";
        assert!(WordVectorModel::read_word2vec_text(Cursor::new(short)).is_err());
        let width = "1 2\ncell 1.0\n";
        assert!(WordVectorModel::read_word2vec_text(Cursor::new(width)).is_err());
        let number = "1 2\ncell 1.0 x\n";
        assert!(WordVectorModel::read_word2vec_text(Cursor::new(number)).is_err());
        assert!(WordVectorModel::read_word2vec_text(Cursor::new("")).is_err());
    }

    #[test]
    fn counts_file() {
        let counts = read_counts(Cursor::new("cell 10\n\ngene 3\n")).unwrap();
        assert_eq!(counts, vec![("cell".to_string(), 10), ("gene".to_string(), 3)]);
        assert!(read_counts(Cursor::new("cell ten\n")).is_err());
    }

    #[test]
    fn cbor_round_trip_keeps_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.cbor");
        let m = WordVectorModel::read_word2vec_text(Cursor::new(TEXT_MODEL))
            .unwrap()
            .with_counts(vec![("gene", 5u64)]);
        m.save(&path).unwrap();

        let back = WordVectorModel::load(&path).unwrap();
        assert_eq!(back.tokens().collect::<Vec<_>>(), vec!["cell", "gene", "rna"]);
        assert_eq!(back.count("gene"), 5);
        assert_eq!(back.vector("cell").unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn projection_text() {
        let p = read_projection_text(Cursor::new("1 2 3\n4 5 6\n")).unwrap();
        assert_eq!(p.shape(), (2, 3));
        assert!(read_projection_text(Cursor::new("1 2\n3\n")).is_err());
    }
}
