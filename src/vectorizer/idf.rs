use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;

use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};
use crate::vectorizer::corpus::Corpus;

/// Precomputed per-token IDF
/// 全コーパスで共通の統計量なので、スコアリング中は読み取り専用
/// IDF は有限かつ非負でなければならない
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(try_from = "RawIdfTable")]
pub struct IdfTable {
    /// token -> IDF
    idf: IndexMap<String, f64>,
    /// document count the table was computed from (0 if unknown)
    pub doc_num: u64,
}

#[derive(Deserialize)]
struct RawIdfTable {
    idf: IndexMap<String, f64>,
    doc_num: u64,
}

impl TryFrom<RawIdfTable> for IdfTable {
    type Error = VectorizerError;

    fn try_from(raw: RawIdfTable) -> Result<Self> {
        let mut table = Self::from_pairs(raw.idf)?;
        table.doc_num = raw.doc_num;
        Ok(table)
    }
}

impl IdfTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// IDFの計算
    /// `ln(1 + N / (1 + df))`, always positive
    ///
    /// # Arguments
    /// * `total_doc_count` - 全ドキュメント数
    /// * `doc_freq` - token を含むドキュメント数
    #[inline]
    pub fn idf_calc(total_doc_count: u64, doc_freq: u64) -> f64 {
        (1.0 + total_doc_count as f64 / (1.0 + doc_freq as f64)).ln()
    }

    /// Corpus から IDF を計算する
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let doc_num = corpus.get_doc_num();
        let mut idf: IndexMap<String, f64> = corpus
            .token_doc_freq
            .iter()
            .map(|entry| (entry.key().to_string(), Self::idf_calc(doc_num, *entry.value())))
            .collect();
        // DashMap の走査順は不定なので並べ替えておく
        idf.sort_keys();
        Self { idf, doc_num }
    }

    /// Build a table from `(token, idf)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (token, idf) in pairs {
            table.insert(token, idf)?;
        }
        Ok(table)
    }

    /// Set the IDF of a token
    pub fn insert<S: Into<String>>(&mut self, token: S, idf: f64) -> Result<&mut Self> {
        let token = token.into();
        if !idf.is_finite() || idf < 0.0 {
            return Err(VectorizerError::model(format!(
                "IDF of {token:?} must be a non-negative finite number, got {idf}"
            )));
        }
        self.idf.insert(token, idf);
        Ok(self)
    }

    /// IDF of a token, `None` if the table has no entry
    #[inline]
    pub fn get(&self, token: &str) -> Option<f64> {
        self.idf.get(token).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    /// Load a table: `*.cbor`, or `token idf` per line
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let table = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("cbor")) {
            serde_cbor::from_reader(reader)
                .map_err(|e| VectorizerError::model(format!("{}: {e}", path.display())))?
        } else {
            Self::read_text(reader)?
        };
        info!("loaded IDF table {} ({} tokens)", path.display(), table.len());
        Ok(table)
    }

    /// Parse `token idf` lines (tab or space separated)
    pub fn read_text<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (None, _, _) => continue,
                (Some(token), Some(value), None) => {
                    let value = value.parse::<f64>().map_err(|e| {
                        VectorizerError::model(format!("line {}: bad IDF {value:?}: {e}", i + 1))
                    })?;
                    table
                        .insert(token, value)
                        .map_err(|_| {
                            VectorizerError::model(format!(
                                "line {}: IDF must be a non-negative finite number",
                                i + 1
                            ))
                        })?;
                }
                _ => return Err(VectorizerError::model(format!("line {}: expected `token idf`", i + 1))),
            }
        }
        Ok(table)
    }

    /// Write the table as CBOR
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_cbor::to_writer(writer, self)
            .map_err(|e| VectorizerError::model(format!("{}: {e}", path.as_ref().display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rare_tokens_weigh_more() {
        let corpus = Corpus::new();
        corpus.add_set(&["the", "gene"]);
        corpus.add_set(&["the"]);
        corpus.add_set(&["the"]);
        let table = IdfTable::from_corpus(&corpus);
        assert_eq!(table.doc_num, 3);
        let the = table.get("the").unwrap();
        let gene = table.get("gene").unwrap();
        assert!(gene > the);
        assert!(the > 0.0);
        assert!((gene - (1.0f64 + 3.0 / 2.0).ln()).abs() < 1e-12);
        assert_eq!(table.get("absent"), None);
    }

    #[test]
    fn text_format() {
        let table = IdfTable::read_text(Cursor::new("gene\t2.5\n\ncell 0.5\n")).unwrap();
        assert_eq!(table.get("gene"), Some(2.5));
        assert_eq!(table.get("cell"), Some(0.5));
        assert!(IdfTable::read_text(Cursor::new("gene -1\n")).is_err());
        assert!(IdfTable::read_text(Cursor::new("gene\n")).is_err());
    }

    #[test]
    fn cbor_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idf.cbor");
        let table = IdfTable::from_pairs(vec![("a", 1.0), ("b", 2.0)]).unwrap();
        table.save(&path).unwrap();
        assert_eq!(IdfTable::load(&path).unwrap(), table);
    }

    #[test]
    fn negative_or_non_finite_idf_is_rejected() {
        assert!(IdfTable::from_pairs(vec![("a", -0.5)]).is_err());
        assert!(IdfTable::from_pairs(vec![("a", f64::NAN)]).is_err());
        assert!(IdfTable::new().insert("a", f64::INFINITY).is_err());

        // CBOR written by something other than `save`
        #[derive(Serialize)]
        struct Forged {
            idf: IndexMap<String, f64>,
            doc_num: u64,
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idf.cbor");
        let forged = Forged {
            idf: [("gene".to_string(), 1.0), ("cell".to_string(), -2.0)].into_iter().collect(),
            doc_num: 4,
        };
        serde_cbor::to_writer(File::create(&path).unwrap(), &forged).unwrap();
        assert!(matches!(IdfTable::load(&path), Err(VectorizerError::Model(_))));
    }
}
