use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};

/// Row-major dense `f32` matrix.
/// Used for the word vectors of a model, the injected projection basis and
/// the per-method datasets of the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = VectorizerError;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        Matrix::new(raw.rows, raw.cols, raw.data)
    }
}

impl Matrix {
    /// Create a matrix from row-major data
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(VectorizerError::model(format!(
                "matrix data length {} does not match shape ({rows}, {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Stack rows of equal width
    /// `cols` is needed so that an empty row set still has a shape
    pub fn from_rows<I, R>(cols: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f32]>,
    {
        let mut data = Vec::new();
        let mut n = 0;
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(VectorizerError::model(format!(
                    "row {n} has width {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
            n += 1;
        }
        Ok(Self { rows: n, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Get row `i`, or `None` if out of range
    #[inline]
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i < self.rows {
            Some(&self.data[i * self.cols..(i + 1) * self.cols])
        } else {
            None
        }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        // cols == 0 だと chunks_exact が panic する (その場合 data は空)
        self.data.chunks_exact(self.cols.max(1))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Little-endian byte image of the data (no shape header)
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 4);
        for v in &self.data {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Inverse of `to_le_bytes`
    pub fn from_le_bytes(rows: usize, cols: usize, bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(VectorizerError::model("matrix byte length is not a multiple of 4"));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::new(rows, cols, data)
    }
}
