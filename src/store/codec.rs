use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};
use crate::utils::matrix::Matrix;

/// One compressed matrix as it sits in the store file
/// payload = zlib(little-endian f32, row-major)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: usize,
    pub cols: usize,
    pub payload: Vec<u8>,
}

impl Dataset {
    /// Compress a matrix
    pub fn encode(matrix: &Matrix) -> Result<Self> {
        let compress_err = |e: std::io::Error| VectorizerError::store(format!("compression failed: {e}"));
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&matrix.to_le_bytes()).map_err(compress_err)?;
        let payload = encoder.finish().map_err(compress_err)?;
        Ok(Self {
            rows: matrix.rows(),
            cols: matrix.cols(),
            payload,
        })
    }

    /// Decompress into a matrix
    /// The shape comes from disk, so the decompressed length is bounded by it
    pub fn decode(&self) -> Result<Matrix> {
        let expected = self
            .rows
            .checked_mul(self.cols)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                VectorizerError::store(format!("corrupt dataset: shape ({}, {}) overflows", self.rows, self.cols))
            })?;
        let mut bytes = Vec::new();
        // 1 byte 余分に読めたら payload が長すぎる
        ZlibDecoder::new(self.payload.as_slice())
            .take((expected as u64).saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| VectorizerError::store(format!("corrupt dataset: {e}")))?;
        if bytes.len() != expected {
            return Err(VectorizerError::store(format!(
                "corrupt dataset: shape ({}, {}) does not match payload",
                self.rows, self.cols
            )));
        }
        Matrix::from_le_bytes(self.rows, self.cols, &bytes)
            .map_err(|e| VectorizerError::store(format!("corrupt dataset: {e}")))
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}
