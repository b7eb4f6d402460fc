//! Shared n-dimensional sample buffers.
//!
//! A [`DataArray`] is a view (element offset + shape) over a reference-counted
//! buffer. Slicing along the leading dimension shares the buffer; appending rows
//! copies only when the buffer is shared or the view does not end at its tail.

use md5::{Digest, Md5};
use std::fmt;
use std::sync::Arc;

use crate::util::{BoundsError, Dimensions, ValidationError};

/// 128-bit content digest of a data array.
pub type DataDigest = [u8; 16];

/// Row-major `f64` array whose leading dimension is time.
#[derive(Clone)]
pub struct DataArray {
    buffer: Arc<Vec<f64>>,
    offset: usize,
    dims: Dimensions,
}

impl DataArray {
    /// Wrap `values` with the given shape.
    pub fn new(values: Vec<f64>, dims: impl Into<Dimensions>) -> Result<Self, ValidationError> {
        let dims = dims.into();
        if dims.rank() == 0 || dims.num_elements() != values.len() {
            return Err(ValidationError::ShapeMismatch {
                attribute: "data".into(),
                expected: dims.to_string(),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(Self {
            buffer: Arc::new(values),
            offset: 0,
            dims,
        })
    }

    /// 1-D array.
    pub fn from_vec(values: Vec<f64>) -> Self {
        let dims = Dimensions::d1(values.len());
        Self {
            buffer: Arc::new(values),
            offset: 0,
            dims,
        }
    }

    /// 2-D array from equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ValidationError> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(ValidationError::ShapeMismatch {
                attribute: "data".into(),
                expected: format!("rows of {}", cols),
                actual: format!("row of {}", bad.len()),
            });
        }
        let values: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(values, Dimensions::d2(rows.len(), cols))
    }

    /// Shape of the array.
    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    /// Number of samples (leading dimension).
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.leading()
    }

    /// Check if the array has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements per sample.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.dims.row_len()
    }

    /// The viewed elements in row-major order.
    pub fn as_slice(&self) -> &[f64] {
        &self.buffer[self.offset..self.offset + self.dims.num_elements()]
    }

    /// Raw bytes of the viewed elements.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// One sample.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.len() {
            return None;
        }
        let w = self.row_len();
        Some(&self.as_slice()[index * w..(index + 1) * w])
    }

    /// First and last element, if any.
    pub fn first(&self) -> Option<f64> {
        self.as_slice().first().copied()
    }

    /// Last value in row-major order.
    pub fn last(&self) -> Option<f64> {
        self.as_slice().last().copied()
    }

    /// View of rows `start..end` sharing the same buffer.
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Self, BoundsError> {
        let len = self.len();
        if start > end || end > len {
            return Err(BoundsError::OutOfBounds { start, end, len });
        }
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            offset: self.offset + start * self.row_len(),
            dims: self.dims.with_leading(end - start),
        })
    }

    /// Append whole rows, given as a flat row-major slice.
    pub fn append_rows(&mut self, values: &[f64]) -> Result<usize, ValidationError> {
        let w = self.row_len();
        if w == 0 || values.len() % w != 0 {
            return Err(ValidationError::ShapeMismatch {
                attribute: "data".into(),
                expected: format!("a multiple of {} values", w),
                actual: format!("{} values", values.len()),
            });
        }
        let added = values.len() / w;
        let end = self.offset + self.dims.num_elements();

        match Arc::get_mut(&mut self.buffer) {
            Some(buf) if buf.len() == end => buf.extend_from_slice(values),
            _ => {
                let mut owned = Vec::with_capacity(self.dims.num_elements() + values.len());
                owned.extend_from_slice(self.as_slice());
                owned.extend_from_slice(values);
                self.buffer = Arc::new(owned);
                self.offset = 0;
            }
        }
        self.dims = self.dims.with_leading(self.len() + added);
        Ok(added)
    }

    /// Whether both arrays view the same underlying buffer.
    pub fn shares_buffer(&self, other: &DataArray) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// MD5 digest of the shape and viewed bytes.
    pub fn digest(&self) -> DataDigest {
        let mut hasher = Md5::new();
        for d in self.dims.sizes() {
            hasher.update((*d as u64).to_le_bytes());
        }
        hasher.update(self.as_bytes());
        hasher.finalize().into()
    }
}

impl PartialEq for DataArray {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.as_slice() == other.as_slice()
    }
}

impl fmt::Debug for DataArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: Vec<f64> = self.as_slice().iter().take(4).copied().collect();
        f.debug_struct("DataArray")
            .field("dims", &self.dims.to_string())
            .field("head", &head)
            .finish()
    }
}
