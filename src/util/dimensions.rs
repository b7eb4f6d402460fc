//! Shape of n-dimensional series data.
//!
//! The leading dimension is always time; trailing dimensions describe one sample
//! (for example the electrode axis of a response series).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Dimensions of a row-major array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimensions {
    dims: SmallVec<[usize; 4]>,
}

impl Dimensions {
    /// Create 1D dimensions.
    pub fn d1(len: usize) -> Self {
        Self { dims: smallvec::smallvec![len] }
    }

    /// Create 2D dimensions.
    pub fn d2(rows: usize, cols: usize) -> Self {
        Self { dims: smallvec::smallvec![rows, cols] }
    }

    /// Create from a slice of sizes.
    pub fn from_slice(sizes: &[usize]) -> Self {
        Self { dims: SmallVec::from_slice(sizes) }
    }

    /// Number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of a specific dimension.
    pub fn size(&self, dim: usize) -> Option<usize> {
        self.dims.get(dim).copied()
    }

    /// All sizes.
    pub fn sizes(&self) -> &[usize] {
        &self.dims
    }

    /// Length of the leading (time) dimension; 0 for rank 0.
    #[inline]
    pub fn leading(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Number of elements in one row (product of trailing dimensions).
    pub fn row_len(&self) -> usize {
        self.dims.iter().skip(1).product()
    }

    /// Total number of elements.
    pub fn num_elements(&self) -> usize {
        if self.dims.is_empty() {
            0
        } else {
            self.dims.iter().product()
        }
    }

    /// Same trailing dimensions with a different leading length.
    pub fn with_leading(&self, len: usize) -> Self {
        let mut dims = self.dims.clone();
        match dims.first_mut() {
            Some(first) => *first = len,
            None => dims.push(len),
        }
        Self { dims }
    }
}

impl From<usize> for Dimensions {
    fn from(len: usize) -> Self {
        Self::d1(len)
    }
}

impl From<(usize, usize)> for Dimensions {
    fn from((rows, cols): (usize, usize)) -> Self {
        Self::d2(rows, cols)
    }
}

impl From<Vec<usize>> for Dimensions {
    fn from(v: Vec<usize>) -> Self {
        Self { dims: SmallVec::from_vec(v) }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, s) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", s)?;
        }
        if self.dims.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_1d() {
        let d = Dimensions::d1(100);
        assert_eq!(d.rank(), 1);
        assert_eq!(d.leading(), 100);
        assert_eq!(d.row_len(), 1);
        assert_eq!(d.num_elements(), 100);
        assert_eq!(d.to_string(), "(100,)");
    }

    #[test]
    fn test_2d() {
        let d: Dimensions = (100, 4).into();
        assert_eq!(d.rank(), 2);
        assert_eq!(d.size(1), Some(4));
        assert_eq!(d.row_len(), 4);
        assert_eq!(d.num_elements(), 400);
        assert_eq!(d.to_string(), "(100, 4)");
    }

    #[test]
    fn test_with_leading() {
        let d = Dimensions::d2(100, 4).with_leading(10);
        assert_eq!(d.sizes(), &[10, 4]);
        assert_eq!(Dimensions::default().with_leading(3).sizes(), &[3]);
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Dimensions::d2(3, 2)).unwrap();
        assert_eq!(json, "[3,2]");
    }
}
