//! Electrode tables and row selections into them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::util::ReferenceError;

/// In-session identity of an object that can be referenced.
///
/// Identities are assigned by the owner of the resolution scope and are never
/// written to storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Provider of an electrode table.
///
/// The table itself is owned outside this crate; series only select rows of it.
pub trait ElectrodeTable {
    /// Number of electrodes (rows).
    fn num_rows(&self) -> usize;

    /// Identifier of the electrode in `row`.
    fn electrode_id(&self, row: usize) -> Option<u64>;

    /// Table description.
    fn description(&self) -> &str;
}

/// A single electrode of an in-memory table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeRow {
    /// Electrode identifier.
    pub id: u64,
    /// Brain area of the electrode.
    pub location: String,
    /// Name of the electrode group.
    pub group: String,
}

/// Simple in-memory electrode table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeTableRows {
    pub description: String,
    /// Electrodes in row order.
    pub rows: Vec<ElectrodeRow>,
}

impl ElectrodeTableRows {
    /// Empty table.
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            rows: Vec::new(),
        }
    }

    /// Append an electrode; its id is its row index.
    pub fn add_electrode(&mut self, location: &str, group: &str) -> usize {
        let row = self.rows.len();
        self.rows.push(ElectrodeRow {
            id: row as u64,
            location: location.to_string(),
            group: group.to_string(),
        });
        row
    }

    /// Table with `count` electrodes in one group.
    pub fn with_electrodes(count: usize, location: &str, group: &str) -> Self {
        let mut table = Self::new("electrodes");
        for _ in 0..count {
            table.add_electrode(location, group);
        }
        table
    }
}

impl ElectrodeTable for ElectrodeTableRows {
    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn electrode_id(&self, row: usize) -> Option<u64> {
        self.rows.get(row).map(|r| r.id)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Ordered, non-empty selection of rows of an electrode table.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectrodeRegion {
    /// Identity of the electrode table.
    pub table: ObjectId,
    /// Selected row indices, in selection order.
    pub rows: SmallVec<[usize; 8]>,
    /// What the selection is.
    pub description: String,
}

impl ElectrodeRegion {
    /// Select `rows` of `table`, checking every index against it.
    pub fn select(
        table_id: ObjectId,
        table: &dyn ElectrodeTable,
        rows: &[usize],
        description: &str,
    ) -> Result<Self, ReferenceError> {
        if rows.is_empty() {
            return Err(ReferenceError::EmptyRegion);
        }
        let num_rows = table.num_rows();
        if let Some(&row) = rows.iter().find(|&&r| r >= num_rows) {
            return Err(ReferenceError::RowOutOfRange { row, num_rows });
        }
        Ok(Self {
            table: table_id,
            rows: SmallVec::from_slice(rows),
            description: description.to_string(),
        })
    }

    /// Number of selected electrodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows are selected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_rows() {
        let table = ElectrodeTableRows::with_electrodes(4, "striatum", "probe0");
        let region = ElectrodeRegion::select(ObjectId(1), &table, &[0, 1, 2, 3], "all").unwrap();
        assert_eq!(region.len(), 4);
        assert_eq!(table.electrode_id(3), Some(3));
        assert_eq!(table.electrode_id(4), None);
    }

    #[test]
    fn test_select_rejects_bad_rows() {
        let table = ElectrodeTableRows::with_electrodes(2, "striatum", "probe0");
        assert_eq!(
            ElectrodeRegion::select(ObjectId(1), &table, &[], "none"),
            Err(ReferenceError::EmptyRegion)
        );
        assert_eq!(
            ElectrodeRegion::select(ObjectId(1), &table, &[0, 2], "bad"),
            Err(ReferenceError::RowOutOfRange { row: 2, num_rows: 2 })
        );
    }
}
