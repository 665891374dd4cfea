//! Origin road table: the sparse cell -> driving-minutes map from the
//! origin city centre, used only by the drive-only branch of the cell
//! evaluator (C7). Optional: a run with no such table falls back to the
//! straight-line estimator for every cell inside the drive-comparison
//! radius instead of treating the cell as unreachable by road.

use std::path::Path;

use h3o::CellIndex;
use std::collections::HashMap;

use crate::error::RoadTableError;

fn parse_cell_identity(raw: &str) -> Result<CellIndex, RoadTableError> {
    let value = u64::from_str_radix(raw, 16)
        .map_err(|_| RoadTableError::InvalidCellIdentity(raw.to_string()))?;
    CellIndex::try_from(value).map_err(|_| RoadTableError::InvalidCellIdentity(raw.to_string()))
}

/// Sparse cell -> driving-minutes map from the origin city centre.
#[derive(Debug, Clone, Default)]
pub struct OriginRoadTable {
    cells: HashMap<CellIndex, u32>,
}

impl OriginRoadTable {
    pub fn from_raw(raw: HashMap<String, u32>) -> Result<Self, RoadTableError> {
        let mut cells = HashMap::with_capacity(raw.len());
        for (cell_id, minutes) in raw {
            cells.insert(parse_cell_identity(&cell_id)?, minutes);
        }
        Ok(Self { cells })
    }

    pub fn load(path: &Path) -> Result<Self, RoadTableError> {
        let data = std::fs::read_to_string(path)?;
        let raw: HashMap<String, u32> = serde_json::from_str(&data)?;
        Self::from_raw(raw)
    }

    pub fn get(&self, cell: CellIndex) -> Option<u32> {
        self.cells.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Whether an origin road table was loaded at all, and if so what it says
/// about a given cell. Mirrors [`crate::road_table::RoadLookup`]'s
/// three-way split for the drive-only branch of the cell evaluator.
pub enum OriginRoadLookup {
    /// No origin road table was loaded for this run at all.
    NoTableLoaded,
    /// A table exists and this cell has a value.
    Entry(u32),
    /// A table exists but the cell is missing: water/unreachable by road.
    Absent,
}

pub fn lookup_origin_road_time(
    table: Option<&OriginRoadTable>,
    cell: CellIndex,
) -> OriginRoadLookup {
    match table {
        None => OriginRoadLookup::NoTableLoaded,
        Some(table) => match table.get(cell) {
            Some(minutes) => OriginRoadLookup::Entry(minutes),
            None => OriginRoadLookup::Absent,
        },
    }
}
