//! Hierarchical hex grid adapter (C2).
//!
//! Wraps `h3o` behind the handful of operations the rest of the crate
//! needs. Cell identities are opaque outside this module; nothing else
//! should assume anything about H3's own numerology beyond what these
//! functions expose.

use h3o::{CellIndex, LatLng, Resolution};

/// The cell at `resolution` containing the given lat/lng, in degrees.
pub fn cell_at(lat: f64, lng: f64, resolution: Resolution) -> Option<CellIndex> {
    LatLng::new(lat, lng).ok().map(|ll| ll.to_cell(resolution))
}

/// Centre (lat, lng) in degrees of a cell.
pub fn cell_center(cell: CellIndex) -> (f64, f64) {
    let ll: LatLng = cell.into();
    (ll.lat(), ll.lng())
}

/// All descendants of `cell` at `child_resolution`.
pub fn children(cell: CellIndex, child_resolution: Resolution) -> Vec<CellIndex> {
    cell.children(child_resolution).collect()
}

/// Cells within grid distance `k` of `cell`, including `cell` itself at k=0.
pub fn disk(cell: CellIndex, k: u32) -> Vec<CellIndex> {
    cell.grid_disk::<Vec<_>>(k)
}

/// The six ring-1 neighbours of `cell`. Pentagon distortion can make one or
/// more positions undefined; those are simply omitted rather than padded.
pub fn ring1(cell: CellIndex) -> Vec<CellIndex> {
    cell.grid_ring_fast(1).flatten().collect()
}

/// The ancestor of `cell` at a coarser `resolution`.
pub fn parent(cell: CellIndex, resolution: Resolution) -> Option<CellIndex> {
    cell.parent(resolution)
}

/// All resolution-0 base cells, the roots of the global traversal in C8.
pub fn base_cells() -> impl Iterator<Item = CellIndex> {
    CellIndex::base_cells()
}
