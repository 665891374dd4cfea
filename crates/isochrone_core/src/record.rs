//! The compact per-cell output record (C7's result type).
//!
//! Drive-only and flight cells share one conceptual shape with disjoint
//! fields; rather than force them through a single struct with a pile of
//! `Option`s, this is a tagged sum with a hand-written `Serialize` that
//! emits the two distinct object shapes.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum CellRecord {
    DriveOnly {
        total_minutes: u32,
        /// Set when the time came from a sanitised road-table entry rather
        /// than the straight-line fallback.
        osrm_flag: Option<bool>,
    },
    Flight {
        total_minutes: u32,
        origin_access_code: String,
        destination_airport_code: String,
        stops: u8,
        osrm_flag: Option<bool>,
    },
}

impl CellRecord {
    pub fn total_minutes(&self) -> u32 {
        match self {
            CellRecord::DriveOnly { total_minutes, .. } => *total_minutes,
            CellRecord::Flight { total_minutes, .. } => *total_minutes,
        }
    }

    pub fn is_drive_only(&self) -> bool {
        matches!(self, CellRecord::DriveOnly { .. })
    }

    pub fn osrm_flag(&self) -> Option<bool> {
        match self {
            CellRecord::DriveOnly { osrm_flag, .. } => *osrm_flag,
            CellRecord::Flight { osrm_flag, .. } => *osrm_flag,
        }
    }

    pub fn destination_airport_code(&self) -> Option<&str> {
        match self {
            CellRecord::DriveOnly { .. } => None,
            CellRecord::Flight { destination_airport_code, .. } => {
                Some(destination_airport_code)
            }
        }
    }
}

impl Serialize for CellRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellRecord::DriveOnly { total_minutes, osrm_flag } => {
                let len = 2 + osrm_flag.is_some() as usize;
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("t", total_minutes)?;
                map.serialize_entry("drive", &1)?;
                if let Some(flag) = osrm_flag {
                    map.serialize_entry("g", flag)?;
                }
                map.end()
            }
            CellRecord::Flight {
                total_minutes,
                origin_access_code,
                destination_airport_code,
                stops,
                osrm_flag,
            } => {
                let len = 4 + osrm_flag.is_some() as usize;
                let mut map = serializer.serialize_map(Some(len))?;
                map.serialize_entry("t", total_minutes)?;
                map.serialize_entry("o", origin_access_code)?;
                map.serialize_entry("d", destination_airport_code)?;
                map.serialize_entry("s", stops)?;
                if let Some(flag) = osrm_flag {
                    map.serialize_entry("g", flag)?;
                }
                map.end()
            }
        }
    }
}

impl CellRecord {
    /// Reconstructs a record from the JSON shape [`Serialize`] produces,
    /// for tools (the discontinuity analyser run standalone) that need to
    /// reload an already-written base or chunk file rather than write one.
    /// There's no `Deserialize` impl: the tag lives in which keys are
    /// present, not in a dedicated discriminant field, so this mirrors the
    /// hand-written `Serialize` above instead of deriving one.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let total_minutes = value.get("t")?.as_u64()? as u32;
        let osrm_flag = value.get("g").and_then(serde_json::Value::as_bool);

        if value.get("drive").is_some() {
            return Some(CellRecord::DriveOnly { total_minutes, osrm_flag });
        }

        let origin_access_code = value.get("o")?.as_str()?.to_string();
        let destination_airport_code = value.get("d")?.as_str()?.to_string();
        let stops = value.get("s")?.as_u64()? as u8;
        Some(CellRecord::Flight {
            total_minutes,
            origin_access_code,
            destination_airport_code,
            stops,
            osrm_flag,
        })
    }
}
