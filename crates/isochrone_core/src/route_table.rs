//! Route table: which airport codes are non-stop connected, per the
//! upstream crawler's output. Directionality in the source is not trusted;
//! symmetrisation happens downstream in the flight graph (C3).

use std::collections::HashMap;
use std::path::Path;

use crate::error::RouteTableError;

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    destinations: HashMap<String, Vec<String>>,
}

impl RouteTable {
    pub fn from_map(destinations: HashMap<String, Vec<String>>) -> Self {
        Self { destinations }
    }

    pub fn load(path: &Path) -> Result<Self, RouteTableError> {
        let data = std::fs::read_to_string(path)?;
        let destinations: HashMap<String, Vec<String>> = serde_json::from_str(&data)?;
        Ok(Self::from_map(destinations))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.destinations
            .iter()
            .flat_map(|(src, dsts)| dsts.iter().map(move |dst| (src.as_str(), dst.as_str())))
    }
}
