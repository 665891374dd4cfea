//! Error types for each fallible subsystem.
//!
//! Each loader gets its own enum rather than a shared boxed-error type, so
//! callers can match on what actually went wrong. [`PipelineError`] wraps the
//! rest for the top-level run.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum CatalogueError {
    Io(io::Error),
    Json(serde_json::Error),
    InvalidCoordinate { code: String, lat: f64, lng: f64 },
    DuplicateCode(String),
}

impl From<io::Error> for CatalogueError {
    fn from(err: io::Error) -> Self {
        CatalogueError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogueError {
    fn from(err: serde_json::Error) -> Self {
        CatalogueError::Json(err)
    }
}

impl fmt::Display for CatalogueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogueError::Io(e) => write!(f, "catalogue io error: {e}"),
            CatalogueError::Json(e) => write!(f, "catalogue json error: {e}"),
            CatalogueError::InvalidCoordinate { code, lat, lng } => {
                write!(f, "airport {code} has invalid coordinate ({lat}, {lng})")
            }
            CatalogueError::DuplicateCode(code) => write!(f, "duplicate airport code {code}"),
        }
    }
}

impl std::error::Error for CatalogueError {}

#[derive(Debug)]
pub enum RouteTableError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl From<io::Error> for RouteTableError {
    fn from(err: io::Error) -> Self {
        RouteTableError::Io(err)
    }
}

impl From<serde_json::Error> for RouteTableError {
    fn from(err: serde_json::Error) -> Self {
        RouteTableError::Json(err)
    }
}

impl fmt::Display for RouteTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTableError::Io(e) => write!(f, "route table io error: {e}"),
            RouteTableError::Json(e) => write!(f, "route table json error: {e}"),
        }
    }
}

impl std::error::Error for RouteTableError {}

/// A road-table region file failed to parse. The sanitiser treats the
/// affected airport(s) as if absent rather than aborting the run.
#[derive(Debug)]
pub enum RoadTableError {
    Io(io::Error),
    Json(serde_json::Error),
    InvalidCellIdentity(String),
}

impl From<io::Error> for RoadTableError {
    fn from(err: io::Error) -> Self {
        RoadTableError::Io(err)
    }
}

impl From<serde_json::Error> for RoadTableError {
    fn from(err: serde_json::Error) -> Self {
        RoadTableError::Json(err)
    }
}

impl fmt::Display for RoadTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadTableError::Io(e) => write!(f, "road table io error: {e}"),
            RoadTableError::Json(e) => write!(f, "road table json error: {e}"),
            RoadTableError::InvalidCellIdentity(s) => write!(f, "invalid cell identity: {s}"),
        }
    }
}

impl std::error::Error for RoadTableError {}

/// Top-level errors that abort a run, per the propagation policy: parsing
/// and sanitisation recover locally, but I/O and serialisation failures here
/// are fatal.
#[derive(Debug)]
pub enum PipelineError {
    Catalogue(CatalogueError),
    RouteTable(RouteTableError),
    RoadTable(RoadTableError),
    Io(io::Error),
    Json(serde_json::Error),
    Serialisation(String),
    UnknownOrigin(String),
}

impl From<CatalogueError> for PipelineError {
    fn from(err: CatalogueError) -> Self {
        PipelineError::Catalogue(err)
    }
}

impl From<RouteTableError> for PipelineError {
    fn from(err: RouteTableError) -> Self {
        PipelineError::RouteTable(err)
    }
}

impl From<RoadTableError> for PipelineError {
    fn from(err: RoadTableError) -> Self {
        PipelineError::RoadTable(err)
    }
}

impl From<io::Error> for PipelineError {
    fn from(err: io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Json(err)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Catalogue(e) => write!(f, "{e}"),
            PipelineError::RouteTable(e) => write!(f, "{e}"),
            PipelineError::RoadTable(e) => write!(f, "{e}"),
            PipelineError::Io(e) => write!(f, "pipeline io error: {e}"),
            PipelineError::Json(e) => write!(f, "pipeline json error: {e}"),
            PipelineError::Serialisation(msg) => write!(f, "serialisation failure: {msg}"),
            PipelineError::UnknownOrigin(key) => write!(f, "unknown origin key: {key}"),
        }
    }
}

impl std::error::Error for PipelineError {}
