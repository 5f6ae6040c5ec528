use geo::{MultiPolygon, Point};
use serde::Serialize;
use thiserror::Error;

/// Rough square-degrees-to-acres factor at the city's latitude.
pub const ACRES_PER_SQ_DEGREE: f64 = 404_686.0;

#[derive(Debug, Clone)]
pub struct ZoningParcel {
    pub zone: Option<String>,
    /// Shape area in the source dataset's unit (square degrees for WGS84 data).
    pub area: f64,
    /// People per unit area, when joined onto the parcel.
    pub density: Option<f64>,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFormat {
    Compact,
    BigBox,
}

impl StoreFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreFormat::Compact => "compact",
            StoreFormat::BigBox => "big_box",
        }
    }
}

/// Per-format suitability, each independently on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuitabilityScore {
    pub compact: u8,
    pub big_box: u8,
}

#[derive(Debug, Clone)]
pub struct RankedSite {
    pub zone: String,
    pub area: f64,
    pub score: SuitabilityScore,
    pub winner: StoreFormat,
    pub margin: u8,
    pub location: Point<f64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("geometry has no vertices")]
    EmptyGeometry,
}
