use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Zoning geometry, shapefile or GeoJSON (picked by extension).
    pub zoning: PathBuf,
    /// Optional population-density polygons (GeoJSON) to join onto parcels.
    pub density: Option<PathBuf>,
    #[serde(default = "default_zone_field")]
    pub zone_field: String,
    #[serde(default = "default_area_field")]
    pub area_field: String,
    #[serde(default = "default_density_field")]
    pub density_field: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterConfig {
    /// Zone codes starting with this prefix count as commercial.
    pub zone_prefix: String,
    /// Minimum shape area; unit follows the dataset's CRS, so this is
    /// calibration data, not a constant.
    pub min_area: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            zone_prefix: "C".to_string(),
            min_area: 1e-6,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub compact: CompactConfig,
    pub big_box: BigBoxConfig,
}

/// Compact-format tunables. The size response is a Gaussian around
/// `ideal_area`: these stores are hurt by parcels that are too large, not
/// just too small.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompactConfig {
    pub ideal_area: f64,
    pub area_tolerance: f64,
    pub density_cap: f64,
    pub size_weight: f64,
    pub density_weight: f64,
}

impl Default for CompactConfig {
    fn default() -> Self {
        CompactConfig {
            ideal_area: 3e-6,
            area_tolerance: 2e-6,
            density_cap: 6_000.0,
            size_weight: 0.6,
            density_weight: 0.4,
        }
    }
}

/// Big-box tunables. Size is a saturating ramp up to `max_area`, raised to
/// `convexity` so undersized parcels lose more than oversized ones gain.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BigBoxConfig {
    pub max_area: f64,
    pub convexity: f64,
    pub density_cap: f64,
    pub size_weight: f64,
    pub density_weight: f64,
}

impl Default for BigBoxConfig {
    fn default() -> Self {
        BigBoxConfig {
            max_area: 6e-6,
            convexity: 1.4,
            density_cap: 12_000.0,
            size_weight: 0.7,
            density_weight: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Where the ranked-site FeatureCollection is written.
    pub sites: PathBuf,
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { port: 8080 }
    }
}

fn default_zone_field() -> String {
    "ZONE_".to_string()
}

fn default_area_field() -> String {
    "Shape_Area".to_string()
}

fn default_density_field() -> String {
    "pop_density".to_string()
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
