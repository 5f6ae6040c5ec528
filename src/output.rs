use crate::config::OutputConfig;
use crate::types::RankedSite;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use std::fs;

/// Shape the ranked sites into the point collection the map consumes.
/// Feature order follows site order, so identical inputs serialize to
/// identical bytes.
pub fn to_feature_collection(sites: &[RankedSite]) -> FeatureCollection {
    let features = sites
        .iter()
        .map(|site| {
            let mut properties = JsonObject::new();
            properties.insert("zone".to_string(), site.zone.clone().into());
            properties.insert("area".to_string(), site.area.into());
            properties.insert("compact_score".to_string(), site.score.compact.into());
            properties.insert("big_box_score".to_string(), site.score.big_box.into());
            properties.insert("winner".to_string(), site.winner.as_str().into());
            properties.insert("margin".to_string(), site.margin.into());

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    site.location.x(),
                    site.location.y(),
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_sites(config: &OutputConfig, sites: &[RankedSite]) -> Result<()> {
    let collection = to_feature_collection(sites);

    let json = if config.pretty {
        serde_json::to_string_pretty(&collection)
    } else {
        serde_json::to_string(&collection)
    }
    .context("Failed to serialize ranked sites")?;

    if let Some(parent) = config.sites.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
    }
    fs::write(&config.sites, &json)
        .with_context(|| format!("Failed to write ranked sites: {:?}", config.sites))?;

    println!("Wrote {} ranked sites to {:?}", sites.len(), config.sites);
    Ok(())
}
