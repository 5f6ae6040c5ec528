use crate::config::{AppConfig, InputConfig};
use crate::types::ZoningParcel;
use anyhow::{Context, Result, anyhow};
use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};
use shapefile::Reader;
use std::fs::File;
use std::io::BufReader;

pub fn load_parcels(config: &AppConfig) -> Result<Vec<ZoningParcel>> {
    println!("Loading zoning data from {:?}...", config.input.zoning);

    let extension = config
        .input
        .zoning
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Zoning geometry file has no extension"))?;

    let parcels = match extension.as_str() {
        "shp" => load_shapefile(config)?,
        "json" | "geojson" => load_geojson(config)?,
        _ => return Err(anyhow!("Unsupported geometry format: {}", extension)),
    };

    println!("Loaded {} zoning parcels", parcels.len());
    Ok(parcels)
}

fn load_geojson(config: &AppConfig) -> Result<Vec<ZoningParcel>> {
    let file = File::open(&config.input.zoning)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", config.input.zoning))?;
    let reader = BufReader::new(file);

    // Parses the whole file into memory; municipal zoning layers are small
    // enough for that.
    let geojson = GeoJson::from_reader(reader).context("Failed to parse zoning GeoJSON")?;
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Zoning GeoJSON must be a FeatureCollection")),
    };

    parcels_from_collection(collection, &config.input)
}

pub(crate) fn parcels_from_collection(
    collection: FeatureCollection,
    input: &InputConfig,
) -> Result<Vec<ZoningParcel>> {
    let mut parcels = Vec::new();

    for feature in collection.features {
        let geometry = match feature.geometry {
            Some(geom) => {
                let converted: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert zoning geometry: {:?}", e))?;
                match converted {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // points/lines are not parcels
                }
            }
            None => continue,
        };

        let props = feature.properties.as_ref();

        // Absent zone codes stay absent; the filter treats them as
        // non-commercial rather than erroring.
        let zone = props
            .and_then(|p| p.get(&input.zone_field))
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            });

        // Missing or non-numeric areas degrade to zero, which the size floor
        // then drops.
        let area = props
            .and_then(|p| p.get(&input.area_field))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0);

        let density = props
            .and_then(|p| p.get(&input.density_field))
            .and_then(serde_json::Value::as_f64);

        parcels.push(ZoningParcel {
            zone,
            area,
            density,
            geometry,
        });
    }

    Ok(parcels)
}

fn load_shapefile(config: &AppConfig) -> Result<Vec<ZoningParcel>> {
    let mut reader = Reader::from_path(&config.input.zoning)
        .with_context(|| format!("Failed to open Shapefile: {:?}", config.input.zoning))?;

    let mut parcels = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let geometry = match shape {
            shapefile::Shape::Polygon(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?;
                geo_polygon
            }
            shapefile::Shape::PolygonM(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?;
                geo_polygon
            }
            shapefile::Shape::PolygonZ(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?;
                geo_polygon
            }
            _ => continue, // skip non-polygon shapes
        };

        let zone = match record.get(&config.input.zone_field) {
            Some(shapefile::dbase::FieldValue::Character(Some(s))) => Some(s.clone()),
            _ => None,
        };
        let area = dbase_number(record.get(&config.input.area_field)).unwrap_or(0.0);
        let density = dbase_number(record.get(&config.input.density_field));

        parcels.push(ZoningParcel {
            zone,
            area,
            density,
            geometry,
        });
    }

    Ok(parcels)
}

fn dbase_number(value: Option<&shapefile::dbase::FieldValue>) -> Option<f64> {
    match value {
        Some(shapefile::dbase::FieldValue::Numeric(Some(n))) => Some(*n),
        Some(shapefile::dbase::FieldValue::Float(Some(f))) => Some(f64::from(*f)),
        Some(shapefile::dbase::FieldValue::Double(d)) => Some(*d),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn input() -> InputConfig {
        InputConfig {
            zoning: "zoning.geojson".into(),
            density: None,
            zone_field: "ZONE_".into(),
            area_field: "Shape_Area".into(),
            density_field: "pop_density".into(),
        }
    }

    fn collection(src: &str) -> FeatureCollection {
        match GeoJson::from_str(src).unwrap() {
            GeoJson::FeatureCollection(fc) => fc,
            _ => panic!("expected a FeatureCollection"),
        }
    }

    #[test]
    fn reads_attributes_and_wraps_polygons() {
        let fc = collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"ZONE_": "C1", "Shape_Area": 3e-6, "pop_density": 6000},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0,0.0],[0.0,2.0],[2.0,2.0],[2.0,0.0],[0.0,0.0]]]
                    }
                }]
            }"#,
        );
        let parcels = parcels_from_collection(fc, &input()).unwrap();
        assert_eq!(parcels.len(), 1);
        let p = &parcels[0];
        assert_eq!(p.zone.as_deref(), Some("C1"));
        assert_eq!(p.area, 3e-6);
        assert_eq!(p.density, Some(6000.0));
        assert_eq!(p.geometry.0.len(), 1);
    }

    #[test]
    fn missing_attributes_degrade_instead_of_failing() {
        let fc = collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"Shape_Area": "not a number"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]
                    }
                }]
            }"#,
        );
        let parcels = parcels_from_collection(fc, &input()).unwrap();
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].zone, None);
        assert_eq!(parcels[0].area, 0.0);
        assert_eq!(parcels[0].density, None);
    }

    #[test]
    fn non_polygon_features_are_skipped() {
        let fc = collection(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": {"ZONE_": "C1", "Shape_Area": 3e-6},
                        "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
                    },
                    {
                        "type": "Feature",
                        "properties": {"ZONE_": "C2", "Shape_Area": 3e-6},
                        "geometry": null
                    }
                ]
            }"#,
        );
        let parcels = parcels_from_collection(fc, &input()).unwrap();
        assert!(parcels.is_empty());
    }

    #[test]
    fn multipolygons_pass_through_unwrapped() {
        let fc = collection(
            r#"{
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": {"ZONE_": "C9", "Shape_Area": 4e-6},
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]],
                            [[[3.0,0.0],[4.0,0.0],[4.0,1.0],[3.0,0.0]]]
                        ]
                    }
                }]
            }"#,
        );
        let parcels = parcels_from_collection(fc, &input()).unwrap();
        assert_eq!(parcels[0].geometry.0.len(), 2);
    }
}
