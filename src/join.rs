use crate::geometry;
use crate::types::ZoningParcel;
use anyhow::{Context, Result, anyhow};
use geo::Polygon;
use geo::algorithm::contains::Contains;
use geojson::{GeoJson, Value};
use rayon::prelude::*;
use rstar::{AABB, RTree, RTreeObject};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Wrapper so the density polygons can live in an RTree; geo types don't
// implement RTreeObject themselves.
pub struct DensityPolygon {
    polygon: Polygon<f64>,
    density: f64,
}

impl RTreeObject for DensityPolygon {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        use geo::bounding_rect::BoundingRect;
        match self.polygon.bounding_rect() {
            Some(bbox) => AABB::from_corners(
                [bbox.min().x, bbox.min().y],
                [bbox.max().x, bbox.max().y],
            ),
            None => AABB::from_point([0.0, 0.0]),
        }
    }
}

pub fn load_density_polygons(path: &Path, density_field: &str) -> Result<RTree<DensityPolygon>> {
    println!("Loading population density from {:?}...", path);
    let file =
        File::open(path).with_context(|| format!("Failed to open density file: {:?}", path))?;
    let reader = BufReader::new(file);
    let geojson = GeoJson::from_reader(reader).context("Failed to parse density GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Density data must be a FeatureCollection")),
    };

    let mut polygons = Vec::new();

    for feature in collection.features {
        let density = match feature
            .properties
            .as_ref()
            .and_then(|p| p.get(density_field))
            .and_then(serde_json::Value::as_f64)
        {
            Some(d) if d.is_finite() => d,
            _ => continue, // a density polygon without a density is useless
        };

        if let Some(geom) = feature.geometry {
            match geom.value {
                Value::Polygon(_) | Value::MultiPolygon(_) => {
                    let geo_geom: geo::Geometry<f64> = geom
                        .value
                        .try_into()
                        .map_err(|e| anyhow!("Failed to convert density geometry: {:?}", e))?;

                    match geo_geom {
                        geo::Geometry::Polygon(p) => {
                            polygons.push(DensityPolygon { polygon: p, density })
                        }
                        geo::Geometry::MultiPolygon(mp) => {
                            for p in mp {
                                polygons.push(DensityPolygon { polygon: p, density });
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }

    println!("Building spatial index for {} density polygons...", polygons.len());
    let tree = RTree::bulk_load(polygons);
    Ok(tree)
}

/// Attach a population density to every parcel whose representative point
/// falls inside a density polygon. Densities already present on the parcel
/// (pre-joined in the source data) are left alone.
pub fn join_density(parcels: &mut Vec<ZoningParcel>, density_tree: &RTree<DensityPolygon>) {
    println!("Joining density onto {} parcels...", parcels.len());

    parcels.par_iter_mut().for_each(|parcel| {
        if parcel.density.is_some() {
            return;
        }

        let centroid = match geometry::vertex_centroid(&parcel.geometry) {
            Ok(point) => point,
            Err(_) => return, // vertex-free parcels can't be located
        };

        let envelope = AABB::from_point([centroid.x(), centroid.y()]);
        for candidate in density_tree.locate_in_envelope_intersecting(&envelope) {
            if candidate.polygon.contains(&centroid) {
                parcel.density = Some(candidate.density);
                return;
            }
        }
    });
}
