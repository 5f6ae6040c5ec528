use crate::types::GeometryError;
use geo::{Coord, MultiPolygon, Point};

/// Flatten every ring of every polygon (outer and holes) into one ordered
/// vertex sequence. Closed rings keep their closing vertex, matching the raw
/// coordinate stream of the source data.
fn flatten_vertices(geometry: &MultiPolygon<f64>) -> Vec<Coord<f64>> {
    let mut coords = Vec::new();
    for polygon in geometry {
        coords.extend(polygon.exterior().coords().copied());
        for interior in polygon.interiors() {
            coords.extend(interior.coords().copied());
        }
    }
    coords
}

/// Unweighted mean of a vertex sequence.
///
/// Not an area-weighted centroid: stretches of boundary with denser vertex
/// sampling pull the result toward them. Downstream consumers key their
/// styling off these exact coordinates, so swapping in `geo`'s true centroid
/// would shift every output point.
fn mean_point(coords: &[Coord<f64>]) -> Result<Point<f64>, GeometryError> {
    if coords.is_empty() {
        return Err(GeometryError::EmptyGeometry);
    }
    let n = coords.len() as f64;
    let (sum_x, sum_y) = coords
        .iter()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x, y + c.y));
    Ok(Point::new(sum_x / n, sum_y / n))
}

/// Representative point for a parcel: the vertex-average of its geometry.
/// Fails with `EmptyGeometry` on a vertex-free geometry rather than dividing
/// by zero.
pub fn vertex_centroid(geometry: &MultiPolygon<f64>) -> Result<Point<f64>, GeometryError> {
    mean_point(&flatten_vertices(geometry))
}
