use crate::config::{AppConfig, FilterConfig, ScoringConfig};
use crate::geometry;
use crate::scoring;
use crate::types::{RankedSite, StoreFormat, SuitabilityScore, ZoningParcel};

/// Keep the commercially zoned parcels above the size floor.
///
/// Stable: survivors come out in input order. A parcel with no zone code is
/// simply not commercial, so it drops out without complaint.
pub fn filter_parcels<'a>(
    config: &FilterConfig,
    parcels: &'a [ZoningParcel],
) -> Vec<&'a ZoningParcel> {
    parcels
        .iter()
        .filter(|parcel| {
            parcel
                .zone
                .as_deref()
                .map(|zone| zone.starts_with(&config.zone_prefix))
                .unwrap_or(false)
                && parcel.area > config.min_area
        })
        .collect()
}

/// Build one ranked site per surviving parcel: vertex centroid, both format
/// scores, winner and margin.
///
/// A parcel whose geometry has no vertices is reported and skipped; the rest
/// of the run is unaffected.
pub fn build_ranked_sites(config: &ScoringConfig, parcels: &[&ZoningParcel]) -> Vec<RankedSite> {
    let mut sites = Vec::with_capacity(parcels.len());

    for parcel in parcels {
        let location = match geometry::vertex_centroid(&parcel.geometry) {
            Ok(point) => point,
            Err(e) => {
                eprintln!(
                    "Skipping parcel {:?}: {}",
                    parcel.zone.as_deref().unwrap_or("<no zone>"),
                    e
                );
                continue;
            }
        };

        let score = scoring::score(config, parcel.area, parcel.density);
        sites.push(RankedSite {
            // The filter only passes parcels with a zone code.
            zone: parcel.zone.clone().unwrap_or_default(),
            area: parcel.area,
            score,
            winner: winner(score),
            margin: margin(score),
            location,
        });
    }

    sites
}

/// Ties go to the compact format.
fn winner(score: SuitabilityScore) -> StoreFormat {
    if score.big_box > score.compact {
        StoreFormat::BigBox
    } else {
        StoreFormat::Compact
    }
}

fn margin(score: SuitabilityScore) -> u8 {
    score.compact.abs_diff(score.big_box)
}

/// Full pipeline: filter, then score and rank. Pure with respect to its
/// inputs; rerunning on the same parcels replaces the previous output
/// wholesale.
pub fn rank_sites(config: &AppConfig, parcels: &[ZoningParcel]) -> Vec<RankedSite> {
    let commercial = filter_parcels(&config.filter, parcels);
    println!(
        "{} of {} parcels are commercial and above the size floor",
        commercial.len(),
        parcels.len()
    );

    let sites = build_ranked_sites(&config.scoring, &commercial);
    println!("Ranked {} candidate sites", sites.len());
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BigBoxConfig, CompactConfig};
    use geo::{LineString, MultiPolygon, Polygon};

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]),
            vec![],
        )])
    }

    fn parcel(zone: Option<&str>, area: f64) -> ZoningParcel {
        ZoningParcel {
            zone: zone.map(str::to_string),
            area,
            density: None,
            geometry: unit_square(),
        }
    }

    #[test]
    fn filter_keeps_only_commercial_above_floor() {
        let config = FilterConfig::default();
        let parcels = vec![
            parcel(Some("C1"), 3e-6),
            parcel(Some("R1"), 3e-6),
            parcel(Some("C2"), 5e-7),
            parcel(None, 3e-6),
            parcel(Some("C3"), 2e-6),
        ];
        let kept = filter_parcels(&config, &parcels);
        let zones: Vec<_> = kept.iter().map(|p| p.zone.as_deref().unwrap()).collect();
        assert_eq!(zones, vec!["C1", "C3"]);
    }

    #[test]
    fn residential_never_survives_regardless_of_area() {
        let config = FilterConfig::default();
        for area in [1e-7, 1e-6, 1e-3, 1.0] {
            let parcels = vec![parcel(Some("R1"), area)];
            assert!(filter_parcels(&config, &parcels).is_empty());
        }
    }

    #[test]
    fn area_floor_is_strict() {
        let config = FilterConfig::default();
        let parcels = vec![parcel(Some("C1"), 1e-6)];
        assert!(filter_parcels(&config, &parcels).is_empty());
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        let config = FilterConfig::default();
        let parcels = vec![parcel(Some("c1"), 3e-6)];
        assert!(filter_parcels(&config, &parcels).is_empty());
    }

    #[test]
    fn builder_derives_winner_and_margin() {
        let p = parcel(Some("C1"), 3e-6);
        let refs = vec![&p];
        let sites = build_ranked_sites(&ScoringConfig::default(), &refs);
        assert_eq!(sites.len(), 1);
        let site = &sites[0];
        assert_eq!(site.zone, "C1");
        assert_eq!(site.winner, StoreFormat::Compact);
        assert_eq!(
            site.margin,
            site.score.compact.abs_diff(site.score.big_box)
        );
        assert!(site.margin <= 100);
        // Vertex centroid of the closed unit square ring.
        assert_eq!(site.location.x_y(), (0.8, 0.8));
    }

    #[test]
    fn tie_goes_to_compact() {
        // Both size curves saturate at area 3e-6 with these tunables and all
        // weight on size, so the formats finish level.
        let config = ScoringConfig {
            compact: CompactConfig {
                ideal_area: 3e-6,
                size_weight: 1.0,
                density_weight: 0.0,
                ..CompactConfig::default()
            },
            big_box: BigBoxConfig {
                max_area: 3e-6,
                size_weight: 1.0,
                density_weight: 0.0,
                ..BigBoxConfig::default()
            },
        };
        let p = parcel(Some("C1"), 3e-6);
        let refs = vec![&p];
        let sites = build_ranked_sites(&config, &refs);
        assert_eq!(sites[0].score.compact, sites[0].score.big_box);
        assert_eq!(sites[0].winner, StoreFormat::Compact);
        assert_eq!(sites[0].margin, 0);
    }

    #[test]
    fn empty_geometry_skips_the_parcel_not_the_run() {
        let good = parcel(Some("C1"), 3e-6);
        let mut bad = parcel(Some("C2"), 3e-6);
        bad.geometry = MultiPolygon::new(vec![]);
        let refs = vec![&good, &bad];
        let sites = build_ranked_sites(&ScoringConfig::default(), &refs);
        let zones: Vec<_> = sites.iter().map(|s| s.zone.as_str()).collect();
        assert_eq!(zones, vec!["C1"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let config = AppConfig {
            input: crate::config::InputConfig {
                zoning: "zoning.geojson".into(),
                density: None,
                zone_field: "ZONE_".into(),
                area_field: "Shape_Area".into(),
                density_field: "pop_density".into(),
            },
            filter: FilterConfig::default(),
            scoring: ScoringConfig::default(),
            output: crate::config::OutputConfig {
                sites: "sites.geojson".into(),
                pretty: false,
            },
            server: crate::config::ServerConfig::default(),
        };
        assert!(rank_sites(&config, &[]).is_empty());
    }
}
