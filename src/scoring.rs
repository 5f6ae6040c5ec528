use crate::config::ScoringConfig;
use crate::types::SuitabilityScore;

/// Score a parcel for both store formats from its shape area and local
/// population density. Pure: no state, same inputs give same outputs.
///
/// Density is the optional input; parcels with no joined density score as if
/// nobody lives nearby (the density term contributes zero, the configured
/// weights are not renormalized).
pub fn score(config: &ScoringConfig, area: f64, density: Option<f64>) -> SuitabilityScore {
    // Degenerate areas would turn the Gaussian and the ramp into NaN fuel,
    // so they pin both formats to zero instead.
    if !area.is_finite() || area <= 0.0 {
        return SuitabilityScore {
            compact: 0,
            big_box: 0,
        };
    }

    let density = match density {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => 0.0,
    };

    let compact = &config.compact;
    let big_box = &config.big_box;

    // Compact format wants a parcel near its ideal footprint; the Gaussian
    // decays symmetrically on both sides of it.
    let compact_size =
        (-(area - compact.ideal_area).powi(2) / (2.0 * compact.area_tolerance.powi(2))).exp();
    let compact_density = (density / compact.density_cap).min(1.0);

    // Big-box never penalizes extra land; undersized lots are squeezed by the
    // convexity exponent.
    let big_box_size = (area / big_box.max_area).min(1.0).powf(big_box.convexity);
    let big_box_density = (density / big_box.density_cap).min(1.0);

    SuitabilityScore {
        compact: to_points(
            compact_size * compact.size_weight + compact_density * compact.density_weight,
        ),
        big_box: to_points(
            big_box_size * big_box.size_weight + big_box_density * big_box.density_weight,
        ),
    }
}

/// Weighted [0,1] blend to a clamped integer 0-100.
fn to_points(weighted: f64) -> u8 {
    (weighted * 100.0).round().clamp(0.0, 100.0) as u8
}
