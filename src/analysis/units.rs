//! Unit normalization into nanomolar.
//!
//! Affinity data arrives with heterogeneous concentration units. Everything is
//! converted to nM; unknown or missing units are taken as nM already, so noisy
//! records are kept rather than rejected.

use crate::models::{Measurement, RawValue};

/// Recognized unit prefixes and their multipliers into nM, matched in order.
pub const UNIT_PREFIXES: [(&str, f64); 4] = [
    ("nm", 1.0),
    ("um", 1_000.0),
    ("mm", 1_000_000.0),
    ("pm", 0.001),
];

/// Convert a raw value and optional unit string into nanomolar.
///
/// Returns `None` for missing, empty, `NA`, non-numeric or non-finite values,
/// and for values that overflow once scaled into nM.
pub fn to_nanomolar(value: Option<&RawValue>, unit: Option<&str>) -> Option<f64> {
    let nm = parse_value(value?)? * unit_multiplier(unit);
    nm.is_finite().then_some(nm)
}

/// Normalize a single measurement.
pub fn normalize(measurement: &Measurement) -> Option<f64> {
    to_nanomolar(
        measurement.raw_value.as_ref(),
        measurement.raw_unit.as_deref(),
    )
}

/// Multiplier into nM for a unit string. Missing or unrecognized units are ×1.
pub fn unit_multiplier(unit: Option<&str>) -> f64 {
    let unit = match unit {
        Some(u) if !u.trim().eq_ignore_ascii_case("nan") => u.trim(),
        _ => return 1.0,
    };

    let folded = unit.to_lowercase().replace(['µ', 'μ'], "u");

    UNIT_PREFIXES
        .iter()
        .find(|(prefix, _)| folded.starts_with(prefix))
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

fn parse_value(value: &RawValue) -> Option<f64> {
    let v = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() || s == "NA" {
                return None;
            }
            s.parse::<f64>().ok()?
        }
    };

    v.is_finite().then_some(v)
}
