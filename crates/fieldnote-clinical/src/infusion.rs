//! Drip and infusion rate arithmetic.
//!
//! Every calculator returns `None` rather than failing when an input is zero,
//! NaN or infinite; the `*_fields` variants also return `None` for empty or
//! non-numeric form fields.

/// Parses a raw form/CLI field. Empty or non-numeric input gives `None`.
pub fn parse_field(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().and_then(usable)
}

fn usable(x: f64) -> Option<f64> {
    (x.is_finite() && x != 0.0).then_some(x)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Drops per minute: `round(total_ml * drop_factor / minutes)`.
#[allow(clippy::cast_possible_truncation)]
pub fn gtt_per_minute(total_ml: f64, minutes: f64, drop_factor: f64) -> Option<i64> {
    let rate = usable(total_ml)? * usable(drop_factor)? / usable(minutes)?;
    Some(rate.round() as i64)
}

/// mL/hr from a mg/hr order and a mg/mL concentration, to 2 decimals.
pub fn ml_per_hour(dose_mg_per_hour: f64, concentration_mg_per_ml: f64) -> Option<f64> {
    Some(round2(usable(dose_mg_per_hour)? / usable(concentration_mg_per_ml)?))
}

/// mL/hr from a mcg/kg/min order: mcg -> mg (/1000), per kg -> per patient
/// (x weight), per min -> per hr (x60), mg -> mL (/concentration). 2 decimals.
pub fn weight_based_ml_per_hour(mcg_per_kg_per_min: f64, weight_kg: f64, concentration_mg_per_ml: f64) -> Option<f64> {
    let mg_per_kg_per_min = usable(mcg_per_kg_per_min)? / 1000.0;
    let mg_per_hour = mg_per_kg_per_min * usable(weight_kg)? * 60.0;
    Some(round2(mg_per_hour / usable(concentration_mg_per_ml)?))
}

pub fn gtt_per_minute_fields(total_ml: &str, minutes: &str, drop_factor: &str) -> Option<i64> {
    gtt_per_minute(parse_field(total_ml)?, parse_field(minutes)?, parse_field(drop_factor)?)
}

pub fn ml_per_hour_fields(dose_mg_per_hour: &str, concentration_mg_per_ml: &str) -> Option<f64> {
    ml_per_hour(parse_field(dose_mg_per_hour)?, parse_field(concentration_mg_per_ml)?)
}

pub fn weight_based_ml_per_hour_fields(mcg_per_kg_per_min: &str, weight_kg: &str, concentration_mg_per_ml: &str) -> Option<f64> {
    weight_based_ml_per_hour(
        parse_field(mcg_per_kg_per_min)?,
        parse_field(weight_kg)?,
        parse_field(concentration_mg_per_ml)?,
    )
}
