//! Small numeric helpers shared by the aggregations.

/// Arithmetic mean. An empty slice yields NaN (0 / 0), matching how the
/// dashboards have always displayed an empty group.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Fixed-point display, e.g. `6.00`. Non-finite values print as `NaN`,
/// `Infinity` or `-Infinity`.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        let rounded = round_to(value, decimals as u32);
        // Avoid "-0.00".
        let rounded = if rounded == 0.0 { 0.0 } else { rounded };
        format!("{:.*}", decimals, rounded)
    }
}
