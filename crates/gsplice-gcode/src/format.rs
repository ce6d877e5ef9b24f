//! Deterministic numeric formatting for emitted G-code.

/// Format a coordinate or feed value for output.
///
/// Values are rounded to six decimal places and printed in the shortest
/// decimal form with no trailing zeros, so splicing the same input twice
/// produces byte-identical output.
pub fn fmt_value(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    // normalize negative zero
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}
