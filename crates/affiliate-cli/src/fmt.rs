//! Formatting helpers for terminal output.

use rust_decimal::Decimal;

/// Truncate a string to `max` characters, appending an ellipsis if needed.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Dollar amount with two decimals, e.g. `$89.70`.
pub fn money(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Percentage with one decimal, e.g. `8.3%`.
pub fn percent(rate: f64) -> String {
    format!("{rate:.1}%")
}
