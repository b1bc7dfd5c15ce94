//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use crate::api::wire_date;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a `YYYY-MM-DD` or ISO timestamp as `Mar 4, 2024`. Anything else
/// is shown unchanged.
///
/// Usage in templates: `{{ employee.hire_date|long_date }}`
#[askama::filter_fn]
pub fn long_date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_long_date(&value.to_string()))
}

fn format_long_date(raw: &str) -> String {
    wire_date::parse(raw).map_or_else(
        || raw.to_string(),
        |date| date.format("%b %-d, %Y").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_date() {
        assert_eq!(format_long_date("2024-03-04T10:00:00Z"), "Mar 4, 2024");
        assert_eq!(format_long_date("2024-12-25"), "Dec 25, 2024");
        assert_eq!(format_long_date("-"), "-");
    }
}
