//! Custom Askama template filters.

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Local::now().year())
}

/// Pluralizes "unidad" for a count.
///
/// Usage in templates: `{{ item.quantity|unidades }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn unidades(count: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let count = count.to_string();
    Ok(if count == "1" {
        "1 unidad".to_owned()
    } else {
        format!("{count} unidades")
    })
}
