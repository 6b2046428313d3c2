pub mod assets;
pub mod dashboard;
pub mod extractors;
pub mod generation;
pub mod users;

/// Treats empty strings like absent fields.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
