//! Creator name formatting

use crate::model::RawCreator;

/// Display name of a single creator
///
/// Single-field names (organizations) win; otherwise "first last" with
/// missing parts skipped.
pub fn creator_display_name(creator: &RawCreator) -> String {
    if let Some(name) = creator.name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    [creator.first_name.as_deref(), creator.last_name.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format creators as "John Doe, Jane Smith"
///
/// Creators without any name are dropped; an empty list gives "".
pub fn format_creators(creators: &[RawCreator]) -> String {
    creators
        .iter()
        .map(creator_display_name)
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
