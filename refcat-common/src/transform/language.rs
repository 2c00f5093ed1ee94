//! Language normalization

use crate::model::Language;

/// Normalize a free-form language code to [`Language`]
///
/// Case-insensitive and whitespace-tolerant: `en`, `eng`, `english`,
/// `en-*`, `en_*` are English; `fr`, `french`, `fr-*`, `fr_*` are French.
/// Anything else, including a missing value, is Unknown.
pub fn normalize_language(code: Option<&str>) -> Language {
    let Some(code) = code else {
        return Language::Unknown;
    };
    let code = code.trim().to_lowercase();

    if matches!(code.as_str(), "en" | "eng" | "english")
        || code.starts_with("en-")
        || code.starts_with("en_")
    {
        Language::English
    } else if matches!(code.as_str(), "fr" | "french")
        || code.starts_with("fr-")
        || code.starts_with("fr_")
    {
        Language::French
    } else {
        Language::Unknown
    }
}
