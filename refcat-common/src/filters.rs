//! Catalog filter matching, free-text search and filter facets

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::model::{Language, Resource};

/// Active filter selections; an empty category matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilters {
    /// Collection display names (matched against `manifestoPart`)
    pub sections: Vec<String>,
    pub tags: Vec<String>,
    pub types: Vec<String>,
    /// Language names: "English", "French" or "Unknown"
    pub languages: Vec<String>,
}

impl ActiveFilters {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
            && self.tags.is_empty()
            && self.types.is_empty()
            && self.languages.is_empty()
    }
}

/// True when the resource matches every non-empty filter category
///
/// Within a category, matching any one selected value is enough.
pub fn matches_filters(resource: &Resource, filters: &ActiveFilters) -> bool {
    if !filters.sections.is_empty()
        && !filters
            .sections
            .iter()
            .any(|s| resource.manifesto_part.contains(s))
    {
        return false;
    }

    if !filters.tags.is_empty() && !filters.tags.iter().any(|t| resource.tags.contains(t)) {
        return false;
    }

    if !filters.types.is_empty() && !filters.types.contains(&resource.item_type) {
        return false;
    }

    if !filters.languages.is_empty() {
        let language = resource.language.unwrap_or(Language::Unknown).as_str();
        if !filters.languages.iter().any(|l| l == language) {
            return false;
        }
    }

    true
}

/// Case-insensitive substring search over title, creators and abstract
///
/// A blank query matches everything.
pub fn matches_query(resource: &Resource, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    resource.title.to_lowercase().contains(&query)
        || resource.creators.to_lowercase().contains(&query)
        || resource
            .abstract_note
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(&query))
}

/// One selectable filter value with its label and resource count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub count: usize,
}

/// Filter values available in a resource list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Collection names, sorted
    pub sections: Vec<String>,
    /// Item types, most frequent first
    pub types: Vec<FilterOption>,
    /// Languages sorted by name, "Unknown" last
    pub languages: Vec<FilterOption>,
}

/// Collect the filter facets of a resource list
pub fn filter_options(resources: &[Resource]) -> FilterOptions {
    let mut sections: BTreeSet<String> = BTreeSet::new();
    let mut types: HashMap<&str, usize> = HashMap::new();
    let mut languages: HashMap<&'static str, usize> = HashMap::new();

    for resource in resources {
        sections.extend(resource.manifesto_part.iter().cloned());
        if !resource.item_type.is_empty() {
            *types.entry(resource.item_type.as_str()).or_insert(0) += 1;
        }
        let language = resource.language.unwrap_or(Language::Unknown).as_str();
        *languages.entry(language).or_insert(0) += 1;
    }

    let mut types: Vec<FilterOption> = types
        .into_iter()
        .map(|(value, count)| FilterOption {
            value: value.to_string(),
            label: format_type_name(value),
            count,
        })
        .collect();
    types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

    let mut languages: Vec<FilterOption> = languages
        .into_iter()
        .map(|(value, count)| FilterOption {
            value: value.to_string(),
            label: format_language_name(Some(value)),
            count,
        })
        .collect();
    languages.sort_by_key(|option| (option.value == Language::Unknown.as_str(), option.value.clone()));

    FilterOptions {
        sections: sections.into_iter().collect(),
        types,
        languages,
    }
}

/// "journalArticle" → "Journal Article"
pub fn format_type_name(item_type: &str) -> String {
    if item_type.is_empty() {
        return "Unknown".to_string();
    }

    let mut formatted = String::with_capacity(item_type.len() + 4);
    for (i, c) in item_type.chars().enumerate() {
        if i == 0 {
            formatted.extend(c.to_uppercase());
        } else if c.is_ascii_uppercase() {
            formatted.push(' ');
            formatted.push(c);
        } else {
            formatted.push(c);
        }
    }
    formatted.trim().to_string()
}

/// Label for a language filter value
pub fn format_language_name(language: Option<&str>) -> String {
    match language {
        None | Some("") | Some("Unknown") => "Not specified".to_string(),
        Some(name) => name.to_string(),
    }
}
