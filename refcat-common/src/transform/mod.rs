//! Item transformer
//!
//! Converts raw upstream items into display-ready [`Resource`]s:
//!
//! ```text
//! { key: 'ABC123', data: { itemType: 'book', title: 'Book Title',
//!   creators: [{ creatorType: 'author', firstName: 'John', lastName: 'Doe' }],
//!   date: '2024-03-15', ... } }
//!        │
//!        ▼
//! { id: 'ABC123', type: 'book', family: 'bibliographic', color: 'blue-700',
//!   themeColor: 'blue', title: 'Book Title', creators: 'John Doe',
//!   year: '2024', citation: 'Doe, J. (2024) Book Title.', ... }
//! ```
//!
//! The transformer is a pure function of the item, the collection context and
//! the taxonomy table. It never fails: missing fields degrade to defaults.

mod citation;
mod creators;
mod language;
mod text;

pub use citation::generate_citation;
pub use creators::{creator_display_name, format_creators};
pub use language::normalize_language;
pub use text::{extract_year, truncate_text, ELLIPSIS, PREVIEW_MAX_CHARS};

use crate::model::{FamilyDetails, RawItem, RawTag, Resource};
use crate::taxonomy::{color_for_family, color_for_item_type, family_for_item_type, Family};
use text::non_empty;

/// Tag marking workshop material
pub const WORKSHOP_TAG: &str = "workshop";

/// Collection an item was fetched from
#[derive(Debug, Clone, Default)]
pub struct CollectionContext {
    /// Display name (becomes the resource's `manifestoPart`)
    pub name: Option<String>,
    pub key: Option<String>,
}

impl CollectionContext {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            key: Some(key.into()),
        }
    }
}

/// Tag names in upstream order, empties dropped
pub fn format_tags(tags: &[RawTag]) -> Vec<String> {
    tags.iter()
        .map(RawTag::name)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive tag membership
pub fn has_tag(tags: &[RawTag], tag_name: &str) -> bool {
    let wanted = tag_name.to_lowercase();
    tags.iter().any(|t| t.name().to_lowercase() == wanted)
}

/// Transform one raw item into a resource
pub fn transform_item(raw: &RawItem, context: &CollectionContext) -> Resource {
    let data = &raw.data;
    let item_type = data.item_type.clone().unwrap_or_default();
    let family = family_for_item_type(&item_type);

    let date = non_empty(&data.date).map(str::to_string);
    let year = date.as_deref().map(extract_year).unwrap_or_default();

    let abstract_note = non_empty(&data.abstract_note).map(str::to_string);
    let abstract_preview = abstract_note
        .as_deref()
        .map(|a| truncate_text(a, PREVIEW_MAX_CHARS))
        .unwrap_or_default();

    // Technical items prefer their programming language over the generic field
    let language = match non_empty(&data.programming_language) {
        Some(code) if family == Family::Technical => Some(normalize_language(Some(code))),
        _ => non_empty(&data.language).map(|code| normalize_language(Some(code))),
    };

    let owned = |value: &Option<String>| non_empty(value).map(str::to_string);

    let details = match family {
        Family::Bibliographic => FamilyDetails::Bibliographic {
            publication: owned(&data.publication_title),
            publisher: owned(&data.publisher),
            pages: owned(&data.pages),
            volume: owned(&data.volume),
            issue: owned(&data.issue),
            book_title: owned(&data.book_title),
            citation: generate_citation(data, &item_type),
        },
        Family::Multimedia => FamilyDetails::Multimedia {
            duration: owned(&data.running_time),
            studio: owned(&data.studio),
            format: owned(&data.video_recording_format),
            description: abstract_note.clone(),
        },
        Family::Technical => FamilyDetails::Technical {
            version: owned(&data.version_number),
            company: owned(&data.company),
            repository: owned(&data.repository),
            description: abstract_note.clone(),
        },
        Family::Webpage => FamilyDetails::Webpage {
            website_title: owned(&data.website_title),
            website_name: owned(&data.website_name),
            access_date: owned(&data.access_date),
            description: abstract_note.clone(),
        },
    };

    Resource {
        id: raw.key.clone(),
        color: color_for_item_type(&item_type).to_string(),
        theme_color: color_for_family(family).to_string(),
        item_type,
        title: owned(&data.title).unwrap_or_else(|| "(Untitled)".to_string()),
        creators: format_creators(&data.creators),
        creators_raw: data.creators.clone(),
        year,
        date,
        tags: format_tags(&data.tags),
        is_workshop: has_tag(&data.tags, WORKSHOP_TAG),
        url: owned(&data.url),
        doi: owned(&data.doi),
        abstract_note,
        abstract_preview,
        language,
        manifesto_part: context
            .name
            .iter()
            .filter(|n| !n.is_empty())
            .cloned()
            .collect(),
        collection_key: context.key.clone(),
        details,
    }
}

/// Transform a batch of raw items with the same collection context
pub fn transform_items(raws: &[RawItem], context: &CollectionContext) -> Vec<Resource> {
    raws.iter().map(|raw| transform_item(raw, context)).collect()
}
