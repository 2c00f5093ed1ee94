//! Raw upstream records and derived catalog resources
//!
//! Upstream records impose no schema contract: every field is optional and
//! unknown fields are kept in [`ItemData::extra`]. Derived [`Resource`]s are
//! rebuilt from scratch on every fetch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::taxonomy::Family;

// ========================================
// Raw upstream records
// ========================================

/// One creator entry (author, director, editor, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCreator {
    #[serde(default)]
    pub creator_type: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Single-field name, used for organizations
    #[serde(default)]
    pub name: Option<String>,
}

/// Tag entry: `{"tag": "EEG"}` or a bare `"EEG"`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Object { tag: String },
    Plain(String),
}

impl RawTag {
    pub fn name(&self) -> &str {
        match self {
            RawTag::Object { tag } => tag,
            RawTag::Plain(tag) => tag,
        }
    }
}

/// Loosely-typed field bag of an upstream item
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub creators: Vec<RawCreator>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub abstract_note: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "DOI")]
    pub doi: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub collections: Vec<String>,

    // Bibliographic
    #[serde(default)]
    pub publication_title: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub pages: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub book_title: Option<String>,

    // Multimedia
    #[serde(default)]
    pub running_time: Option<String>,
    #[serde(default)]
    pub studio: Option<String>,
    #[serde(default)]
    pub video_recording_format: Option<String>,

    // Technical
    #[serde(default)]
    pub version_number: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub programming_language: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,

    // Webpage
    #[serde(default)]
    pub website_title: Option<String>,
    #[serde(default)]
    pub website_name: Option<String>,
    #[serde(default)]
    pub access_date: Option<String>,

    /// Every field not modelled above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upstream item as returned by the reference-manager API
///
/// Accepts both the API envelope `{key, version, data: {...}}` and a flat
/// record carrying `key` next to the data fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawItemRepr")]
pub struct RawItem {
    pub key: String,
    pub version: Option<u64>,
    pub data: ItemData,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItemRepr {
    Envelope {
        key: String,
        #[serde(default)]
        version: Option<u64>,
        data: ItemData,
    },
    Flat(ItemData),
}

impl From<RawItemRepr> for RawItem {
    fn from(repr: RawItemRepr) -> Self {
        match repr {
            RawItemRepr::Envelope { key, version, data } => RawItem { key, version, data },
            RawItemRepr::Flat(data) => {
                let version = data.extra.get("version").and_then(Value::as_u64);
                RawItem {
                    key: data.key.clone().unwrap_or_default(),
                    version,
                    data,
                }
            }
        }
    }
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Collection (folder) in the upstream library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    pub key: String,
    pub name: String,
    pub parent_collection: Option<String>,
    pub num_items: u64,
}

// ========================================
// Derived resources
// ========================================

/// Normalized resource language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    French,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
            Language::Unknown => "Unknown",
        }
    }
}

/// Family-specific fields, discriminated by `family`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FamilyDetails {
    Bibliographic {
        #[serde(skip_serializing_if = "Option::is_none")]
        publication: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        publisher: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pages: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        volume: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        issue: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        book_title: Option<String>,
        citation: String,
    },
    Multimedia {
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        studio: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Technical {
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        company: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        repository: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Webpage {
        #[serde(skip_serializing_if = "Option::is_none")]
        website_title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        website_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        access_date: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl FamilyDetails {
    pub fn family(&self) -> Family {
        match self {
            FamilyDetails::Bibliographic { .. } => Family::Bibliographic,
            FamilyDetails::Multimedia { .. } => Family::Multimedia,
            FamilyDetails::Technical { .. } => Family::Technical,
            FamilyDetails::Webpage { .. } => Family::Webpage,
        }
    }

    /// Generated citation (bibliographic family only)
    pub fn citation(&self) -> Option<&str> {
        match self {
            FamilyDetails::Bibliographic { citation, .. } => Some(citation),
            _ => None,
        }
    }
}

/// Display-ready catalog resource derived from a [`RawItem`]
///
/// Serializes to the detail shape; the raw creator list stays internal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub color: String,
    pub theme_color: String,
    pub title: String,
    /// Formatted creator names, empty when there are none
    pub creators: String,
    #[serde(skip)]
    pub creators_raw: Vec<RawCreator>,
    /// Year extracted from `date`, empty when there is no date
    pub year: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub tags: Vec<String>,
    pub is_workshop: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_note: Option<String>,
    pub abstract_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Names of the collections this resource was retrieved from
    pub manifesto_part: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_key: Option<String>,
    #[serde(flatten)]
    pub details: FamilyDetails,
}

impl Resource {
    pub fn family(&self) -> Family {
        self.details.family()
    }
}
