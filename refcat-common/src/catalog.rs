//! Catalog helpers over transformed resources
//!
//! Deduplication across collections, family grouping, aggregate stats and
//! the card/detail views served by the HTTP layer.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::model::{Language, Resource};
use crate::taxonomy::Family;

/// Merge resources sharing an id
///
/// Keeps first-seen order. A recurring id takes the later resource's fields
/// while its `manifestoPart` becomes the deduplicated union of both.
pub fn deduplicate_resources(resources: Vec<Resource>) -> Vec<Resource> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Resource> = Vec::with_capacity(resources.len());

    for mut resource in resources {
        match index.get(&resource.id) {
            Some(&pos) => {
                let mut parts = std::mem::take(&mut merged[pos].manifesto_part);
                for part in resource.manifesto_part.drain(..) {
                    if !parts.contains(&part) {
                        parts.push(part);
                    }
                }
                resource.manifesto_part = parts;
                merged[pos] = resource;
            }
            None => {
                let mut parts: Vec<String> = Vec::with_capacity(resource.manifesto_part.len());
                for part in resource.manifesto_part.drain(..) {
                    if !parts.contains(&part) {
                        parts.push(part);
                    }
                }
                resource.manifesto_part = parts;
                index.insert(resource.id.clone(), merged.len());
                merged.push(resource);
            }
        }
    }

    merged
}

/// Group resources by family; every family is present, possibly empty
pub fn group_by_family(resources: &[Resource]) -> BTreeMap<Family, Vec<&Resource>> {
    let mut grouped: BTreeMap<Family, Vec<&Resource>> =
        Family::ALL.iter().map(|f| (*f, Vec::new())).collect();

    for resource in resources {
        grouped.entry(resource.family()).or_default().push(resource);
    }

    grouped
}

/// Per-family resource counts
pub fn count_by_family(resources: &[Resource]) -> BTreeMap<Family, usize> {
    group_by_family(resources)
        .into_iter()
        .map(|(family, members)| (family, members.len()))
        .collect()
}

/// Aggregate statistics over a resource list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub total: usize,
    pub by_family: BTreeMap<Family, usize>,
    pub by_type: BTreeMap<String, usize>,
}

/// Compute [`ResourceStats`]
pub fn resource_stats(resources: &[Resource]) -> ResourceStats {
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for resource in resources {
        *by_type.entry(resource.item_type.clone()).or_insert(0) += 1;
    }

    ResourceStats {
        total: resources.len(),
        by_family: count_by_family(resources),
        by_type,
    }
}

/// Fields shown on a catalog card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub family: Family,
    pub color: String,
    pub theme_color: String,
    pub title: String,
    pub creators: String,
    pub manifesto_part: Vec<String>,
    pub year: String,
    pub abstract_preview: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl From<&Resource> for CardView {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.clone(),
            item_type: resource.item_type.clone(),
            family: resource.family(),
            color: resource.color.clone(),
            theme_color: resource.theme_color.clone(),
            title: resource.title.clone(),
            creators: resource.creators.clone(),
            manifesto_part: resource.manifesto_part.clone(),
            year: resource.year.clone(),
            abstract_preview: resource.abstract_preview.clone(),
            tags: resource.tags.clone(),
            language: resource.language,
        }
    }
}

/// Full resource for the detail page (raw creator list excluded)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DetailView(pub Resource);

impl From<&Resource> for DetailView {
    fn from(resource: &Resource) -> Self {
        DetailView(resource.clone())
    }
}

pub fn prepare_for_card(resource: &Resource) -> CardView {
    CardView::from(resource)
}

pub fn prepare_for_detail(resource: &Resource) -> DetailView {
    DetailView::from(resource)
}
