//! Citation builder for bibliographic resources
//!
//! Produces an APA-like single-line citation:
//! `Doe, J., Smith, J. (2024) Title. *Journal*, 12, (3), 45-67. https://doi.org/...`
//!
//! Every part is optional; missing fields are left out.

use crate::model::{ItemData, RawCreator};
use crate::transform::text::{extract_year, non_empty};

/// "Last, F." for people, the single-field name for organizations
fn citation_author(creator: &RawCreator) -> String {
    if let Some(name) = creator.name.as_deref().filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    let last_name = creator.last_name.as_deref().unwrap_or("");
    match creator
        .first_name
        .as_deref()
        .and_then(|first| first.chars().next())
    {
        Some(initial) => format!("{}, {}.", last_name, initial),
        None => last_name.to_string(),
    }
}

/// Build the citation for an item of the given type
pub fn generate_citation(data: &ItemData, item_type: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    let authors = data
        .creators
        .iter()
        .filter(|c| matches!(c.creator_type.as_deref(), Some("author") | Some("director")))
        .map(citation_author)
        .collect::<Vec<_>>()
        .join(", ");
    if !authors.is_empty() {
        parts.push(authors);
    }

    if let Some(date) = non_empty(&data.date) {
        parts.push(format!("({})", extract_year(date)));
    }

    if let Some(title) = non_empty(&data.title) {
        parts.push(format!("{}.", title));
    }

    match item_type {
        "journalArticle" => {
            let mut journal = Vec::new();
            if let Some(publication) = non_empty(&data.publication_title) {
                journal.push(format!("*{}*", publication));
            }
            if let Some(volume) = non_empty(&data.volume) {
                journal.push(volume.to_string());
            }
            if let Some(issue) = non_empty(&data.issue) {
                journal.push(format!("({})", issue));
            }
            if let Some(pages) = non_empty(&data.pages) {
                journal.push(pages.to_string());
            }
            if !journal.is_empty() {
                parts.push(format!("{}.", journal.join(", ")));
            }
        }
        "book" => {
            if let Some(publisher) = non_empty(&data.publisher) {
                parts.push(format!("{}.", publisher));
            }
        }
        "bookSection" => {
            if let Some(book_title) = non_empty(&data.book_title) {
                parts.push(format!("In *{}*", book_title));
            }
            if let Some(publisher) = non_empty(&data.publisher) {
                let pages = non_empty(&data.pages).unwrap_or("");
                parts.push(format!("(pp. {}). {}.", pages, publisher));
            }
        }
        _ => {}
    }

    if let Some(doi) = non_empty(&data.doi) {
        parts.push(format!("https://doi.org/{}", doi));
    } else if let Some(url) = non_empty(&data.url) {
        parts.push(url.to_string());
    }

    parts.join(" ")
}
