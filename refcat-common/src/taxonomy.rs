//! Item-type taxonomy
//!
//! Upstream items are organized into 4 families based on their item type:
//! - Bibliographic: traditional academic sources (books, articles, etc.)
//! - Multimedia: audio/visual content
//! - Technical: software, datasets, standards, legal texts
//! - Webpage: online content and blog posts
//!
//! Each family has a theme color and each item type a shade of it.
//! Everything here is a pure lookup; unknown item types fall back to
//! the bibliographic family and the default blue shade.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Shade used for item types missing from the table
pub const DEFAULT_ITEM_COLOR: &str = "blue-500";

/// Coarse resource family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Bibliographic,
    Multimedia,
    Technical,
    Webpage,
}

impl Family {
    /// All families in display order
    pub const ALL: [Family; 4] = [
        Family::Bibliographic,
        Family::Multimedia,
        Family::Technical,
        Family::Webpage,
    ];

    /// Wire tag (`bibliographic`, `multimedia`, `technical`, `webpage`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Bibliographic => "bibliographic",
            Family::Multimedia => "multimedia",
            Family::Technical => "technical",
            Family::Webpage => "webpage",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bibliographic" => Ok(Family::Bibliographic),
            "multimedia" => Ok(Family::Multimedia),
            "technical" => Ok(Family::Technical),
            "webpage" => Ok(Family::Webpage),
            other => Err(Error::InvalidInput(format!(
                "Invalid family '{}'. Must be: bibliographic, multimedia, technical, or webpage",
                other
            ))),
        }
    }
}

/// Look up the family for an upstream item type
///
/// Unknown types default to [`Family::Bibliographic`].
pub fn family_for_item_type(item_type: &str) -> Family {
    match item_type {
        "article" | "book" | "bookSection" | "journalArticle" | "magazineArticle"
        | "newspaperArticle" | "thesis" | "letter" | "manuscript" | "preprint" | "review"
        | "report" | "encyclopediaArticle" | "conferencePaper" | "document" => {
            Family::Bibliographic
        }

        "film" | "presentation" | "videoRecording" | "audioRecording" | "interview"
        | "artwork" | "podcast" | "radioBroadcast" | "tvBroadcast" => Family::Multimedia,

        "software" | "computerProgram" | "dataset" | "standard" | "map" | "patent" | "case"
        | "bill" | "statute" => Family::Technical,

        "webpage" | "blogPost" | "forumPost" | "attachment" => Family::Webpage,

        _ => Family::Bibliographic,
    }
}

/// Main theme color of a family
pub fn color_for_family(family: Family) -> &'static str {
    match family {
        Family::Bibliographic => "blue",
        Family::Multimedia => "violet",
        Family::Technical => "orange",
        Family::Webpage => "yellow",
    }
}

/// Shade of the family color for a specific item type
pub fn color_for_item_type(item_type: &str) -> &'static str {
    match item_type {
        // Bibliographic (blue)
        "article" | "journalArticle" | "manuscript" | "review" => "blue-500",
        "book" | "conferencePaper" => "blue-700",
        "bookSection" | "preprint" | "encyclopediaArticle" => "blue-600",
        "magazineArticle" | "letter" | "report" => "blue-400",
        "newspaperArticle" | "document" => "blue-300",
        "thesis" => "blue-800",

        // Multimedia (violet)
        "film" | "tvBroadcast" => "violet-700",
        "presentation" | "videoRecording" => "violet-600",
        "audioRecording" | "interview" | "radioBroadcast" => "violet-500",
        "artwork" | "podcast" => "violet-400",

        // Technical (orange)
        "software" | "computerProgram" | "patent" => "orange-600",
        "dataset" | "standard" | "case" | "statute" => "orange-500",
        "map" | "bill" => "orange-400",

        // Webpage (yellow)
        "blogPost" => "yellow-600",
        "webpage" => "yellow-500",
        "forumPost" => "yellow-400",
        "attachment" => "yellow-300",

        _ => DEFAULT_ITEM_COLOR,
    }
}

/// Upstream fields shown for each family, in display order
pub fn display_fields(family: Family) -> &'static [&'static str] {
    match family {
        Family::Bibliographic => &[
            "creators",
            "title",
            "date",
            "publicationTitle",
            "publisher",
            "pages",
            "DOI",
            "url",
        ],
        Family::Multimedia => &["creators", "title", "date", "runningTime", "studio", "url"],
        Family::Technical => &[
            "title",
            "versionNumber",
            "date",
            "company",
            "programmingLanguage",
            "repository",
            "url",
        ],
        Family::Webpage => &["title", "url", "accessDate", "websiteTitle", "creators"],
    }
}
