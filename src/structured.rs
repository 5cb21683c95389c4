//! Structured blocks embedded at the top of page text.
//!
//! Place, person and family pages start with a machine-written XML element
//! (`<place>...</place>` etc.) followed by free wiki text.

use anyhow::{Context, Result};
use memchr::memmem;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A page body split into its leading structured block and the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredSplit<'a> {
    pub structured: Option<&'a str>,
    pub free_text: &'a str,
}

impl<'a> StructuredSplit<'a> {
    /// The structured block, if present and not blank.
    pub fn block(&self) -> Option<&'a str> {
        self.structured.filter(|s| !s.trim().is_empty())
    }
}

/// Splits `text` after the first `</tag>`.
///
/// The block is assumed to start at offset 0; the opening tag is neither
/// searched for nor validated. Without a closing tag the whole text is free.
pub fn split_structured<'a>(tag: &str, text: &'a str) -> StructuredSplit<'a> {
    let end_tag = format!("</{}>", tag);
    match memmem::find(text.as_bytes(), end_tag.as_bytes()) {
        Some(pos) => {
            let end = pos + end_tag.len();
            StructuredSplit {
                structured: Some(&text[..end]),
                free_text: &text[end..],
            }
        }
        None => StructuredSplit {
            structured: None,
            free_text: text,
        },
    }
}

/// Deserializes a structured block into one of the typed block structs.
pub fn parse_block<T: DeserializeOwned>(tag: &str, block: &str) -> Result<T> {
    quick_xml::de::from_str(block).with_context(|| format!("Malformed <{}> block", tag))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaceBlock {
    #[serde(rename = "alternate_name")]
    pub alternate_names: Vec<AlternateName>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    #[serde(rename = "also_located_in")]
    pub also_located_in: Vec<AlsoLocatedIn>,
    #[serde(rename = "latitude")]
    pub latitudes: Vec<String>,
    #[serde(rename = "longitude")]
    pub longitudes: Vec<String>,
}

fn first(values: &[String]) -> Option<&str> {
    values.first().map(String::as_str)
}

// Repeated single-valued elements are tolerated; the first one wins.
impl PlaceBlock {
    pub fn type_list(&self) -> Option<&str> {
        first(&self.types)
    }

    pub fn latitude(&self) -> Option<&str> {
        first(&self.latitudes)
    }

    pub fn longitude(&self) -> Option<&str> {
        first(&self.longitudes)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlternateName {
    #[serde(rename = "@name")]
    pub name: Option<String>,
    #[serde(rename = "@source")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlsoLocatedIn {
    #[serde(rename = "@place")]
    pub place: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersonBlock {
    #[serde(rename = "name")]
    pub names: Vec<NameElement>,
    #[serde(rename = "gender")]
    pub genders: Vec<String>,
    #[serde(rename = "event_fact")]
    pub event_facts: Vec<EventFact>,
    #[serde(rename = "child_of_family")]
    pub child_of_families: Vec<FamilyLink>,
    #[serde(rename = "spouse_of_family")]
    pub spouse_of_families: Vec<FamilyLink>,
}

impl PersonBlock {
    pub fn gender(&self) -> Option<&str> {
        first(&self.genders)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FamilyBlock {
    #[serde(rename = "husband")]
    pub husbands: Vec<NameElement>,
    #[serde(rename = "wife")]
    pub wives: Vec<NameElement>,
    #[serde(rename = "event_fact")]
    pub event_facts: Vec<EventFact>,
}

/// `<name given=".." surname=".."/>`, also used for `<husband>`/`<wife>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NameElement {
    #[serde(rename = "@given")]
    pub given: Option<String>,
    #[serde(rename = "@surname")]
    pub surname: Option<String>,
    #[serde(rename = "@title")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventFact {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    #[serde(rename = "@date")]
    pub date: Option<String>,
    #[serde(rename = "@place")]
    pub place: Option<String>,
}

impl EventFact {
    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    pub fn date(&self) -> String {
        self.date.clone().unwrap_or_default()
    }

    /// Place title without any `|display` suffix.
    pub fn place_title(&self) -> String {
        self.place
            .as_deref()
            .map(|p| p.split('|').next().unwrap_or_default().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FamilyLink {
    #[serde(rename = "@title")]
    pub title: Option<String>,
}
