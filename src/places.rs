use crate::config::PLACE_NAMESPACE;
use crate::models::{PageRevision, PlaceRecord};
use crate::parser::{redirect_target, PageHandler};
use crate::structured::{parse_block, split_structured, PlaceBlock};
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

static WIKIPEDIA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{wikipedia-notice\|(.+?)\}\}").unwrap());

static WIKIPEDIA2_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{moreinfo wikipedia\|(.+?)\}\}").unwrap());

static GETTY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{source-getty\|(.+?)\}\}").unwrap());

static FHLC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\{\{source-fhlc\|(.+?)\}\}").unwrap());

/// Every place and place redirect collected from a dump.
///
/// `places` and `titles` describe the same set of pages; `redirects` never
/// shares a title with `titles`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlaceCatalog {
    pub places: BTreeMap<u32, PlaceRecord>,
    pub titles: FxHashMap<String, u32>,
    pub redirects: FxHashMap<String, String>,
}

impl PlaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a place page. A title already known as a place or redirect is
    /// kept as first seen.
    pub fn insert_place(&mut self, id: u32, title: String, record: PlaceRecord) -> bool {
        if self.titles.contains_key(&title) || self.redirects.contains_key(&title) {
            warn!(title = %title, id, "Duplicate place title");
            return false;
        }
        self.places.insert(id, record);
        self.titles.insert(title, id);
        true
    }

    pub fn insert_redirect(&mut self, title: String, target: String) -> bool {
        if self.titles.contains_key(&title) || self.redirects.contains_key(&title) {
            warn!(title = %title, "Duplicate place redirect");
            return false;
        }
        self.redirects.insert(title, target);
        true
    }

    pub fn place_count(&self) -> usize {
        self.places.len()
    }

    pub fn redirect_count(&self) -> usize {
        self.redirects.len()
    }
}

/// Page handler collecting `Place:` pages into a [`PlaceCatalog`].
#[derive(Debug, Default)]
pub struct Places {
    catalog: PlaceCatalog,
}

impl Places {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &PlaceCatalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> PlaceCatalog {
        self.catalog
    }
}

impl PageHandler for Places {
    fn on_page(&mut self, page: &PageRevision) -> Result<()> {
        let Some(title) = page.title.strip_prefix(PLACE_NAMESPACE) else {
            return Ok(());
        };

        if let Some(target) = redirect_target(page.text.trim()) {
            if let Some(target) = target.strip_prefix(PLACE_NAMESPACE) {
                debug!(from = title, to = target, "Place redirect");
                self.catalog
                    .insert_redirect(title.to_string(), target.trim().to_string());
            }
            return Ok(());
        }

        let split = split_structured("place", &page.text);
        let Some(block) = split.block() else {
            return Ok(());
        };
        let id = page
            .page_id
            .ok_or_else(|| anyhow!("Place page has no numeric id"))?;
        let parsed: PlaceBlock = parse_block("place", block)?;
        let record = build_record(title, parsed, split.free_text);
        self.catalog.insert_place(id, title.to_string(), record);
        Ok(())
    }
}

fn build_record(title: &str, block: PlaceBlock, free_text: &str) -> PlaceRecord {
    let (name, located_in) = match title.find(',') {
        Some(pos) if pos > 0 => (title[..pos].trim(), title[pos + 1..].trim()),
        _ => (title, ""),
    };

    let types = block
        .type_list()
        .map(|types| {
            types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(no_tilde)
                .collect()
        })
        .unwrap_or_default();

    let latitude = coordinate(block.latitude(), 90.0);
    let longitude = coordinate(block.longitude(), 180.0);

    let alt_names = block
        .alternate_names
        .into_iter()
        .filter_map(|alt| {
            let name = alt.name.filter(|n| !n.is_empty())?;
            let entry = match alt.source.filter(|s| !s.is_empty()) {
                Some(source) => format!("{}:{}", no_colon(&name), unlink(&source)),
                None => name,
            };
            Some(no_tilde(&entry))
        })
        .collect();

    let also_located_in = block
        .also_located_in
        .into_iter()
        .filter_map(|ali| ali.place.filter(|p| !p.is_empty()))
        .collect();

    let mut sources = Vec::new();
    if !add_source(&WIKIPEDIA_REGEX, "wikipedia", free_text, &mut sources) {
        add_source(&WIKIPEDIA2_REGEX, "wikipedia", free_text, &mut sources);
    }
    add_source(&GETTY_REGEX, "getty", free_text, &mut sources);
    add_source(&FHLC_REGEX, "fhlc", free_text, &mut sources);

    PlaceRecord {
        name: name.to_string(),
        located_in: located_in.to_string(),
        alt_names,
        types,
        also_located_in,
        latitude,
        longitude,
        sources,
    }
}

fn no_tilde(s: &str) -> String {
    s.replace('~', " ")
}

fn no_colon(s: &str) -> String {
    s.replace(':', " ")
}

/// `[[Source:X|Label]]` becomes `Label`, `[[Source:X]]` becomes `X`.
fn unlink(source: &str) -> &str {
    let Some(inner) = source
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
    else {
        return source;
    };
    match inner.find('|') {
        Some(pos) if pos > 0 => &inner[pos + 1..],
        _ => match inner.find(':') {
            Some(pos) if pos > 0 => &inner[pos + 1..],
            _ => inner,
        },
    }
}

fn add_source(regex: &Regex, label: &str, text: &str, sources: &mut Vec<String>) -> bool {
    match regex.captures(text) {
        Some(c) => {
            sources.push(format!("{}:{}", label, &c[1]));
            true
        }
        None => false,
    }
}

/// Keeps the trimmed value only if it is a number within `[-limit, limit]`.
fn coordinate(value: Option<&str>, limit: f64) -> String {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return String::new();
    };
    match value.parse::<f64>() {
        Ok(d) if (-limit..=limit).contains(&d) => value.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place_page(title: &str, id: u32, text: &str) -> PageRevision {
        PageRevision {
            title: title.to_string(),
            page_id: Some(id),
            latest_rev_id: 1,
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn collects_place_with_located_in() {
        let mut places = Places::new();
        let text = "<place><type>City, County Seat</type>\
            <alternate_name name=\"Calhoun\" source=\"[[Source:Gazetteer|Gazetteer of Illinois]]\"/>\
            <alternate_name name=\"Old~Town\"/>\
            <alternate_name name=\"\"/>\
            <also_located_in place=\"Menard, Illinois, United States\"/>\
            <latitude>39.8</latitude><longitude>-89.65</longitude></place>\
            Capital city. {{wikipedia-notice|Springfield, Illinois}} {{source-fhlc|123}}";
        places
            .on_page(&place_page("Place:Springfield, Sangamon, Illinois", 10, text))
            .unwrap();

        let catalog = places.into_catalog();
        let record = &catalog.places[&10];
        assert_eq!(record.name, "Springfield");
        assert_eq!(record.located_in, "Sangamon, Illinois");
        assert_eq!(
            record.alt_names,
            vec!["Calhoun:Gazetteer of Illinois", "Old Town"]
        );
        assert_eq!(record.types, vec!["City", "County Seat"]);
        assert_eq!(record.also_located_in, vec!["Menard, Illinois, United States"]);
        assert_eq!(record.latitude, "39.8");
        assert_eq!(record.longitude, "-89.65");
        assert_eq!(
            record.sources,
            vec!["wikipedia:Springfield, Illinois", "fhlc:123"]
        );
        assert_eq!(catalog.titles["Springfield, Sangamon, Illinois"], 10);
    }

    #[test]
    fn repeated_type_keeps_place_and_first_type() {
        let mut places = Places::new();
        let text = "<place><type>City</type><latitude>42</latitude><type>Town</type>\
            <latitude>43</latitude></place>";
        places
            .on_page(&place_page("Place:Boston, Massachusetts", 12, text))
            .unwrap();
        let record = &places.catalog().places[&12];
        assert_eq!(record.types, vec!["City"]);
        assert_eq!(record.latitude, "42");
    }

    #[test]
    fn top_level_place() {
        let mut places = Places::new();
        places
            .on_page(&place_page("Place:Illinois", 3, "<place></place>"))
            .unwrap();
        let record = &places.catalog().places[&3];
        assert_eq!(record.name, "Illinois");
        assert_eq!(record.located_in, "");
    }

    #[test]
    fn records_place_redirects_only() {
        let mut places = Places::new();
        places
            .on_page(&place_page("Place:Sangamon County, Illinois", 5, "#REDIRECT [[Place:Sangamon, Illinois]]"))
            .unwrap();
        places
            .on_page(&place_page("Place:Elsewhere", 6, "#REDIRECT [[Person:John Smith (1)]]"))
            .unwrap();
        let catalog = places.into_catalog();
        assert_eq!(
            catalog.redirects.get("Sangamon County, Illinois").map(String::as_str),
            Some("Sangamon, Illinois")
        );
        assert_eq!(catalog.redirect_count(), 1);
        assert_eq!(catalog.place_count(), 0);
    }

    #[test]
    fn ignores_other_namespaces_and_unstructured_pages() {
        let mut places = Places::new();
        places
            .on_page(&place_page("Person:John Smith (1)", 1, "<person></person>"))
            .unwrap();
        places
            .on_page(&place_page("Place:Nowhere", 2, "no structured data"))
            .unwrap();
        assert_eq!(places.catalog().place_count(), 0);
    }

    #[test]
    fn rejects_missing_page_id() {
        let mut places = Places::new();
        let mut page = place_page("Place:Boston", 1, "<place></place>");
        page.page_id = None;
        assert!(places.on_page(&page).is_err());
        assert_eq!(places.catalog().place_count(), 0);
    }

    #[test]
    fn rejects_malformed_block() {
        let mut places = Places::new();
        let page = place_page("Place:Boston", 1, "<place><type a=\"City></type></place>");
        assert!(places.on_page(&page).is_err());
    }

    #[test]
    fn duplicate_titles_keep_first() {
        let mut catalog = PlaceCatalog::new();
        assert!(catalog.insert_place(1, "A".to_string(), PlaceRecord::default()));
        assert!(!catalog.insert_place(2, "A".to_string(), PlaceRecord::default()));
        assert!(!catalog.insert_redirect("A".to_string(), "B".to_string()));
        assert_eq!(catalog.titles["A"], 1);
        assert!(!catalog.places.contains_key(&2));
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert_eq!(coordinate(Some(" 45.5 "), 90.0), "45.5");
        assert_eq!(coordinate(Some("91"), 90.0), "");
        assert_eq!(coordinate(Some("-180"), 180.0), "-180");
        assert_eq!(coordinate(Some("north"), 90.0), "");
        assert_eq!(coordinate(None, 90.0), "");
    }

    #[test]
    fn unlink_sources() {
        assert_eq!(unlink("[[Source:Getty|Getty Thesaurus]]"), "Getty Thesaurus");
        assert_eq!(unlink("[[Source:Getty]]"), "Getty");
        assert_eq!(unlink("Plain text"), "Plain text");
    }

    #[test]
    fn moreinfo_wikipedia_is_fallback() {
        let record = build_record(
            "Boston",
            PlaceBlock::default(),
            "{{moreinfo wikipedia|Boston}} {{Source-Getty|7013445}}",
        );
        assert_eq!(record.sources, vec!["wikipedia:Boston", "getty:7013445"]);
    }

    #[test]
    fn leading_comma_keeps_whole_title() {
        let record = build_record(",Odd", PlaceBlock::default(), "");
        assert_eq!(record.name, ",Odd");
        assert_eq!(record.located_in, "");
    }
}
