//! Place hierarchy resolution over a complete [`PlaceCatalog`].
//!
//! Runs once traversal is finished: redirect chains and parent chains may
//! point at places discovered anywhere in the dump. The catalog is only
//! read here, so places are resolved in parallel; the word index is the
//! one shared write target and goes through a sharded `DashMap`.

use crate::config::REDIRECT_MAX_HOPS;
use crate::models::{ParentRef, PlaceRecord, ResolvedPlace};
use crate::places::PlaceCatalog;
use crate::words::name_token;
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Name token to the sorted, de-duplicated ids of places carrying it.
pub type WordIndex = BTreeMap<String, Vec<u32>>;

pub struct PlaceHierarchy<'a> {
    catalog: &'a PlaceCatalog,
}

impl<'a> PlaceHierarchy<'a> {
    pub fn new(catalog: &'a PlaceCatalog) -> Self {
        Self { catalog }
    }

    /// Resolves a place title to its page id.
    ///
    /// An empty title is [`ParentRef::TopLevel`]. Otherwise up to
    /// [`REDIRECT_MAX_HOPS`] redirects are followed and the resulting title
    /// is looked up; a title that is still a redirect after the last hop is
    /// not a place and comes back [`ParentRef::Unresolved`].
    pub fn resolve_title(&self, title: &str) -> ParentRef {
        if title.is_empty() {
            return ParentRef::TopLevel;
        }

        let mut current = title;
        for _ in 0..REDIRECT_MAX_HOPS {
            match self.catalog.redirects.get(current) {
                Some(target) => current = target,
                None => break,
            }
        }

        match self.catalog.titles.get(current) {
            Some(&id) => ParentRef::Place(id),
            None => {
                error!(title = current, "Title not found");
                ParentRef::Unresolved
            }
        }
    }

    /// Walks the containment chain above `id`, returning `(level, country_id)`.
    ///
    /// Level starts at 1 and grows by one per ancestor; the country is the
    /// last ancestor reached, or `id` itself for top-level places. The walk
    /// stops at a top-level ancestor or at an unresolved parent.
    pub fn metrics(&self, id: u32, parent: ParentRef) -> (u32, u32) {
        let limit = self.catalog.place_count();
        let mut level = 1u32;
        let mut country_id = id;
        let mut parent = parent;

        while let ParentRef::Place(parent_id) = parent {
            if level as usize >= limit {
                error!(id, "Containment cycle");
                break;
            }
            country_id = parent_id;
            level += 1;
            parent = match self.catalog.places.get(&parent_id) {
                Some(record) => self.resolve_title(&record.located_in),
                None => ParentRef::Unresolved,
            };
            if parent == ParentRef::Unresolved {
                error!(id, "Bad country");
            }
        }

        (level, country_id)
    }

    /// Resolves each also-located-in title independently.
    ///
    /// Unresolved titles are dropped; an empty title resolves to 0 and is
    /// kept as is.
    pub fn resolve_also_located_in(&self, id: u32, titles: &[String]) -> Vec<i64> {
        titles
            .iter()
            .filter_map(|title| match self.resolve_title(title) {
                ParentRef::Unresolved => {
                    error!(id, title = %title, "Bad alsoLocatedIn");
                    None
                }
                resolved => Some(resolved.id()),
            })
            .collect()
    }

    /// Resolves a single place; `None` when its own parent is unresolved.
    pub fn resolve_place(&self, id: u32, record: &PlaceRecord) -> Option<ResolvedPlace> {
        let located_in = self.resolve_title(&record.located_in);
        if located_in == ParentRef::Unresolved {
            error!(id, located_in = %record.located_in, "Bad locatedInId");
            return None;
        }

        let also_located_in = self.resolve_also_located_in(id, &record.also_located_in);
        let (level, country_id) = self.metrics(id, located_in);

        Some(ResolvedPlace {
            id,
            name: record.name.clone(),
            alt_names: record.alt_names.clone(),
            types: record.types.clone(),
            located_in,
            also_located_in,
            level,
            country_id,
            latitude: record.latitude.clone(),
            longitude: record.longitude.clone(),
            sources: record.sources.clone(),
        })
    }

    /// Resolves every place, in id order. Places with an unresolved parent
    /// are left out.
    pub fn resolve_all(&self) -> Vec<ResolvedPlace> {
        let resolved: Vec<ResolvedPlace> = self
            .catalog
            .places
            .par_iter()
            .filter_map(|(&id, record)| self.resolve_place(id, record))
            .collect();
        debug!(
            resolved = resolved.len(),
            total = self.catalog.place_count(),
            "Resolved places"
        );
        resolved
    }

    /// Builds the token index from every primary and alternate name.
    ///
    /// Alternate names are tokenized without their `:source` suffix. A
    /// primary name without a token is logged; an alternate one is skipped.
    pub fn build_word_index(&self) -> WordIndex {
        let shards: DashMap<String, Vec<u32>> = DashMap::new();

        self.catalog.places.par_iter().for_each(|(&id, record)| {
            match name_token(&record.name) {
                Some(token) => shards.entry(token).or_default().push(id),
                None => error!(
                    id,
                    name = %record.name,
                    located_in = %record.located_in,
                    "Primary name token not found"
                ),
            }
            for alt_name in &record.alt_names {
                let alt_name = alt_name.split(':').next().unwrap_or_default();
                if let Some(token) = name_token(alt_name) {
                    shards.entry(token).or_default().push(id);
                }
            }
        });

        shards
            .into_iter()
            .map(|(token, mut ids)| {
                ids.sort_unstable();
                ids.dedup();
                (token, ids)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, located_in: &str) -> PlaceRecord {
        PlaceRecord {
            name: name.to_string(),
            located_in: located_in.to_string(),
            ..Default::default()
        }
    }

    fn illinois_catalog() -> PlaceCatalog {
        let mut catalog = PlaceCatalog::new();
        catalog.insert_place(30, "Springfield, Sangamon, Illinois".into(), place("Springfield", "Sangamon, Illinois"));
        catalog.insert_place(20, "Sangamon, Illinois".into(), place("Sangamon", "Illinois"));
        catalog.insert_place(10, "Illinois".into(), place("Illinois", ""));
        catalog
    }

    #[test]
    fn empty_title_is_top_level() {
        let catalog = PlaceCatalog::new();
        let hierarchy = PlaceHierarchy::new(&catalog);
        assert_eq!(hierarchy.resolve_title(""), ParentRef::TopLevel);
        assert_eq!(hierarchy.resolve_title("").id(), 0);
        assert_eq!(PlaceHierarchy::new(&illinois_catalog()).resolve_title(""), ParentRef::TopLevel);
    }

    #[test]
    fn unknown_title_is_unresolved() {
        let catalog = illinois_catalog();
        let hierarchy = PlaceHierarchy::new(&catalog);
        assert_eq!(hierarchy.resolve_title("Ohio"), ParentRef::Unresolved);
        assert_eq!(hierarchy.resolve_title("Ohio").id(), -1);
    }

    #[test]
    fn three_hop_redirect_chain_resolves() {
        // A -> B -> C -> D, D is a place
        let mut catalog = PlaceCatalog::new();
        catalog.insert_redirect("A".into(), "B".into());
        catalog.insert_redirect("B".into(), "C".into());
        catalog.insert_redirect("C".into(), "D".into());
        catalog.insert_place(4, "D".into(), place("D", ""));
        let hierarchy = PlaceHierarchy::new(&catalog);

        assert_eq!(hierarchy.resolve_title("A"), ParentRef::Place(4));
        assert_eq!(hierarchy.resolve_title("C"), ParentRef::Place(4));
    }

    #[test]
    fn longer_redirect_chain_stops_after_bound() {
        // A -> B -> C -> D -> E: after three hops "D" is still a redirect
        let mut catalog = PlaceCatalog::new();
        for (from, to) in [("A", "B"), ("B", "C"), ("C", "D"), ("D", "E")] {
            catalog.insert_redirect(from.into(), to.into());
        }
        catalog.insert_place(5, "E".into(), place("E", ""));
        let hierarchy = PlaceHierarchy::new(&catalog);

        assert_eq!(hierarchy.resolve_title("A"), ParentRef::Unresolved);
        assert_eq!(hierarchy.resolve_title("B"), ParentRef::Place(5));
    }

    #[test]
    fn redirect_loop_terminates() {
        let mut catalog = PlaceCatalog::new();
        catalog.insert_redirect("X".into(), "Y".into());
        catalog.insert_redirect("Y".into(), "X".into());
        let hierarchy = PlaceHierarchy::new(&catalog);
        assert_eq!(hierarchy.resolve_title("X"), ParentRef::Unresolved);
    }

    #[test]
    fn levels_and_country() {
        let catalog = illinois_catalog();
        let resolved = PlaceHierarchy::new(&catalog).resolve_all();

        let summary: Vec<(u32, i64, u32, u32)> = resolved
            .iter()
            .map(|p| (p.id, p.located_in.id(), p.level, p.country_id))
            .collect();
        assert_eq!(
            summary,
            vec![(10, 0, 1, 10), (20, 10, 2, 10), (30, 20, 3, 10)]
        );
    }

    #[test]
    fn parent_through_redirect() {
        let mut catalog = illinois_catalog();
        catalog.insert_redirect("Sangamon County, Illinois".into(), "Sangamon, Illinois".into());
        catalog.insert_place(40, "Chatham, Sangamon County, Illinois".into(), place("Chatham", "Sangamon County, Illinois"));
        let hierarchy = PlaceHierarchy::new(&catalog);

        let chatham = hierarchy.resolve_place(40, &catalog.places[&40]).unwrap();
        assert_eq!(chatham.located_in, ParentRef::Place(20));
        assert_eq!((chatham.level, chatham.country_id), (3, 10));
    }

    #[test]
    fn unresolved_parent_is_omitted() {
        let mut catalog = illinois_catalog();
        catalog.insert_place(50, "Lost, Nowhere".into(), place("Lost", "Nowhere"));
        let resolved = PlaceHierarchy::new(&catalog).resolve_all();
        assert!(resolved.iter().all(|p| p.id != 50));
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn unresolved_grandparent_ends_walk() {
        let mut catalog = PlaceCatalog::new();
        catalog.insert_place(1, "Town, County".into(), place("Town", "County"));
        catalog.insert_place(2, "County".into(), place("County", "Missing State"));
        let hierarchy = PlaceHierarchy::new(&catalog);

        assert_eq!(hierarchy.metrics(1, ParentRef::Place(2)), (2, 2));
    }

    #[test]
    fn containment_cycle_is_bounded() {
        let mut catalog = PlaceCatalog::new();
        catalog.insert_place(1, "A".into(), place("A", "B"));
        catalog.insert_place(2, "B".into(), place("B", "A"));
        let hierarchy = PlaceHierarchy::new(&catalog);

        let (level, _) = hierarchy.metrics(1, ParentRef::Place(2));
        assert_eq!(level, 2);
    }

    #[test]
    fn also_located_in_drops_unresolved_keeps_top_level() {
        let catalog = illinois_catalog();
        let hierarchy = PlaceHierarchy::new(&catalog);
        let titles = vec![
            "Sangamon, Illinois".to_string(),
            "Nowhere".to_string(),
            String::new(),
            "Illinois".to_string(),
        ];
        assert_eq!(hierarchy.resolve_also_located_in(30, &titles), vec![20, 0, 10]);
    }

    #[test]
    fn word_index_merges_names_and_alternates() {
        let mut catalog = PlaceCatalog::new();
        let mut sangamon = place("Sangamon", "Illinois");
        sangamon.alt_names = vec!["Sangamon County:Gazetteer".into(), "Calhoun".into()];
        catalog.insert_place(20, "Sangamon, Illinois".into(), sangamon);
        catalog.insert_place(7, "Sangamon, Ohio".into(), place("Sangamon County", "Ohio"));
        catalog.insert_place(10, "Illinois".into(), place("Illinois", ""));

        let index = PlaceHierarchy::new(&catalog).build_word_index();
        assert_eq!(index["sangamon"], vec![7, 20]);
        assert_eq!(index["calhoun"], vec![20]);
        assert_eq!(index["illinois"], vec![10]);
        assert!(!index.contains_key("gazetteer"));
        assert_eq!(
            index.keys().cloned().collect::<Vec<_>>(),
            vec!["calhoun", "illinois", "sangamon"]
        );
    }

    #[test]
    fn word_index_skips_tokenless_names() {
        let mut catalog = PlaceCatalog::new();
        let mut record = place("--", "");
        record.alt_names = vec!["...".into(), "Hamlet".into()];
        catalog.insert_place(1, "--".into(), record);

        let index = PlaceHierarchy::new(&catalog).build_word_index();
        assert_eq!(index.len(), 1);
        assert_eq!(index["hamlet"], vec![1]);
    }
}
