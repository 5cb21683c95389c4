use serde::{Deserialize, Serialize};

/// The latest retained revision of one page, handed to every page handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRevision {
    pub title: String,
    /// `None` when the page carried no `<id>` or it was not numeric.
    pub page_id: Option<u32>,
    /// 0 when no revision with a valid id was seen.
    pub latest_rev_id: u32,
    pub text: String,
    pub username: String,
    pub timestamp: String,
    pub comment: String,
}

/// Raw place attributes as extracted from a single `Place:` page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    /// Title of the containing place; empty for top-level places.
    pub located_in: String,
    /// `name` or `name:source` entries.
    pub alt_names: Vec<String>,
    pub types: Vec<String>,
    pub also_located_in: Vec<String>,
    pub latitude: String,
    pub longitude: String,
    /// `label:id` citations.
    pub sources: Vec<String>,
}

/// Outcome of resolving a place title against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParentRef {
    /// Empty title: the place has no parent.
    TopLevel,
    Place(u32),
    /// The title (after redirect following) is not a known place.
    Unresolved,
}

impl ParentRef {
    /// Numeric form used in the tabular outputs: 0 = top level, -1 = unresolved.
    pub fn id(self) -> i64 {
        match self {
            ParentRef::TopLevel => 0,
            ParentRef::Place(id) => i64::from(id),
            ParentRef::Unresolved => -1,
        }
    }
}

/// A place with its containment resolved to ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlace {
    pub id: u32,
    pub name: String,
    pub alt_names: Vec<String>,
    pub types: Vec<String>,
    pub located_in: ParentRef,
    pub also_located_in: Vec<i64>,
    /// Depth in the containment chain, 1 for top-level places.
    pub level: u32,
    /// Topmost ancestor reached, or the place itself when top-level.
    pub country_id: u32,
    pub latitude: String,
    pub longitude: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Person {
    pub person_id: String,
    pub first_names: String,
    pub last_names: String,
    pub gender: String,
    pub birth_date_str: String,
    pub birth_place: String,
    pub marriage_date_str: String,
    pub marriage_place: String,
    pub death_date_str: String,
    pub death_place: String,
    pub father_first_names: String,
    pub father_last_names: String,
    pub mother_first_names: String,
    pub mother_last_names: String,
    pub spouse_first_names: String,
    pub spouse_last_names: String,
    pub child_of_family_title: String,
    pub spouse_of_family_title: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Family {
    pub husband_given: String,
    pub husband_surname: String,
    pub wife_given: String,
    pub wife_surname: String,
    pub marriage_date: String,
    pub marriage_place: String,
}
