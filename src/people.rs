//! Person and family reports built from `Person:` and `Family:` pages.

use crate::config::{FAMILY_NAMESPACE, PERSON_NAMESPACE};
use crate::models::{Family, PageRevision, Person};
use crate::output::pipe_writer;
use crate::parser::PageHandler;
use crate::structured::{
    parse_block, split_structured, EventFact, FamilyBlock, FamilyLink, NameElement, PersonBlock,
};
use anyhow::{Context, Result};
use csv::Writer;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::io::Write;

/// Given name and surname of the first name element.
fn first_name(names: &[NameElement]) -> (String, String) {
    names
        .first()
        .map(|n| {
            (
                n.given.clone().unwrap_or_default(),
                n.surname.clone().unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}

/// Date and place of the last event fact of the given type.
fn event(facts: &[EventFact], kind: &str) -> (String, String) {
    facts
        .iter()
        .rev()
        .find(|f| f.is(kind))
        .map(|f| (f.date(), f.place_title()))
        .unwrap_or_default()
}

fn parse_person(text: &str) -> Result<Option<PersonBlock>> {
    match split_structured("person", text).block() {
        Some(block) => parse_block("person", block).map(Some),
        None => Ok(None),
    }
}

/// Writes `title|given|surname|birthDate|birthPlace|deathDate|deathPlace`
/// for every person page.
pub struct PeopleCsv<W: Write> {
    writer: Writer<W>,
    written: u64,
}

impl<W: Write> PeopleCsv<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: pipe_writer(out),
            written: 0,
        }
    }

    /// Flushes the output and returns the number of lines written.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush().context("Failed to flush people output")?;
        Ok(self.written)
    }
}

impl<W: Write> PageHandler for PeopleCsv<W> {
    fn on_page(&mut self, page: &PageRevision) -> Result<()> {
        let Some(title) = page.title.strip_prefix(PERSON_NAMESPACE) else {
            return Ok(());
        };
        let Some(person) = parse_person(&page.text)? else {
            return Ok(());
        };

        let (given, surname) = first_name(&person.names);
        let (birth_date, birth_place) = event(&person.event_facts, "Birth");
        let (death_date, death_place) = event(&person.event_facts, "Death");
        let record: [&str; 7] = [
            title,
            &given,
            &surname,
            &birth_date,
            &birth_place,
            &death_date,
            &death_place,
        ];
        self.writer.write_record(record)?;
        self.written += 1;
        Ok(())
    }
}

/// Collects people and families, then joins them into one JSON object per
/// person.
#[derive(Debug, Default)]
pub struct PeopleJson {
    people: BTreeMap<String, Person>,
    families: FxHashMap<String, Family>,
}

impl PeopleJson {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// A person with parent and spouse fields filled from their families.
    ///
    /// The spouse is the wife for gender `M` and the husband for `F`;
    /// marriage details come from the spouse-of family either way.
    pub fn joined(&self, person: &Person) -> Person {
        let mut p = person.clone();
        if let Some(f) = self.families.get(&p.child_of_family_title) {
            p.father_first_names = f.husband_given.clone();
            p.father_last_names = f.husband_surname.clone();
            p.mother_first_names = f.wife_given.clone();
            p.mother_last_names = f.wife_surname.clone();
        }
        if let Some(f) = self.families.get(&p.spouse_of_family_title) {
            match p.gender.as_str() {
                "M" => {
                    p.spouse_first_names = f.wife_given.clone();
                    p.spouse_last_names = f.wife_surname.clone();
                }
                "F" => {
                    p.spouse_first_names = f.husband_given.clone();
                    p.spouse_last_names = f.husband_surname.clone();
                }
                _ => {}
            }
            p.marriage_date_str = f.marriage_date.clone();
            p.marriage_place = f.marriage_place.clone();
        }
        p
    }

    /// Writes one JSON line per person in title order.
    pub fn write_json<W: Write>(&self, mut out: W) -> Result<usize> {
        for person in self.people.values() {
            serde_json::to_writer(&mut out, &self.joined(person))?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(self.people.len())
    }

    fn add_family(&mut self, title: &str, text: &str) -> Result<()> {
        let Some(block) = split_structured("family", text).block() else {
            return Ok(());
        };
        let family: FamilyBlock = parse_block("family", block)?;
        let (husband_given, husband_surname) = first_name(&family.husbands);
        let (wife_given, wife_surname) = first_name(&family.wives);
        let (marriage_date, marriage_place) = event(&family.event_facts, "Marriage");
        self.families.insert(
            title.to_string(),
            Family {
                husband_given,
                husband_surname,
                wife_given,
                wife_surname,
                marriage_date,
                marriage_place,
            },
        );
        Ok(())
    }

    fn add_person(&mut self, title: &str, text: &str) -> Result<()> {
        let Some(block) = parse_person(text)? else {
            return Ok(());
        };
        let (first_names, last_names) = first_name(&block.names);
        let (birth_date_str, birth_place) = event(&block.event_facts, "Birth");
        let (death_date_str, death_place) = event(&block.event_facts, "Death");
        let family_title = |links: &[FamilyLink]| {
            links
                .first()
                .and_then(|l| l.title.clone())
                .unwrap_or_default()
        };

        self.people.insert(
            title.to_string(),
            Person {
                person_id: title.to_string(),
                first_names,
                last_names,
                gender: block.gender().unwrap_or_default().to_string(),
                birth_date_str,
                birth_place,
                death_date_str,
                death_place,
                child_of_family_title: family_title(&block.child_of_families),
                spouse_of_family_title: family_title(&block.spouse_of_families),
                ..Default::default()
            },
        );
        Ok(())
    }
}

impl PageHandler for PeopleJson {
    fn on_page(&mut self, page: &PageRevision) -> Result<()> {
        if let Some(title) = page.title.strip_prefix(FAMILY_NAMESPACE) {
            self.add_family(title, &page.text)
        } else if let Some(title) = page.title.strip_prefix(PERSON_NAMESPACE) {
            self.add_person(title, &page.text)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, text: &str) -> PageRevision {
        PageRevision {
            title: title.to_string(),
            page_id: Some(1),
            latest_rev_id: 1,
            text: text.to_string(),
            ..Default::default()
        }
    }

    const JOHN: &str = "<person><name given=\"John\" surname=\"Smith\"/><gender>M</gender>\
        <event_fact type=\"Birth\" date=\"1 Jan 1800\" place=\"Boston, Suffolk, Massachusetts, United States|Boston\"/>\
        <event_fact type=\"Death\" date=\"1870\"/>\
        <child_of_family title=\"William Smith and Ann Lee (1)\"/>\
        <spouse_of_family title=\"John Smith and Mary Jones (1)\"/></person>\nBiography.";

    const MARRIAGE: &str = "<family><husband title=\"John Smith (1)\" given=\"John\" surname=\"Smith\"/>\
        <wife title=\"Mary Jones (1)\" given=\"Mary\" surname=\"Jones\"/>\
        <event_fact type=\"Marriage\" date=\"1825\" place=\"Salem, Essex, Massachusetts, United States\"/></family>";

    const PARENTS: &str = "<family><husband given=\"William\" surname=\"Smith\"/>\
        <wife given=\"Ann\" surname=\"Lee\"/></family>";

    #[test]
    fn csv_line_per_person() {
        let mut buf = Vec::new();
        let mut people = PeopleCsv::new(&mut buf);
        people.on_page(&page("Person:John Smith (1)", JOHN)).unwrap();
        people.on_page(&page("Family:John Smith and Mary Jones (1)", MARRIAGE)).unwrap();
        people.on_page(&page("Person:No Data (1)", "just text")).unwrap();
        assert_eq!(people.finish().unwrap(), 1);

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "John Smith (1)|John|Smith|1 Jan 1800|Boston, Suffolk, Massachusetts, United States|1870|\n"
        );
    }

    #[test]
    fn csv_rejects_malformed_person() {
        let mut buf = Vec::new();
        let mut people = PeopleCsv::new(&mut buf);
        assert!(people
            .on_page(&page("Person:Bad (1)", "<person><name given=\"x/></person>"))
            .is_err());
    }

    #[test]
    fn json_joins_parents_and_spouse() {
        let mut json = PeopleJson::new();
        json.on_page(&page("Person:John Smith (1)", JOHN)).unwrap();
        json.on_page(&page("Family:John Smith and Mary Jones (1)", MARRIAGE)).unwrap();
        json.on_page(&page("Family:William Smith and Ann Lee (1)", PARENTS)).unwrap();
        assert_eq!((json.person_count(), json.family_count()), (1, 2));

        let mut buf = Vec::new();
        assert_eq!(json.write_json(&mut buf).unwrap(), 1);
        let line = String::from_utf8(buf).unwrap();
        assert_eq!(line.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["person_id"], "John Smith (1)");
        assert_eq!(value["father_first_names"], "William");
        assert_eq!(value["mother_last_names"], "Lee");
        assert_eq!(value["spouse_first_names"], "Mary");
        assert_eq!(value["spouse_last_names"], "Jones");
        assert_eq!(value["marriage_date_str"], "1825");
        assert_eq!(value["marriage_place"], "Salem, Essex, Massachusetts, United States");
        assert_eq!(value["birth_place"], "Boston, Suffolk, Massachusetts, United States");
    }

    #[test]
    fn spouse_depends_on_gender() {
        let mut json = PeopleJson::new();
        json.on_page(&page("Family:John Smith and Mary Jones (1)", MARRIAGE)).unwrap();
        let mut person = Person {
            gender: "F".to_string(),
            spouse_of_family_title: "John Smith and Mary Jones (1)".to_string(),
            ..Default::default()
        };
        let joined = json.joined(&person);
        assert_eq!(joined.spouse_first_names, "John");

        person.gender = "?".to_string();
        let joined = json.joined(&person);
        assert_eq!(joined.spouse_first_names, "");
        assert_eq!(joined.marriage_date_str, "1825");
    }

    #[test]
    fn json_output_is_title_ordered() {
        let mut json = PeopleJson::new();
        json.on_page(&page("Person:Zed (1)", "<person><gender>M</gender></person>")).unwrap();
        json.on_page(&page("Person:Abe (1)", "<person><gender>M</gender></person>")).unwrap();
        let mut buf = Vec::new();
        json.write_json(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let ids: Vec<String> = text
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["person_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["Abe (1)", "Zed (1)"]);
    }

    #[test]
    fn last_event_of_a_type_wins() {
        let facts = vec![
            EventFact {
                kind: Some("Birth".into()),
                date: Some("1800".into()),
                place: None,
            },
            EventFact {
                kind: Some("Birth".into()),
                date: Some("1801".into()),
                place: Some("Here|There".into()),
            },
        ];
        assert_eq!(event(&facts, "Birth"), ("1801".to_string(), "Here".to_string()));
        assert_eq!(event(&facts, "Death"), (String::new(), String::new()));
    }
}
