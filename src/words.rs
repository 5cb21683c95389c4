use crate::romanize::romanize;
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

// keep in sync with the place standardizer's abbreviation list
static ABBREVIATIONS: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("no", "north"),
        ("so", "south"),
        ("e", "east"),
        ("w", "west"),
        ("cem", "cemetery"),
        ("cemetary", "cemetery"),
        ("co", "county"),
        ("cnty", "county"),
        ("cty", "county"),
        ("is", "island"),
        ("isl", "island"),
        ("lk", "lake"),
        ("mt", "mount"),
        ("par", "parish"),
        ("sainte", "saint"),
        ("st", "saint"),
        ("ste", "saint"),
        ("tp", "township"),
        ("tsp", "township"),
        ("twp", "township"),
        ("twsp", "township"),
        ("ft", "fort"),
    ]
    .into_iter()
    .collect()
});

// keep in sync with the place standardizer's type word list
static TYPE_WORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "amt",
        "amtsgericht",
        "area",
        "arrondissement",
        "authority",
        "bantustan",
        "barangays",
        "bezirk",
        "borough",
        "buurtschap",
        "canton",
        "capital",
        "cemetery",
        "city",
        "civil",
        "comarca",
        "commune",
        "community",
        "concelho",
        "constituency",
        "county",
        "departement",
        "department",
        "diocese",
        "district",
        "division",
        "duchy",
        "federal",
        "freguesia",
        "gehucht",
        "gemeente",
        "gerichtsbezirk",
        "governorate",
        "grafschaft",
        "hameau",
        "hundred",
        "independent",
        "kanton",
        "kerulet",
        "kreis",
        "landkreis",
        "marke",
        "metropolitan",
        "municipal",
        "municipality",
        "national",
        "oblast",
        "okres",
        "parish",
        "partido",
        "perfecture",
        "periphery",
        "powiat",
        "prefecture",
        "presbytery",
        "principal",
        "principality",
        "province",
        "provincie",
        "raion",
        "rayon",
        "regency",
        "regierungsbezirk",
        "region",
        "regional",
        "rione",
        "sahar",
        "stad",
        "state",
        "statutarstadt",
        "stift",
        "subprefecture",
        "synod",
        "territory",
        "town",
        "townland",
        "township",
        "unitary",
        "uyezd",
        "village",
        "voivodship",
    ]
    .into_iter()
    .collect()
});

pub fn is_type_word(word: &str) -> bool {
    TYPE_WORDS.contains(word)
}

/// Expands a known abbreviation, e.g. `st` to `saint`.
pub fn expand_abbreviation(word: &str) -> &str {
    ABBREVIATIONS.get(word).copied().unwrap_or(word)
}

/// Canonical search key for a place name.
///
/// The name is lowercased, romanized and split on anything that is not
/// `a-z0-9`. Words are scanned right to left; type words (`county`,
/// `parish`, ...) trailing the last real name word are dropped, everything
/// from that name word leftwards is kept. A name made only of type words keeps
/// them all. The kept words are concatenated without separators.
///
/// Returns `None` only when the name has no alphanumeric words at all.
pub fn name_token(name: &str) -> Option<String> {
    let lowered = romanize(&name.to_lowercase());
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|w| !w.is_empty())
        .collect();
    // abbreviations are only expanded in multi-word names
    let expand = words.len() > 1;

    let mut kept: Vec<&str> = Vec::with_capacity(words.len());
    let mut found_name_word = false;
    for &word in words.iter().rev() {
        let word = if expand {
            expand_abbreviation(word)
        } else {
            word
        };
        if !is_type_word(word) {
            if !found_name_word {
                kept.clear();
            }
            found_name_word = true;
        }
        kept.push(word);
    }

    if !found_name_word {
        info!(name, "No name words found");
    }
    if kept.is_empty() {
        return None;
    }
    kept.reverse();
    Some(kept.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_type_word_is_dropped() {
        assert_eq!(name_token("Sangamon County"), name_token("Sangamon"));
        assert_eq!(name_token("Sangamon").as_deref(), Some("sangamon"));
    }

    #[test]
    fn leading_type_word_is_kept() {
        assert_eq!(
            name_token("County of Sangamon").as_deref(),
            Some("countyofsangamon")
        );
    }

    #[test]
    fn only_type_words_still_yield_token() {
        assert_eq!(name_token("County").as_deref(), Some("county"));
        assert_eq!(name_token("Civil Parish").as_deref(), Some("civilparish"));
    }

    #[test]
    fn abbreviations_expand_in_multi_word_names() {
        assert_eq!(name_token("St. Louis").as_deref(), Some("saintlouis"));
        assert_eq!(name_token("Mt Vernon").as_deref(), Some("mountvernon"));
        assert_eq!(name_token("Adams Co."), name_token("Adams"));
    }

    #[test]
    fn single_word_abbreviation_is_not_expanded() {
        assert_eq!(name_token("St").as_deref(), Some("st"));
        assert_eq!(name_token("Co").as_deref(), Some("co"));
        // leading punctuation does not make a second word
        assert_eq!(name_token("-Co").as_deref(), Some("co"));
    }

    #[test]
    fn partido_is_a_type_word() {
        assert_eq!(name_token("La Plata Partido"), name_token("La Plata"));
    }

    #[test]
    fn accents_and_punctuation() {
        assert_eq!(name_token("Saint-Étienne").as_deref(), Some("saintetienne"));
        assert_eq!(name_token("Zürich Kanton"), name_token("Zurich"));
    }

    #[test]
    fn multiple_trailing_type_words() {
        assert_eq!(
            name_token("Tipperary South Riding County Council").as_deref(),
            Some("tipperarysouthridingcountycouncil")
        );
        assert_eq!(name_token("Kings Parish County").as_deref(), Some("kings"));
    }

    #[test]
    fn no_words_yields_none() {
        assert_eq!(name_token(""), None);
        assert_eq!(name_token(" -- "), None);
    }

    #[test]
    fn digits_are_words() {
        assert_eq!(name_token("District 9").as_deref(), Some("district9"));
    }
}
