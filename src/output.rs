use crate::config::{ALT_NAMES_MAX_LEN, WORD_IDS_MAX_LEN, WORD_IDS_WARN_COUNT};
use crate::hierarchy::WordIndex;
use crate::models::ResolvedPlace;
use anyhow::Result;
use csv::{QuoteStyle, Writer, WriterBuilder};
use std::io::Write;
use tracing::{error, warn};

/// Headerless `|`-delimited writer; fields are written verbatim.
pub fn pipe_writer<W: Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(inner)
}

pub fn join_ids<T: itoa::Integer + Copy>(ids: &[T], sep: char) -> String {
    let mut buf = itoa::Buffer::new();
    let mut out = String::with_capacity(ids.len() * 8);
    for (i, &id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(buf.format(id));
    }
    out
}

fn no_bar(s: &str) -> String {
    s.replace('|', "")
}

/// Writes `token|id,id,...` lines, returning how many were written.
pub fn write_place_words<W: Write>(index: &WordIndex, out: W) -> Result<usize> {
    let mut writer = pipe_writer(out);
    let mut written = 0;
    for (token, ids) in index {
        if ids.len() > WORD_IDS_WARN_COUNT {
            warn!(token = %token, count = ids.len(), "Large id list");
        }
        let joined = join_ids(ids, ',');
        if joined.len() > WORD_IDS_MAX_LEN {
            error!(token = %token, len = joined.len(), "Ids too long");
            continue;
        }
        writer.write_record([token.as_str(), joined.as_str()])?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Writes one line per resolved place, in the order given.
pub fn write_places<W: Write>(places: &[ResolvedPlace], out: W) -> Result<usize> {
    let mut writer = pipe_writer(out);
    let (mut id, mut parent, mut level, mut country) = (
        itoa::Buffer::new(),
        itoa::Buffer::new(),
        itoa::Buffer::new(),
        itoa::Buffer::new(),
    );

    for place in places {
        let mut alt_names = place.alt_names.join("~");
        if alt_names.len() > ALT_NAMES_MAX_LEN {
            error!(id = place.id, len = alt_names.len(), "Alt names too long");
            alt_names.clear();
        }
        let name = no_bar(&place.name);
        let alt_names = no_bar(&alt_names);
        let types = no_bar(&place.types.join("~"));
        let also_located_in = join_ids(&place.also_located_in, '~');
        let sources = no_bar(&place.sources.join("~"));

        let record: [&str; 11] = [
            id.format(place.id),
            &name,
            &alt_names,
            &types,
            parent.format(place.located_in.id()),
            &also_located_in,
            level.format(place.level),
            country.format(place.country_id),
            &place.latitude,
            &place.longitude,
            &sources,
        ];
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(places.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParentRef;

    fn springfield() -> ResolvedPlace {
        ResolvedPlace {
            id: 30,
            name: "Spring|field".to_string(),
            alt_names: vec!["Calhoun:Gazetteer".to_string(), "Old Town".to_string()],
            types: vec!["City".to_string(), "County Seat".to_string()],
            located_in: ParentRef::Place(20),
            also_located_in: vec![21, 0],
            level: 3,
            country_id: 10,
            latitude: "39.8".to_string(),
            longitude: "-89.65".to_string(),
            sources: vec!["wikipedia:Springfield, Illinois".to_string()],
        }
    }

    fn render<F: FnOnce(&mut Vec<u8>) -> Result<usize>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn join_ids_formats() {
        assert_eq!(join_ids(&[1u32, 22, 333], ','), "1,22,333");
        assert_eq!(join_ids::<i64>(&[], '~'), "");
        assert_eq!(join_ids(&[-1i64], '~'), "-1");
    }

    #[test]
    fn place_line_layout() {
        let text = render(|buf| write_places(&[springfield()], buf));
        assert_eq!(
            text,
            "30|Springfield|Calhoun:Gazetteer~Old Town|City~County Seat|20|21~0|3|10|39.8|-89.65|wikipedia:Springfield, Illinois\n"
        );
    }

    #[test]
    fn top_level_place_line() {
        let mut place = springfield();
        place.located_in = ParentRef::TopLevel;
        place.also_located_in.clear();
        place.alt_names.clear();
        place.latitude.clear();
        place.longitude.clear();
        place.sources.clear();
        let text = render(|buf| write_places(&[place], buf));
        assert_eq!(text, "30|Springfield||City~County Seat|0||3|10|||\n");
    }

    #[test]
    fn long_alt_names_are_emptied() {
        let mut place = springfield();
        place.alt_names = vec!["x".repeat(ALT_NAMES_MAX_LEN + 1)];
        let text = render(|buf| write_places(&[place], buf));
        assert!(text.starts_with("30|Springfield||City"));
    }

    #[test]
    fn word_lines() {
        let mut index = WordIndex::new();
        index.insert("sangamon".to_string(), vec![7, 20]);
        index.insert("illinois".to_string(), vec![10]);
        let mut buf = Vec::new();
        assert_eq!(write_place_words(&index, &mut buf).unwrap(), 2);
        assert_eq!(String::from_utf8(buf).unwrap(), "illinois|10\nsangamon|7,20\n");
    }

    #[test]
    fn oversized_word_lists_are_omitted() {
        let mut index = WordIndex::new();
        index.insert("big".to_string(), (1_000_000..1_002_000).collect());
        index.insert("small".to_string(), vec![1]);
        let mut buf = Vec::new();
        assert_eq!(write_place_words(&index, &mut buf).unwrap(), 1);
        assert_eq!(String::from_utf8(buf).unwrap(), "small|1\n");
    }
}
