//! End-to-end report pipelines: read a dump, run the handlers, write outputs.

use crate::audit::{MultiSpouseFamilies, OrphanMySources};
use crate::cache;
use crate::hierarchy::PlaceHierarchy;
use crate::output::{write_place_words, write_places};
use crate::parser::DumpReader;
use crate::people::{PeopleCsv, PeopleJson};
use crate::places::{PlaceCatalog, Places};
use crate::stats::ReadStats;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

const WRITER_CAPACITY: usize = 128 * 1024;

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    Ok(BufWriter::with_capacity(WRITER_CAPACITY, file))
}

#[derive(Debug)]
pub struct PlacesSummary {
    /// `None` when the catalog came from the cache.
    pub read: Option<ReadStats>,
    pub places: usize,
    pub redirects: usize,
    pub resolved: usize,
    pub words: usize,
}

/// Reads every `Place:` page, redirects included, into a catalog.
pub fn build_catalog(input: &str, show_progress: bool) -> Result<(PlaceCatalog, ReadStats)> {
    let mut places = Places::new();
    let stats = {
        let mut reader = DumpReader::new()
            .skip_redirects(false)
            .show_progress(show_progress);
        reader.add_handler(&mut places);
        reader.read_path(input)?
    };
    Ok((places.into_catalog(), stats))
}

/// Writes `place_words.csv` and `places.csv` into `output_dir`.
pub fn run_places(
    input: &str,
    output_dir: &Path,
    use_cache: bool,
    show_progress: bool,
) -> Result<PlacesSummary> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let cached = if use_cache {
        cache::try_load_catalog(&cache::cache_path(output_dir), input)?
    } else {
        info!("Cache disabled, reading dump");
        None
    };
    let (catalog, read) = match cached {
        Some(catalog) => (catalog, None),
        None => {
            let (catalog, stats) = build_catalog(input, show_progress)?;
            if let Err(e) = cache::save_catalog(&catalog, input, output_dir) {
                warn!(error = %e, "Failed to save place catalog cache");
            }
            (catalog, Some(stats))
        }
    };

    let hierarchy = PlaceHierarchy::new(&catalog);
    let index = hierarchy.build_word_index();
    let words = write_place_words(&index, create_output(&output_dir.join("place_words.csv"))?)?;
    info!(tokens = index.len(), written = words, "Word index written");

    let resolved = hierarchy.resolve_all();
    write_places(&resolved, create_output(&output_dir.join("places.csv"))?)?;
    info!(places = resolved.len(), "Places written");

    Ok(PlacesSummary {
        read,
        places: catalog.place_count(),
        redirects: catalog.redirect_count(),
        resolved: resolved.len(),
        words,
    })
}

/// One pipe-delimited line per person page.
pub fn run_people(input: &str, output: &Path, show_progress: bool) -> Result<(ReadStats, u64)> {
    let mut people = PeopleCsv::new(create_output(output)?);
    let stats = {
        let mut reader = DumpReader::new().show_progress(show_progress);
        reader.add_handler(&mut people);
        reader.read_path(input)?
    };
    let written = people.finish()?;
    Ok((stats, written))
}

/// One JSON object per line for every person, joined with their families.
pub fn run_people_json(input: &str, output: &Path, show_progress: bool) -> Result<(ReadStats, usize)> {
    let mut people = PeopleJson::new();
    let stats = {
        let mut reader = DumpReader::new().show_progress(show_progress);
        reader.add_handler(&mut people);
        reader.read_path(input)?
    };
    info!(
        people = people.person_count(),
        families = people.family_count(),
        "Joining people with families"
    );
    let written = people.write_json(create_output(output)?)?;
    Ok((stats, written))
}

/// Same-gender and different-gender multi-spouse family lists.
pub fn run_multi_spouse_families(
    input: &str,
    same_gender: &Path,
    diff_gender: &Path,
    show_progress: bool,
) -> Result<(ReadStats, (u64, u64))> {
    let mut families =
        MultiSpouseFamilies::new(create_output(same_gender)?, create_output(diff_gender)?);
    let stats = {
        let mut reader = DumpReader::new().show_progress(show_progress);
        reader.add_handler(&mut families);
        reader.read_path(input)?
    };
    let counts = families.finish()?;
    Ok((stats, counts))
}

pub fn run_orphan_mysources(input: &str, output: &Path, show_progress: bool) -> Result<(ReadStats, u64)> {
    let mut sources = OrphanMySources::new(create_output(output)?);
    let stats = {
        let mut reader = DumpReader::new().show_progress(show_progress);
        reader.add_handler(&mut sources);
        reader.read_path(input)?
    };
    let written = sources.finish()?;
    Ok((stats, written))
}
