//! Genwiki: genealogy wiki dump extraction
//!
//! Turns a full-history genealogy wiki XML dump into flat reports: a
//! resolved place hierarchy with a name-token search index, person
//! summaries, and review lists.
//!
//! 1. **Read pass** -- Stream the dump once, keeping only each page's
//!    latest revision, and hand it to the registered page handlers
//! 2. **Resolution pass** (places only) -- Follow redirects and parent
//!    chains over the complete place catalog, compute levels and countries,
//!    and build the word index
//! 3. **Output** -- Write pipe-delimited CSV, JSON lines or wikitext lists
//!
//! # Architecture
//!
//! - **Selective streaming** -- An allow-list state machine buffers only the
//!   few elements a page event needs; everything else is dropped on sight
//! - **Latest revision by document order** -- A revision replaces the current
//!   one only when its id is strictly greater
//! - **Isolated handlers** -- A failing handler is logged and skipped, the read
//!   goes on
//! - **Parallel resolution** -- rayon over the read-only catalog, with a
//!   sharded DashMap for word-index writes
//! - **Catalog caching** -- The place catalog is persisted with bincode and
//!   reused while the dump is unchanged
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming dump reader and the page handler interface
//! - [`structured`] -- Structured-block splitting and typed block parsing
//! - [`places`] -- Place page handler and the place catalog
//! - [`hierarchy`] -- Redirect/parent resolution, levels, word index
//! - [`words`] -- Name tokenizer
//! - [`romanize`] -- Accent and ligature folding
//! - [`output`] -- Pipe-delimited writers
//! - [`people`] -- Person CSV and JSON reports
//! - [`audit`] -- Review lists
//! - [`cache`] -- Place catalog persistence
//! - [`extract`] -- Report pipelines
//! - [`stats`] -- Read counters
//! - [`config`] -- Constants
//!
//! # Example Usage
//!
//! ```bash
//! genwiki places -i pages.xml.bz2 -o output/
//! genwiki people-json -i pages.xml.bz2 -o people.json
//! genwiki multi-spouse-families -i pages.xml --same-gender same.wiki --diff-gender diff.wiki
//! ```

pub mod audit;
pub mod cache;
pub mod config;
pub mod extract;
pub mod hierarchy;
pub mod models;
pub mod output;
pub mod parser;
pub mod people;
pub mod places;
pub mod romanize;
pub mod stats;
pub mod structured;
pub mod words;
