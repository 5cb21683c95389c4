//! Wikitext lists of pages needing manual review.

use crate::config::{FAMILY_NAMESPACE, MYSOURCE_NAMESPACE};
use crate::models::PageRevision;
use crate::parser::PageHandler;
use crate::structured::{parse_block, split_structured, FamilyBlock};
use anyhow::{Context, Result};
use std::io::Write;

fn write_item<W: Write>(out: &mut W, title: &str) -> Result<()> {
    writeln!(out, "* [[{}]]", title).context("Failed to write list item")
}

/// Families with unlikely spouse combinations.
///
/// Three or more spouses with both husbands and wives present go to the
/// different-gender list; two or more spouses all on one side go to the
/// same-gender list.
pub struct MultiSpouseFamilies<S: Write, D: Write> {
    same_gender: S,
    diff_gender: D,
    same_count: u64,
    diff_count: u64,
}

impl<S: Write, D: Write> MultiSpouseFamilies<S, D> {
    pub fn new(same_gender: S, diff_gender: D) -> Self {
        Self {
            same_gender,
            diff_gender,
            same_count: 0,
            diff_count: 0,
        }
    }

    /// Flushes both lists, returning `(same_gender, diff_gender)` counts.
    pub fn finish(mut self) -> Result<(u64, u64)> {
        self.same_gender.flush()?;
        self.diff_gender.flush()?;
        Ok((self.same_count, self.diff_count))
    }
}

impl<S: Write, D: Write> PageHandler for MultiSpouseFamilies<S, D> {
    fn on_page(&mut self, page: &PageRevision) -> Result<()> {
        if !page.title.starts_with(FAMILY_NAMESPACE) {
            return Ok(());
        }
        let Some(block) = split_structured("family", &page.text).block() else {
            return Ok(());
        };
        let family: FamilyBlock = parse_block("family", block)?;
        let (husbands, wives) = (family.husbands.len(), family.wives.len());

        if husbands > 0 && wives > 0 && husbands + wives > 2 {
            write_item(&mut self.diff_gender, &page.title)?;
            self.diff_count += 1;
        } else if (husbands == 0 || wives == 0) && husbands + wives > 1 {
            write_item(&mut self.same_gender, &page.title)?;
            self.same_count += 1;
        }
        Ok(())
    }
}

/// `MySource:` pages whose title has no `User/` style prefix.
pub struct OrphanMySources<W: Write> {
    out: W,
    count: u64,
}

impl<W: Write> OrphanMySources<W> {
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }

    pub fn finish(mut self) -> Result<u64> {
        self.out.flush()?;
        Ok(self.count)
    }
}

impl<W: Write> PageHandler for OrphanMySources<W> {
    fn on_page(&mut self, page: &PageRevision) -> Result<()> {
        if page.title.starts_with(MYSOURCE_NAMESPACE) && !page.title.contains('/') {
            write_item(&mut self.out, &page.title)?;
            self.count += 1;
        }
        Ok(())
    }
}
