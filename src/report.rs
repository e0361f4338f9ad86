use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::citations::CitationKey;

/// Outcome of one formatting pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub body_start: usize,
    pub ref_start: usize,
    pub title_page_formatted: bool,
    pub blank_paragraphs_removed: usize,
    pub page_breaks_inserted: usize,
    pub article_title: bool,
    pub headings: usize,
    pub body_paragraphs: usize,
    pub reference_section_found: bool,
    pub reference_entries: usize,
    pub references_sorted: bool,
    /// Sorting rebuilt entries as plain text, dropping italics and other run formatting.
    pub reference_formatting_lost: bool,
    pub citations_checked: bool,
    pub missing_in_references: BTreeSet<CitationKey>,
    pub missing_in_body: BTreeSet<CitationKey>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title_page_formatted {
            writeln!(f, "Title page: formatted (body starts at paragraph {})", self.body_start + 1)?;
        } else {
            writeln!(f, "Title page: not formatted")?;
        }
        writeln!(
            f,
            "Body: {} headings, {} paragraphs{}",
            self.headings,
            self.body_paragraphs,
            if self.article_title { ", article title centred" } else { "" }
        )?;
        if self.reference_section_found {
            writeln!(
                f,
                "References: {} entries{}",
                self.reference_entries,
                if self.references_sorted { ", sorted" } else { "" }
            )?;
            if self.reference_formatting_lost {
                writeln!(f, "  note: sorting removed italics from reference entries; re-apply them by hand")?;
            }
        } else {
            writeln!(f, "References: no reference heading found")?;
        }
        writeln!(
            f,
            "Cleanup: {} blank paragraphs removed, {} page breaks inserted",
            self.blank_paragraphs_removed, self.page_breaks_inserted
        )?;

        if !self.citations_checked {
            return Ok(());
        }
        if self.missing_in_references.is_empty() && self.missing_in_body.is_empty() {
            return writeln!(f, "Citations: every in-text citation matches a reference");
        }
        if !self.missing_in_references.is_empty() {
            writeln!(f, "Cited but missing from the reference list:")?;
            for key in &self.missing_in_references {
                writeln!(f, "  - {key}")?;
            }
        }
        if !self.missing_in_body.is_empty() {
            writeln!(f, "In the reference list but never cited:")?;
            for key in &self.missing_in_body {
                writeln!(f, "  - {key}")?;
            }
        }
        Ok(())
    }
}
