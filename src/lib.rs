pub mod body;
pub mod citations;
pub mod config;
pub mod docx;
mod error;
pub mod locate;
pub mod model;
pub mod references;
pub mod report;
pub mod style;
pub mod title_page;
pub mod writer;

pub use config::{Config, Heuristics};
pub use error::Error;
pub use model::{Document, Paragraph, RawProperty, Role, Run};
pub use report::Report;

use std::path::Path;

/// Run every formatting pass over `doc`.
///
/// The passes work on a scratch copy; `doc` is only replaced when all of them
/// succeed, so an error leaves it exactly as it was.
pub fn format_document(doc: &mut Document, config: &Config) -> Result<Report, Error> {
    let mut scratch = doc.clone();
    let report = run_passes(&mut scratch, config)?;
    *doc = scratch;
    Ok(report)
}

fn run_passes(doc: &mut Document, config: &Config) -> Result<Report, Error> {
    let initial = locate::locate(doc, config.has_title_page, &config.heuristics);

    let title_page = if config.has_title_page {
        title_page::normalize(doc, initial.body_start)?
    } else {
        title_page::TitlePageOutcome::default()
    };

    let bounds = body::relocate(doc, &title_page);
    let body = body::classify_body(doc, bounds, config)?;

    let refs = if bounds.has_references(doc) {
        references::normalize(doc, bounds.ref_start, config.sort_references)?
    } else {
        log::info!("no reference list; skipping reference formatting");
        references::ReferenceSummary::default()
    };

    let mut report = Report {
        body_start: bounds.body_start,
        ref_start: bounds.ref_start,
        title_page_formatted: title_page.formatted,
        blank_paragraphs_removed: title_page.blanks_removed + refs.blanks_removed,
        page_breaks_inserted: usize::from(title_page.break_inserted) + usize::from(refs.break_inserted),
        article_title: body.article_title,
        headings: body.headings,
        body_paragraphs: body.body_paragraphs,
        reference_section_found: refs.found,
        reference_entries: refs.entries,
        references_sorted: refs.sorted,
        reference_formatting_lost: refs.formatting_lost,
        ..Report::default()
    };

    if config.check_citations {
        let check = citations::match_citations(doc);
        report.citations_checked = true;
        report.missing_in_references = check.missing_in_references;
        report.missing_in_body = check.missing_in_body;
    }

    Ok(report)
}

/// Read a DOCX manuscript, format it, and write the result to `output`.
pub fn format_docx(input: &Path, output: &Path, config: &Config) -> Result<Report, Error> {
    let (mut doc, package) = docx::read(input)?;
    let report = format_document(&mut doc, config)?;
    writer::write(&package, &doc, output)?;
    Ok(report)
}
