use crate::config::{Config, Heuristics};
use crate::error::Error;
use crate::locate::{self, Boundaries};
use crate::model::{Document, Paragraph, ParagraphId, Role};
use crate::style;
use crate::title_page::TitlePageOutcome;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BodySummary {
    pub article_title: bool,
    pub headings: usize,
    pub body_paragraphs: usize,
}

/// Re-derive the boundaries after the title page pass has mutated `doc`.
///
/// The body start follows the identity captured before mutation; the
/// reference start is found by scanning again.
pub fn relocate(doc: &Document, title_page: &TitlePageOutcome) -> Boundaries {
    let ref_start = locate::find_reference_start(doc);
    let body_start = if title_page.formatted {
        match title_page.first_body {
            Some(id) => doc.position(id).unwrap_or(0),
            None => doc.len(),
        }
    } else {
        0
    };
    Boundaries { body_start: body_start.min(ref_start), ref_start }
}

/// Short lines without terminal punctuation read as section headings.
pub fn looks_like_heading(para: &Paragraph, heuristics: &Heuristics) -> bool {
    let text = para.text();
    let ends_in_terminator = text
        .trim()
        .chars()
        .next_back()
        .is_some_and(|c| heuristics.heading_terminators.contains(&c));
    para.word_count() < heuristics.heading_max_words && !ends_in_terminator
}

/// Role of a body paragraph that has text.
pub fn classify(para: &Paragraph, is_title_slot: bool, config: &Config) -> Role {
    if is_title_slot && config.has_article_title {
        Role::ArticleTitle
    } else if looks_like_heading(para, &config.heuristics) {
        Role::Heading
    } else {
        Role::BodyText
    }
}

/// Classify and style `doc[body_start..ref_start)`. Paragraphs without text,
/// blank lines and figures alike, are left alone.
pub fn classify_body(doc: &mut Document, bounds: Boundaries, config: &Config) -> Result<BodySummary, Error> {
    let end = bounds.ref_start.min(doc.len());
    let start = bounds.body_start.min(end);
    let ids: Vec<ParagraphId> = doc.paragraphs()[start..end]
        .iter()
        .filter(|p| p.has_text())
        .map(|p| p.id())
        .collect();

    let mut summary = BodySummary::default();
    for (i, &id) in ids.iter().enumerate() {
        let para = doc.by_id_mut(id)?;
        let role = classify(para, i == 0, config);
        match role {
            Role::ArticleTitle => summary.article_title = true,
            Role::Heading => summary.headings += 1,
            Role::BodyText => summary.body_paragraphs += 1,
            Role::TitlePageLine | Role::ReferenceTitle | Role::ReferenceEntry => {}
        }
        style::apply(para, role);
    }

    log::info!(
        "body classified: {} headings, {} body paragraphs, article title: {}",
        summary.headings,
        summary.body_paragraphs,
        summary.article_title
    );
    Ok(summary)
}
