use serde::Serialize;

use crate::config::Heuristics;
use crate::model::{Document, Paragraph};

const REFERENCE_HEADINGS: &[&str] = &["reference", "references", "reference list"];

/// Section boundaries: `0 <= body_start <= ref_start <= len`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Boundaries {
    pub body_start: usize,
    pub ref_start: usize,
}

impl Boundaries {
    pub fn has_references(&self, doc: &Document) -> bool {
        self.ref_start < doc.len()
    }
}

pub(crate) fn is_reference_heading(para: &Paragraph) -> bool {
    let text = para.text().trim().to_lowercase();
    REFERENCE_HEADINGS.contains(&text.as_str())
}

pub fn find_reference_start(doc: &Document) -> usize {
    doc.paragraphs()
        .iter()
        .position(is_reference_heading)
        .unwrap_or(doc.len())
}

/// Find where the body and the reference list begin.
///
/// With `has_title_page` unset the body always starts at 0. A title page that
/// cannot be delimited also yields 0, which downstream treats as "no title page".
pub fn locate(doc: &Document, has_title_page: bool, heuristics: &Heuristics) -> Boundaries {
    let ref_start = find_reference_start(doc);
    if ref_start == doc.len() {
        log::debug!("no reference heading found; body runs to the end");
    }

    let body_start = if has_title_page {
        let window = heuristics.safe_window.min(ref_start);
        find_body_start(doc, window, heuristics.title_page_lines)
    } else {
        0
    };

    log::debug!("located body_start={body_start} ref_start={ref_start}");
    Boundaries { body_start, ref_start }
}

fn find_body_start(doc: &Document, window: usize, title_page_lines: usize) -> usize {
    let paragraphs = &doc.paragraphs()[..window];

    if let Some(i) = paragraphs.iter().position(Paragraph::has_hard_break) {
        log::debug!("title page ends at hard break in paragraph {i}");
        return i + 1;
    }

    let mut seen = 0;
    for (i, para) in paragraphs.iter().enumerate() {
        if !para.has_text() {
            continue;
        }
        seen += 1;
        if seen == title_page_lines {
            let next = paragraphs[i + 1..]
                .iter()
                .position(|p| p.has_text())
                .map(|offset| i + 1 + offset);
            if let Some(start) = next {
                log::debug!("title page ends after {title_page_lines} lines at paragraph {start}");
                return start;
            }
            break;
        }
    }

    log::warn!("could not find the end of the title page within {window} paragraphs");
    0
}
