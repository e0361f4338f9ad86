use crate::error::Error;
use crate::model::{Document, Paragraph, ParagraphId, Role};
use crate::style;

/// What the title page pass did, and where the body now begins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TitlePageOutcome {
    pub formatted: bool,
    /// First body paragraph as it was before any mutation; `None` when the
    /// pass did not run or the body is empty.
    pub first_body: Option<ParagraphId>,
    pub blanks_removed: usize,
    pub break_inserted: bool,
}

/// Format `doc[0..body_start)` as a title page and force a page break before
/// the body.
///
/// A range holding no text is taken as a false detection and left untouched.
pub fn normalize(doc: &mut Document, body_start: usize) -> Result<TitlePageOutcome, Error> {
    let body_start = body_start.min(doc.len());
    if body_start == 0 {
        return Ok(TitlePageOutcome::default());
    }

    let range: Vec<ParagraphId> = doc.paragraphs()[..body_start].iter().map(|p| p.id()).collect();
    let first_body = doc.get(body_start).map(|p| p.id());

    if !doc.paragraphs()[..body_start].iter().any(|p| p.has_text()) {
        log::warn!("title page range has no text; leaving it as is");
        return Ok(TitlePageOutcome::default());
    }

    let mut title_seen = false;
    let mut last_line = None;
    for &id in &range {
        let para = doc.by_id_mut(id)?;
        style::apply(para, Role::TitlePageLine);
        if !para.has_text() {
            continue;
        }
        if !title_seen {
            style::set_bold(para);
            title_seen = true;
        }
        last_line = Some(id);
    }
    let Some(last_line) = last_line else {
        return Ok(TitlePageOutcome::default());
    };

    // Blanks between the last title line and the body, removed back to front.
    // Drawings and section breaks in the gap stay.
    let last_pos = doc.position(last_line).ok_or(Error::UnknownParagraph(last_line))?;
    let stray: Vec<ParagraphId> = doc.paragraphs()[last_pos + 1..body_start]
        .iter()
        .filter(|p| p.is_disposable())
        .map(|p| p.id())
        .collect();
    for &id in stray.iter().rev() {
        doc.remove(id)?;
    }

    // Right before the body now sits the last title line, or a section break
    // that survived the cleanup.
    let body_pos = match first_body {
        Some(id) => doc.position(id).ok_or(Error::UnknownParagraph(id))?,
        None => doc.len(),
    };
    let title_has_break = body_pos
        .checked_sub(1)
        .and_then(|i| doc.get(i))
        .is_some_and(|p| p.has_hard_break());
    let body_has_break = match first_body {
        Some(id) => doc.by_id(id)?.has_hard_break(),
        None => false,
    };

    let mut break_inserted = false;
    if !title_has_break && !body_has_break {
        let mut page_break = Paragraph::page_break();
        style::apply_base(&mut page_break);
        match first_body {
            Some(id) => doc.insert_before(id, page_break)?,
            None => doc.push(page_break),
        };
        break_inserted = true;
    }

    log::info!(
        "title page formatted: {} paragraphs, {} blanks removed, break inserted: {break_inserted}",
        range.len(),
        stray.len()
    );

    Ok(TitlePageOutcome {
        formatted: true,
        first_body,
        blanks_removed: stray.len(),
        break_inserted,
    })
}
