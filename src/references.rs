use crate::error::Error;
use crate::model::{Document, Paragraph, ParagraphId, Role};
use crate::style;

pub const REFERENCE_TITLE: &str = "References";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceSummary {
    pub found: bool,
    pub entries: usize,
    pub sorted: bool,
    /// Sorting rewrote entries that carried bold, italic or underline runs,
    /// or embedded content such as fields.
    pub formatting_lost: bool,
    pub break_inserted: bool,
    pub blanks_removed: usize,
}

/// Format the reference list starting at `ref_start`.
///
/// With `sort` the entries are rebuilt as plain text in code-point order;
/// otherwise each entry is formatted in place and blank paragraphs are dropped.
/// Paragraphs holding only a drawing or a section break are never dropped.
pub fn normalize(doc: &mut Document, ref_start: usize, sort: bool) -> Result<ReferenceSummary, Error> {
    let Some(heading) = doc.get(ref_start).map(|p| p.id()) else {
        return Ok(ReferenceSummary::default());
    };
    let mut summary = ReferenceSummary { found: true, ..ReferenceSummary::default() };

    let heading_has_break = doc.by_id(heading)?.has_hard_break();
    if let Some(prev) = ref_start.checked_sub(1).and_then(|i| doc.get_mut(i))
        && !prev.has_hard_break()
        && !heading_has_break
    {
        prev.append_page_break();
        summary.break_inserted = true;
    }

    let title = doc.by_id_mut(heading)?;
    title.set_text(REFERENCE_TITLE);
    style::apply(title, Role::ReferenceTitle);

    if sort {
        // Paragraphs with no text to sort (drawings, section breaks) keep their
        // content and follow the sorted entries.
        let mut entries = Vec::new();
        let mut kept = Vec::new();
        let mut trailing = Vec::new();
        for mut para in doc.drain_after(heading)? {
            if !para.has_text() {
                if para.is_disposable() {
                    trailing.append(&mut para.trailing);
                } else {
                    kept.push(para);
                }
                continue;
            }
            summary.formatting_lost |= para.runs.iter().any(|r| r.has_emphasis() || r.is_embedded());
            trailing.append(&mut para.trailing);
            entries.push(para.text().trim().to_string());
        }
        entries.sort();

        let mut last = heading;
        for entry in entries {
            let mut para = Paragraph::with_text(entry);
            style::apply(&mut para, Role::ReferenceEntry);
            last = doc.insert_after(last, para)?;
            summary.entries += 1;
        }
        doc.by_id_mut(last)?.trailing.extend(trailing);
        for para in kept {
            last = doc.insert_after(last, para)?;
        }
        summary.sorted = true;
    } else {
        let range: Vec<ParagraphId> = doc.paragraphs()[ref_start + 1..].iter().map(|p| p.id()).collect();
        for &id in range.iter().rev() {
            let para = doc.by_id(id)?;
            if para.is_disposable() {
                doc.remove(id)?;
                summary.blanks_removed += 1;
            } else if para.has_text() {
                style::apply(doc.by_id_mut(id)?, Role::ReferenceEntry);
                summary.entries += 1;
            }
        }
    }

    log::info!(
        "reference list formatted: {} entries, sorted: {}",
        summary.entries,
        summary.sorted
    );
    Ok(summary)
}
