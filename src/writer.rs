use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::docx::{self, DOCUMENT_PART, Package, STYLES_PART, WML_NS, WML_PREFIX};
use crate::error::Error;
use crate::model::{Alignment, Document, Paragraph, RawProperty, Run};
use crate::style::{BASE_FONT, BASE_FONT_SIZE};

/// `w:pPr` children in schema order.
const PARAGRAPH_PROPERTY_ORDER: &[&str] = &[
    "pStyle",
    "keepNext",
    "keepLines",
    "pageBreakBefore",
    "framePr",
    "widowControl",
    "numPr",
    "suppressLineNumbers",
    "pBdr",
    "shd",
    "tabs",
    "suppressAutoHyphens",
    "kinsoku",
    "wordWrap",
    "overflowPunct",
    "topLinePunct",
    "autoSpaceDE",
    "autoSpaceDN",
    "bidi",
    "adjustRightInd",
    "snapToGrid",
    "spacing",
    "ind",
    "contextualSpacing",
    "mirrorIndents",
    "suppressOverlap",
    "jc",
    "textDirection",
    "textAlignment",
    "textboxTightWrap",
    "outlineLvl",
    "divId",
    "cnfStyle",
    "rPr",
    "sectPr",
    "pPrChange",
];

/// `w:rPr` children in schema order.
const RUN_PROPERTY_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
    "rPrChange",
];

fn pts_to_twips(pts: f32) -> i64 {
    (pts * 20.0).round() as i64
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn schema_rank(order: &[&str], name: &str) -> usize {
    order.iter().position(|n| *n == name).unwrap_or(order.len())
}

/// Regenerated property elements plus the raw ones, in schema order.
/// A regenerated element replaces a raw element of the same name.
fn merge_properties<'a>(order: &[&str], mut elements: Vec<(&'a str, String)>, raw: &'a [RawProperty]) -> String {
    for prop in raw {
        if !elements.iter().any(|(name, _)| *name == prop.name) {
            elements.push((prop.name.as_str(), prop.xml.clone()));
        }
    }
    elements.sort_by_key(|(name, _)| schema_rank(order, name));
    elements.into_iter().map(|(_, xml)| xml).collect()
}

fn alignment_val(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

pub fn write(package: &Package, doc: &Document, output: &Path) -> Result<(), Error> {
    let bytes = to_bytes(package, doc)?;
    std::fs::write(output, bytes)?;
    log::debug!("wrote {} paragraphs to {}", doc.len(), output.display());
    Ok(())
}

/// Re-zip the package with a regenerated `word/document.xml`.
pub fn to_bytes(package: &Package, doc: &Document) -> Result<Vec<u8>, Error> {
    let document_xml = render_document(package, doc);

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for part in &package.parts {
        zip.start_file(part.name.as_str(), options)?;
        if part.name == DOCUMENT_PART {
            zip.write_all(document_xml.as_bytes())?;
        } else if part.name == STYLES_PART {
            zip.write_all(&styles_part(&part.data))?;
        } else {
            zip.write_all(&part.data)?;
        }
    }
    Ok(zip.finish()?.into_inner())
}

pub fn render_document(package: &Package, doc: &Document) -> String {
    let mut out = package.head.clone();
    render_body(doc, &mut out);
    out.push_str(&package.tail);
    out
}

/// The children of `w:body`: paragraphs, preserved blocks, then the section properties.
pub fn render_body(doc: &Document, out: &mut String) {
    for block in &doc.leading {
        out.push_str(block);
    }
    for para in doc.paragraphs() {
        render_paragraph(para, out);
        for block in &para.trailing {
            out.push_str(block);
        }
    }
    if let Some(section) = &doc.section {
        out.push_str(section);
    }
}

fn render_paragraph(para: &Paragraph, out: &mut String) {
    let mut ppr: Vec<(&str, String)> = Vec::new();
    if let Some(style) = &para.style_id {
        ppr.push(("pStyle", format!(r#"<w:pStyle w:val="{}"/>"#, escape(style))));
    }
    if let Some(numbering) = &para.numbering {
        ppr.push(("numPr", numbering.clone()));
    }
    if para.line_spacing.is_some() || para.space_before.is_some() || para.space_after.is_some() {
        let mut spacing = String::from("<w:spacing");
        if let Some(before) = para.space_before {
            spacing.push_str(&format!(r#" w:before="{}""#, pts_to_twips(before)));
        }
        if let Some(after) = para.space_after {
            spacing.push_str(&format!(r#" w:after="{}""#, pts_to_twips(after)));
        }
        if let Some(line) = para.line_spacing {
            let line = (line * 240.0).round() as i64;
            spacing.push_str(&format!(r#" w:line="{line}" w:lineRule="auto""#));
        }
        spacing.push_str("/>");
        ppr.push(("spacing", spacing));
    }
    if para.left_indent.is_some() || para.first_line_indent.is_some() {
        let mut ind = String::from("<w:ind");
        if let Some(left) = para.left_indent {
            ind.push_str(&format!(r#" w:left="{}""#, pts_to_twips(left)));
        }
        match para.first_line_indent {
            Some(first) if first < 0.0 => {
                ind.push_str(&format!(r#" w:hanging="{}""#, pts_to_twips(-first)));
            }
            Some(first) => ind.push_str(&format!(r#" w:firstLine="{}""#, pts_to_twips(first))),
            None => {}
        }
        ind.push_str("/>");
        ppr.push(("ind", ind));
    }
    if let Some(alignment) = para.alignment {
        ppr.push(("jc", format!(r#"<w:jc w:val="{}"/>"#, alignment_val(alignment))));
    }
    let ppr = merge_properties(PARAGRAPH_PROPERTY_ORDER, ppr, &para.properties);

    out.push_str("<w:p>");
    if !ppr.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(&ppr);
        out.push_str("</w:pPr>");
    }
    for run in &para.runs {
        render_run(run, out);
    }
    out.push_str("</w:p>");
}

/// The `w:rPr` children of a modelled run.
fn run_properties(run: &Run) -> String {
    let mut rpr: Vec<(&str, String)> = Vec::new();
    if let Some(font) = &run.font_name {
        let font = escape(font);
        let mut fonts = format!(r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}""#);
        if let Some(east_asia) = &run.east_asia_font {
            fonts.push_str(&format!(r#" w:eastAsia="{}""#, escape(east_asia)));
        }
        fonts.push_str(&format!(r#" w:cs="{font}"/>"#));
        rpr.push(("rFonts", fonts));
    }
    if run.bold {
        rpr.push(("b", "<w:b/>".to_string()));
    }
    if run.italic {
        rpr.push(("i", "<w:i/>".to_string()));
    }
    if let Some([r, g, b]) = run.color {
        rpr.push(("color", format!(r#"<w:color w:val="{r:02X}{g:02X}{b:02X}"/>"#)));
    }
    if let Some(size) = run.font_size {
        let half_points = (size * 2.0).round() as i64;
        rpr.push(("sz", format!(r#"<w:sz w:val="{half_points}"/>"#)));
        rpr.push(("szCs", format!(r#"<w:szCs w:val="{half_points}"/>"#)));
    }
    // A raw w:u already carries the underline style.
    if run.underline && !run.properties.iter().any(|p| p.name == "u") {
        rpr.push(("u", r#"<w:u w:val="single"/>"#.to_string()));
    }
    merge_properties(RUN_PROPERTY_ORDER, rpr, &run.properties)
}

fn render_run(run: &Run, out: &mut String) {
    if let Some(raw) = &run.raw {
        out.push_str(raw);
        return;
    }

    out.push_str("<w:r>");
    let rpr = run_properties(run);
    if !rpr.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&rpr);
        out.push_str("</w:rPr>");
    }
    if run.page_break {
        out.push_str(r#"<w:br w:type="page"/></w:r>"#);
        return;
    }

    let mut pending = String::new();
    for c in run.text.chars() {
        let element = match c {
            '\t' => "<w:tab/>",
            '\n' => "<w:br/>",
            '\u{00AD}' => "<w:softHyphen/>",
            '\u{2011}' => "<w:noBreakHyphen/>",
            _ => {
                pending.push(c);
                continue;
            }
        };
        flush_text(&mut pending, out);
        out.push_str(element);
    }
    flush_text(&mut pending, out);
    out.push_str("</w:r>");
}

fn flush_text(pending: &mut String, out: &mut String) {
    if pending.is_empty() {
        return;
    }
    out.push_str(r#"<w:t xml:space="preserve">"#);
    out.push_str(&escape(pending));
    out.push_str("</w:t>");
    pending.clear();
}

/// `word/styles.xml` with the default paragraph style set to the base font,
/// or the original bytes when it cannot be rewritten.
fn styles_part(data: &[u8]) -> Vec<u8> {
    let rewritten = match std::str::from_utf8(data) {
        Ok(xml) => normalize_styles(xml),
        Err(e) => Err(Error::InvalidDocx(format!("{STYLES_PART} is not UTF-8: {e}"))),
    };
    match rewritten {
        Ok(xml) => xml.into_bytes(),
        Err(e) => {
            log::warn!("keeping {STYLES_PART} unchanged: {e}");
            data.to_vec()
        }
    }
}

/// Rewrite the `w:rPr` of the default paragraph style (`Normal`) to
/// Times New Roman 12 pt. Its other run properties are kept.
pub fn normalize_styles(xml: &str) -> Result<String, Error> {
    let styles = roxmltree::Document::parse(xml)?;
    let root = styles.root_element();
    if root.lookup_prefix(WML_NS) != Some(WML_PREFIX) {
        return Err(Error::InvalidDocx(format!("{STYLES_PART} does not use the \"w\" prefix")));
    }

    let paragraph_styles = root
        .children()
        .filter(|n| docx::is_wml(*n, "style"))
        .filter(|n| n.attribute((WML_NS, "type")) == Some("paragraph"));
    let normal = paragraph_styles
        .clone()
        .find(|n| matches!(n.attribute((WML_NS, "default")), Some("1" | "true" | "on")))
        .or_else(|| paragraph_styles.clone().find(|n| n.attribute((WML_NS, "styleId")) == Some("Normal")))
        .ok_or_else(|| Error::InvalidDocx(format!("no default paragraph style in {STYLES_PART}")))?;

    let rpr = docx::wml(normal, "rPr");
    let base = Run {
        font_name: Some(BASE_FONT.to_string()),
        east_asia_font: rpr
            .and_then(|n| docx::wml(n, "rFonts"))
            .and_then(|n| n.attribute((WML_NS, "eastAsia")))
            .map(String::from),
        font_size: Some(BASE_FONT_SIZE),
        properties: docx::raw_properties(rpr, xml, &["rFonts", "sz", "szCs"]),
        ..Run::default()
    };
    let replacement = format!("<w:rPr>{}</w:rPr>", run_properties(&base));

    let range = match rpr {
        Some(rpr) => rpr.range(),
        None => {
            let at = rpr_slot(normal)
                .ok_or_else(|| Error::InvalidDocx("default paragraph style has no children".into()))?;
            at..at
        }
    };
    log::debug!("set the default paragraph style to {BASE_FONT} {BASE_FONT_SIZE} pt");
    Ok(format!("{}{replacement}{}", &xml[..range.start], &xml[range.end..]))
}

/// Where a missing `w:rPr` goes inside a `w:style`: after `w:pPr`, before the
/// table properties, or after the last child.
fn rpr_slot(style: roxmltree::Node) -> Option<usize> {
    if let Some(ppr) = docx::wml(style, "pPr") {
        return Some(ppr.range().end);
    }
    let children = style.children().filter(|n| n.is_element());
    let table = children
        .clone()
        .find(|n| matches!(n.tag_name().name(), "tblPr" | "trPr" | "tcPr" | "tblStylePr"));
    match table {
        Some(table) => Some(table.range().start),
        None => children.last().map(|n| n.range().end),
    }
}
