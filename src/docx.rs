use std::io::Read;
use std::path::Path;

use crate::error::Error;
use crate::model::{Alignment, Document, Paragraph, RawProperty, Run};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const MATH_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const STYLES_PART: &str = "word/styles.xml";
/// The writer emits this prefix for every element it generates.
pub(crate) const WML_PREFIX: &str = "w";

/// `w:pPr` children regenerated from the paragraph fields.
const MODELLED_PARAGRAPH_PROPERTIES: &[&str] = &["pStyle", "numPr", "spacing", "ind", "jc"];
/// `w:rPr` children regenerated from the run fields. `rFonts`, `szCs` and `u`
/// stay raw so attributes the model lacks survive until they are overridden.
const MODELLED_RUN_PROPERTIES: &[&str] = &["b", "i", "color", "sz"];
/// Paragraph children that take no space on the page.
const MARKERS: &[&str] = &[
    "bookmarkStart",
    "bookmarkEnd",
    "proofErr",
    "commentRangeStart",
    "commentRangeEnd",
    "permStart",
    "permEnd",
    "moveFromRangeStart",
    "moveFromRangeEnd",
    "moveToRangeStart",
    "moveToRangeEnd",
];
/// Run children we can represent; anything else keeps the run as raw XML.
const MODELLED_RUN_CHILDREN: &[&str] = &[
    "rPr",
    "t",
    "tab",
    "br",
    "cr",
    "lastRenderedPageBreak",
    "softHyphen",
    "noBreakHyphen",
];

pub(crate) struct Part {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
}

/// Everything in the DOCX that the formatter does not model, kept for writing back.
pub struct Package {
    pub(crate) parts: Vec<Part>,
    /// `word/document.xml` up to and including the opening `w:body` tag.
    pub(crate) head: String,
    /// The closing `w:body` tag and everything after it.
    pub(crate) tail: String,
}

fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    if val == "auto" || val.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

pub(crate) fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

pub(crate) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

/// `<w:b/>` and `<w:b w:val="1"/>` are on; `w:val="0"`/`"false"` is off.
fn toggle(rpr: Option<roxmltree::Node>, name: &str) -> bool {
    rpr.and_then(|n| wml(n, name))
        .is_some_and(|n| !matches!(n.attribute((WML_NS, "val")), Some("0" | "false" | "off")))
}

fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" | "distribute" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

fn raw<'x>(xml: &'x str, node: roxmltree::Node) -> &'x str {
    &xml[node.range()]
}

/// Text of `w:t` and `m:t` descendants, for content kept as raw XML.
fn visible_text(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| {
            n.tag_name().name() == "t" && matches!(n.tag_name().namespace(), Some(WML_NS | MATH_NS))
        })
        .filter_map(|n| n.text())
        .collect()
}

/// Element children of a property container other than the `modelled` ones.
pub(crate) fn raw_properties(container: Option<roxmltree::Node>, xml: &str, modelled: &[&str]) -> Vec<RawProperty> {
    container
        .into_iter()
        .flat_map(|c| c.children())
        .filter(|n| n.is_element())
        .filter(|n| !(n.tag_name().namespace() == Some(WML_NS) && modelled.contains(&n.tag_name().name())))
        .map(|n| RawProperty::new(n.tag_name().name(), raw(xml, n)))
        .collect()
}

pub fn read(path: &Path) -> Result<(Document, Package), Error> {
    let file = std::fs::File::open(path)?;
    let mut zip = zip::ZipArchive::new(file)?;

    let mut parts = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        parts.push(Part { name: entry.name().to_string(), data });
    }

    let document_part = parts
        .iter()
        .find(|p| p.name == DOCUMENT_PART)
        .ok_or_else(|| Error::InvalidDocx(format!("missing {DOCUMENT_PART}")))?;
    let xml_content = std::str::from_utf8(&document_part.data)
        .map_err(|e| Error::InvalidDocx(format!("{DOCUMENT_PART} is not UTF-8: {e}")))?;

    let (doc, head, tail) = parse_document(xml_content)?;
    log::debug!("read {} paragraphs from {}", doc.len(), path.display());
    Ok((doc, Package { parts, head, tail }))
}

fn parse_document(xml_content: &str) -> Result<(Document, String, String), Error> {
    let xml = roxmltree::Document::parse(xml_content)?;
    let root = xml.root_element();

    let body = wml(root, "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;
    // Preserved blocks are spliced next to generated `w:` elements, so both
    // must agree on the prefix.
    match body.lookup_prefix(WML_NS) {
        Some(WML_PREFIX) => {}
        Some(other) => {
            return Err(Error::InvalidDocx(format!(
                "WordprocessingML bound to prefix {other:?}, expected {WML_PREFIX:?}"
            )));
        }
        None => {
            return Err(Error::InvalidDocx(
                "WordprocessingML is the default namespace, expected a \"w\" prefix".into(),
            ));
        }
    }

    let mut doc = Document::new();
    for node in body.children().filter(|n| n.is_element()) {
        if is_wml(node, "p") {
            doc.push(parse_paragraph(node, xml_content));
        } else if is_wml(node, "sectPr") {
            doc.section = Some(raw(xml_content, node).to_string());
        } else {
            let block = raw(xml_content, node).to_string();
            let last = doc.len().checked_sub(1).and_then(|i| doc.get_mut(i));
            match last {
                Some(para) => para.trailing.push(block),
                None => doc.leading.push(block),
            }
        }
    }

    let range = body.range();
    let head = format!("{}<{WML_PREFIX}:body>", &xml_content[..range.start]);
    let tail = format!("</{WML_PREFIX}:body>{}", &xml_content[range.end..]);
    Ok((doc, head, tail))
}

fn parse_paragraph(node: roxmltree::Node, xml: &str) -> Paragraph {
    let ppr = wml(node, "pPr");

    let alignment = ppr.and_then(|ppr| wml_attr(ppr, "jc")).map(parse_alignment);

    let ind = ppr.and_then(|ppr| wml(ppr, "ind"));
    let left_indent = ind.and_then(|n| twips_attr(n, "left").or_else(|| twips_attr(n, "start")));
    let first_line_indent = ind.and_then(|n| {
        twips_attr(n, "firstLine").or_else(|| twips_attr(n, "hanging").map(|h| -h))
    });

    // Only proportional ("auto") spacing is a multiple of single spacing.
    let spacing = ppr.and_then(|ppr| wml(ppr, "spacing"));
    let line_spacing = spacing
        .filter(|s| matches!(s.attribute((WML_NS, "lineRule")), None | Some("auto")))
        .and_then(|s| s.attribute((WML_NS, "line")))
        .and_then(|v| v.parse::<f32>().ok())
        .map(|v| v / 240.0);
    let space_before = spacing.and_then(|s| twips_attr(s, "before"));
    let space_after = spacing.and_then(|s| twips_attr(s, "after"));

    let style_id = ppr.and_then(|ppr| wml_attr(ppr, "pStyle")).map(String::from);
    let numbering = ppr
        .and_then(|ppr| wml(ppr, "numPr"))
        .map(|n| raw(xml, n).to_string());

    let mut runs = Vec::new();
    collect_runs(node, xml, &mut runs);

    let mut para = Paragraph::new();
    para.runs = runs;
    para.alignment = alignment;
    para.first_line_indent = first_line_indent;
    para.left_indent = left_indent;
    para.line_spacing = line_spacing;
    para.space_before = space_before;
    para.space_after = space_after;
    para.style_id = style_id;
    para.numbering = numbering;
    para.properties = raw_properties(ppr, xml, MODELLED_PARAGRAPH_PROPERTIES);
    para
}

/// Runs of a paragraph. Any other child (hyperlinks, tracked moves, equations,
/// bookmarks) becomes a raw run in document order.
fn collect_runs(parent: roxmltree::Node, xml: &str, runs: &mut Vec<Run>) {
    for child in parent.children().filter(|n| n.is_element()) {
        let in_wml = child.tag_name().namespace() == Some(WML_NS);
        match child.tag_name().name() {
            "pPr" if in_wml => {}
            "r" if in_wml => parse_run(child, xml, runs),
            name => runs.push(Run {
                text: visible_text(child),
                raw: Some(raw(xml, child).to_string()),
                marker: in_wml && MARKERS.contains(&name),
                ..Run::default()
            }),
        }
    }
}

fn parse_run(run_node: roxmltree::Node, xml: &str, runs: &mut Vec<Run>) {
    let rpr = wml(run_node, "rPr");

    let template = Run {
        bold: toggle(rpr, "b"),
        italic: toggle(rpr, "i"),
        underline: rpr
            .and_then(|n| wml_attr(n, "u"))
            .is_some_and(|v| v != "none"),
        font_name: rpr
            .and_then(|n| wml(n, "rFonts"))
            .and_then(|n| n.attribute((WML_NS, "ascii")))
            .map(String::from),
        east_asia_font: rpr
            .and_then(|n| wml(n, "rFonts"))
            .and_then(|n| n.attribute((WML_NS, "eastAsia")))
            .map(String::from),
        font_size: rpr
            .and_then(|n| wml_attr(n, "sz"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|hp| hp / 2.0),
        color: rpr
            .and_then(|n| wml_attr(n, "color"))
            .and_then(parse_hex_color),
        properties: raw_properties(rpr, xml, MODELLED_RUN_PROPERTIES),
        ..Run::default()
    };

    let modelled = run_node.children().filter(|n| n.is_element()).all(|n| {
        n.tag_name().namespace() == Some(WML_NS) && MODELLED_RUN_CHILDREN.contains(&n.tag_name().name())
    });
    if !modelled {
        let text = visible_text(run_node);
        runs.push(Run { text, raw: Some(raw(xml, run_node).to_string()), ..template });
        return;
    }

    let mut current = template.clone();
    for child in run_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "t" => current.text.push_str(child.text().unwrap_or("")),
            "tab" => current.text.push('\t'),
            "cr" => current.text.push('\n'),
            "softHyphen" => current.text.push('\u{00AD}'),
            "noBreakHyphen" => current.text.push('\u{2011}'),
            "br" if child.attribute((WML_NS, "type")) == Some("page") => {
                if !current.text.is_empty() {
                    runs.push(std::mem::replace(&mut current, template.clone()));
                }
                runs.push(Run { page_break: true, ..template.clone() });
            }
            "br" => current.text.push('\n'),
            _ => {}
        }
    }
    if !current.text.is_empty() {
        runs.push(current);
    }
}
