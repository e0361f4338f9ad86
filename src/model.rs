use std::fmt;

use serde::Serialize;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Stable identity of a paragraph inside one [`Document`].
///
/// Positions shift whenever paragraphs are inserted or removed; ids do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ParagraphId(u64);

impl ParagraphId {
    const DETACHED: ParagraphId = ParagraphId(0);
}

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag applied to a paragraph by classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Role {
    TitlePageLine,
    ArticleTitle,
    Heading,
    BodyText,
    ReferenceTitle,
    ReferenceEntry,
}

/// A property element (`w:pPr` or `w:rPr` child) kept as source XML.
#[derive(Clone, Debug, PartialEq)]
pub struct RawProperty {
    /// Local element name, e.g. `keepNext`, `vertAlign`, `sectPr`.
    pub name: String,
    pub xml: String,
}

impl RawProperty {
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Self {
        RawProperty { name: name.into(), xml: xml.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font_name: Option<String>,
    pub east_asia_font: Option<String>,
    pub font_size: Option<f32>,  // points
    pub color: Option<[u8; 3]>, // None = automatic (black)
    /// The run is exactly one forced page break.
    pub page_break: bool,
    /// Source XML for runs we cannot model (drawings, fields, equations);
    /// written back verbatim.
    pub raw: Option<String>,
    /// The raw XML is a zero-width marker (bookmark, proofing mark, comment range).
    pub marker: bool,
    /// Unmodelled `w:rPr` children, written after the regenerated ones.
    pub properties: Vec<RawProperty>,
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Run { text: text.into(), ..Run::default() }
    }

    pub fn page_break() -> Self {
        Run { page_break: true, ..Run::default() }
    }

    pub fn has_emphasis(&self) -> bool {
        self.bold || self.italic || self.underline
    }

    /// Raw content that renders on the page (drawings, equations, fields).
    pub fn is_embedded(&self) -> bool {
        self.raw.is_some() && !self.marker
    }
}

#[derive(Clone, Debug)]
pub struct Paragraph {
    id: ParagraphId,
    pub runs: Vec<Run>,
    pub alignment: Option<Alignment>,
    pub first_line_indent: Option<f32>, // points, negative = hanging
    pub left_indent: Option<f32>,       // points
    pub line_spacing: Option<f32>,      // multiple of single spacing
    pub space_before: Option<f32>,      // points
    pub space_after: Option<f32>,       // points
    pub style_id: Option<String>,
    pub numbering: Option<String>, // raw w:numPr
    /// Unmodelled `w:pPr` children, including a paragraph-level `w:sectPr`.
    pub properties: Vec<RawProperty>,
    /// Raw body-level blocks (tables, etc.) that follow this paragraph.
    pub trailing: Vec<String>,
}

impl Default for Paragraph {
    fn default() -> Self {
        Paragraph {
            id: ParagraphId::DETACHED,
            runs: Vec::new(),
            alignment: None,
            first_line_indent: None,
            left_indent: None,
            line_spacing: None,
            space_before: None,
            space_after: None,
            style_id: None,
            numbering: None,
            properties: Vec::new(),
            trailing: Vec::new(),
        }
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Paragraph { runs: vec![Run::text(text)], ..Self::default() }
    }

    /// An empty paragraph whose only content is a forced page break.
    pub fn page_break() -> Self {
        Paragraph { runs: vec![Run::page_break()], ..Self::default() }
    }

    pub fn id(&self) -> ParagraphId {
        self.id
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// No visible text and no embedded content such as a drawing or an equation.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty() && !r.is_embedded())
    }

    pub fn has_text(&self) -> bool {
        !self.text().trim().is_empty()
    }

    /// The paragraph mark carries a `w:sectPr`, closing a section of the document.
    pub fn ends_section(&self) -> bool {
        self.properties.iter().any(|p| p.name == "sectPr")
    }

    /// Blank and safe to delete: removing a section-closing paragraph would
    /// merge two sections.
    pub fn is_disposable(&self) -> bool {
        self.is_blank() && !self.ends_section()
    }

    /// A forced page break run, or a section break that starts a new page.
    pub fn has_hard_break(&self) -> bool {
        self.runs.iter().any(|r| r.page_break)
            || self
                .properties
                .iter()
                .any(|p| p.name == "sectPr" && !is_continuous_section(&p.xml))
    }

    pub fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }

    /// Replace the content with a single plain run, keeping any page break.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let had_break = self.has_hard_break();
        self.runs = vec![Run::text(text)];
        if had_break {
            self.runs.push(Run::page_break());
        }
    }

    pub fn append_page_break(&mut self) {
        self.runs.push(Run::page_break());
    }
}

fn is_continuous_section(sect_pr: &str) -> bool {
    sect_pr
        .find("<w:type ")
        .and_then(|start| sect_pr[start..].split('>').next())
        .is_some_and(|tag| tag.contains("continuous"))
}

/// Ordered, mutable paragraph store.
#[derive(Clone, Debug, Default)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
    next_id: u64,
    /// Raw body-level blocks that precede the first paragraph.
    pub leading: Vec<String>,
    /// Raw `w:sectPr` of the body, if any.
    pub section: Option<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paragraphs(paragraphs: impl IntoIterator<Item = Paragraph>) -> Self {
        let mut doc = Self::new();
        for p in paragraphs {
            doc.push(p);
        }
        doc
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn get(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        self.paragraphs.get_mut(index)
    }

    pub fn position(&self, id: ParagraphId) -> Option<usize> {
        self.paragraphs.iter().position(|p| p.id == id)
    }

    pub fn by_id(&self, id: ParagraphId) -> Result<&Paragraph, Error> {
        self.paragraphs
            .iter()
            .find(|p| p.id == id)
            .ok_or(Error::UnknownParagraph(id))
    }

    pub fn by_id_mut(&mut self, id: ParagraphId) -> Result<&mut Paragraph, Error> {
        self.paragraphs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::UnknownParagraph(id))
    }

    fn attach(&mut self, mut para: Paragraph) -> Paragraph {
        self.next_id += 1;
        para.id = ParagraphId(self.next_id);
        para
    }

    pub fn push(&mut self, para: Paragraph) -> ParagraphId {
        let para = self.attach(para);
        let id = para.id;
        self.paragraphs.push(para);
        id
    }

    pub fn insert_before(&mut self, anchor: ParagraphId, para: Paragraph) -> Result<ParagraphId, Error> {
        let index = self.position(anchor).ok_or(Error::UnknownParagraph(anchor))?;
        let para = self.attach(para);
        let id = para.id;
        self.paragraphs.insert(index, para);
        Ok(id)
    }

    pub fn insert_after(&mut self, anchor: ParagraphId, para: Paragraph) -> Result<ParagraphId, Error> {
        let index = self.position(anchor).ok_or(Error::UnknownParagraph(anchor))?;
        let para = self.attach(para);
        let id = para.id;
        self.paragraphs.insert(index + 1, para);
        Ok(id)
    }

    /// Remove a paragraph. Its trailing blocks move to the predecessor.
    pub fn remove(&mut self, id: ParagraphId) -> Result<Paragraph, Error> {
        let index = self.position(id).ok_or(Error::UnknownParagraph(id))?;
        let mut removed = self.paragraphs.remove(index);
        let trailing = std::mem::take(&mut removed.trailing);
        match index.checked_sub(1) {
            Some(prev) => self.paragraphs[prev].trailing.extend(trailing),
            None => self.leading.extend(trailing),
        }
        Ok(removed)
    }

    /// Remove and return every paragraph after `id`, in order.
    ///
    /// Trailing blocks of the drained paragraphs stay with the caller.
    pub fn drain_after(&mut self, id: ParagraphId) -> Result<Vec<Paragraph>, Error> {
        let index = self.position(id).ok_or(Error::UnknownParagraph(id))?;
        Ok(self.paragraphs.split_off(index + 1))
    }
}
