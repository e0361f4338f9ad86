//! Author–year cross-check between in-text citations and the reference list.
//!
//! Keys are coarse: `(first author surname, year)`. Two authors
//! sharing a surname, or two works by the same first author in one year,
//! collapse into one key.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::{Document, Paragraph};

const SECTION_HEADINGS: &[&str] = &["references", "reference list"];
const STOP_WORDS: &[&str] = &["see", "e.g.", "cf.", "also", "table", "figure"];
const NO_DATE: &str = "n.d.";

/// Parenthesised year that closes the author segment of a reference entry:
/// `(2020)`, `(2020a)`, `(2020, March 3)`, `(n.d.)`.
static REFERENCE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[(（]\s*(?:(\d{4})[a-z]?(?:\s*[,，][^)）]*)?|n\.\s?d\.)\s*[)）]").unwrap()
});

static PAREN_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（]([^()（）]*)[)）]").unwrap());

static CITATION_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{4})[a-z]?\b|\bn\.\s?d\.").unwrap());

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CitationKey {
    pub author: String,
    pub year: String,
}

impl CitationKey {
    pub fn new(author: impl Into<String>, year: impl Into<String>) -> Self {
        CitationKey { author: author.into(), year: year.into() }
    }
}

impl fmt::Display for CitationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.author, self.year)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrossReference {
    pub body_keys: BTreeSet<CitationKey>,
    pub reference_keys: BTreeSet<CitationKey>,
    /// Cited in the text but absent from the reference list.
    pub missing_in_references: BTreeSet<CitationKey>,
    /// Listed as a reference but never cited.
    pub missing_in_body: BTreeSet<CitationKey>,
}

impl CrossReference {
    pub fn from_keys(body_keys: BTreeSet<CitationKey>, reference_keys: BTreeSet<CitationKey>) -> Self {
        let missing_in_references = body_keys.difference(&reference_keys).cloned().collect();
        let missing_in_body = reference_keys.difference(&body_keys).cloned().collect();
        CrossReference { body_keys, reference_keys, missing_in_references, missing_in_body }
    }
}

/// Lowercase, keeping letters only (Latin, accented and CJK alike).
pub fn normalize_author(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

fn year_of(caps: &regex::Captures) -> String {
    caps.get(1).map_or_else(|| NO_DATE.to_string(), |m| m.as_str().to_string())
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '，' | '&')
}

/// Key of one reference-list entry, if a year in parentheses can be found.
pub fn reference_key(entry: &str) -> Option<CitationKey> {
    let caps = REFERENCE_YEAR.captures(entry)?;
    let authors = &entry[..caps.get(0)?.start()];
    let author = authors
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '，'))
        .map(normalize_author)
        .find(|a| !a.is_empty())?;
    Some(CitationKey { author, year: year_of(&caps) })
}

fn author_token(segment: &str) -> Option<String> {
    segment
        .split(is_separator)
        .filter(|t| !t.is_empty())
        .filter(|t| !STOP_WORDS.contains(&t.to_lowercase().as_str()))
        .map(normalize_author)
        .find(|a| !a.is_empty())
}

/// Author of a narrative citation such as `Wang and Li (2020)`, taken from the
/// words right before the parenthesis.
fn narrative_author(before: &str) -> Option<String> {
    let words: Vec<&str> = before.split_whitespace().collect();
    let mut end = words.len();
    if end >= 2 && words[end - 2] == "et" && words[end - 1].trim_end_matches(',') == "al." {
        end -= 2;
    }
    if end == 0 {
        return None;
    }
    let mut candidate = words[end - 1];
    if end >= 3
        && matches!(words[end - 2], "and" | "&")
        && words[end - 3].chars().next().is_some_and(|c| c.is_uppercase())
    {
        candidate = words[end - 3];
    }
    let candidate = candidate
        .trim_end_matches("'s")
        .trim_end_matches("\u{2019}s");
    let first = candidate.chars().find(|c| c.is_alphabetic())?;
    if first.is_lowercase() {
        return None;
    }
    Some(normalize_author(candidate)).filter(|a| !a.is_empty())
}

/// Citation keys from the parenthesised groups of one paragraph of text.
pub fn in_text_keys(text: &str) -> Vec<CitationKey> {
    let mut keys = Vec::new();
    for group in PAREN_GROUP.captures_iter(text) {
        let (Some(whole), Some(inner)) = (group.get(0), group.get(1)) else {
            continue;
        };
        if !CITATION_YEAR.is_match(inner.as_str()) {
            continue;
        }
        for (i, citation) in inner.as_str().split([';', '；']).enumerate() {
            let Some(caps) = CITATION_YEAR.captures(citation) else {
                continue;
            };
            let Some(year_match) = caps.get(0) else {
                continue;
            };
            let author = author_token(&citation[..year_match.start()])
                .or_else(|| if i == 0 { narrative_author(&text[..whole.start()]) } else { None });
            match author {
                Some(author) => keys.push(CitationKey { author, year: year_of(&caps) }),
                None => log::debug!("citation without an author token: {citation:?}"),
            }
        }
    }
    keys
}

fn is_section_heading(para: &Paragraph) -> bool {
    let text = para.text().trim().to_lowercase();
    SECTION_HEADINGS.contains(&text.as_str())
}

/// Compare citations in the body against the reference list. Read-only.
pub fn match_citations(doc: &Document) -> CrossReference {
    let paragraphs = doc.paragraphs();
    let split = paragraphs.iter().position(is_section_heading).unwrap_or(paragraphs.len());
    let (body, rest) = paragraphs.split_at(split);

    let body_keys: BTreeSet<CitationKey> = body.iter().flat_map(|p| in_text_keys(&p.text())).collect();

    let mut reference_keys = BTreeSet::new();
    for para in rest.iter().skip(1).filter(|p| p.has_text()) {
        let text = para.text();
        match reference_key(text.trim()) {
            Some(key) => {
                reference_keys.insert(key);
            }
            None => log::debug!("reference entry without a year: {:?}", text.trim()),
        }
    }

    let result = CrossReference::from_keys(body_keys, reference_keys);
    log::info!(
        "citations checked: {} missing from references, {} never cited",
        result.missing_in_references.len(),
        result.missing_in_body.len()
    );
    result
}
