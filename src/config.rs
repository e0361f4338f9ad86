/// Options chosen by the caller for one formatting pass.
#[derive(Clone, Debug)]
pub struct Config {
    /// The manuscript opens with a student/professional title page.
    pub has_title_page: bool,
    /// The first body paragraph repeats the paper title.
    pub has_article_title: bool,
    /// Rebuild the reference list in sorted order (drops run-level formatting).
    pub sort_references: bool,
    pub check_citations: bool,
    pub heuristics: Heuristics,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            has_title_page: true,
            has_article_title: true,
            sort_references: false,
            check_citations: true,
            heuristics: Heuristics::default(),
        }
    }
}

/// Empirically tuned thresholds for the layout heuristics.
///
/// All of them misfire on some manuscripts; the defaults are the tuned values.
#[derive(Clone, Debug)]
pub struct Heuristics {
    /// Non-blank lines on a conventional title page (title, author,
    /// affiliation, course, instructor, date).
    pub title_page_lines: usize,
    /// Only the first this-many paragraphs are searched for the title page end.
    pub safe_window: usize,
    /// Paragraphs with fewer words than this may be headings.
    pub heading_max_words: usize,
    /// A paragraph ending in one of these is never a heading.
    pub heading_terminators: Vec<char>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Heuristics {
            title_page_lines: 6,
            safe_window: 50,
            heading_max_words: 15,
            heading_terminators: vec!['.', ':', '?', '!'],
        }
    }
}
