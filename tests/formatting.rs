use apa_format::citations::{self, CitationKey};
use apa_format::locate::{self, Boundaries};
use apa_format::model::{Alignment, RawProperty};
use apa_format::{body, title_page};
use apa_format::{Config, Document, Heuristics, Paragraph, Role, Run};

const TITLE_PAGE: &[&str] = &[
    "Effects of Sleep on Memory",
    "Jane Doe",
    "Department of Psychology, Example University",
    "PSY 101: Introduction to Psychology",
    "Dr. Alan Smith",
    "October 1, 2024",
];

const LONG_SENTENCE: &str =
    "Participants who slept for eight hours recalled more words than those who stayed awake all night (Wang, 2020).";

fn doc_of(texts: &[&str]) -> Document {
    Document::from_paragraphs(texts.iter().map(|t| Paragraph::with_text(*t)))
}

fn texts(doc: &Document) -> Vec<String> {
    doc.paragraphs().iter().map(|p| p.text()).collect()
}

fn manuscript() -> Vec<&'static str> {
    let mut texts = TITLE_PAGE.to_vec();
    texts.extend(["", "", "Effects of Sleep on Memory", "Method", LONG_SENTENCE]);
    texts.extend(["References", "Wang, L. (2020). Sleep and recall. Journal of Sleep."]);
    texts
}

const DRAWING: &str = "<w:r><w:drawing><wp:inline/></w:drawing></w:r>";

fn drawing_runs() -> Vec<Run> {
    vec![Run { raw: Some(DRAWING.into()), ..Run::default() }]
}

fn has_drawing(para: &Paragraph) -> bool {
    para.runs.iter().any(|r| r.raw.as_deref() == Some(DRAWING))
}

fn is_article_title(para: &Paragraph) -> bool {
    para.alignment == Some(Alignment::Center)
        && para.first_line_indent == Some(0.0)
        && para.runs.iter().filter(|r| !r.page_break).all(|r| r.bold)
}

fn no_title_page() -> Config {
    Config { has_title_page: false, ..Config::default() }
}

#[test]
fn body_starts_at_zero_without_title_page() {
    let mut doc = doc_of(&manuscript());
    doc.get_mut(2).unwrap().append_page_break();
    let bounds = locate::locate(&doc, false, &Heuristics::default());
    assert_eq!(bounds.body_start, 0);
    assert_eq!(bounds.ref_start, 11);
}

#[test]
fn rule_of_six_skips_blank_lines() {
    let doc = doc_of(&manuscript());
    let bounds = locate::locate(&doc, true, &Heuristics::default());
    assert_eq!(bounds, Boundaries { body_start: 8, ref_start: 11 });
}

#[test]
fn hard_break_ends_the_title_page() {
    let mut doc = doc_of(&["Title", "Author", "Date", "Body starts here."]);
    doc.get_mut(2).unwrap().append_page_break();
    let bounds = locate::locate(&doc, true, &Heuristics::default());
    assert_eq!(bounds.body_start, 3);
    assert_eq!(bounds.ref_start, 4);
}

#[test]
fn reference_heading_variants() {
    for heading in ["Reference", "  REFERENCES ", "Reference List"] {
        let doc = doc_of(&["Body.", heading, "Entry (2020)."]);
        assert_eq!(locate::find_reference_start(&doc), 1, "{heading:?}");
    }
    let doc = doc_of(&["Body.", "Further references", "Entry"]);
    assert_eq!(locate::find_reference_start(&doc), 3);
}

#[test]
fn title_search_stays_inside_the_window() {
    let mut texts = vec!["Title", "Author", ""];
    texts.extend(std::iter::repeat_n("", 10));
    texts.extend(["Affiliation", "Course", "Instructor", "Date", "Body."]);
    let doc = doc_of(&texts);
    let heuristics = Heuristics { safe_window: 8, ..Heuristics::default() };
    assert_eq!(locate::locate(&doc, true, &heuristics).body_start, 0);

    // Six lines but nothing after them before the reference heading.
    let mut texts = TITLE_PAGE.to_vec();
    texts.extend(["", "References", "Entry"]);
    let doc = doc_of(&texts);
    assert_eq!(locate::locate(&doc, true, &Heuristics::default()).body_start, 0);
}

#[test]
fn title_page_is_compacted_and_broken_from_the_body() {
    let mut doc = doc_of(&manuscript());
    let before = doc.len();
    let report = apa_format::format_document(&mut doc, &Config::default()).unwrap();

    assert!(report.title_page_formatted);
    let break_paragraphs: Vec<&Paragraph> = doc
        .paragraphs()
        .iter()
        .filter(|p| p.is_blank() && p.has_hard_break())
        .collect();
    assert_eq!(break_paragraphs.len(), 1);
    assert_eq!(doc.len(), before - 2 + 1);

    assert_eq!(report.body_start, 7);
    assert!(doc.get(report.body_start - 1).unwrap().has_hard_break());
    assert_eq!(doc.get(report.body_start).unwrap().text(), "Effects of Sleep on Memory");

    for para in &doc.paragraphs()[..6] {
        assert_eq!(para.alignment, Some(Alignment::Center));
        assert_eq!(para.line_spacing, Some(2.0));
        assert_eq!(para.runs[0].font_name.as_deref(), Some("Times New Roman"));
    }
    assert!(doc.get(0).unwrap().runs.iter().all(|r| r.bold));
    assert!(doc.get(1).unwrap().runs.iter().all(|r| !r.bold));
}

#[test]
fn title_page_without_text_is_left_alone() {
    let mut doc = doc_of(&["", "", "Introduction", LONG_SENTENCE]);
    doc.get_mut(1).unwrap().append_page_break();
    let report = apa_format::format_document(&mut doc, &Config::default()).unwrap();
    assert!(!report.title_page_formatted);
    assert_eq!(report.body_start, 0);
    assert_eq!(doc.len(), 4);
    assert_eq!(doc.get(0).unwrap().line_spacing, None);
}

#[test]
fn break_on_the_last_title_line_is_reused() {
    let mut texts = TITLE_PAGE.to_vec();
    texts.extend(["Effects of Sleep on Memory", LONG_SENTENCE]);
    let mut doc = doc_of(&texts);
    doc.get_mut(5).unwrap().append_page_break();

    let report = apa_format::format_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(report.page_breaks_inserted, 0);
    assert_eq!(report.blank_paragraphs_removed, 0);
    assert_eq!(doc.len(), 8);
    assert_eq!(report.body_start, 6);
    assert!(report.article_title);
    assert!(is_article_title(doc.get(6).unwrap()));
    assert!(!is_article_title(doc.get(7).unwrap()));
}

#[test]
fn break_in_the_first_body_paragraph_is_reused() {
    // The locator would stop at such a break itself, so the pass is driven
    // with an explicit body start.
    let mut texts = TITLE_PAGE.to_vec();
    texts.extend(["", "Effects of Sleep on Memory", LONG_SENTENCE]);
    let mut doc = doc_of(&texts);
    doc.get_mut(7).unwrap().append_page_break();

    let outcome = title_page::normalize(&mut doc, 7).unwrap();
    assert!(outcome.formatted);
    assert!(!outcome.break_inserted);
    assert_eq!(outcome.blanks_removed, 1);
    assert_eq!(doc.len(), 8);

    let bounds = body::relocate(&doc, &outcome);
    assert_eq!(bounds.body_start, 6);
    let summary = body::classify_body(&mut doc, bounds, &Config::default()).unwrap();
    assert!(summary.article_title);
    assert_eq!(doc.get(6).unwrap().text(), "Effects of Sleep on Memory");
    assert!(is_article_title(doc.get(6).unwrap()));
}

#[test]
fn article_title_follows_a_blank_line_after_the_break() {
    let mut doc = doc_of(&["Title", "Author", "Date", "", "Effects of Sleep on Memory", LONG_SENTENCE]);
    doc.get_mut(2).unwrap().append_page_break();

    let report = apa_format::format_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(report.page_breaks_inserted, 0);
    assert_eq!(report.blank_paragraphs_removed, 0);
    assert_eq!(doc.len(), 6);
    assert_eq!(report.body_start, 3);
    assert!(report.article_title);
    assert_eq!(report.body_paragraphs, 1);

    assert_eq!(doc.get(3).unwrap().line_spacing, None);
    assert!(is_article_title(doc.get(4).unwrap()));
    assert_eq!(doc.get(5).unwrap().first_line_indent, Some(36.0));
}

#[test]
fn drawing_between_title_page_and_body_survives() {
    let mut texts = TITLE_PAGE.to_vec();
    texts.extend(["", "", "", "Effects of Sleep on Memory", LONG_SENTENCE]);
    let mut doc = doc_of(&texts);
    doc.get_mut(7).unwrap().runs = drawing_runs();
    doc.get_mut(8).unwrap().append_page_break();

    let report = apa_format::format_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(report.blank_paragraphs_removed, 2);
    assert_eq!(report.page_breaks_inserted, 1);
    assert_eq!(doc.len(), 10);
    assert!(has_drawing(doc.get(6).unwrap()));
    assert!(doc.get(7).unwrap().has_hard_break());
    assert_eq!(report.body_start, 8);
    assert!(is_article_title(doc.get(8).unwrap()));
}

#[test]
fn section_break_closes_the_title_page() {
    let mut texts = TITLE_PAGE.to_vec();
    texts.extend(["", "Effects of Sleep on Memory", LONG_SENTENCE]);
    let mut doc = doc_of(&texts);
    let section = RawProperty::new("sectPr", "<w:sectPr><w:titlePg/></w:sectPr>");
    doc.get_mut(6).unwrap().properties.push(section.clone());

    let report = apa_format::format_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(report.page_breaks_inserted, 0);
    assert_eq!(report.blank_paragraphs_removed, 0);
    assert_eq!(doc.len(), 9);
    assert_eq!(doc.get(6).unwrap().properties, vec![section]);
    assert_eq!(report.body_start, 7);
    assert!(is_article_title(doc.get(7).unwrap()));
}

#[test]
fn heading_heuristic() {
    let config = Config::default();
    let method = Paragraph::with_text("Method");
    let sentence = Paragraph::with_text("We used a mixed design.");
    assert_eq!(body::classify(&method, false, &config), Role::Heading);
    assert_eq!(body::classify(&sentence, false, &config), Role::BodyText);

    let question = Paragraph::with_text("Why do we sleep?");
    assert_eq!(body::classify(&question, false, &config), Role::BodyText);
    let long = Paragraph::with_text(
        "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen",
    );
    assert_eq!(body::classify(&long, false, &config), Role::BodyText);
    assert_eq!(body::classify(&method, true, &config), Role::ArticleTitle);

    let no_title = Config { has_article_title: false, ..Config::default() };
    assert_eq!(body::classify(&method, true, &no_title), Role::Heading);
}

#[test]
fn body_paragraphs_are_styled_by_role() {
    let mut doc = doc_of(&manuscript());
    apa_format::format_document(&mut doc, &Config::default()).unwrap();

    let title = doc.get(7).unwrap();
    assert_eq!(title.alignment, Some(Alignment::Center));
    assert_eq!(title.first_line_indent, Some(0.0));
    assert!(title.runs.iter().all(|r| r.bold));

    let heading = doc.get(8).unwrap();
    assert_eq!(heading.text(), "Method");
    assert_eq!(heading.alignment, Some(Alignment::Left));
    assert!(heading.runs.iter().all(|r| r.bold));

    let text = doc.get(9).unwrap();
    assert_eq!(text.alignment, Some(Alignment::Left));
    assert_eq!(text.first_line_indent, Some(36.0));
    assert_eq!(text.left_indent, Some(0.0));
    assert!(text.runs.iter().all(|r| !r.bold));
}

#[test]
fn blank_body_paragraphs_are_not_styled() {
    let mut doc = doc_of(&["Introduction", "", LONG_SENTENCE]);
    apa_format::format_document(&mut doc, &no_title_page()).unwrap();
    assert_eq!(doc.get(1).unwrap().line_spacing, None);
    assert_eq!(doc.get(2).unwrap().line_spacing, Some(2.0));
}

#[test]
fn second_pass_changes_nothing() {
    let mut doc = doc_of(&manuscript());
    let first = apa_format::format_document(&mut doc, &Config::default()).unwrap();
    let after_first = texts(&doc);
    let styles: Vec<_> = doc
        .paragraphs()
        .iter()
        .map(|p| (p.alignment, p.first_line_indent, p.left_indent, p.runs.iter().any(|r| r.bold)))
        .collect();

    let second = apa_format::format_document(&mut doc, &Config::default()).unwrap();
    assert_eq!(texts(&doc), after_first);
    let styles_again: Vec<_> = doc
        .paragraphs()
        .iter()
        .map(|p| (p.alignment, p.first_line_indent, p.left_indent, p.runs.iter().any(|r| r.bold)))
        .collect();
    assert_eq!(styles_again, styles);
    assert_eq!(second.missing_in_references, first.missing_in_references);
    assert_eq!(second.missing_in_body, first.missing_in_body);
}

#[test]
fn reclassifying_the_body_converges() {
    let mut doc = doc_of(&["Introduction", LONG_SENTENCE, "Method", "Short line"]);
    let config = no_title_page();
    let bounds = Boundaries { body_start: 0, ref_start: doc.len() };
    let first = body::classify_body(&mut doc, bounds, &config).unwrap();
    let second = body::classify_body(&mut doc, bounds, &config).unwrap();
    assert_eq!(first, second);
    assert!(first.article_title);
    assert_eq!(first.headings, 2);
    assert_eq!(first.body_paragraphs, 1);
}

fn with_references(entries: &[&str]) -> Document {
    let mut texts = vec![LONG_SENTENCE, "Reference"];
    texts.extend_from_slice(entries);
    doc_of(&texts)
}

#[test]
fn references_are_sorted_and_rebuilt() {
    let mut doc = with_references(&["Zhang, Y. (2019). Z.", "", "adams, b. (2018). a.", "Brown, C. (2017). B.", "  "]);
    let entry = doc.get_mut(2).unwrap();
    entry.runs = vec![Run::text("Zhang, Y. (2019). "), Run { italic: true, ..Run::text("Z.") }];

    let config = Config { sort_references: true, ..no_title_page() };
    let report = apa_format::format_document(&mut doc, &config).unwrap();

    assert!(report.references_sorted);
    assert!(report.reference_formatting_lost);
    assert_eq!(report.reference_entries, 3);
    assert_eq!(
        texts(&doc)[1..],
        ["References", "Brown, C. (2017). B.", "Zhang, Y. (2019). Z.", "adams, b. (2018). a."]
    );
    let entries = &doc.paragraphs()[2..];
    assert!(entries.windows(2).all(|w| w[0].text() <= w[1].text()));
    for para in entries {
        assert_eq!(para.first_line_indent, Some(-36.0));
        assert_eq!(para.left_indent, Some(36.0));
        assert!(para.runs.iter().all(|r| !r.italic));
    }
}

#[test]
fn unsorted_references_keep_run_formatting() {
    let mut doc = with_references(&["Wang, L. (2020). Title.", "", "Kim, S. (2018). Another."]);
    doc.get_mut(2).unwrap().runs.push(Run { italic: true, ..Run::text(" Journal") });

    let report = apa_format::format_document(&mut doc, &no_title_page()).unwrap();
    assert!(!report.references_sorted);
    assert!(!report.reference_formatting_lost);
    assert_eq!(report.reference_entries, 2);
    assert_eq!(report.blank_paragraphs_removed, 1);

    let heading = doc.get(1).unwrap();
    assert_eq!(heading.text(), "References");
    assert_eq!(heading.alignment, Some(Alignment::Center));
    assert!(heading.runs.iter().all(|r| r.bold));

    let entries = &doc.paragraphs()[2..];
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|p| !p.is_blank()));
    for para in entries {
        assert_eq!(para.first_line_indent, Some(-36.0));
        assert_eq!(para.left_indent, Some(36.0));
        assert_eq!(para.line_spacing, Some(2.0));
    }
    assert!(entries[0].runs[1].italic);
}

#[test]
fn reference_cleanup_keeps_a_drawing() {
    let mut doc = with_references(&["Wang, L. (2020). Title.", "", ""]);
    doc.get_mut(3).unwrap().runs = drawing_runs();

    let report = apa_format::format_document(&mut doc, &no_title_page()).unwrap();
    assert_eq!(report.reference_entries, 1);
    assert_eq!(report.blank_paragraphs_removed, 1);
    assert_eq!(doc.len(), 4);
    assert!(has_drawing(doc.get(3).unwrap()));
}

#[test]
fn sorted_rebuild_keeps_a_drawing() {
    let mut doc = with_references(&["Zhang, Y. (2019). Z.", "", "Brown, C. (2017). B.", ""]);
    doc.get_mut(3).unwrap().runs = drawing_runs();

    let config = Config { sort_references: true, ..no_title_page() };
    let report = apa_format::format_document(&mut doc, &config).unwrap();
    assert_eq!(report.reference_entries, 2);
    assert!(!report.reference_formatting_lost);
    assert_eq!(
        texts(&doc)[1..],
        ["References", "Brown, C. (2017). B.", "Zhang, Y. (2019). Z.", ""]
    );
    assert!(has_drawing(doc.get(4).unwrap()));
}

#[test]
fn page_break_precedes_reference_list() {
    let mut doc = with_references(&["Wang, L. (2020). Title."]);
    let report = apa_format::format_document(&mut doc, &no_title_page()).unwrap();
    assert_eq!(report.page_breaks_inserted, 1);
    assert!(doc.get(0).unwrap().has_hard_break());
    assert_eq!(doc.len(), 3);

    let report = apa_format::format_document(&mut doc, &no_title_page()).unwrap();
    assert_eq!(report.page_breaks_inserted, 0);
}

#[test]
fn no_reference_section_skips_reference_work() {
    let mut doc = doc_of(&["Introduction", LONG_SENTENCE]);
    let report = apa_format::format_document(&mut doc, &no_title_page()).unwrap();
    assert!(!report.reference_section_found);
    assert_eq!(report.ref_start, 2);
    assert_eq!(report.missing_in_references, [CitationKey::new("wang", "2020")].into());
    assert!(report.missing_in_body.is_empty());
}

#[test]
fn matching_citation_and_entry_cancel_out() {
    let doc = doc_of(&[
        "Sleep matters (Wang, 2020).",
        "Results are summarised below (see Table 1).",
        "References",
        "Wang, L. (2020). Title. Journal.",
        "Anonymous source, retrieved online",
    ]);
    let check = citations::match_citations(&doc);
    assert_eq!(check.body_keys, [CitationKey::new("wang", "2020")].into());
    assert_eq!(check.reference_keys, [CitationKey::new("wang", "2020")].into());
    assert!(check.missing_in_references.is_empty());
    assert!(check.missing_in_body.is_empty());
}

#[test]
fn cross_reference_is_a_two_way_difference() {
    let doc = doc_of(&[
        "Earlier work (Wang, 2020; Lee & Park, 2019) and Chen et al. (2018) disagree.",
        "References",
        "Chen, X., Li, Y., & Zhao, Q. (2018). Title.",
        "",
        "Kim, S. (2017). Never cited.",
        "Wang, L. (2020). Title.",
    ]);
    let check = citations::match_citations(&doc);
    assert_eq!(check.missing_in_references, [CitationKey::new("lee", "2019")].into());
    assert_eq!(check.missing_in_body, [CitationKey::new("kim", "2017")].into());

    let expected: std::collections::BTreeSet<_> =
        check.body_keys.difference(&check.reference_keys).cloned().collect();
    assert_eq!(check.missing_in_references, expected);
}

#[test]
fn citation_check_can_be_disabled() {
    let mut doc = doc_of(&["Claim (Wang, 2020).", "References"]);
    let config = Config { check_citations: false, ..no_title_page() };
    let report = apa_format::format_document(&mut doc, &config).unwrap();
    assert!(!report.citations_checked);
    assert!(report.missing_in_references.is_empty());
}

#[test]
fn report_serialises_missing_keys() {
    let mut doc = doc_of(&["Claim (Lee, 2019).", "References", "Wang, L. (2020). Title."]);
    let report = apa_format::format_document(&mut doc, &no_title_page()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["missing_in_references"][0]["author"], "lee");
    assert_eq!(json["missing_in_body"][0]["year"], "2020");

    let text = report.to_string();
    assert!(text.contains("lee, 2019"));
    assert!(text.contains("wang, 2020"));
}
