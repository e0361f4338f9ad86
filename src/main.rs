use clap::Parser;
use std::path::PathBuf;

use apa_format::{Config, Heuristics};

#[derive(Parser)]
#[command(name = "apa-format", version, about = "Format a DOCX manuscript in APA 7th edition style")]
struct Args {
    /// Input DOCX file
    input: PathBuf,
    /// Output DOCX file (defaults to <input>_apa.docx)
    output: Option<PathBuf>,
    /// The manuscript has no title page
    #[arg(long)]
    no_title_page: bool,
    /// Do not treat the first body paragraph as the article title
    #[arg(long)]
    no_article_title: bool,
    /// Sort reference entries alphabetically (removes italics inside entries)
    #[arg(long)]
    sort_references: bool,
    /// Skip the citation cross-check
    #[arg(long)]
    no_citation_check: bool,
    /// Non-blank lines expected on the title page
    #[arg(long, default_value_t = 6)]
    title_lines: usize,
    /// Paragraphs searched for the end of the title page
    #[arg(long, default_value_t = 50)]
    search_window: usize,
    /// Paragraphs with fewer words than this may be headings
    #[arg(long, default_value_t = 15)]
    heading_max_words: usize,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("Error: file not found: {}", args.input.display());
        std::process::exit(1);
    }
    if !args.input.is_file() {
        eprintln!("Error: not a file: {}", args.input.display());
        std::process::exit(1);
    }

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "manuscript".to_string());
        args.input.with_file_name(format!("{stem}_apa.docx"))
    });

    let config = Config {
        has_title_page: !args.no_title_page,
        has_article_title: !args.no_article_title,
        sort_references: args.sort_references,
        check_citations: !args.no_citation_check,
        heuristics: Heuristics {
            title_page_lines: args.title_lines,
            safe_window: args.search_window,
            heading_max_words: args.heading_max_words,
            ..Heuristics::default()
        },
    };

    let report = match apa_format::format_docx(&args.input, &output, &config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print!("{report}");
        println!("Saved to {}", output.display());
    }
}
