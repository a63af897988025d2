//! folio - EPUB inspection and pagination tool

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use folio::{LayoutConfig, PaginationEngine, extract_quick_metadata, parse_document, reading_time_minutes, DEFAULT_WORDS_PER_MINUTE};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "EPUB inspection and pagination tool", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio book.epub                 Show document structure
    folio -q book.epub              Show title/author only (fast path)
    folio -p 1080x1920 book.epub    Paginate for a 1080x1920 viewport
    folio --json book.epub          Emit machine-readable output")]
struct Cli {
    /// Input EPUB file
    #[arg(value_name = "INPUT")]
    input: String,

    /// Quick metadata only (skips spine/chapter/image extraction)
    #[arg(short, long)]
    quick: bool,

    /// Paginate the document text for a WIDTHxHEIGHT viewport
    #[arg(short, long, value_name = "WIDTHxHEIGHT")]
    paginate: Option<String>,

    /// Font size used when paginating
    #[arg(long, default_value_t = 16.0)]
    font_size: f32,

    /// Emit JSON instead of human-readable output
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DocumentSummary {
    title: String,
    author: String,
    language: Option<String>,
    publisher: Option<String>,
    has_cover: bool,
    chapters: Vec<ChapterSummary>,
    toc_entries: usize,
    images: usize,
    pagination: Option<PaginationSummary>,
}

#[derive(Serialize)]
struct ChapterSummary {
    order: usize,
    title: String,
    words: usize,
}

#[derive(Serialize)]
struct PaginationSummary {
    pages: usize,
    words: usize,
    reading_time_minutes: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let bytes = std::fs::read(&cli.input).map_err(|e| e.to_string())?;

    if cli.quick {
        let (title, author) =
            extract_quick_metadata(&bytes).ok_or("unsupported or corrupted document")?;
        if cli.json {
            let value = serde_json::json!({ "title": title, "author": author });
            println!("{}", serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?);
        } else {
            println!("Title: {title}");
            println!("Author: {author}");
        }
        return Ok(());
    }

    let document = parse_document(&bytes).map_err(|e| e.to_string())?;

    let pagination = match &cli.paginate {
        Some(spec) => {
            let (width, height) = parse_viewport(spec)?;
            let config = LayoutConfig {
                font_size: cli.font_size,
                ..LayoutConfig::for_display(width, height)
            };
            let engine = PaginationEngine::new();
            let result = engine.paginate(&document.plain_text, &config);
            Some(PaginationSummary {
                pages: result.total_pages,
                words: result.total_words,
                reading_time_minutes: reading_time_minutes(
                    result.total_words,
                    DEFAULT_WORDS_PER_MINUTE,
                ),
            })
        }
        None => None,
    };

    let summary = DocumentSummary {
        title: document.metadata.title.clone(),
        author: document.metadata.author.clone(),
        language: document.metadata.language.clone(),
        publisher: document.metadata.publisher.clone(),
        has_cover: document.metadata.cover.is_some(),
        chapters: document
            .chapters
            .iter()
            .map(|c| ChapterSummary {
                order: c.order,
                title: c.title.clone(),
                words: c.content.split_whitespace().count(),
            })
            .collect(),
        toc_entries: document.toc.len(),
        images: document.images.len(),
        pagination,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?);
        return Ok(());
    }

    println!("File: {}", cli.input);
    println!("Title: {}", summary.title);
    println!("Author: {}", summary.author);
    if let Some(ref language) = summary.language {
        println!("Language: {language}");
    }
    if let Some(ref publisher) = summary.publisher {
        println!("Publisher: {publisher}");
    }
    println!("Cover: {}", if summary.has_cover { "yes" } else { "no" });
    println!("TOC entries: {}", summary.toc_entries);
    println!("Images: {}", summary.images);
    println!("Chapters: {}", summary.chapters.len());
    for chapter in &summary.chapters {
        println!("  {:>3}. {} ({} words)", chapter.order + 1, chapter.title, chapter.words);
    }
    if let Some(ref p) = summary.pagination {
        println!("Pages: {}", p.pages);
        println!("Words: {}", p.words);
        println!("Reading time: ~{} min", p.reading_time_minutes);
    }

    Ok(())
}

fn parse_viewport(spec: &str) -> Result<(f32, f32), String> {
    let (width, height) = spec
        .split_once('x')
        .ok_or_else(|| format!("invalid viewport '{spec}', expected WIDTHxHEIGHT"))?;
    let width: f32 = width.parse().map_err(|_| format!("invalid width '{width}'"))?;
    let height: f32 = height.parse().map_err(|_| format!("invalid height '{height}'"))?;
    Ok((width, height))
}
