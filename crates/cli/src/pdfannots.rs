//! pdfannots - list the annotations of analysed PDF documents
//!
//! Reads layout dumps (JSON-serialized [`MemoryDocument`]s produced by a
//! layout analyzer), extracts their annotations in reading order together
//! with the text they cover, and prints them as JSON.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing_subscriber::EnvFilter;

use pdfannots_core::params::DEFAULT_CONTEXT_CHARS;
use pdfannots_core::{Document, ExtractParams, MemoryDocument, Page, PdfSource, process_document_with_progress};

/// Extracts annotations from analysed PDF layouts.
#[derive(Parser, Debug)]
#[command(name = "pdfannots")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more layout dumps (JSON)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Show debug messages
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Show progress on stderr
    #[arg(short = 'p', long, action = ArgAction::SetTrue)]
    progress: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Key the output by file name, even for a single input
    #[arg(long = "print-filename", action = ArgAction::SetTrue)]
    print_filename: bool,

    /// Number of columns per page; reading order is inferred if omitted
    #[arg(short = 'n', long = "cols", value_parser = clap::value_parser!(u32).range(1..))]
    cols: Option<u32>,

    /// Keep hyphens at the end of lines
    #[arg(long = "keep-hyphens", action = ArgAction::SetTrue)]
    keep_hyphens: bool,

    /// Number pages by index instead of by their labels
    #[arg(long = "no-page-labels", action = ArgAction::SetTrue)]
    no_page_labels: bool,

    /// Added to every printed page number (labels are unaffected)
    #[arg(long = "page-number-offset", default_value_t = 0, allow_negative_numbers = true)]
    page_number_offset: i64,

    /// Characters of context captured around deletions and insertions
    #[arg(long = "context-chars", default_value_t = DEFAULT_CONTEXT_CHARS)]
    context_chars: usize,
}

impl Args {
    fn extract_params(&self) -> ExtractParams {
        ExtractParams {
            columns_per_page: self.cols,
            context_chars: self.context_chars,
            use_page_labels: !self.no_page_labels,
        }
    }

    fn record_format(&self) -> RecordFormat {
        RecordFormat {
            remove_hyphens: !self.keep_hyphens,
            page_number_offset: self.page_number_offset,
        }
    }
}

/// How annotations are rendered into records.
#[derive(Debug, Clone, Copy, Default)]
struct RecordFormat {
    remove_hyphens: bool,
    page_number_offset: i64,
}

/// One annotation as printed, with its replies and group members nested inside.
#[derive(Debug, serde::Serialize)]
struct AnnotationRecord {
    #[serde(rename = "type")]
    kind: &'static str,
    page: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_label: Option<String>,
    start_xy: (f64, f64),
    #[serde(skip_serializing_if = "Option::is_none")]
    prior_outline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pre_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_context: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    replies: Vec<AnnotationRecord>,
    /// Members of this annotation's group, such as the deletion half of a
    /// replacement.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    group_children: Vec<AnnotationRecord>,
}

impl AnnotationRecord {
    fn new(doc: &Document, page: &Page, idx: usize, format: RecordFormat) -> Option<Self> {
        let a = page.annot(idx)?;
        let remove_hyphens = format.remove_hyphens;
        let nested = |indices: &[usize]| -> Vec<Self> {
            indices
                .iter()
                .filter_map(|&i| Self::new(doc, page, i, format))
                .collect()
        };
        let (pre_context, post_context) = if a.has_context() {
            let (pre, post) = a.get_context(remove_hyphens);
            (Some(pre), Some(post))
        } else {
            (None, None)
        };
        Some(Self {
            kind: a.subtype.name(),
            page: i64::try_from(page.pageno)
                .unwrap_or(i64::MAX)
                .saturating_add(1)
                .saturating_add(format.page_number_offset),
            page_label: page.label.clone(),
            start_xy: (a.pos.x, a.pos.y),
            prior_outline: doc.nearest_outline(&a.pos).map(|o| o.title.clone()),
            text: a.gettext(remove_hyphens),
            contents: a.contents.clone().filter(|c| !c.is_empty()),
            author: a.author.clone(),
            created: a.created.map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            color: a.color.map(|c| c.as_hexcolor()),
            name: a.name.clone(),
            pre_context,
            post_context,
            replies: nested(a.replies()),
            group_children: nested(a.group_children()),
        })
    }
}

fn records(doc: &Document, format: RecordFormat) -> Vec<AnnotationRecord> {
    doc.iter_annots_with_page(false)
        .filter_map(|(page, idx, _)| AnnotationRecord::new(doc, page, idx, format))
        .collect()
}

/// Per-file results, printed as an object keyed by file name in input order.
struct ByFile(Vec<(String, Vec<AnnotationRecord>)>);

impl Serialize for ByFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, records) in &self.0 {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load(path: &Path) -> Result<MemoryDocument> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("{} is not a valid layout dump", path.display()))
}

fn process_file(path: &Path, args: &Args) -> Result<Vec<AnnotationRecord>> {
    let src = load(path)?;
    let total = src.page_count();
    let doc = process_document_with_progress(&src, &args.extract_params(), |pageno| {
        if args.progress {
            eprint!("\r{}: page {pageno} of {total}", path.display());
        }
    })
    .with_context(|| format!("failed to extract annotations from {}", path.display()))?;
    if args.progress {
        eprintln!();
    }
    Ok(records(&doc, args.record_format()))
}

fn run(args: &Args) -> Result<()> {
    let mut results = Vec::with_capacity(args.files.len());
    for path in &args.files {
        results.push((path.display().to_string(), process_file(path, args)?));
    }

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    if results.len() == 1 && !args.print_filename {
        let (_, records) = results.remove(0);
        serde_json::to_writer_pretty(&mut output, &records)?;
    } else {
        serde_json::to_writer_pretty(&mut output, &ByFile(results))?;
    }
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    run(&args)
}
