//! Shared helpers for extraction benchmarks.

#![allow(dead_code)]

use std::env;
use std::time::Duration;

use criterion::measurement::WallTime;
use criterion::{BenchmarkGroup, Criterion, Throughput};

use pdfannots_core::geometry::BBox;
use pdfannots_core::layout::{LTItem, LTPage, LTTextBox, LTTextLine};
use pdfannots_core::pdftypes::{PDFObjRef, PDFObject};
use pdfannots_core::source::{MemoryDocument, RawPage};

pub const PAGE_BBOX: (f64, f64, f64, f64) = (0.0, 0.0, 612.0, 792.0);
const CHAR_W: f64 = 4.5;
const LINE_H: f64 = 9.0;
const LEADING: f64 = 11.0;
const LINES_PER_COLUMN: usize = 60;
const CHARS_PER_LINE: usize = 55;
const WORDS: [&str; 8] = ["the", "cache", "latency", "of", "branch", "prediction", "is", "low"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchTier {
    Quick,
    Full,
}

pub fn bench_tier() -> BenchTier {
    match env::var("PDFANNOTS_BENCH_TIER").as_deref() {
        Ok("full") => BenchTier::Full,
        _ => BenchTier::Quick,
    }
}

#[derive(Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    pub fn gen_range(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

pub fn bench_criterion() -> Criterion {
    Criterion::default().configure_from_args()
}

pub fn configure_group(group: &mut BenchmarkGroup<'_, WallTime>, tier: BenchTier) {
    match tier {
        BenchTier::Quick => {
            group.sample_size(10);
            group.measurement_time(Duration::from_secs(2));
        }
        BenchTier::Full => {
            group.sample_size(50);
            group.measurement_time(Duration::from_secs(10));
        }
    }
}

pub fn pages_throughput(pages: usize) -> Throughput {
    Throughput::Elements(pages as u64)
}

fn column_lines(rng: &mut XorShift64) -> Vec<String> {
    (0..LINES_PER_COLUMN)
        .map(|_| {
            let mut line = String::new();
            while line.len() < CHARS_PER_LINE {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(WORDS[rng.gen_range(WORDS.len())]);
            }
            line.truncate(CHARS_PER_LINE);
            line
        })
        .collect()
}

fn line_y(i: usize) -> f64 {
    760.0 - LEADING * (i + 1) as f64
}

fn text_box(x0: f64, lines: &[String]) -> LTItem {
    let lines = lines
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let y = line_y(i);
            let mut items: Vec<LTItem> = text
                .chars()
                .enumerate()
                .map(|(j, c)| {
                    let x = x0 + j as f64 * CHAR_W;
                    if c == ' ' {
                        LTItem::anno(" ")
                    } else {
                        LTItem::char((x, y, x + CHAR_W, y + LINE_H), &c.to_string())
                    }
                })
                .collect();
            items.push(LTItem::anno("\n"));
            LTTextLine::from_items(items)
        })
        .collect();
    LTTextBox::from_lines(lines).into()
}

fn markup(rng: &mut XorShift64, x0: f64) -> PDFObject {
    let subtype = if rng.gen_range(4) == 0 { "StrikeOut" } else { "Highlight" };
    let line = rng.gen_range(LINES_PER_COLUMN - 2);
    let span = 1 + rng.gen_range(2);
    let mut quads = Vec::new();
    for l in line..line + span {
        let (y0, y1) = (line_y(l), line_y(l) + LINE_H);
        let start = x0 + rng.gen_range(CHARS_PER_LINE / 2) as f64 * CHAR_W;
        let end = start + (5 + rng.gen_range(20)) as f64 * CHAR_W;
        quads.extend([start, y1, end, y1, start, y0, end, y0].map(PDFObject::Real));
    }
    PDFObject::Dict(
        [
            ("Subtype".to_string(), PDFObject::Name(subtype.to_string())),
            ("QuadPoints".to_string(), PDFObject::Array(quads)),
        ]
        .into_iter()
        .collect(),
    )
}

/// A two-column document with `annots_per_page` random markups per page.
pub fn synthetic_document(seed: u64, pages: usize, annots_per_page: usize) -> MemoryDocument {
    let mut rng = XorShift64::new(seed);
    let mut doc = MemoryDocument::new();
    let mut next_objid = 1;

    for pageno in 0..pages {
        let columns = [36.0, 320.0];
        let mut layout = LTPage::new(pageno as i32 + 1, PAGE_BBOX);
        for &x0 in &columns {
            layout.add(text_box(x0, &column_lines(&mut rng)));
        }

        let mut annots = Vec::with_capacity(annots_per_page);
        for _ in 0..annots_per_page {
            let x0 = columns[rng.gen_range(columns.len())];
            annots.push(PDFObject::Ref(doc.add_object(next_objid, markup(&mut rng, x0))));
            next_objid += 1;
        }

        let (x0, y0, x1, y1) = PAGE_BBOX;
        let raw = RawPage {
            pageid: PDFObjRef::new(100_000 + pageno as u32, 0),
            mediabox: BBox::new(x0, y0, x1, y1).expect("valid page box"),
            annots,
        };
        doc.push_page(raw, layout);
    }
    doc
}
