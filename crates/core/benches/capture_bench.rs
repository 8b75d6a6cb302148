mod common;

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use pdfannots_core::{ExtractParams, process_document};

use common::{BenchTier, bench_criterion, bench_tier, configure_group, pages_throughput, synthetic_document};

const SEED: u64 = 0x5eed_a11c;

fn bench_process_document(c: &mut Criterion) {
    let tier = bench_tier();
    let sizes: &[(usize, usize)] = if tier == BenchTier::Quick {
        &[(4, 8), (4, 64)]
    } else {
        &[(4, 8), (4, 64), (32, 16), (32, 128)]
    };

    let mut group = c.benchmark_group("process_document");
    configure_group(&mut group, tier);

    for &(pages, annots) in sizes {
        let doc = synthetic_document(SEED ^ (pages * annots) as u64, pages, annots);
        let id = format!("{pages}p_{annots}a");
        group.throughput(pages_throughput(pages));

        group.bench_with_input(BenchmarkId::new("inferred", &id), &doc, |b, doc| {
            let params = ExtractParams::default();
            b.iter(|| {
                let out = process_document(doc, &params).expect("extraction succeeds");
                black_box(out.pages.len());
            })
        });

        group.bench_with_input(BenchmarkId::new("two_columns", &id), &doc, |b, doc| {
            let params = ExtractParams::with_columns(2).expect("valid column count");
            b.iter(|| {
                let out = process_document(doc, &params).expect("extraction succeeds");
                black_box(out.pages.len());
            })
        });
    }

    group.finish();
}

fn bench_context_window(c: &mut Criterion) {
    let tier = bench_tier();
    let doc = synthetic_document(SEED, 4, 64);

    let mut group = c.benchmark_group("context_window");
    configure_group(&mut group, tier);
    group.throughput(pages_throughput(doc.pages.len()));

    for context_chars in [0, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(context_chars), &context_chars, |b, &k| {
            let params = ExtractParams {
                context_chars: k,
                ..ExtractParams::default()
            };
            b.iter(|| {
                let out = process_document(&doc, &params).expect("extraction succeeds");
                black_box(out.pages.len());
            })
        });
    }

    group.finish();
}

criterion_group!(
    name = capture_benches;
    config = bench_criterion();
    targets = bench_process_document, bench_context_window
);
criterion_main!(capture_benches);
