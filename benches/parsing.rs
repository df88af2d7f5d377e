//! Benchmarks for tagged-article parsing.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use inkstream::document::Document;

fn article(sections: usize) -> String {
    let mut out = String::from("[封面锚点: skyline at dusk]\n");
    for i in 0..sections {
        out.push_str(&format!("[TITLE: Section {i}]\n"));
        out.push_str("Body text with **bold** fragments and a # marker.\n\n");
        out.push_str("[LIST: first point]\n[LIST: second point]\n[LIST: third point]\n");
        out.push_str(&format!("[QUOTE: pull quote {i}]\n"));
        out.push_str("[TABLE: Asset|Edge|Risk\\nAlpha|fast|high\\nBeta|steady|low]\n");
        out.push_str(&format!("[IMAGE: {}]\n", (i % 3) + 1));
    }
    out.push_str("[视觉锚点1: rooftop]\n[视觉锚点2: harbor]\n[视觉锚点3: skyline]\n");
    out
}

fn bench_parse_short(c: &mut Criterion) {
    let source = article(2);
    c.bench_function("parse_short", |b| {
        b.iter(|| Document::parse(black_box(&source)));
    });
}

fn bench_parse_long(c: &mut Criterion) {
    let source = article(40);
    c.bench_function("parse_long", |b| {
        b.iter(|| Document::parse(black_box(&source)));
    });
}

fn bench_streamed_reparse(c: &mut Criterion) {
    // The engine re-parses the whole buffer per chunk; measure that
    // quadratic pattern over a realistic chunk size.
    let source = article(10);
    c.bench_function("streamed_reparse", |b| {
        b.iter(|| {
            let mut buffer = String::new();
            let chars: Vec<char> = source.chars().collect();
            for chunk in chars.chunks(64) {
                buffer.extend(chunk.iter());
                black_box(Document::parse(&buffer));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_parse_short,
    bench_parse_long,
    bench_streamed_reparse
);
criterion_main!(benches);
