use std::fmt::Write;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cdxcrab::cdx::binary;
use cdxcrab::{read_cdx, read_cdxml, DecodeOptions, Document};

/// A page of `n` unconnected zig-zag chains, ten atoms each.
fn chains_cdxml(n: u32) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" ?><CDXML><page id="1">"#);
    let mut id = 2;
    for chain in 0..n {
        let fragment = id;
        id += 1;
        write!(xml, r#"<fragment id="{fragment}">"#).unwrap();
        let first = id;
        for i in 0..10 {
            let x = 12.47 * f64::from(i);
            let y = 60.0 * f64::from(chain) + if i % 2 == 0 { 0.0 } else { 7.2 };
            write!(xml, r#"<n id="{id}" p="{x:.2} {y:.2}"/>"#).unwrap();
            id += 1;
        }
        for i in 0..9 {
            write!(xml, r#"<b id="{id}" B="{}" E="{}"/>"#, first + i, first + i + 1).unwrap();
            id += 1;
        }
        xml.push_str("</fragment>");
    }
    xml.push_str("</page></CDXML>");
    xml
}

fn bench_text(c: &mut Criterion) {
    let small = chains_cdxml(1);
    let large = chains_cdxml(200);
    let options = DecodeOptions::default();

    let mut group = c.benchmark_group("cdxml");
    group.bench_function("records_small", |b| {
        b.iter(|| black_box(read_cdxml(black_box(&small), &options).unwrap()))
    });
    group.bench_function("records_large", |b| {
        b.iter(|| black_box(read_cdxml(black_box(&large), &options).unwrap()))
    });
    group.bench_function("document_large", |b| {
        b.iter(|| black_box(Document::from_cdxml(black_box(&large), &options).unwrap()))
    });
    group.finish();
}

fn bench_binary(c: &mut Criterion) {
    let options = DecodeOptions::default();
    let small = binary::write(&read_cdxml(&chains_cdxml(1), &options).unwrap().root);
    let large = binary::write(&read_cdxml(&chains_cdxml(200), &options).unwrap().root);

    let mut group = c.benchmark_group("cdx");
    group.bench_function("records_small", |b| {
        b.iter(|| black_box(read_cdx(black_box(&small), &options).unwrap()))
    });
    group.bench_function("records_large", |b| {
        b.iter(|| black_box(read_cdx(black_box(&large), &options).unwrap()))
    });
    group.bench_function("document_large", |b| {
        b.iter(|| black_box(Document::from_cdx(black_box(&large), &options).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_text, bench_binary);
criterion_main!(benches);
