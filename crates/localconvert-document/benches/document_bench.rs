// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the localconvert-document crate: image-to-PDF
// composition, page-level merging, and preview rendering on synthetic input.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use localconvert_core::{PageReference, PaperSize, SourceId};
use localconvert_document::{LoadedPdf, PdfDocumentLoader, PdfMergeEngine, PdfPageCompositor, PdfPageRenderer};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn synthetic_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 96]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode synthetic PNG");
    bytes
}

/// Load `count` single-page PDFs, each wrapping a small image.
fn loaded_sources(count: usize) -> HashMap<SourceId, Arc<LoadedPdf>> {
    let compositor = PdfPageCompositor::new(PaperSize::Letter);
    let loader = PdfDocumentLoader::new();
    (0..count)
        .map(|i| {
            let pdf = compositor
                .image_to_single_page_pdf(&synthetic_png(64, 48), "image/png")
                .expect("compose");
            let loaded = loader.load(&format!("source-{i}.pdf"), pdf).expect("load");
            (loaded.id(), Arc::new(loaded))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Wrap a 640x480 PNG in a Letter page.
fn bench_compose(c: &mut Criterion) {
    let compositor = PdfPageCompositor::default();
    let png = synthetic_png(640, 480);
    c.bench_function("image_to_single_page_pdf (640x480)", |b| {
        b.iter(|| {
            let pdf = compositor
                .image_to_single_page_pdf(black_box(&png), "image/png")
                .expect("compose");
            black_box(pdf);
        });
    });
}

/// Merge eight single-page sources in reverse order.
fn bench_merge(c: &mut Criterion) {
    let sources = loaded_sources(8);
    let mut refs: Vec<PageReference> = sources.keys().map(|id| PageReference::new(*id, 0)).collect();
    refs.sort_by(|a, b| b.source.cmp(&a.source));
    let engine = PdfMergeEngine::new();

    c.bench_function("merge (8 pages)", |b| {
        b.iter(|| {
            let merged = engine
                .merge(black_box(&refs), |id| sources.get(&id).cloned())
                .expect("merge");
            black_box(merged);
        });
    });
}

/// Render a thumbnail of a composed page with the built-in rasterizer.
fn bench_render(c: &mut Criterion) {
    let sources = loaded_sources(1);
    let doc = sources.values().next().expect("one source");
    let renderer = PdfPageRenderer::default();
    c.bench_function("render_page (Letter @ 0.5)", |b| {
        b.iter(|| black_box(renderer.render_page(doc, 0).expect("render")));
    });
}

criterion_group!(benches, bench_compose, bench_merge, bench_render);
criterion_main!(benches);
