//! Benchmarks for framecut-core detection stages
//!
//! Run with: cargo bench -p framecut-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framecut_core::config::DetectionConfig;
use framecut_core::frames::detect_regions;
use framecut_core::perforation::analyze_perforations;
use framecut_core::pipeline::{detect_frames, CalibrationSource};
use framecut_core::synthetic::film_strip;
use framecut_core::DecodedImage;
use image::DynamicImage;

/// Benchmark perforation analysis on strips of growing length
fn bench_perforations(c: &mut Criterion) {
    let mut group = c.benchmark_group("perforations");
    let params = DetectionConfig::default().perforation;

    for frames in [1usize, 3, 6].iter() {
        let (gray, _) = film_strip(*frames, frames * 2);
        group.throughput(Throughput::Elements(gray.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("analyze", format!("{}x{}", gray.width(), gray.height())),
            &gray,
            |b, gray| {
                b.iter(|| analyze_perforations(black_box(gray), black_box(&params)));
            },
        );
    }

    group.finish();
}

/// Benchmark the frame region detector
fn bench_regions(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_regions");
    let params = DetectionConfig::default().frames;

    for frames in [1usize, 3, 6].iter() {
        let (gray, _) = film_strip(*frames, frames * 2);
        group.throughput(Throughput::Elements(gray.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("detect", format!("{}x{}", gray.width(), gray.height())),
            &gray,
            |b, gray| {
                b.iter(|| detect_regions(black_box(gray), black_box(&params)));
            },
        );
    }

    group.finish();
}

/// Benchmark the full detection chain on one strip
fn bench_full_detection(c: &mut Criterion) {
    let (gray, _) = film_strip(4, 8);
    let decoded = match DecodedImage::new("bench", DynamicImage::ImageLuma8(gray)) {
        Ok(decoded) => decoded,
        Err(e) => panic!("synthetic strip rejected: {}", e),
    };
    let config = DetectionConfig::default();

    c.bench_function("detect_frames", |b| {
        b.iter(|| {
            detect_frames(
                black_box(&decoded),
                black_box(&config),
                &CalibrationSource::Detect,
            )
        })
    });
}

criterion_group!(
    benches,
    bench_perforations,
    bench_regions,
    bench_full_detection
);
criterion_main!(benches);
