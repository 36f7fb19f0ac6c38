//! Benchmarks for locator parsing and building.
//!
//! Covers the hot paths of the addressing layer:
//! - Parse operations: plain, query-heavy, and deep-path locator strings
//! - Build operations: composing synthetic locators the way providers do
//! - Query lookups: typed and flag argument access on a parsed locator

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glint_locator::prelude::{Locator, LocatorBuilder};
use std::hint::black_box;

fn benchmark_locator_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator_parse");
    let inputs = [
        ("plain", "txt:///TestText"),
        (
            "query_heavy",
            "shape:///unit_cube?position=true&normal=true&uv=true&index=true&divisions=8",
        ),
        ("deep_path", "glsl:///shaders/common/include/lighting/phong"),
    ];
    for (label, input) in inputs.iter() {
        group.bench_with_input(BenchmarkId::new("parse", label), input, |b, input| {
            b.iter(|| black_box(Locator::parse(black_box(input)).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_locator_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator_build");
    group.bench_function("build_sub_image", |b| {
        b.iter(|| {
            let loc = LocatorBuilder::new("eagitexi")
                .path_segment("checker")
                .arg("level", black_box(3))
                .arg("width", black_box(64))
                .arg("height", black_box(64))
                .build()
                .unwrap();
            black_box(loc)
        });
    });
    group.finish();
}

fn benchmark_query_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator_query_lookup");
    let loc = Locator::parse(
        "shape:///unit_cube?position=true&normal=true&uv=true&index=true&divisions=8",
    )
    .unwrap();
    group.bench_function("arg_value_as", |b| {
        b.iter(|| black_box(loc.query().arg_value_as::<u32>(black_box("divisions"))));
    });
    group.bench_function("arg_flag", |b| {
        b.iter(|| black_box(loc.query().arg_flag(black_box("normal"))));
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_locator_parse,
    benchmark_locator_build,
    benchmark_query_lookup
);
criterion_main!(benches);
