//! Criterion benchmarks for the filter codec.
//!
//! Measures decoding from JSON text, decoding from an already parsed
//! `serde_json::Value`, and canonical encoding.
//!
//! Run:
//!   cargo bench
//!   cargo bench -- decode             # one group
//!   cargo bench --features simd       # simd-json text parsing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cql2_filter::{decoder, encoder, Decoder};
use serde_json::{json, Value};

// ── Documents ─────────────────────────────────────────────────────────────────

fn comparison() -> Value {
    json!({"op": "=", "args": [{"property": "city"}, "Pleasantville"]})
}

/// Search-page style filter touching every operator family.
fn realistic() -> Value {
    json!({
        "op": "and",
        "args": [
            {"op": "like", "args": [{"op": "casei", "args": [{"property": "name"}]}, "main%"]},
            {"op": "between", "args": [{"property": "floors"}, 2, 12]},
            {"op": "in", "args": [{"property": "zone"}, ["R1", "R2", "C1"]]},
            {"op": "a_overlaps", "args": [{"property": "tags"}, ["historic", "listed"]]},
            {
                "op": "s_intersects",
                "args": [
                    {"property": "geometry"},
                    {
                        "type": "Polygon",
                        "coordinates": [[[-105.3, 39.9], [-105.1, 39.9], [-105.1, 40.1], [-105.3, 39.9]]]
                    }
                ]
            },
            {
                "op": "t_during",
                "args": [
                    {"property": "built"},
                    {"interval": ["1900-01-01", "1950-12-31T23:59:59Z"]}
                ]
            },
            {"op": "not", "args": [{"op": "isNull", "args": [{"property": "owner"}]}]}
        ]
    })
}

/// `or` of `n` comparisons.
fn wide(n: usize) -> Value {
    let args: Vec<Value> = (0..n)
        .map(|i| json!({"op": "=", "args": [{"property": format!("field{i}")}, i]}))
        .collect();
    json!({"op": "or", "args": args})
}

/// `not` nested `n` levels deep.
fn deep(n: usize) -> Value {
    let mut doc = json!(true);
    for _ in 0..n {
        doc = json!({"op": "not", "args": [doc]});
    }
    doc
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let decoder = Decoder::default();

    for (name, doc) in [("comparison", comparison()), ("realistic", realistic())] {
        let text = doc.to_string();
        group.bench_function(BenchmarkId::new("text", name), |b| {
            b.iter(|| decoder.decode_str(black_box(&text)))
        });
        group.bench_function(BenchmarkId::new("value", name), |b| {
            b.iter(|| decoder.decode(black_box(&doc)))
        });
    }
    group.finish();
}

fn bench_decode_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_scaling");
    let decoder = Decoder::default();

    for n in [10_usize, 100, 1000] {
        let doc = wide(n);
        group.bench_with_input(BenchmarkId::new("wide_or", n), &doc, |b, doc| {
            b.iter(|| decoder.decode(black_box(doc)))
        });
    }
    for n in [8_usize, 64, 120] {
        let doc = deep(n);
        group.bench_with_input(BenchmarkId::new("nested_not", n), &doc, |b, doc| {
            b.iter(|| decoder.decode(black_box(doc)))
        });
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for (name, doc) in [("realistic", realistic()), ("wide_or_100", wide(100))] {
        let Ok(expr) = decoder::decode(&doc) else {
            panic!("benchmark document {} does not decode", name);
        };
        group.bench_function(BenchmarkId::new("string", name), |b| {
            b.iter(|| encoder::to_string(black_box(&expr)))
        });
        group.bench_function(BenchmarkId::new("value", name), |b| {
            b.iter(|| encoder::to_value(black_box(&expr)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_decode_scaling, bench_encode);
criterion_main!(benches);
