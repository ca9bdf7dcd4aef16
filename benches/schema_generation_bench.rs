// SPDX-License-Identifier: MIT OR Apache-2.0
//! Benchmarks for realistic and aggressive case generation at varying
//! schema complexity.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mcpf_core::{JsonSchema, PrimitiveType, SchemaType};
use mcpf_schema::{aggressive, realistic, CaseRng};

/// Build an object schema with `n` required string/integer properties.
fn make_schema(n: usize) -> JsonSchema {
    let mut properties = std::collections::BTreeMap::new();
    let mut required = Vec::new();
    for i in 0..n {
        let name = format!("field{i}");
        let prop = if i % 2 == 0 {
            JsonSchema::of_type(PrimitiveType::String)
        } else {
            JsonSchema::of_type(PrimitiveType::Integer)
        };
        properties.insert(name.clone(), prop);
        required.push(name);
    }
    JsonSchema { schema_type: Some(SchemaType::Single(PrimitiveType::Object)), properties, required, ..JsonSchema::default() }
}

fn bench_realistic(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_realistic");

    for property_count in [1, 10, 50] {
        let schema = make_schema(property_count);
        group.bench_with_input(BenchmarkId::new("properties", property_count), &schema, |b, s| {
            let mut rng = CaseRng::from_seed(7);
            b.iter(|| realistic(black_box(s), &mut rng).unwrap());
        });
    }

    group.finish();
}

fn bench_aggressive(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_aggressive");

    for property_count in [1, 10, 50] {
        let schema = make_schema(property_count);
        group.bench_with_input(BenchmarkId::new("properties", property_count), &schema, |b, s| {
            let mut rng = CaseRng::from_seed(7);
            b.iter(|| aggressive(black_box(s), &mut rng).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_realistic, bench_aggressive);
criterion_main!(benches);
