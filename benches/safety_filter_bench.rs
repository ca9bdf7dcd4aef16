// SPDX-License-Identifier: MIT OR Apache-2.0
//! Benchmarks for safety-filter dispatch checks at varying deny-list and
//! network-policy size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mcpf_safety::{MethodDenyList, NetworkPolicy, SafetyFilter};

fn make_filter(n: usize) -> SafetyFilter {
    let methods: Vec<String> = (0..n).map(|i| format!("denied/method{i}")).collect();
    let deny: Vec<String> = (0..n).map(|i| format!("blocked{i}.example.com")).collect();
    let policy = NetworkPolicy { deny, ..NetworkPolicy::default() };
    SafetyFilter::new(MethodDenyList::new(methods), policy)
}

fn bench_clean_args(c: &mut Criterion) {
    let mut group = c.benchmark_group("safety_filter_clean");
    let args = serde_json::json!({ "path": "/tmp/scratch", "count": 3 });

    for rule_count in [1, 10, 100] {
        let filter = make_filter(rule_count);
        group.bench_with_input(BenchmarkId::new("rules", rule_count), &filter, |b, f| {
            b.iter(|| f.check(black_box("tools/call"), black_box(&args)));
        });
    }

    group.finish();
}

fn bench_danger_pattern(c: &mut Criterion) {
    let mut group = c.benchmark_group("safety_filter_danger_pattern");
    let args = serde_json::json!({ "command": "rm -rf / --no-preserve-root" });

    for rule_count in [1, 10, 100] {
        let filter = make_filter(rule_count);
        group.bench_with_input(BenchmarkId::new("rules", rule_count), &filter, |b, f| {
            b.iter(|| f.check(black_box("tools/call"), black_box(&args)));
        });
    }

    group.finish();
}

fn bench_denied_network_destination(c: &mut Criterion) {
    let mut group = c.benchmark_group("safety_filter_network_deny");
    let args = serde_json::json!({ "url": "http://blocked0.example.com/x" });

    for rule_count in [1, 10, 100] {
        let filter = make_filter(rule_count);
        group.bench_with_input(BenchmarkId::new("rules", rule_count), &filter, |b, f| {
            b.iter(|| f.check(black_box("tools/call"), black_box(&args)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clean_args, bench_danger_pattern, bench_denied_network_destination);
criterion_main!(benches);
