// SPDX-License-Identifier: MIT OR Apache-2.0
//! Benchmarks for NDJSON envelope encode/decode and batch-response
//! correlation at varying batch size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mcpf_core::{JsonRpcRequest, JsonRpcResponse, RequestId};
use mcpf_protocol::batch::correlate_lenient;
use mcpf_protocol::codec::{decode_all, encode_line, encode_requests};

fn make_requests(n: usize) -> Vec<JsonRpcRequest> {
    (0..n)
        .map(|i| JsonRpcRequest::call(RequestId::Number(i as i64), "tools/call", Some(serde_json::json!({"i": i}))))
        .collect()
}

fn make_responses(n: usize) -> Vec<JsonRpcResponse> {
    (0..n)
        .map(|i| JsonRpcResponse::success(RequestId::Number(i as i64), serde_json::json!({"ok": true})))
        .collect()
}

fn bench_encode_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_encode_line");

    for batch_size in [1, 10, 100] {
        let requests = make_requests(batch_size);
        group.bench_with_input(BenchmarkId::new("requests", batch_size), &requests, |b, reqs| {
            b.iter(|| {
                for req in reqs {
                    black_box(encode_line(req).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_decode_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_decode_all");

    for batch_size in [1, 10, 100] {
        let requests = make_requests(batch_size);
        let blob = encode_requests(&requests).unwrap();
        group.bench_with_input(BenchmarkId::new("requests", batch_size), &blob, |b, blob| {
            b.iter(|| decode_all::<JsonRpcRequest>(black_box(blob)));
        });
    }

    group.finish();
}

fn bench_correlate_lenient(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_correlate_lenient");

    for batch_size in [1, 10, 100] {
        let requests = make_requests(batch_size);
        let responses = make_responses(batch_size);
        group.bench_with_input(BenchmarkId::new("requests", batch_size), &(requests, responses), |b, (reqs, resps)| {
            b.iter(|| correlate_lenient(black_box(reqs), black_box(resps)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_line, bench_decode_all, bench_correlate_lenient);
criterion_main!(benches);
