//! 라인 파서 벤치마크
//!
//! 호스트 레지스트리 크기와 라인 길이에 따른 파싱 처리량을 측정합니다.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use logharbor_core::types::HostRegistry;
use logharbor_ingest::{LineParser, RawLine};

/// 짧은 라인
const SHORT_LINE: &[u8] = b"./web01/var/log/app.log:2024-01-01 00:00:00 user login ok\n";

/// 긴 라인 (메시지에 콜론 다수 포함)
const LONG_LINE: &[u8] = b"./web01/var/log/nginx/access.log:203.0.113.45 - - [01/Jan/2024:00:00:00 +0000] \"POST /api/v1/users/create HTTP/1.1\" 201 512 \"-\" \"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36\" rt=0.245 uct=0.001 uht=0.244 urt=0.244\n";

/// 알 수 없는 호스트
const UNKNOWN_HOST_LINE: &[u8] = b"./cache99/var/log/redis.log:Background saving started\n";

fn registry(size: usize) -> HostRegistry {
    let mut hosts: Vec<String> = (0..size.saturating_sub(1))
        .map(|i| format!("node{i:03}.cluster.internal"))
        .collect();
    hosts.push("web01".to_owned());
    HostRegistry::new(hosts)
}

fn bench_parse_line(c: &mut Criterion) {
    let parser = LineParser::new(&registry(3)).unwrap();
    let short = RawLine::new(SHORT_LINE, 1);
    let long = RawLine::new(LONG_LINE, 1);
    let unknown = RawLine::new(UNKNOWN_HOST_LINE, 1);

    let mut group = c.benchmark_group("line_parser");

    group.throughput(Throughput::Elements(1));
    group.bench_function("short", |b| {
        b.iter(|| parser.parse(black_box(&short)).unwrap())
    });

    group.bench_function("long", |b| {
        b.iter(|| parser.parse(black_box(&long)).unwrap())
    });

    group.bench_function("unknown_host", |b| {
        b.iter(|| parser.parse(black_box(&unknown)).unwrap_err())
    });

    // 1000건 반복 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                parser.parse(black_box(&short)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_registry_size(c: &mut Criterion) {
    let line = RawLine::new(SHORT_LINE, 1);

    let mut group = c.benchmark_group("line_parser_registry");
    group.throughput(Throughput::Elements(1));

    for size in [1usize, 10, 100, 500] {
        let parser = LineParser::new(&registry(size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| parser.parse(black_box(&line)).unwrap())
        });
    }

    group.finish();
}

fn bench_build_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_parser_build");

    for size in [10usize, 100, 500] {
        let hosts = registry(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &hosts, |b, hosts| {
            b.iter(|| LineParser::new(black_box(hosts)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_line,
    bench_registry_size,
    bench_build_parser
);
criterion_main!(benches);
