//! Hot-path benchmarks for the redirector
//!
//! Run with: cargo bench --bench tracking

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use shoptrack::services::classify_user_agent;
use shoptrack::utils::generate_random_code;
use shoptrack::utils::ip::{is_geo_lookup_candidate, resolve_client_ip};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
];

fn bench_code_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_code");
    for len in [6usize, 7, 10] {
        group.bench_function(format!("generate_len_{}", len), |b| {
            b.iter(|| generate_random_code(black_box(len)))
        });
    }
    group.finish();
}

fn bench_user_agent(c: &mut Criterion) {
    let mut group = c.benchmark_group("user_agent");
    for (i, ua) in USER_AGENTS.iter().enumerate() {
        group.bench_function(format!("classify_{}", i), |b| {
            b.iter(|| classify_user_agent(black_box(ua)))
        });
    }
    group.finish();
}

fn bench_client_ip(c: &mut Criterion) {
    let trusted = vec!["10.0.0.0/8".to_string()];
    c.bench_function("resolve_client_ip_via_proxy", |b| {
        b.iter(|| {
            resolve_client_ip(
                black_box(Some("10.1.2.3:443")),
                black_box(Some("8.8.8.8".to_string())),
                &trusted,
            )
        })
    });
    c.bench_function("geo_lookup_candidate", |b| {
        b.iter(|| is_geo_lookup_candidate(black_box("192.168.1.20")))
    });
}

criterion_group!(
    benches,
    bench_code_generation,
    bench_user_agent,
    bench_client_ip
);
criterion_main!(benches);
