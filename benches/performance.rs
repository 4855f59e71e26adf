//! Performance benchmarks for hostsweep

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hostsweep::{
    HostRange, LivenessProbe, LivenessResult, PortProbe, PortResult, PortSpec, ScanConfig,
    ScanCoordinator,
};
use std::net::Ipv4Addr;
use tokio::runtime::Runtime;

/// Benchmark CIDR expansion
fn bench_host_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_enumeration");

    for cidr in ["192.168.1.0/24", "10.0.0.0/16", "10.0.0.0/12"] {
        group.bench_with_input(BenchmarkId::from_parameter(cidr), &cidr, |b, cidr| {
            b.iter(|| {
                let range = HostRange::parse(black_box(cidr)).unwrap();
                black_box(range.iter().count())
            })
        });
    }

    group.finish();
}

/// Benchmark port specification parsing
fn bench_port_spec(c: &mut Criterion) {
    let mut group = c.benchmark_group("port_spec");

    group.bench_function("common_ports", |b| {
        b.iter(|| PortSpec::parse(black_box("21,22,23,25,53,80,110,143,443,445,3306,3389,8080")))
    });

    group.bench_function("full_range", |b| {
        b.iter(|| PortSpec::parse(black_box("1-65535")))
    });

    group.bench_function("overlapping_ranges", |b| {
        b.iter(|| PortSpec::parse(black_box("1-1000,500-1500,1000-2000,22,80,443")))
    });

    group.finish();
}

struct AllUp;

#[async_trait]
impl LivenessProbe for AllUp {
    async fn probe(&self, target: Ipv4Addr) -> LivenessResult {
        LivenessResult::up(target, 0.1)
    }

    fn method_name(&self) -> &str {
        "all-up"
    }
}

struct EvenOpen;

#[async_trait]
impl PortProbe for EvenOpen {
    async fn probe(&self, target: Ipv4Addr, port: u16) -> PortResult {
        PortResult::new(target, port, port % 2 == 0)
    }
}

/// Benchmark coordinator overhead with probes that answer instantly
fn bench_coordinator(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("coordinator");
    group.sample_size(20);

    let spec = PortSpec::parse("1-100").unwrap();

    for concurrency in [1usize, 50, 500] {
        group.bench_with_input(
            BenchmarkId::new("slash_24_x_100_ports", concurrency),
            &concurrency,
            |b, &concurrency| {
                b.iter(|| {
                    rt.block_on(async {
                        let scanner = ScanCoordinator::new(
                            ScanConfig::new().with_max_concurrency(concurrency),
                        )
                        .unwrap()
                        .with_liveness_probe(AllUp)
                        .with_port_probe(EvenOpen);

                        let report = scanner.scan("10.0.0.0/24", Some(&spec)).await.unwrap();
                        black_box(report.open_port_count())
                    })
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_host_enumeration,
    bench_port_spec,
    bench_coordinator
);
criterion_main!(benches);
