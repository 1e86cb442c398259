//! Ranking and reasons benchmarks.
//!
//! Measures how reranking and reason generation scale with the candidate pool.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use uuid::Uuid;

use kindred::domain::models::{ConnectionType, Member, Profile};
use kindred::services::{generate_reasons, DiversityRanker, RankingStrategy, ScoredCandidate};

const CONNECTION_TYPES: [ConnectionType; 4] = [
    ConnectionType::Mentorship,
    ConnectionType::Collaboration,
    ConnectionType::Friendship,
    ConnectionType::Networking,
];

fn candidates(tenant: Uuid, count: usize) -> Vec<ScoredCandidate> {
    let orgs: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
    (0..count)
        .map(|i| {
            let member = Member::new(
                tenant,
                orgs[i % orgs.len()],
                format!("org{}.example", i % 5),
                format!("Member {i}"),
                format!("member{i}@example.com"),
            );
            let profile = Profile::new(
                member.id,
                format!("Interest {} with sourdough fermentation", i % 13),
                format!("Project {} cataloguing wild yeasts", i % 7),
                CONNECTION_TYPES[i % CONNECTION_TYPES.len()],
            );
            ScoredCandidate {
                member,
                profile: Some(profile),
                similarity: (i % 100) as f32 / 100.0,
            }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("diversity_rank");
    let tenant = Uuid::new_v4();
    let source = Member::new(tenant, Uuid::new_v4(), "source.example", "Source", "source@example.com");
    let source_profile = Profile::new(
        source.id,
        "Sourdough fermentation",
        "Wild yeast catalog",
        ConnectionType::Collaboration,
    );

    for &size in &[10usize, 100, 1000] {
        let pool = candidates(tenant, size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &pool, |b, pool| {
            b.iter(|| {
                DiversityRanker
                    .rank(&source, Some(&source_profile), black_box(pool.clone()), 0.3)
                    .map(|ranked| ranked.len())
            })
        });
    }

    group.finish();
}

fn bench_reasons(c: &mut Criterion) {
    let user = Uuid::new_v4();
    let source = Profile::new(
        user,
        "Sourdough fermentation and heritage grains",
        "Cataloguing wild yeasts from mountain villages",
        ConnectionType::Collaboration,
    )
    .with_rabbit_hole("Medieval bread ovens");
    let candidate = Profile::new(
        Uuid::new_v4(),
        "Heritage grains milling",
        "Wild yeasts sequencing project",
        ConnectionType::Collaboration,
    )
    .with_rabbit_hole("Bread ovens in monasteries");

    c.bench_function("generate_reasons", |b| {
        b.iter(|| generate_reasons(black_box(&source), Some(black_box(&candidate))))
    });
}

criterion_group!(benches, bench_rank, bench_reasons);
criterion_main!(benches);
