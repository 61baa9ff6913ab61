// Criterion benchmarks for Lehrmatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lehrmatch::core::{haversine_distance, postal_coordinates, ScoringEngine};
use lehrmatch::models::{
    CompanySize, InterestCategory, Posting, SkillLevel, TransportMode, UserProfile,
    WorkEnvironment,
};
use std::collections::HashMap;

const PROFESSIONS: [&str; 5] = [
    "Informatiker/in EFZ",
    "Kaufmann/-frau EFZ",
    "Koch/Köchin EFZ",
    "Landwirt/in EFZ",
    "Grafiker/in EFZ",
];

fn create_posting(id: usize) -> Posting {
    Posting {
        id: id as i64,
        title: PROFESSIONS[id % PROFESSIONS.len()].to_string(),
        profession: Some(PROFESSIONS[id % PROFESSIONS.len()].to_string()),
        description: Some("Spannende Lehrstelle mit Computer und Team".to_string()),
        requirements: None,
        location: "Zürich".to_string(),
        postal_code: Some(format!("{}", 8000 + (id % 999))),
        company_name: Some(format!("Firma {} AG", id)),
        source_url: format!("https://example.ch/{}", id),
        source_platform: "yousty".to_string(),
        is_active: true,
        created_at: None,
    }
}

fn create_profile() -> UserProfile {
    UserProfile {
        age: 16,
        location: "Zürich".to_string(),
        postal_code: "8001".to_string(),
        max_commute_minutes: 45,
        preferred_transport: TransportMode::Public,
        interests: HashMap::from([
            (InterestCategory::Technical, 5),
            (InterestCategory::Creative, 2),
            (InterestCategory::Social, 3),
            (InterestCategory::Business, 3),
        ]),
        technical_skills: HashMap::from([
            ("computer_skills".to_string(), SkillLevel::Expert),
            ("math_skills".to_string(), SkillLevel::Advanced),
        ]),
        soft_skills: HashMap::from([("communication".to_string(), 4)]),
        company_size_preference: CompanySize::Medium,
        work_environment: WorkEnvironment::Mixed,
        team_vs_individual: 4,
        career_goals: vec![],
        salary_importance: 3,
        growth_importance: 4,
        avoid_sectors: vec![],
        required_benefits: vec![],
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(47.3769),
                black_box(8.5417),
                black_box(46.9481),
                black_box(7.4474),
            )
        });
    });
}

fn bench_postal_coordinates(c: &mut Criterion) {
    c.bench_function("postal_coordinates", |b| {
        b.iter(|| postal_coordinates(black_box("8404")));
    });
}

fn bench_score_single(c: &mut Criterion) {
    let engine = ScoringEngine::with_default_weights();
    let profile = create_profile();
    let posting = create_posting(1);

    c.bench_function("score_single_posting", |b| {
        b.iter(|| engine.score(black_box(&profile), black_box(&posting)));
    });
}

fn bench_rank(c: &mut Criterion) {
    let engine = ScoringEngine::with_default_weights();
    let profile = create_profile();

    let mut group = c.benchmark_group("rank_postings");
    for size in [100, 1_000, 10_000] {
        let postings: Vec<Posting> = (0..size).map(create_posting).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &postings, |b, postings| {
            b.iter(|| engine.rank(black_box(&profile), black_box(postings), 50));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_postal_coordinates,
    bench_score_single,
    bench_rank
);
criterion_main!(benches);
