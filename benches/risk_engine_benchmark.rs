use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeSet;
use supply_chain_risk_engine::{
    assess_risk, cascading_impact, distance_km, match_suppliers, rank_alternatives,
    CriticalityLevel, DependencyGraph, IncidentType, ParsedIncident, Supplier, SupplierCategory,
    SupplierDependencyEdge,
};

const COUNTRIES: [&str; 5] = ["Taiwan", "Japan", "Germany", "Mexico", "Vietnam"];

fn portfolio(size: i64) -> (Vec<Supplier>, Vec<SupplierDependencyEdge>) {
    let suppliers: Vec<Supplier> = (0..size)
        .map(|id| {
            let country = COUNTRIES[(id % COUNTRIES.len() as i64) as usize];
            let criticality = match id % 4 {
                0 => CriticalityLevel::Low,
                1 => CriticalityLevel::Medium,
                2 => CriticalityLevel::High,
                _ => CriticalityLevel::Critical,
            };
            Supplier::new(id, &format!("Supplier {}", id), country, SupplierCategory::Components, criticality)
                .with_location(20.0 + (id % 30) as f64 * 0.5, 110.0 + (id % 40) as f64 * 0.5)
        })
        .collect();

    // Each supplier depends on the two before it
    let edges = (2..size)
        .flat_map(|id| {
            [
                SupplierDependencyEdge::new(id, id - 1, "component"),
                SupplierDependencyEdge::new(id, id - 2, "component"),
            ]
        })
        .collect();

    (suppliers, edges)
}

fn incident() -> ParsedIncident {
    ParsedIncident::new(IncidentType::NaturalDisaster, 4)
        .with_country("Taiwan")
        .with_location(24.8, 121.0)
}

fn bench_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| distance_km(black_box(24.8138), black_box(120.9675), black_box(35.6762), black_box(139.6503)))
    });
}

fn bench_matching(c: &mut Criterion) {
    let (suppliers, _) = portfolio(1_000);
    let incident = incident();

    c.bench_function("match_1000_suppliers", |b| {
        b.iter(|| match_suppliers(black_box(&incident), black_box(&suppliers)))
    });
}

fn bench_cascade(c: &mut Criterion) {
    let (suppliers, edges) = portfolio(1_000);
    let graph = DependencyGraph::build(&suppliers, &edges);
    let affected: BTreeSet<i64> = (0..10).collect();

    c.bench_function("cascade_1000_suppliers", |b| {
        b.iter(|| cascading_impact(black_box(&affected), black_box(&graph)))
    });
}

fn bench_full_assessment(c: &mut Criterion) {
    let (suppliers, edges) = portfolio(500);
    let incident = incident();

    c.bench_function("match_cascade_score_500", |b| {
        b.iter(|| {
            let summary = match_suppliers(&incident, &suppliers).ok()?;
            let graph = DependencyGraph::build(&suppliers, &edges);
            let cascading = graph.downstream_impact(&summary.affected_ids());
            black_box(assess_risk(&incident, &summary.matches, suppliers.len(), &cascading).ok())
        })
    });
}

fn bench_ranking(c: &mut Criterion) {
    let (suppliers, _) = portfolio(200);

    c.bench_function("rank_200_alternatives", |b| {
        b.iter(|| rank_alternatives(black_box(&suppliers[0]), black_box(&suppliers), incident().location, 3))
    });
}

criterion_group!(
    benches,
    bench_distance,
    bench_matching,
    bench_cascade,
    bench_full_assessment,
    bench_ranking
);
criterion_main!(benches);
