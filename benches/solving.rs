//! Benchmarks for lucon parsing and resolution

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lucon::{PolicyEngine, Solver, SolverConfig, Theory};

const POLICY: &str = r#"
    path(X, Y, [X, Y]) :- edge(X, Y), forbidden(X, Y).
    path(X, Z, [X|T]) :- edge(X, Y), path(Y, Z, T).
    forbidden(a, b).
    forbidden(c, b).
"#;

const ROUTE: &str = r#"
    entrynode(a).
    stmt(b).
    edge(a, b).
    edge(a, c).
    edge(c, b).
"#;

fn parse_benchmark(c: &mut Criterion) {
    c.bench_function("parse_policy", |b| {
        b.iter(|| Theory::parse(black_box(POLICY)).unwrap());
    });
}

fn solve_benchmark(c: &mut Criterion) {
    let policy = Theory::parse(POLICY).unwrap();
    let route = Theory::parse(ROUTE).unwrap();
    let derived = policy.appended(&route);

    c.bench_function("solve_all_paths", |b| {
        b.iter(|| {
            let mut solver = Solver::for_query(
                black_box(&derived),
                "entrynode(X), stmt(Y), path(X, Y, T)",
                SolverConfig::default(),
            )
            .unwrap();
            solver.solve_all().unwrap()
        });
    });
}

fn verify_benchmark(c: &mut Criterion) {
    let engine = PolicyEngine::new();
    engine.load_policy(POLICY).unwrap();

    c.bench_function("prove_invalid_route", |b| {
        b.iter(|| {
            engine
                .prove_invalid_route(black_box(Some("bench")), black_box(Some(ROUTE)))
                .unwrap()
        });
    });
}

criterion_group!(benches, parse_benchmark, solve_benchmark, verify_benchmark);
criterion_main!(benches);
