//! Scoring throughput for single pairs and batches.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use surface_sim::core::config::BatchConfig;
use surface_sim::io::batch::score_records;
use surface_sim::io::records::Record;
use surface_sim::SurfaceScorer;

/// Generate Python functions of growing size
fn generate_python(statements: usize, seed: usize) -> String {
    let mut code = format!("def function_{seed}(param1, param2):\n    \"\"\"Generated.\"\"\"\n");
    for i in 0..statements {
        code.push_str(&format!(
            "    if param1 > {i}:\n        result_{i} = param2 * {seed}  # step {i}\n"
        ));
    }
    code.push_str("    return param1\n");
    code
}

fn generate_java(statements: usize, seed: usize) -> String {
    let mut code = format!("class Gen{seed} {{\n  int run(int a, int b) {{\n");
    for i in 0..statements {
        code.push_str(&format!("    if (a > {i}) {{ b = b * {seed}; }} // step {i}\n"));
    }
    code.push_str("    return b;\n  }\n}\n");
    code
}

fn bench_pair_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_scoring");
    let python = SurfaceScorer::for_language("python").unwrap();
    let java = SurfaceScorer::for_language("java").unwrap();

    for size in [5usize, 25, 100] {
        let (py_a, py_b) = (generate_python(size, 1), generate_python(size, 2));
        group.bench_with_input(BenchmarkId::new("python", size), &size, |b, _| {
            b.iter(|| python.score(black_box(&py_a), black_box(&py_b)))
        });

        let (java_a, java_b) = (generate_java(size, 1), generate_java(size, 2));
        group.bench_with_input(BenchmarkId::new("java", size), &size, |b, _| {
            b.iter(|| java.score(black_box(&java_a), black_box(&java_b)))
        });
    }
    group.finish();
}

fn bench_python_fallback(c: &mut Criterion) {
    let scorer = SurfaceScorer::for_language("python").unwrap();
    // unclosed bracket forces the regex tier
    let broken_a = format!("{}    values = [\n", generate_python(25, 1));
    let broken_b = format!("{}    values = [\n", generate_python(25, 2));
    c.bench_function("python_fallback_tier", |b| {
        b.iter(|| scorer.score(black_box(&broken_a), black_box(&broken_b)))
    });
}

fn bench_batch(c: &mut Criterion) {
    let records: Vec<Record> = (0..200)
        .filter_map(|i| match json!({
            "id": format!("SHARE-{i}"),
            "golden_code": generate_python(10, i),
            "generated_code": generate_python(10, i + 1),
        }) {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    let mut group = c.benchmark_group("batch_200");
    for parallel in [false, true] {
        let config = BatchConfig {
            parallel,
            ..BatchConfig::default()
        };
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(label, |b| {
            b.iter(|| score_records(black_box(records.clone()), "python", &config).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pair_scoring, bench_python_fallback, bench_batch);
criterion_main!(benches);
