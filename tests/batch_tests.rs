//! Batch scoring and region analysis over JSONL files on disk.

use serde_json::{json, Value};
use surface_sim::analysis::hit_rate::hit_rate;
use surface_sim::analysis::regions::RegionCounts;
use surface_sim::analysis::thresholds::search_thresholds;
use surface_sim::core::config::{BatchConfig, RegionThresholds, ThresholdRange, ThresholdSearchConfig};
use surface_sim::io::batch::{score_records, BatchSummary, PairOutcome};
use surface_sim::io::records::{read_jsonl, write_jsonl, Record};
use tempfile::tempdir;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

fn python_pairs() -> Vec<Record> {
    vec![
        record(json!({
            "id": "LOCAL-1",
            "variant_id": "MUT1",
            "golden_code": "def f(a, b):\n    return a < b\n",
            "generated_code": "def f(a, b):\n    return a <= b\n",
            "score": 0.0
        })),
        record(json!({
            "id": "LOCAL-2",
            "variant_id": "OPT1",
            "golden_code": "def total(xs):\n    s = 0\n    for x in xs:\n        s += x\n    return s\n",
            "generated_code": "total = lambda xs: sum(xs)\n",
            "score": 1.0
        })),
        record(json!({
            "id": "LOCAL-3",
            "golden_code": "def g(:\n",
            "generated_code": "def g(:\n",
            "score": 1.0
        })),
    ]
}

#[test]
fn test_file_round_trip_preserves_order_and_fields() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("pairs.jsonl");
    let output = dir.path().join("scored.jsonl");
    write_jsonl(&input, &python_pairs()).unwrap();

    let records = read_jsonl(&input).unwrap();
    let scored = score_records(records, "python", &BatchConfig::default()).unwrap();
    write_jsonl(&output, scored.iter().map(|row| &row.record)).unwrap();

    let rows = read_jsonl(&output).unwrap();
    let ids: Vec<&str> = rows.iter().map(|row| row["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["LOCAL-1", "LOCAL-2", "LOCAL-3"]);
    for row in &rows {
        assert!(row.contains_key("golden_code"));
        assert!(row["SurfaceSim"].is_number());
        assert!(row["abs_SurfaceSim_minus_score"].is_number());
    }

    // broken-but-identical code keeps its edit score and loses structure
    assert_eq!(rows[2]["InverseEdit"], 1.0);
    assert_eq!(rows[2]["AST"], 0.0);

    assert_eq!(
        BatchSummary::from_records(&scored),
        BatchSummary { total: 3, scored: 3, skipped: 0, oversized: 0 }
    );
}

#[test]
fn test_mutation_looks_alike_and_rewrite_does_not() {
    let scored = score_records(python_pairs(), "python", &BatchConfig::default()).unwrap();
    let PairOutcome::Scored(mutation) = scored[0].outcome else {
        panic!("mutation pair was not scored");
    };
    let PairOutcome::Scored(rewrite) = scored[1].outcome else {
        panic!("rewrite pair was not scored");
    };
    assert!(mutation.surface_sim > 0.9, "mutation SurfaceSim {}", mutation.surface_sim);
    assert!(rewrite.surface_sim < 0.65, "rewrite SurfaceSim {}", rewrite.surface_sim);
}

#[test]
fn test_scored_output_feeds_hit_rate() {
    let scored = score_records(python_pairs(), "python", &BatchConfig::default()).unwrap();
    let rows: Vec<Record> = scored.into_iter().map(|row| row.record).collect();

    let result = hit_rate(&rows, &RegionThresholds::default());
    assert_eq!(result.rows, 3);
    assert_eq!(result.total_mutations, 1);
    assert_eq!(result.mutations_in_sfd, 1);
    assert_eq!(result.total_optimizations, 1);
    assert_eq!(result.optimizations_in_dfs, 1);
}

#[test]
fn test_scored_output_feeds_threshold_search() {
    let mut pairs = python_pairs();
    pairs.push(record(json!({
        "id": "SHARE-4",
        "golden_code": "def h(n):\n    return n * 2\n",
        "generated_code": "def h(n):\n    return n + n\n",
        "score": 0.5
    })));
    for (pair, codebleu) in pairs.iter_mut().zip([0.9, 0.3, 0.6, 0.5]) {
        pair.insert("codebleu".to_string(), json!(codebleu));
    }

    let scored = score_records(pairs, "python", &BatchConfig::default()).unwrap();
    let rows: Vec<Record> = scored.into_iter().map(|row| row.record).collect();

    let config = ThresholdSearchConfig {
        x_lo: ThresholdRange::new(0.65, 0.65),
        x_hi: ThresholdRange::new(0.90, 0.90),
        y_lo: ThresholdRange::new(0.10, 0.10),
        y_hi: ThresholdRange::new(0.90, 0.90),
        min_dfs: 1,
        min_sfd: 1,
        min_control: 1,
        metrics: vec!["codebleu".to_string()],
        ..ThresholdSearchConfig::default()
    };
    let report = search_thresholds(&rows, &config).unwrap();
    assert_eq!(report.rows, 4);
    // the rewrite and the broken pair are DFS, the mutation SFD, the last Control
    assert_eq!(report.best().unwrap().counts, RegionCounts { dfs: 2, sfd: 1, control: 1 });
}
