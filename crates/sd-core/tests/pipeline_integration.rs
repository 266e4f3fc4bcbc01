//! End-to-end runs over JSON batch files and on-disk tables.
//!
//! Covers:
//! - History threshold (batches 0 and 1 are never ranked)
//! - Unreadable scores and unknown industries fall back to the sentinel
//! - Scores table reads back as exactly what was ranked
//! - Output growth is the same whether run in one go, batch by batch, or
//!   resumed in a new process
//! - Gaps and malformed batches halt without touching earlier output

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use sd_common::{BatchIndex, EntityId, Error};
use sd_config::EtlConfig;
use sd_core::{
    entity_history, read_drift, read_scores, JsonBatchSource, MemorySink, Percentile, Pipeline,
    TableSink,
};

// ============================================================================
// Helpers
// ============================================================================

fn config_in(dir: &Path) -> EtlConfig {
    EtlConfig {
        input_prefix: dir.join("batches").join("batch"),
        ..EtlConfig::default()
    }
    .with_output_dir(dir)
}

fn write_batch(dir: &Path, index: u64, records: Value) {
    let batches = dir.join("batches");
    fs::create_dir_all(&batches).unwrap();
    fs::write(batches.join(format!("batch_{index}.json")), records.to_string()).unwrap();
}

/// A batch of ten records spread over all default industries plus one the
/// config does not know.
fn synthetic_batch(index: u64) -> Value {
    let industries = ["clothing", "food", "cars", "hair care", "toys"];
    let records: Vec<Value> = (0..10u64)
        .map(|i| {
            let score = ((i * 37 + index * 11) % 101) as f64 * 0.5;
            json!({
                "id": format!("e{i}"),
                "score": score,
                "industry": industries[(i % 5) as usize],
            })
        })
        .collect();
    Value::Array(records)
}

fn seed_synthetic(dir: &Path, count: u64) {
    for index in 0..count {
        write_batch(dir, index, synthetic_batch(index));
    }
}

fn table_pipeline(config: &EtlConfig) -> Pipeline<JsonBatchSource, TableSink> {
    Pipeline::new(
        config,
        JsonBatchSource::new(&config.input_prefix),
        TableSink::from_config(config),
    )
}

fn read_text(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn single_entity_ranked_once_history_exists() {
    let dir = TempDir::new().unwrap();
    for index in 0..3 {
        write_batch(
            dir.path(),
            index,
            json!([{"id": "A", "score": "10", "industry": "food"}]),
        );
    }
    let config = config_in(dir.path());
    let summary = table_pipeline(&config).process(3).unwrap();
    assert_eq!(summary.batch_count(), 3);

    let rows = read_scores(&config).unwrap();
    let percentiles: Vec<Percentile> = rows.iter().map(|r| r.percentile).collect();
    assert_eq!(
        percentiles,
        vec![Percentile::NotComputed, Percentile::NotComputed, Percentile::Rank(0)]
    );
    assert!(rows.iter().all(|r| r.score == Some(10.0)));

    let scores = read_text(&config.scores_table);
    assert!(scores.starts_with("id,score,industry,percentile\n"));
    assert!(scores.ends_with("A,10.0,food,0\n"));

    let history = entity_history(&config, &EntityId::from("A")).unwrap();
    let runs: Vec<u64> = history.points.iter().map(|p| p.batch_index.0).collect();
    assert_eq!(runs, vec![0, 1, 2]);
}

#[test]
fn unreadable_score_is_missing_and_unranked() {
    let dir = TempDir::new().unwrap();
    seed_synthetic(dir.path(), 3);
    write_batch(
        dir.path(),
        3,
        json!([
            {"id": "A", "score": "12.5", "industry": "food"},
            {"id": "B", "score": "abc", "industry": "food"},
        ]),
    );
    let config = config_in(dir.path());
    let summary = table_pipeline(&config).process(4).unwrap();
    assert_eq!(summary.batches[3].score_failures, 1);
    assert_eq!(summary.batches[3].ranked, 1);

    let rows = read_scores(&config).unwrap();
    let b = rows.iter().find(|r| r.id.as_str() == "B").unwrap();
    assert_eq!(b.score, None);
    assert_eq!(b.percentile, Percentile::NotComputed);
    assert!(read_text(&config.scores_table).contains("B,,food,-1\n"));
}

#[test]
fn unknown_industry_is_never_ranked() {
    let dir = TempDir::new().unwrap();
    seed_synthetic(dir.path(), 5);
    write_batch(
        dir.path(),
        5,
        json!([
            {"id": "X", "score": 3.0, "industry": "electronics"},
            {"id": "Y", "score": 3.0, "industry": "cars"},
        ]),
    );
    let config = config_in(dir.path());
    table_pipeline(&config).process(6).unwrap();

    let drift = read_drift(&config).unwrap();
    let last: Vec<_> = drift
        .iter()
        .filter(|(_, point)| point.batch_index == BatchIndex(5))
        .collect();
    assert_eq!(last.len(), 2);
    assert_eq!(last[0].0.as_str(), "X");
    assert_eq!(last[0].1.percentile, Percentile::NotComputed);
    assert!(last[1].1.percentile.is_computed());
}

#[test]
fn columns_layout_batches_are_accepted() {
    let dir = TempDir::new().unwrap();
    for index in 0..3 {
        write_batch(
            dir.path(),
            index,
            json!({
                "id": {"0": "A", "1": "B"},
                "score": {"0": 1.0, "1": 2.0},
                "industry": {"0": "cars", "1": "cars"},
            }),
        );
    }
    let config = config_in(dir.path());
    table_pipeline(&config).process(3).unwrap();
    let rows = read_scores(&config).unwrap();
    assert_eq!(rows.len(), 6);
    let last: Vec<&str> = rows[4..].iter().map(|r| r.id.as_str()).collect();
    assert_eq!(last, vec!["A", "B"]);
    assert!(rows[4].percentile < rows[5].percentile);
}

// ============================================================================
// Round-trip and growth
// ============================================================================

#[test]
fn scores_table_reads_back_what_was_ranked() {
    let dir = TempDir::new().unwrap();
    seed_synthetic(dir.path(), 6);
    let config = config_in(dir.path());

    table_pipeline(&config).process(6).unwrap();
    let mut reference = Pipeline::new(
        &config,
        JsonBatchSource::new(&config.input_prefix),
        MemorySink::new(),
    );
    reference.process(6).unwrap();

    let expected: Vec<_> = reference.sink().rows().collect();
    let written = read_scores(&config).unwrap();
    assert_eq!(written.len(), expected.len());
    for (row, scored) in written.iter().zip(expected) {
        assert_eq!(row.id, scored.record.entity_id);
        assert_eq!(row.score, scored.record.score);
        assert_eq!(row.industry, scored.record.industry);
        assert_eq!(row.percentile, scored.percentile);
    }

    let drift = read_drift(&config).unwrap();
    assert_eq!(drift.len(), written.len());
}

#[test]
fn output_growth_is_the_same_in_one_run_stepwise_or_resumed() {
    let k = 4;

    let whole = TempDir::new().unwrap();
    seed_synthetic(whole.path(), k + 1);
    let whole_config = config_in(whole.path());
    table_pipeline(&whole_config).process(k + 1).unwrap();

    let stepwise = TempDir::new().unwrap();
    seed_synthetic(stepwise.path(), k + 1);
    let step_config = config_in(stepwise.path());
    let mut pipeline = table_pipeline(&step_config);
    pipeline.process(k).unwrap();
    let prefix = read_text(&step_config.scores_table);
    pipeline.process_batch(BatchIndex(k)).unwrap();
    let grown = read_text(&step_config.scores_table);
    assert!(grown.starts_with(&prefix));

    let resumed = TempDir::new().unwrap();
    seed_synthetic(resumed.path(), k + 1);
    let resume_config = config_in(resumed.path());
    table_pipeline(&resume_config).process(k).unwrap();
    table_pipeline(&resume_config)
        .process_range(BatchIndex(k), BatchIndex(k + 1))
        .unwrap();

    for config in [&step_config, &resume_config] {
        assert_eq!(
            read_text(&config.scores_table),
            read_text(&whole_config.scores_table)
        );
        assert_eq!(
            read_text(&config.drift_table),
            read_text(&whole_config.drift_table)
        );
    }
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn missing_batch_halts_after_earlier_output() {
    let dir = TempDir::new().unwrap();
    seed_synthetic(dir.path(), 2);
    write_batch(dir.path(), 3, synthetic_batch(3));
    let config = config_in(dir.path());

    let mut pipeline = table_pipeline(&config);
    let err = pipeline.process(4).unwrap_err();
    assert!(matches!(err, Error::BatchUnavailable { index: 2, .. }));
    assert_eq!(pipeline.next_index(), BatchIndex(2));

    let runs: Vec<u64> = read_drift(&config)
        .unwrap()
        .iter()
        .map(|(_, p)| p.batch_index.0)
        .collect();
    assert_eq!(runs.len(), 20);
    assert!(runs.iter().all(|run| *run < 2));
}

#[test]
fn failed_drift_write_is_retried_without_duplicate_rows() {
    let dir = TempDir::new().unwrap();
    seed_synthetic(dir.path(), 4);
    let config = config_in(dir.path());

    let mut pipeline = table_pipeline(&config);
    pipeline.process(3).unwrap();
    let drift_before = read_text(&config.drift_table);

    // A directory in place of the drift table makes its append fail.
    fs::remove_file(&config.drift_table).unwrap();
    fs::create_dir(&config.drift_table).unwrap();
    let err = pipeline.process_batch(BatchIndex(3)).unwrap_err();
    assert_eq!(err.code(), 40);
    assert_eq!(pipeline.next_index(), BatchIndex(3));
    assert_eq!(read_scores(&config).unwrap().len(), 30);

    fs::remove_dir(&config.drift_table).unwrap();
    fs::write(&config.drift_table, drift_before).unwrap();
    pipeline.process_batch(BatchIndex(3)).unwrap();

    let scores = read_scores(&config).unwrap();
    let drift = read_drift(&config).unwrap();
    assert_eq!(scores.len(), 40);
    assert_eq!(drift.len(), 40);
    for (row, (id, _)) in scores.iter().zip(&drift) {
        assert_eq!(&row.id, id);
    }
    let batch_three = drift
        .iter()
        .filter(|(_, point)| point.batch_index == BatchIndex(3))
        .count();
    assert_eq!(batch_three, 10);

    let whole = TempDir::new().unwrap();
    seed_synthetic(whole.path(), 4);
    let whole_config = config_in(whole.path());
    table_pipeline(&whole_config).process(4).unwrap();
    assert_eq!(
        read_text(&config.scores_table),
        read_text(&whole_config.scores_table)
    );
}

#[test]
fn malformed_batch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    seed_synthetic(dir.path(), 2);
    write_batch(
        dir.path(),
        2,
        json!([
            {"id": "A", "score": 1.0, "industry": "food"},
            {"id": "B", "score": 2.0},
        ]),
    );
    let config = config_in(dir.path());

    let err = table_pipeline(&config).process(3).unwrap_err();
    assert_eq!(err.code(), 21);
    let rows = read_scores(&config).unwrap();
    assert_eq!(rows.len(), 20);
    assert!(rows.iter().all(|r| r.id.as_str() != "A"));
}
