//! Batch sources: where raw records come from.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use sd_common::{BatchIndex, Error, Result};

use crate::record::RawRecord;

/// Indexed access to batches of raw records.
pub trait BatchSource {
    /// Fetch batch `index`, or fail with [`Error::BatchUnavailable`].
    fn fetch(&self, index: BatchIndex) -> Result<Vec<RawRecord>>;
}

impl<T: BatchSource + ?Sized> BatchSource for &T {
    fn fetch(&self, index: BatchIndex) -> Result<Vec<RawRecord>> {
        (**self).fetch(index)
    }
}

impl<T: BatchSource + ?Sized> BatchSource for Box<T> {
    fn fetch(&self, index: BatchIndex) -> Result<Vec<RawRecord>> {
        (**self).fetch(index)
    }
}

/// Batches stored as `<prefix>_<index>.json` files.
#[derive(Debug, Clone)]
pub struct JsonBatchSource {
    prefix: PathBuf,
}

impl JsonBatchSource {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, index: BatchIndex) -> PathBuf {
        let mut name = self.prefix.as_os_str().to_os_string();
        name.push(format!("_{index}.json"));
        PathBuf::from(name)
    }
}

impl BatchSource for JsonBatchSource {
    fn fetch(&self, index: BatchIndex) -> Result<Vec<RawRecord>> {
        let path = self.path_for(index);
        let text = read_batch_file(&path, index)?;
        let records = parse_batch_json(&text, index)?;
        debug!(batch = %index, path = %path.display(), records = records.len(), "fetched batch");
        Ok(records)
    }
}

fn read_batch_file(path: &Path, index: BatchIndex) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(Error::BatchUnavailable {
            index: index.0,
            reason: format!("{} does not exist", path.display()),
        }),
        Err(err) => Err(Error::Io(err)),
    }
}

/// Parse a batch document.
///
/// Two layouts are accepted:
/// - records: `[{"id": .., "score": .., "industry": ..}, ...]`
/// - columns: `{"id": {"0": .., "1": ..}, "score": {..}, "industry": {..}}`
///
/// In the columns layout rows are ordered by row key, numerically when every
/// key is an unsigned integer. A row missing from one column simply lacks
/// that field.
pub fn parse_batch_json(text: &str, index: BatchIndex) -> Result<Vec<RawRecord>> {
    let document: Value = serde_json::from_str(text)
        .map_err(|err| Error::malformed(index.0, format!("batch is not valid JSON: {err}")))?;

    match document {
        Value::Array(rows) => rows
            .into_iter()
            .enumerate()
            .map(|(pos, row)| match row {
                Value::Object(fields) => Ok(RawRecord::from_fields(fields)),
                other => Err(Error::malformed(
                    index.0,
                    format!("row {pos} is {}, expected an object", json_kind(&other)),
                )),
            })
            .collect(),
        Value::Object(columns) => columns_to_records(columns, index),
        other => Err(Error::malformed(
            index.0,
            format!("batch is {}, expected an array or object", json_kind(&other)),
        )),
    }
}

fn columns_to_records(columns: Map<String, Value>, index: BatchIndex) -> Result<Vec<RawRecord>> {
    let mut by_column: Vec<(String, Map<String, Value>)> = Vec::with_capacity(columns.len());
    let mut row_keys = BTreeSet::new();
    for (name, column) in columns {
        match column {
            Value::Object(cells) => {
                row_keys.extend(cells.keys().cloned());
                by_column.push((name, cells));
            }
            other => {
                return Err(Error::malformed(
                    index.0,
                    format!("column {name:?} is {}, expected an object", json_kind(&other)),
                ))
            }
        }
    }

    let mut ordered: Vec<String> = row_keys.into_iter().collect();
    if ordered.iter().all(|k| k.parse::<u64>().is_ok()) {
        ordered.sort_by_key(|k| k.parse::<u64>().unwrap_or(u64::MAX));
    }

    let records = ordered
        .iter()
        .map(|key| {
            let mut fields = Map::new();
            for (name, cells) in &by_column {
                if let Some(value) = cells.get(key) {
                    fields.insert(name.clone(), value.clone());
                }
            }
            RawRecord::from_fields(fields)
        })
        .collect();
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// In-memory batches, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryBatchSource {
    batches: BTreeMap<BatchIndex, Vec<RawRecord>>,
}

impl MemoryBatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: impl Into<BatchIndex>, records: Vec<RawRecord>) {
        self.batches.insert(index.into(), records);
    }

    pub fn with_batch(mut self, index: impl Into<BatchIndex>, records: Vec<RawRecord>) -> Self {
        self.insert(index, records);
        self
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

impl BatchSource for MemoryBatchSource {
    fn fetch(&self, index: BatchIndex) -> Result<Vec<RawRecord>> {
        self.batches
            .get(&index)
            .cloned()
            .ok_or_else(|| Error::BatchUnavailable {
                index: index.0,
                reason: "no such batch in memory source".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn records_layout_parses_in_order() {
        let text = r#"[{"id": "A", "score": "10", "industry": "food"},
                       {"id": 7, "score": 3.5, "industry": "cars"}]"#;
        let rows = parse_batch_json(text, BatchIndex(0)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("id"), Some(&json!("A")));
        assert_eq!(rows[1].get("score"), Some(&json!(3.5)));
    }

    #[test]
    fn columns_layout_orders_rows_numerically() {
        let text = r#"{
            "id": {"10": "K", "2": "B", "0": "A"},
            "score": {"0": "1", "2": "abc", "10": 4},
            "industry": {"0": "food", "2": "food", "10": "cars"}
        }"#;
        let rows = parse_batch_json(text, BatchIndex(4)).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.get("id").cloned().unwrap()).collect();
        assert_eq!(ids, vec![json!("A"), json!("B"), json!("K")]);
        assert_eq!(rows[1].get("score"), Some(&json!("abc")));
    }

    #[test]
    fn non_object_rows_are_malformed() {
        let err = parse_batch_json(r#"[{"id": "A"}, 5]"#, BatchIndex(2)).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { index: 2, .. }));
        assert!(err.to_string().contains("row 1 is a number"));

        let err = parse_batch_json("not json", BatchIndex(1)).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn missing_file_is_batch_unavailable() {
        let temp = TempDir::new().unwrap();
        let source = JsonBatchSource::new(temp.path().join("batch"));
        let err = source.fetch(BatchIndex(3)).unwrap_err();
        assert!(matches!(err, Error::BatchUnavailable { index: 3, .. }));
    }

    #[test]
    fn json_files_resolved_by_prefix() {
        let temp = TempDir::new().unwrap();
        let source = JsonBatchSource::new(temp.path().join("batch"));
        std::fs::write(
            temp.path().join("batch_0.json"),
            r#"[{"id": "A", "score": "10", "industry": "food"}]"#,
        )
        .unwrap();
        assert_eq!(source.path_for(BatchIndex(0)), temp.path().join("batch_0.json"));
        let rows = source.fetch(BatchIndex(0)).unwrap();
        assert_eq!(rows, vec![RawRecord::new("A", "10", "food")]);
    }

    #[test]
    fn memory_source_reports_gaps() {
        let source = MemoryBatchSource::new().with_batch(0u64, vec![]);
        assert!(source.fetch(BatchIndex(0)).unwrap().is_empty());
        assert!(matches!(
            source.fetch(BatchIndex(1)),
            Err(Error::BatchUnavailable { index: 1, .. })
        ));
    }
}
