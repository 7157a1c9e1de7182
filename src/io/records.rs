//! Newline-delimited JSON records and code-pair extraction.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::warn;

use crate::core::config::BatchConfig;
use crate::core::errors::{Result, ResultExt};

/// One JSON object from a JSONL file.
pub type Record = Map<String, Value>;

/// Read every JSON object from a JSONL file.
///
/// Blank lines, lines that fail to parse and lines holding anything other
/// than an object are skipped with a warning.
pub fn read_jsonl(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(map)) => records.push(map),
            Ok(_) => warn!(line = index + 1, "skipping non-object JSONL line"),
            Err(e) => warn!(line = index + 1, error = %e, "skipping malformed JSONL line"),
        }
    }

    Ok(records)
}

/// Write records as JSONL, one compact object per line, raw UTF-8.
pub fn write_jsonl<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Record>,
{
    let write_context = || format!("Failed to write {}", path.display());
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record).with_context(write_context)?;
        writer.write_all(b"\n").with_context(write_context)?;
    }
    writer.flush().with_context(write_context)
}

/// A (reference, candidate) pair pulled out of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct CodePair {
    /// Record identifier, when the record carries one
    pub id: Option<String>,
    /// Reference code
    pub reference: String,
    /// Candidate code
    pub candidate: String,
    /// Ground-truth semantic score, when present and numeric
    pub ground_truth: Option<f64>,
}

impl CodePair {
    /// Extract a pair using the configured field names and their fallbacks.
    ///
    /// Returns `None` when either code field is missing or not a string.
    pub fn from_record(record: &Record, config: &BatchConfig) -> Option<Self> {
        let reference = first_string(record, &config.reference_field, &config.reference_fallbacks)?;
        let candidate = first_string(record, &config.candidate_field, &config.candidate_fallbacks)?;
        let id = record.get(&config.id_field).and_then(value_as_id);
        let ground_truth = std::iter::once(&config.ground_truth_field)
            .chain(config.ground_truth_fallbacks.iter())
            .find_map(|field| record.get(field).and_then(value_as_f64));

        Some(Self {
            id,
            reference: reference.to_string(),
            candidate: candidate.to_string(),
            ground_truth,
        })
    }

    /// Length in characters of the longer snippet
    pub fn max_chars(&self) -> usize {
        self.reference.chars().count().max(self.candidate.chars().count())
    }
}

fn first_string<'r>(record: &'r Record, primary: &str, fallbacks: &[String]) -> Option<&'r str> {
    std::iter::once(primary)
        .chain(fallbacks.iter().map(String::as_str))
        .find_map(|field| record.get(field).and_then(Value::as_str))
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a finite float from a JSON number or numeric string.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// First finite float found under any of `fields`.
pub fn first_f64<S: AsRef<str>>(record: &Record, fields: &[S]) -> Option<f64> {
    fields
        .iter()
        .find_map(|field| record.get(field.as_ref()).and_then(value_as_f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_read_skips_blank_and_malformed_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.jsonl");
        std::fs::write(
            &path,
            "{\"id\": 1}\n\n   \nnot json\n[1, 2]\n{\"id\": 2}\n",
        )
        .unwrap();

        let records = read_jsonl(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["id"], 2);
    }

    #[test]
    fn test_write_keeps_raw_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let rows = vec![record(json!({"code": "print('héllo')"}))];
        write_jsonl(&path, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("héllo"));
        assert!(content.ends_with('\n'));
        assert_eq!(read_jsonl(&path).unwrap(), rows);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_jsonl(Path::new("/nonexistent/surface-sim.jsonl")).unwrap_err();
        assert!(matches!(err, crate::core::errors::SurfaceSimError::Io { .. }));
        assert!(err.to_string().contains("Failed to open /nonexistent/surface-sim.jsonl"));
    }

    #[test]
    fn test_pair_uses_primary_fields() {
        let row = record(json!({
            "id": "SHARE-1",
            "golden_code": "a",
            "generated_code": "b",
            "score": 0.5
        }));
        let pair = CodePair::from_record(&row, &BatchConfig::default()).unwrap();
        assert_eq!(pair.id.as_deref(), Some("SHARE-1"));
        assert_eq!(pair.reference, "a");
        assert_eq!(pair.candidate, "b");
        assert_eq!(pair.ground_truth, Some(0.5));
    }

    #[test]
    fn test_pair_falls_back_to_alternate_fields() {
        let row = record(json!({
            "id": 7,
            "original_code": "a",
            "variant_code": "b",
            "df_score": "0.25"
        }));
        let pair = CodePair::from_record(&row, &BatchConfig::default()).unwrap();
        assert_eq!(pair.id.as_deref(), Some("7"));
        assert_eq!(pair.reference, "a");
        assert_eq!(pair.ground_truth, Some(0.25));
    }

    #[test]
    fn test_pair_requires_both_code_fields() {
        let row = record(json!({"golden_code": "a", "generated_code": 3}));
        assert!(CodePair::from_record(&row, &BatchConfig::default()).is_none());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        assert_eq!(value_as_f64(&json!("NaN")), None);
        assert_eq!(value_as_f64(&json!("inf")), None);
        assert_eq!(value_as_f64(&json!(true)), None);
        assert_eq!(value_as_f64(&json!(" 0.75 ")), Some(0.75));
    }
}
