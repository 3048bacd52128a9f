use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ArchiveError, Result};
use crate::model::{ObservableEntry, ParamValue, TaskRecord};

// ---------------------------------------------------------------------------
// Record Parser
// ---------------------------------------------------------------------------

/// On-disk shape of one task record, before parameter values are tagged.
///
/// Expected JSON schema (one archive = one top-level array):
///
/// ```json
/// [
///   {
///     "parameters": { "T": 1.0, "Lx": 16, "model": "ising" },
///     "results": {
///       "Energy": { "mean": [-1.23], "error": [0.01], "rebin_len": 100 }
///     }
///   },
///   { "parameters": { "T": 2.0, "Lx": 16 }, "results": null }
/// ]
/// ```
#[derive(Deserialize)]
struct RawTask {
    parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    results: Option<BTreeMap<String, ObservableEntry>>,
}

/// Read and parse an archive file into typed task records.
pub fn load_file(path: &Path) -> Result<Vec<TaskRecord>> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text)
}

/// Parse raw archive content into typed task records.
///
/// Pure transform: no filtering, no aggregation. Fails on the first invalid
/// record; no partial record list is ever returned.
pub fn parse_str(text: &str) -> Result<Vec<TaskRecord>> {
    let raw: Vec<RawTask> = serde_json::from_str(text)?;

    let mut tasks = Vec::with_capacity(raw.len());
    for (i, task) in raw.into_iter().enumerate() {
        if let Some(results) = &task.results {
            for (name, entry) in results {
                validate_entry(i, name, entry)?;
            }
        }

        let parameters = task
            .parameters
            .iter()
            .map(|(key, val)| (key.clone(), ParamValue::from_json(val)))
            .collect();

        tasks.push(TaskRecord {
            parameters,
            results: task.results,
        });
    }

    Ok(tasks)
}

pub(crate) fn validate_entry(task: usize, name: &str, entry: &ObservableEntry) -> Result<()> {
    if entry.mean.is_empty() {
        return Err(ArchiveError::EmptyObservable {
            task,
            observable: name.to_string(),
        });
    }
    if entry.mean.len() != entry.error.len() {
        return Err(ArchiveError::MeanErrorMismatch {
            task,
            observable: name.to_string(),
            mean_len: entry.mean.len(),
            error_len: entry.error.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tasks_with_and_without_results() {
        let tasks = parse_str(
            r#"[
                {"parameters": {"T": 1.0, "Lx": 16},
                 "results": {"Energy": {"mean": [-1.2], "error": [0.01]}}},
                {"parameters": {"T": 2.0, "Lx": 16}, "results": null},
                {"parameters": {"T": 3.0, "Lx": 16}}
            ]"#,
        )
        .unwrap();

        assert_eq!(tasks.len(), 3);
        assert!(tasks[0].results.is_some());
        assert!(tasks[1].results.is_none());
        assert!(tasks[2].results.is_none());
        assert_eq!(
            tasks[0].parameters["T"],
            ParamValue::Float(1.0)
        );
        assert_eq!(tasks[0].parameters["Lx"], ParamValue::Integer(16));
    }

    #[test]
    fn rejects_mean_error_length_mismatch() {
        let err = parse_str(
            r#"[{"parameters": {},
                 "results": {"Corr": {"mean": [1.0, 2.0], "error": [0.1]}}}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::MeanErrorMismatch { task: 0, mean_len: 2, error_len: 1, .. }
        ));
    }

    #[test]
    fn rejects_empty_mean() {
        let err = parse_str(
            r#"[{"parameters": {},
                 "results": {"Energy": {"mean": [], "error": []}}}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::EmptyObservable { task: 0, .. }));
    }

    #[test]
    fn rejects_entry_without_error_field() {
        let res = parse_str(
            r#"[{"parameters": {},
                 "results": {"Energy": {"mean": [1.0]}}}]"#,
        );
        assert!(matches!(res, Err(ArchiveError::Json(_))));
    }

    #[test]
    fn rejects_non_array_archive() {
        assert!(matches!(
            parse_str(r#"{"parameters": {}}"#),
            Err(ArchiveError::Json(_))
        ));
    }
}
