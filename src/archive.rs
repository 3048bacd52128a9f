use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::Result;
use crate::loader;
use crate::model::{ParamValue, TaskRecord};

// ---------------------------------------------------------------------------
// Observable Store – five parallel per-task columns per observable
// ---------------------------------------------------------------------------

/// Aggregated columns for one observable across all tasks in the archive.
///
/// Slot `i` belongs to task `i`. Tasks that never reported the observable
/// hold NaN in the three metadata columns and a `[NaN]` placeholder in
/// mean/error. Mean/error rows are stored independently per task; the same
/// observable may be scalar in one task and vector-valued in another, so no
/// fixed matrix shape is assumed here. Densification happens at query time.
#[derive(Debug, Clone)]
pub(crate) struct ObservableColumns {
    pub rebin_len: Vec<f64>,
    pub rebin_count: Vec<f64>,
    pub autocorr_time: Vec<f64>,
    pub mean: Vec<Vec<f64>>,
    pub error: Vec<Vec<f64>>,
}

impl ObservableColumns {
    fn with_tasks(num_tasks: usize) -> Self {
        ObservableColumns {
            rebin_len: vec![f64::NAN; num_tasks],
            rebin_count: vec![f64::NAN; num_tasks],
            autocorr_time: vec![f64::NAN; num_tasks],
            mean: vec![vec![f64::NAN]; num_tasks],
            error: vec![vec![f64::NAN]; num_tasks],
        }
    }
}

// ---------------------------------------------------------------------------
// McArchive – the loaded, immutable archive
// ---------------------------------------------------------------------------

/// An archive of Monte Carlo results, loaded once and queried read-only.
///
/// Parameters are projected into per-name columns of length
/// [`num_tasks`](McArchive::num_tasks); a task that lacks a parameter key
/// holds [`ParamValue::Null`] in that column. Observables are projected into
/// [`ObservableColumns`]. All query operations live in the `query` module
/// and never mutate the archive.
#[derive(Debug, Clone)]
pub struct McArchive {
    pub(crate) num_tasks: usize,
    pub(crate) parameters: BTreeMap<String, Vec<ParamValue>>,
    pub(crate) observables: BTreeMap<String, ObservableColumns>,
}

impl McArchive {
    /// Load an archive from a `*.results.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let tasks = loader::load_file(path)?;
        let archive = Self::project(tasks);
        log::info!(
            "loaded {}: {} tasks, {} parameters, {} observables",
            path.display(),
            archive.num_tasks,
            archive.parameters.len(),
            archive.observables.len()
        );
        Ok(archive)
    }

    /// Parse an archive from in-memory JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::project(loader::parse_str(text)?))
    }

    /// Build an archive from already-parsed task records.
    ///
    /// Runs the same per-entry validation as the file loader, so a mean/error
    /// length mismatch fails here rather than corrupting query results later.
    pub fn from_records(tasks: Vec<TaskRecord>) -> Result<Self> {
        for (i, task) in tasks.iter().enumerate() {
            if let Some(results) = &task.results {
                for (name, entry) in results {
                    loader::validate_entry(i, name, entry)?;
                }
            }
        }
        Ok(Self::project(tasks))
    }

    /// Project parsed records into per-parameter and per-observable columns.
    fn project(tasks: Vec<TaskRecord>) -> Self {
        let num_tasks = tasks.len();

        let param_names: BTreeSet<&String> = tasks
            .iter()
            .flat_map(|task| task.parameters.keys())
            .collect();
        let observable_names: BTreeSet<&String> = tasks
            .iter()
            .filter_map(|task| task.results.as_ref())
            .flat_map(|results| results.keys())
            .collect();

        let mut parameters: BTreeMap<String, Vec<ParamValue>> = param_names
            .into_iter()
            .map(|name| (name.clone(), vec![ParamValue::Null; num_tasks]))
            .collect();
        let mut observables: BTreeMap<String, ObservableColumns> = observable_names
            .into_iter()
            .map(|name| (name.clone(), ObservableColumns::with_tasks(num_tasks)))
            .collect();

        for (i, task) in tasks.into_iter().enumerate() {
            for (name, value) in task.parameters {
                parameters.get_mut(&name).unwrap()[i] = value;
            }
            for (name, entry) in task.results.into_iter().flatten() {
                let o = observables.get_mut(&name).unwrap();
                o.rebin_len[i] = entry.rebin_len as f64;
                o.rebin_count[i] = entry.rebin_count as f64;
                o.autocorr_time[i] = entry.autocorr_time;
                o.mean[i] = entry.mean;
                o.error[i] = entry.error;
            }
        }

        McArchive {
            num_tasks,
            parameters,
            observables,
        }
    }

    /// Number of tasks in the archive (including tasks without results).
    pub fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    /// Union of parameter keys over all tasks, sorted.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.keys().map(String::as_str).collect()
    }

    /// Union of observable names over all tasks with present results, sorted.
    pub fn observable_names(&self) -> Vec<&str> {
        self.observables.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(text: &str) -> McArchive {
        McArchive::from_json(text).unwrap()
    }

    #[test]
    fn name_sets_are_unions_over_tasks() {
        let a = archive(
            r#"[
                {"parameters": {"T": 1.0},
                 "results": {"Energy": {"mean": [1.0], "error": [0.1]}}},
                {"parameters": {"T": 2.0, "h": 0.5},
                 "results": {"Magnetization": {"mean": [0.3], "error": [0.02]}}},
                {"parameters": {"Lx": 16}, "results": null}
            ]"#,
        );
        assert_eq!(a.num_tasks(), 3);
        assert_eq!(a.parameter_names(), ["Lx", "T", "h"]);
        assert_eq!(a.observable_names(), ["Energy", "Magnetization"]);
    }

    #[test]
    fn missing_parameter_slots_are_null() {
        let a = archive(
            r#"[
                {"parameters": {"T": 1.0}, "results": null},
                {"parameters": {"Lx": 16}, "results": null}
            ]"#,
        );
        assert_eq!(
            a.parameters["T"],
            vec![ParamValue::Float(1.0), ParamValue::Null]
        );
        assert_eq!(
            a.parameters["Lx"],
            vec![ParamValue::Null, ParamValue::Integer(16)]
        );
    }

    #[test]
    fn missing_observable_slots_are_nan_placeholders() {
        let a = archive(
            r#"[
                {"parameters": {},
                 "results": {"Energy": {"mean": [1.5], "error": [0.1],
                                        "rebin_len": 100, "rebin_count": 20,
                                        "autocorr_time": 2.0}}},
                {"parameters": {}, "results": null}
            ]"#,
        );
        let o = &a.observables["Energy"];
        assert_eq!(o.rebin_len[0], 100.0);
        assert_eq!(o.rebin_count[0], 20.0);
        assert_eq!(o.autocorr_time[0], 2.0);
        assert_eq!(o.mean[0], vec![1.5]);

        assert!(o.rebin_len[1].is_nan());
        assert!(o.rebin_count[1].is_nan());
        assert!(o.autocorr_time[1].is_nan());
        assert_eq!(o.mean[1].len(), 1);
        assert!(o.mean[1][0].is_nan());
        assert!(o.error[1][0].is_nan());
    }

    #[test]
    fn ragged_vector_lengths_are_kept_per_task() {
        let a = archive(
            r#"[
                {"parameters": {},
                 "results": {"Corr": {"mean": [1.0, 2.0, 3.0],
                                      "error": [0.1, 0.1, 0.1]}}},
                {"parameters": {},
                 "results": {"Corr": {"mean": [1.0, 2.0],
                                      "error": [0.1, 0.1]}}}
            ]"#,
        );
        let o = &a.observables["Corr"];
        assert_eq!(o.mean[0].len(), 3);
        assert_eq!(o.mean[1].len(), 2);
    }

    #[test]
    fn from_records_validates_entries() {
        use crate::model::{ObservableEntry, TaskRecord};
        use std::collections::BTreeMap;

        let entry: ObservableEntry =
            serde_json::from_str(r#"{"mean": [1.0, 2.0], "error": [0.1]}"#).unwrap();
        let mut results = BTreeMap::new();
        results.insert("Corr".to_string(), entry);
        let task = TaskRecord {
            parameters: BTreeMap::new(),
            results: Some(results),
        };
        assert!(McArchive::from_records(vec![task]).is_err());
    }
}
