use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::archive::McArchive;
use crate::error::{ArchiveError, Result};
use crate::model::ParamValue;

// ---------------------------------------------------------------------------
// Constraints: conjunction of exact-equality conditions on parameter columns
// ---------------------------------------------------------------------------

/// Maps parameter name → required value. A task is selected only if every
/// entry matches its column value exactly; an empty map selects all tasks.
pub type Constraints = BTreeMap<String, ParamValue>;

// ---------------------------------------------------------------------------
// ParamColumn – a filtered view of one parameter column
// ---------------------------------------------------------------------------

/// A parameter selection, densified when the values allow it.
///
/// A selection whose values are all `Integer` (or all `Float`) is coerced
/// into a plain numeric vector for arithmetic convenience. Everything else,
/// including the empty selection, stays as tagged values.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamColumn {
    Values(Vec<ParamValue>),
    Integers(Vec<i64>),
    Floats(Vec<f64>),
}

impl ParamColumn {
    fn densify(selection: Vec<ParamValue>) -> ParamColumn {
        if selection.is_empty() {
            return ParamColumn::Values(selection);
        }
        let integers: Option<Vec<i64>> = selection
            .iter()
            .map(|v| match v {
                ParamValue::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        if let Some(integers) = integers {
            return ParamColumn::Integers(integers);
        }
        let floats: Option<Vec<f64>> = selection
            .iter()
            .map(|v| match v {
                ParamValue::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        if let Some(floats) = floats {
            return ParamColumn::Floats(floats);
        }
        ParamColumn::Values(selection)
    }

    /// Number of selected values.
    pub fn len(&self) -> usize {
        match self {
            ParamColumn::Values(v) => v.len(),
            ParamColumn::Integers(v) => v.len(),
            ParamColumn::Floats(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_integers(&self) -> Option<&[i64]> {
        match self {
            ParamColumn::Integers(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            ParamColumn::Floats(v) => Some(v),
            _ => None,
        }
    }

    /// The selection as tagged values, re-tagging densified numerics.
    pub fn to_values(&self) -> Vec<ParamValue> {
        match self {
            ParamColumn::Values(v) => v.clone(),
            ParamColumn::Integers(v) => v.iter().map(|&i| ParamValue::Integer(i)).collect(),
            ParamColumn::Floats(v) => v.iter().map(|&f| ParamValue::Float(f)).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ObsColumn – mean/error after shape normalization
// ---------------------------------------------------------------------------

/// A filtered mean or error column in its tightest safe shape.
///
/// Selection starts ragged (one variable-length row per task). When every
/// selected row has the same length the column densifies to `Matrix`; when
/// that common length is 1 it flattens further to `Scalar`. An empty
/// selection stays `Ragged`.
#[derive(Debug, Clone, PartialEq)]
pub enum ObsColumn {
    /// One value per selected task (all rows had length 1).
    Scalar(Vec<f64>),
    /// Selected tasks × components, all rows the same length.
    Matrix(Vec<Vec<f64>>),
    /// Rows of differing lengths, kept per task.
    Ragged(Vec<Vec<f64>>),
}

impl ObsColumn {
    /// Number of selected tasks.
    pub fn len(&self) -> usize {
        match self {
            ObsColumn::Scalar(v) => v.len(),
            ObsColumn::Matrix(rows) | ObsColumn::Ragged(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The row for the `i`-th selected task, regardless of shape.
    pub fn row(&self, i: usize) -> &[f64] {
        match self {
            ObsColumn::Scalar(v) => std::slice::from_ref(&v[i]),
            ObsColumn::Matrix(rows) | ObsColumn::Ragged(rows) => &rows[i],
        }
    }

    pub fn as_scalar(&self) -> Option<&[f64]> {
        match self {
            ObsColumn::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&[Vec<f64>]> {
        match self {
            ObsColumn::Matrix(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Normalize a selected mean/error pair into their tightest shape.
///
/// The shape decision is made on the mean rows and applied to both columns;
/// the load-time invariant guarantees error rows have matching lengths.
fn normalize_pair(mean: Vec<Vec<f64>>, error: Vec<Vec<f64>>) -> (ObsColumn, ObsColumn) {
    let width = match mean.first() {
        Some(first) => first.len(),
        None => return (ObsColumn::Ragged(mean), ObsColumn::Ragged(error)),
    };
    if !mean.iter().all(|row| row.len() == width) {
        return (ObsColumn::Ragged(mean), ObsColumn::Ragged(error));
    }
    if width == 1 {
        let flatten = |rows: Vec<Vec<f64>>| rows.into_iter().map(|row| row[0]).collect();
        (ObsColumn::Scalar(flatten(mean)), ObsColumn::Scalar(flatten(error)))
    } else {
        (ObsColumn::Matrix(mean), ObsColumn::Matrix(error))
    }
}

// ---------------------------------------------------------------------------
// Observable – a filtered view of one observable
// ---------------------------------------------------------------------------

/// Query result for one observable: the five per-task columns restricted to
/// the selected tasks, mean/error shape-normalized.
#[derive(Debug, Clone)]
pub struct Observable {
    pub rebin_len: Vec<f64>,
    pub rebin_count: Vec<f64>,
    pub autocorr_time: Vec<f64>,
    pub mean: ObsColumn,
    pub error: ObsColumn,
}

impl Observable {
    /// Number of selected tasks.
    pub fn num_tasks(&self) -> usize {
        self.rebin_len.len()
    }
}

// ---------------------------------------------------------------------------
// Query Engine
// ---------------------------------------------------------------------------

/// Comparison class of a parameter value. Values sort only within one class;
/// integers and floats share the numeric class.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueClass {
    Numeric,
    String,
    Bool,
    Null,
}

fn value_class(value: &ParamValue) -> Option<ValueClass> {
    match value {
        ParamValue::Integer(_) | ParamValue::Float(_) => Some(ValueClass::Numeric),
        ParamValue::String(_) => Some(ValueClass::String),
        ParamValue::Bool(_) => Some(ValueClass::Bool),
        ParamValue::Null => Some(ValueClass::Null),
        ParamValue::Opaque(_) => None,
    }
}

/// Check that every selected value belongs to the same comparison class, so
/// that `try_cmp` is a total order over the selection. Opaque values never
/// sort; everything else sorts iff the selection is single-class (an
/// all-`Null` selection is trivially ordered).
fn ensure_orderable(name: &str, selection: &[ParamValue]) -> Result<()> {
    let mut classes = selection.iter().map(value_class);
    let first = match classes.next() {
        Some(class) => class.ok_or_else(|| ArchiveError::IncomparableTypes(name.to_string()))?,
        None => return Ok(()),
    };
    for class in classes {
        if class != Some(first) {
            return Err(ArchiveError::IncomparableTypes(name.to_string()));
        }
    }
    Ok(())
}

fn select<T: Clone>(column: &[T], mask: &[bool]) -> Vec<T> {
    column
        .iter()
        .zip(mask)
        .filter(|(_, &keep)| keep)
        .map(|(value, _)| value.clone())
        .collect()
}

impl McArchive {
    /// Boolean task-selection mask for a conjunction of equality constraints.
    ///
    /// Task `i` is selected iff for every `(key, value)` constraint its
    /// parameter column holds exactly `value` at position `i`. Equality is
    /// strict: `Integer(1)` does not match `Float(1.0)`. A key the archive
    /// never saw behaves like a column of absent values, so it matches only
    /// a `Null` constraint.
    pub fn filter_mask(&self, constraints: &Constraints) -> Vec<bool> {
        if constraints.is_empty() {
            return vec![true; self.num_tasks];
        }
        (0..self.num_tasks)
            .map(|i| {
                constraints.iter().all(|(key, want)| {
                    let have = self
                        .parameters
                        .get(key)
                        .map_or(&ParamValue::Null, |column| &column[i]);
                    have == want
                })
            })
            .collect()
    }

    /// Filtered view of one parameter column, in task order.
    ///
    /// Fails with [`ArchiveError::UnknownParameter`] only if `name` was never
    /// a parameter key anywhere in the archive; a known parameter whose
    /// filter matches zero tasks yields an empty selection. With `unique`,
    /// the selection is sorted and deduplicated, which requires all selected
    /// values to be mutually orderable.
    pub fn get_parameter(
        &self,
        name: &str,
        unique: bool,
        constraints: &Constraints,
    ) -> Result<ParamColumn> {
        let column = self
            .parameters
            .get(name)
            .ok_or_else(|| ArchiveError::UnknownParameter(name.to_string()))?;

        let mask = self.filter_mask(constraints);
        let mut selection = select(column, &mask);

        if unique {
            // Verified single-class, so try_cmp is total here; the fallback
            // arm of unwrap_or is never taken.
            ensure_orderable(name, &selection)?;
            selection.sort_by(|a, b| a.try_cmp(b).unwrap_or(Ordering::Equal));
            selection.dedup_by(|a, b| a.try_cmp(b) == Some(Ordering::Equal));
        }

        Ok(ParamColumn::densify(selection))
    }

    /// Filtered, shape-normalized view of one observable.
    ///
    /// Fails with [`ArchiveError::UnknownObservable`] only if `name` was
    /// never reported by any task; a filter matching zero tasks yields an
    /// empty selection.
    pub fn get_observable(&self, name: &str, constraints: &Constraints) -> Result<Observable> {
        let columns = self
            .observables
            .get(name)
            .ok_or_else(|| ArchiveError::UnknownObservable(name.to_string()))?;

        let mask = self.filter_mask(constraints);
        let (mean, error) =
            normalize_pair(select(&columns.mean, &mask), select(&columns.error, &mask));

        Ok(Observable {
            rebin_len: select(&columns.rebin_len, &mask),
            rebin_count: select(&columns.rebin_count, &mask),
            autocorr_time: select(&columns.autocorr_time, &mask),
            mean,
            error,
        })
    }
}
