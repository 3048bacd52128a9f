use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// ParamValue – a single cell in a parameter column
// ---------------------------------------------------------------------------

/// A dynamically-typed task parameter value.
///
/// Archives carry whatever the job file put in them: temperatures as floats,
/// lattice sizes as integers, model names as strings, the odd boolean switch,
/// and occasionally a nested structure this crate only passes through.
/// Missing keys and explicit JSON `null` both map to [`ParamValue::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
    /// Nested arrays/objects kept opaque; never coerced, never orderable.
    Opaque(serde_json::Value),
}

impl ParamValue {
    /// Convert a raw JSON value into a tagged parameter value.
    pub fn from_json(val: &serde_json::Value) -> ParamValue {
        use serde_json::Value;
        match val {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ParamValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    ParamValue::Float(f)
                } else {
                    ParamValue::Opaque(val.clone())
                }
            }
            Value::String(s) => ParamValue::String(s.clone()),
            other => ParamValue::Opaque(other.clone()),
        }
    }

    /// Interpret the value as `f64` where that is lossless in spirit.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Ordering used for `unique` parameter queries.
    ///
    /// Integers and floats compare numerically with each other; values of the
    /// same variant compare naturally, and `Null` equals `Null` (consistent
    /// with `PartialEq`, which filtering relies on). Every other pairing
    /// (and anything involving `Opaque`) has no defined order and yields
    /// `None`, which the query layer turns into an `IncomparableTypes` error.
    pub fn try_cmp(&self, other: &ParamValue) -> Option<Ordering> {
        use ParamValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => Some(a.total_cmp(b)),
            (Integer(a), Float(b)) => Some((*a as f64).total_cmp(b)),
            (Float(a), Integer(b)) => Some(a.total_cmp(&(*b as f64))),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Null, Null) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::String(s) => write!(f, "{s}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Null => write!(f, "<null>"),
            ParamValue::Opaque(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

// ---------------------------------------------------------------------------
// ObservableEntry – one task's report of one observable
// ---------------------------------------------------------------------------

fn nan() -> f64 {
    f64::NAN
}

/// Raw per-task estimate of a single observable, as stored in the archive.
///
/// Two field-name conventions exist in the wild; the serde aliases fold the
/// older spelled-out names onto the canonical short ones at parse time.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservableEntry {
    /// Component-wise estimated mean; length ≥ 1 (scalar observables have
    /// length exactly 1).
    pub mean: Vec<f64>,
    /// Component-wise estimated error; same length as `mean`.
    pub error: Vec<f64>,
    #[serde(default, alias = "rebinning_bin_length")]
    pub rebin_len: u64,
    #[serde(default, alias = "rebinning_bin_count")]
    pub rebin_count: u64,
    /// NaN when the archive did not record an autocorrelation time.
    #[serde(default = "nan", alias = "autocorrelation_time")]
    pub autocorr_time: f64,
}

// ---------------------------------------------------------------------------
// TaskRecord – one task of the archive
// ---------------------------------------------------------------------------

/// One independently-parameterized simulation task.
///
/// `results` is `None` for tasks whose runs have not been merged yet; that is
/// a legal state, not an error.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub parameters: BTreeMap<String, ParamValue>,
    pub results: Option<BTreeMap<String, ObservableEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn from_json_tags_scalars() {
        let v: serde_json::Value = serde_json::json!({
            "a": 1, "b": 2.5, "c": "x", "d": true, "e": null, "f": [1, 2]
        });
        let obj = v.as_object().unwrap();
        assert_eq!(ParamValue::from_json(&obj["a"]), ParamValue::Integer(1));
        assert_eq!(ParamValue::from_json(&obj["b"]), ParamValue::Float(2.5));
        assert_eq!(
            ParamValue::from_json(&obj["c"]),
            ParamValue::String("x".into())
        );
        assert_eq!(ParamValue::from_json(&obj["d"]), ParamValue::Bool(true));
        assert_eq!(ParamValue::from_json(&obj["e"]), ParamValue::Null);
        assert!(matches!(
            ParamValue::from_json(&obj["f"]),
            ParamValue::Opaque(_)
        ));
    }

    #[test]
    fn equality_is_strict_across_types() {
        assert_ne!(ParamValue::Integer(1), ParamValue::Float(1.0));
        assert_ne!(ParamValue::String("1".into()), ParamValue::Integer(1));
        assert_ne!(ParamValue::from("true"), ParamValue::from(true));
    }

    #[test]
    fn numeric_values_read_back_as_f64() {
        assert_eq!(ParamValue::from(2_i64).as_f64(), Some(2.0));
        assert_eq!(ParamValue::from(0.5).as_f64(), Some(0.5));
        assert_eq!(ParamValue::from("x").as_f64(), None);
        assert_eq!(ParamValue::Null.as_f64(), None);
    }

    #[test]
    fn try_cmp_mixes_numerics_only() {
        let one = ParamValue::Integer(1);
        let one_f = ParamValue::Float(1.0);
        let two = ParamValue::Float(2.0);
        assert_eq!(one.try_cmp(&one_f), Some(Ordering::Equal));
        assert_eq!(one.try_cmp(&two), Some(Ordering::Less));
        assert_eq!(one.try_cmp(&ParamValue::String("a".into())), None);
        assert_eq!(
            ParamValue::Null.try_cmp(&ParamValue::Null),
            Some(Ordering::Equal)
        );
        assert_eq!(ParamValue::Null.try_cmp(&one), None);
    }

    #[test]
    fn entry_aliases_normalize() {
        let old: ObservableEntry = serde_json::from_str(
            r#"{"mean": [1.0], "error": [0.1],
                "rebinning_bin_length": 100, "rebinning_bin_count": 20,
                "autocorrelation_time": 1.5}"#,
        )
        .unwrap();
        assert_eq!(old.rebin_len, 100);
        assert_eq!(old.rebin_count, 20);
        assert_eq!(old.autocorr_time, 1.5);

        let new: ObservableEntry = serde_json::from_str(
            r#"{"mean": [1.0], "error": [0.1], "rebin_len": 50}"#,
        )
        .unwrap();
        assert_eq!(new.rebin_len, 50);
        assert_eq!(new.rebin_count, 0);
        assert!(new.autocorr_time.is_nan());
    }

    #[test]
    fn entry_requires_mean_and_error() {
        assert!(serde_json::from_str::<ObservableEntry>(r#"{"mean": [1.0]}"#).is_err());
        assert!(serde_json::from_str::<ObservableEntry>(r#"{"error": [0.1]}"#).is_err());
    }
}
