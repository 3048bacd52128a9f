//! Query layer over Monte Carlo simulation result archives.
//!
//! An archive (`*.results.json`) is an ordered array of per-task records:
//! the input parameters a task ran with, and the statistical observables its
//! merged runs produced. This crate loads one archive into an immutable
//! column-oriented structure and answers filtered queries over it.
//!
//! Architecture:
//! ```text
//!   *.results.json
//!         │
//!         ▼
//!    ┌──────────┐
//!    │  loader   │  parse records, normalize field aliases, validate
//!    └──────────┘
//!         │
//!         ▼
//!    ┌──────────┐
//!    │ McArchive │  per-parameter columns, per-observable columns
//!    └──────────┘
//!         │
//!         ▼
//!    ┌──────────┐
//!    │  query    │  filter_mask / get_parameter / get_observable
//!    └──────────┘
//! ```
//!
//! ```no_run
//! use mcarchive::{McArchive, Constraints, ParamValue};
//!
//! # fn main() -> mcarchive::Result<()> {
//! let archive = McArchive::load(std::path::Path::new("job.results.json"))?;
//! let mut at_tc = Constraints::new();
//! at_tc.insert("T".to_string(), ParamValue::Float(2.269));
//! let energy = archive.get_observable("Energy", &at_tc)?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod loader;
pub mod model;
pub mod query;

pub use archive::McArchive;
pub use error::{ArchiveError, Result};
pub use model::{ObservableEntry, ParamValue, TaskRecord};
pub use query::{Constraints, ObsColumn, Observable, ParamColumn};
