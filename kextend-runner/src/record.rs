//! Per-test JSON records, the only artefact a run persists.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use kextend_core::{Algorithm, Classification, Dimensions, Verdict};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// One solver run as written to the results file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Case name.
    pub test: String,
    /// Generator or corpus directory the case came from.
    pub source: String,
    /// `exact` or `approx`.
    pub algorithm: String,
    /// Pattern order, absent for malformed inputs.
    pub n1: Option<usize>,
    /// Target order, absent for malformed inputs.
    pub n2: Option<usize>,
    /// Requested copies, absent for malformed inputs.
    pub k: Option<usize>,
    /// Solver time in milliseconds with microsecond precision.
    pub time_ms: Option<f64>,
    /// Cost the solver reported.
    pub cost: Option<u64>,
    /// Outcome code such as `OK` or `VALIDATION_FAILURE`.
    pub outcome: String,
    /// Whether the outcome counts as a pass.
    pub passed: bool,
    /// Human-readable explanation of the outcome.
    pub detail: String,
    /// For `NO_SOLUTION`, whether the instance truly has no answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<bool>,
    /// Fuzz seed of the case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Non-failing observations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl TestRecord {
    /// Builds the record for one classified run.
    #[must_use]
    pub fn new(
        test: &str,
        source: &str,
        algorithm: Algorithm,
        dimensions: Option<Dimensions>,
        seed: Option<u64>,
        classification: &Classification,
    ) -> Self {
        let expected = match classification.verdict {
            Verdict::NoSolution { expected } => Some(expected),
            _ => None,
        };
        Self {
            test: test.to_owned(),
            source: source.to_owned(),
            algorithm: algorithm.as_str().to_owned(),
            n1: dimensions.map(|d| d.pattern_order),
            n2: dimensions.map(|d| d.target_order),
            k: dimensions.map(|d| d.copies),
            time_ms: classification
                .solver_time
                .map(|time| time.as_secs_f64() * 1000.0),
            cost: classification.reported_cost,
            outcome: classification.verdict.code().as_str().to_owned(),
            passed: classification.verdict.is_pass(),
            detail: classification.verdict.to_string(),
            expected,
            seed,
            notes: classification.notes.clone(),
        }
    }
}

/// Writes `records` to `path` as a pretty-printed JSON array.
///
/// # Errors
/// Returns [`HarnessError`] if the file cannot be written.
pub fn write_records(path: &Path, records: &[TestRecord]) -> Result<(), HarnessError> {
    let file = File::create(path).map_err(|source| HarnessError::write_file(path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|source| HarnessError::Serialize { source })?;
    writeln!(writer).map_err(|source| HarnessError::write_file(path, source))?;
    writer
        .flush()
        .map_err(|source| HarnessError::write_file(path, source))
}
