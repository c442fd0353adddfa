//! Parallel batch execution.
//!
//! Jobs run on a dedicated rayon pool. Each job writes its own input file,
//! named after its batch index, into a scratch directory private to the
//! batch, and owns its solver process; workers share nothing but the failure
//! counter and the [`AbortSignal`]. Results keep job order.

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use kextend_core::{
    Aggregator, Algorithm, CaseInput, Classifier, Dimensions, GeneratedCase, InputFormatError,
    TestCase, Verdict,
};
use rayon::{ThreadPoolBuilder, prelude::*};
use tracing::{Span, debug, field, info, instrument, warn};

use crate::{
    archive::FailureArchive, command::SolverCommand, error::HarnessError, record::TestRecord,
};

/// What a job sends to the solver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobInput {
    /// A well-formed instance.
    Case(TestCase),
    /// A file the harness could not parse, sent verbatim.
    Malformed {
        /// The file contents.
        text: String,
        /// Why the harness rejected it.
        error: InputFormatError,
    },
}

impl JobInput {
    /// Parses `text`, keeping it verbatim when it is malformed.
    #[must_use]
    pub fn parse(text: String) -> Self {
        match TestCase::parse(&text) {
            Ok(case) => Self::Case(case),
            Err(error) => Self::Malformed { text, error },
        }
    }

    /// The text written to the solver's input file.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Case(case) => Cow::Owned(case.to_input_string()),
            Self::Malformed { text, .. } => Cow::Borrowed(text),
        }
    }

    /// Instance sizes, absent for malformed inputs.
    #[must_use]
    pub fn dimensions(&self) -> Option<Dimensions> {
        match self {
            Self::Case(case) => Some(case.dimensions()),
            Self::Malformed { .. } => None,
        }
    }

    fn case_input(&self) -> CaseInput<'_> {
        match self {
            Self::Case(case) => CaseInput::Parsed(case),
            Self::Malformed { error, .. } => CaseInput::Malformed(error),
        }
    }
}

/// One solver run to perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    /// Case name, unique within its source.
    pub name: String,
    /// Generator or corpus directory the case came from.
    pub source: String,
    /// Fuzz seed, for generated random cases.
    pub seed: Option<u64>,
    /// Algorithm to run.
    pub algorithm: Algorithm,
    /// The input.
    pub input: JobInput,
}

impl Job {
    /// A job running `generated` with `algorithm`.
    #[must_use]
    pub fn generated(generated: &GeneratedCase, algorithm: Algorithm) -> Self {
        Self {
            name: generated.name.clone(),
            source: generated.source.clone(),
            seed: generated.seed,
            algorithm,
            input: JobInput::Case(generated.case.clone()),
        }
    }
}

/// Stops a batch from launching new jobs. Jobs already running finish or
/// time out normally.
#[derive(Clone, Debug, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    /// Requests the abort.
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether an abort was requested.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Batch settings.
///
/// Runs are sequential unless more workers are requested.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    workers: usize,
    strict_order: bool,
    max_failures: Option<usize>,
    archive_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            strict_order: false,
            max_failures: None,
            archive_dir: None,
        }
    }
}

impl BatchConfig {
    /// Number of solver processes run at once.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Treats non-canonical copy order as a validation failure.
    #[must_use]
    pub const fn with_strict_order(mut self, strict: bool) -> Self {
        self.strict_order = strict;
        self
    }

    /// Aborts the batch once this many runs have not passed.
    #[must_use]
    pub const fn with_max_failures(mut self, limit: Option<usize>) -> Self {
        self.max_failures = limit;
        self
    }

    /// Saves failing inputs into `dir`.
    #[must_use]
    pub fn with_archive_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.archive_dir = dir;
        self
    }

    /// The configured worker count.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    fn validate(&self) -> Result<(), HarnessError> {
        if self.workers == 0 {
            return Err(HarnessError::InvalidConfig {
                reason: "at least one worker is required".to_owned(),
            });
        }
        if self.max_failures == Some(0) {
            return Err(HarnessError::InvalidConfig {
                reason: "max failures must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Everything a finished batch produced.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    /// Records of the jobs that ran, in job order.
    pub records: Vec<TestRecord>,
    /// Counts over the jobs that ran.
    pub aggregator: Aggregator,
    /// Jobs not started because the batch was aborted.
    pub skipped: usize,
    /// Archived failing inputs.
    pub archived: Vec<PathBuf>,
}

impl BatchReport {
    /// Whether every job ran and passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.aggregator.all_passed()
    }
}

struct Executed {
    record: TestRecord,
    verdict: Verdict,
    time: Option<Duration>,
    archived: Option<PathBuf>,
}

/// Runs jobs against one solver.
#[derive(Debug)]
pub struct BatchExecutor {
    solver: SolverCommand,
    config: BatchConfig,
    classifier: Classifier,
    abort: AbortSignal,
}

impl BatchExecutor {
    /// Creates an executor after validating both configurations.
    ///
    /// # Errors
    /// Returns [`HarnessError::InvalidConfig`] for unusable settings.
    pub fn new(solver: SolverCommand, config: BatchConfig) -> Result<Self, HarnessError> {
        solver.validate()?;
        config.validate()?;
        let classifier = Classifier::new().with_strict_order(config.strict_order);
        Ok(Self {
            solver,
            config,
            classifier,
            abort: AbortSignal::default(),
        })
    }

    /// A handle that stops this executor from launching further jobs.
    #[must_use]
    pub fn abort_signal(&self) -> AbortSignal {
        self.abort.clone()
    }

    /// Runs every job and aggregates the results.
    ///
    /// # Errors
    /// Returns [`HarnessError`] when the scratch directory, worker pool,
    /// failure archive or an input file cannot be set up. Per-test problems
    /// are recorded, never returned.
    #[instrument(
        name = "runner.batch",
        skip_all,
        fields(jobs = jobs.len(), workers = self.config.workers, failed = field::Empty, skipped = field::Empty),
    )]
    pub fn run(&self, jobs: &[Job]) -> Result<BatchReport, HarnessError> {
        let scratch = tempfile::Builder::new()
            .prefix("kextend-")
            .tempdir()
            .map_err(|source| HarnessError::ScratchDir { source })?;
        let archive = self
            .config
            .archive_dir
            .as_ref()
            .map(FailureArchive::create)
            .transpose()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|source| HarnessError::WorkerPool { source })?;
        let failures = AtomicUsize::new(0);

        let executed = pool.install(|| {
            jobs.par_iter()
                .enumerate()
                .map(|(index, job)| {
                    self.run_job(scratch.path(), index, job, &failures, archive.as_ref())
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut report = BatchReport::default();
        for (job, outcome) in jobs.iter().zip(executed) {
            let Some(executed) = outcome else {
                report.skipped += 1;
                continue;
            };
            report
                .aggregator
                .record(&job.source, job.algorithm, &executed.verdict, executed.time);
            report.records.push(executed.record);
            report.archived.extend(executed.archived);
        }

        let span = Span::current();
        span.record("failed", report.aggregator.overall().failed());
        span.record("skipped", report.skipped);
        info!(
            passed = report.aggregator.overall().passed(),
            failed = report.aggregator.overall().failed(),
            skipped = report.skipped,
            "batch finished"
        );
        Ok(report)
    }

    fn run_job(
        &self,
        scratch: &Path,
        index: usize,
        job: &Job,
        failures: &AtomicUsize,
        archive: Option<&FailureArchive>,
    ) -> Result<Option<Executed>, HarnessError> {
        if self.abort.is_aborted() {
            debug!(test = %job.name, "batch aborted; job skipped");
            return Ok(None);
        }
        let path = scratch.join(format!("{index:05}_{}.txt", job.algorithm));
        let text = job.input.text();
        fs::write(&path, text.as_bytes()).map_err(|source| HarnessError::write_file(&path, source))?;

        let run = self.solver.run(&path, job.algorithm);
        let classification = self.classifier.classify(job.input.case_input(), &run);
        if let Err(err) = fs::remove_file(&path) {
            debug!(path = %path.display(), error = %err, "failed to remove input file");
        }

        let mut archived = None;
        if !classification.verdict.is_pass() {
            let failed = failures.fetch_add(1, Ordering::SeqCst) + 1;
            if self.config.max_failures.is_some_and(|limit| failed >= limit) {
                if !self.abort.is_aborted() {
                    warn!(failed, "failure limit reached; aborting batch");
                }
                self.abort.abort();
            }
            if let Some(archive) = archive {
                archived = Some(archive.persist(
                    &job.source,
                    &job.name,
                    job.seed,
                    job.algorithm,
                    &text,
                )?);
            }
        }

        info!(
            test = %job.name,
            algorithm = %job.algorithm,
            outcome = %classification.verdict.code(),
            "test finished"
        );
        let record = TestRecord::new(
            &job.name,
            &job.source,
            job.algorithm,
            job.input.dimensions(),
            job.seed,
            &classification,
        );
        Ok(Some(Executed {
            record,
            verdict: classification.verdict,
            time: classification.solver_time,
            archived,
        }))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use kextend_core::OutcomeKind;
    use kextend_test_support::{fake_solver::FakeSolver, tracing::RecordingLayer};
    use rstest::rstest;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const EDGE_INPUT: &str = "2\n0 1\n0 0\n2\n0 0\n0 0\n1\n";

    fn executor(solver: &FakeSolver, config: BatchConfig) -> Result<BatchExecutor, HarnessError> {
        let command = SolverCommand::new(solver.program())
            .with_leading_args([solver.script()])
            .with_timeout(Duration::from_secs(10));
        BatchExecutor::new(command, config)
    }

    fn edge_jobs(count: usize) -> Vec<Job> {
        (0..count)
            .map(|i| Job {
                name: format!("edge_{i}"),
                source: "valid".into(),
                seed: None,
                algorithm: Algorithm::Exact,
                input: JobInput::parse(EDGE_INPUT.into()),
            })
            .collect()
    }

    #[test]
    fn correct_solver_passes_every_job() -> TestResult {
        let solver = FakeSolver::printing("2\n0 1\n0 0\n1\n")?;
        let report = executor(&solver, BatchConfig::default().with_workers(3))?.run(&edge_jobs(6))?;
        assert_eq!(report.records.len(), 6);
        assert!(report.is_clean());
        let names: Vec<_> = report.records.iter().map(|r| r.test.as_str()).collect();
        assert_eq!(names, ["edge_0", "edge_1", "edge_2", "edge_3", "edge_4", "edge_5"]);
        Ok(())
    }

    #[test]
    fn failure_limit_stops_new_jobs() -> TestResult {
        let solver = FakeSolver::printing("2\n0 1\n0 0\n7\n")?;
        let config = BatchConfig::default()
            .with_workers(1)
            .with_max_failures(Some(2));
        let report = executor(&solver, config)?.run(&edge_jobs(5))?;
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.skipped, 3);
        assert!(!report.is_clean());
        Ok(())
    }

    #[test]
    fn failing_inputs_are_archived_verbatim() -> TestResult {
        let solver = FakeSolver::printing("2\n0 1\n0 0\n7\n")?;
        let archive_dir = solver.dir().join("failures");
        let config = BatchConfig::default()
            .with_workers(1)
            .with_archive_dir(Some(archive_dir.clone()));
        let mut jobs = edge_jobs(1);
        jobs[0].seed = Some(99);
        let report = executor(&solver, config)?.run(&jobs)?;
        assert_eq!(report.archived, [archive_dir.join("fuzz_fail_99_exact.txt")]);
        assert_eq!(fs::read_to_string(&report.archived[0])?, EDGE_INPUT);
        Ok(())
    }

    #[test]
    fn same_named_corpus_cases_archive_separately() -> TestResult {
        let solver = FakeSolver::printing("2\n0 1\n0 0\n7\n")?;
        let archive_dir = solver.dir().join("failures");
        let config = BatchConfig::default()
            .with_workers(2)
            .with_archive_dir(Some(archive_dir.clone()));
        let mut jobs = edge_jobs(2);
        for (job, source) in jobs.iter_mut().zip(["a", "b"]) {
            job.name = "case1".into();
            job.source = source.into();
        }
        let report = executor(&solver, config)?.run(&jobs)?;
        let mut archived = report.archived.clone();
        archived.sort();
        assert_eq!(
            archived,
            [
                archive_dir.join("fail_a_case1_exact.txt"),
                archive_dir.join("fail_b_case1_exact.txt"),
            ]
        );
        assert!(archived.iter().all(|path| path.is_file()));
        Ok(())
    }

    #[test]
    fn batches_run_sequentially_unless_asked() {
        assert_eq!(BatchConfig::default().workers(), 1);
    }

    #[test]
    fn malformed_inputs_are_sent_verbatim() -> TestResult {
        let solver = FakeSolver::builder()
            .stderr("ERROR: Invalid matrix row\n")
            .exit_code(1)
            .build()?;
        let job = Job {
            name: "broken".into(),
            source: "invalid".into(),
            seed: None,
            algorithm: Algorithm::Approximate,
            input: JobInput::parse("2\n0 1\n".into()),
        };
        assert!(matches!(job.input, JobInput::Malformed { .. }));
        let report = executor(&solver, BatchConfig::default())?.run(&[job])?;
        assert_eq!(report.records[0].outcome, OutcomeKind::Ok.as_str());
        assert_eq!(report.records[0].n1, None);
        Ok(())
    }

    #[rstest]
    #[case::workers(BatchConfig::default().with_workers(0))]
    #[case::limit(BatchConfig::default().with_max_failures(Some(0)))]
    fn invalid_configs_are_rejected(#[case] config: BatchConfig) -> TestResult {
        let solver = FakeSolver::printing("")?;
        let err = executor(&solver, config).expect_err("config must be rejected");
        assert!(matches!(err, HarnessError::InvalidConfig { .. }));
        Ok(())
    }

    #[test]
    fn batch_span_records_failures() -> TestResult {
        let solver = FakeSolver::printing("2\n0 1\n0 0\n7\n")?;
        let executor = executor(&solver, BatchConfig::default().with_workers(1))?;
        let (report, layer) = RecordingLayer::capture(|| executor.run(&edge_jobs(2)));
        assert_eq!(report?.aggregator.overall().failed(), 2);
        let spans = layer.spans_named("runner.batch");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].fields.get("failed").map(String::as_str), Some("2"));
        Ok(())
    }
}
