//! Command implementations and argument parsing for the `kextend` CLI.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use kextend_core::{
    Algorithm, Capture, Classification, Classifier, Family, FuzzConfig, Fuzzer, GenerateError,
    OutcomeCounts, RunOutcome, TestCase, UnknownAlgorithm,
};
use kextend_runner::{
    BatchConfig, BatchExecutor, BatchReport, FlagConvention, HarnessError, Job, OutputRequest,
    SolverCommand, fuzz_jobs, load_corpus_dir, write_corpus, write_records,
};
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FUZZ_COUNT: u64 = 100;
const DEFAULT_IMPOSSIBLE_PROBABILITY: f64 = 0.1;
const DEFAULT_FUZZ_ARCHIVE: &str = "fuzz_failures";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "kextend",
    about = "Check a k-copy graph extension solver against independent verifiers."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the solver over corpus directories.
    Batch(BatchArgs),
    /// Run the solver over seeded random cases.
    Fuzz(FuzzArgs),
    /// Write the structured case families to disk.
    Generate(GenerateArgs),
    /// Judge a saved solver answer without running the solver.
    Check(CheckArgs),
}

/// Solver argument convention.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ConventionArg {
    /// `-a` selects the approximate algorithm.
    #[default]
    Dashed,
    /// An `exact`/`approx` token follows the input path.
    Positional,
}

impl From<ConventionArg> for FlagConvention {
    fn from(value: ConventionArg) -> Self {
        match value {
            ConventionArg::Dashed => Self::Dashed,
            ConventionArg::Positional => Self::Positional,
        }
    }
}

/// Output dialect to request from the solver.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputArg {
    /// Pass no format flag.
    #[default]
    Default,
    /// Request the verbose dialect (`-v`).
    Verbose,
    /// Request the compact dialect (`-r`).
    Compact,
}

impl From<OutputArg> for OutputRequest {
    fn from(value: OutputArg) -> Self {
        match value {
            OutputArg::Default => Self::SolverDefault,
            OutputArg::Verbose => Self::Verbose,
            OutputArg::Compact => Self::Compact,
        }
    }
}

/// Structured case family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    /// Small adversarial instances.
    Tricky,
    /// Solvable boundary instances.
    Valid,
    /// Larger stress instances.
    Nightmare,
}

impl From<FamilyArg> for Family {
    fn from(value: FamilyArg) -> Self {
        match value {
            FamilyArg::Tricky => Self::Tricky,
            FamilyArg::Valid => Self::Valid,
            FamilyArg::Nightmare => Self::Nightmare,
        }
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, UnknownAlgorithm> {
    raw.parse()
}

/// How to run the solver and where to put the results.
#[derive(Debug, Args, Clone)]
pub struct SolverArgs {
    /// Path to the solver executable.
    #[arg(long)]
    pub solver: PathBuf,

    /// Argument placed before the input path, repeatable.
    #[arg(long = "solver-arg", allow_hyphen_values = true)]
    pub solver_args: Vec<String>,

    /// Algorithm to run, repeatable. Both run when omitted.
    #[arg(long = "algorithm", value_parser = parse_algorithm)]
    pub algorithms: Vec<Algorithm>,

    /// Wall-clock budget per run in seconds.
    #[arg(
        long = "timeout",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub timeout_secs: u64,

    /// Solver processes run at once. Runs are sequential by default.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Argument convention of the solver.
    #[arg(long, value_enum, default_value_t = ConventionArg::Dashed)]
    pub convention: ConventionArg,

    /// Output dialect to request.
    #[arg(long = "output-format", value_enum, default_value_t = OutputArg::Default)]
    pub output_format: OutputArg,

    /// Write per-test JSON records to this file.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Save failing inputs into this directory.
    #[arg(long = "archive-dir")]
    pub archive_dir: Option<PathBuf>,

    /// Stop launching runs after this many failures.
    #[arg(long = "max-failures")]
    pub max_failures: Option<usize>,

    /// Treat non-canonical copy order as a validation failure.
    #[arg(long = "strict-order")]
    pub strict_order: bool,
}

impl SolverArgs {
    fn algorithms(&self) -> Vec<Algorithm> {
        if self.algorithms.is_empty() {
            return Algorithm::all().to_vec();
        }
        let mut algorithms = self.algorithms.clone();
        algorithms.sort_unstable();
        algorithms.dedup();
        algorithms
    }

    fn command(&self) -> SolverCommand {
        SolverCommand::new(self.solver.clone())
            .with_leading_args(self.solver_args.clone())
            .with_convention(self.convention.into())
            .with_output(self.output_format.into())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }

    fn batch_config(&self, archive_dir: Option<PathBuf>) -> BatchConfig {
        let config = BatchConfig::default()
            .with_strict_order(self.strict_order)
            .with_max_failures(self.max_failures)
            .with_archive_dir(archive_dir);
        match self.workers {
            Some(workers) => config.with_workers(workers),
            None => config,
        }
    }
}

/// Options accepted by the `batch` command.
#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Solver and result options.
    #[command(flatten)]
    pub solver: SolverArgs,

    /// Corpus directories, one `.txt` input per case.
    #[arg(required = true)]
    pub corpus: Vec<PathBuf>,
}

/// Options accepted by the `fuzz` command.
#[derive(Debug, Args, Clone)]
pub struct FuzzArgs {
    /// Solver and result options. Failing inputs are archived under
    /// `fuzz_failures` unless `--archive-dir` says otherwise.
    #[command(flatten)]
    pub solver: SolverArgs,

    /// Number of random cases.
    #[arg(long, default_value_t = DEFAULT_FUZZ_COUNT)]
    pub count: u64,

    /// Base seed. Drawn from the clock when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Chance that a case asks for more copies than can exist.
    #[arg(long = "impossible-probability", default_value_t = DEFAULT_IMPOSSIBLE_PROBABILITY)]
    pub impossible_probability: f64,

    /// Chance that a copy of the pattern is planted in the target.
    #[arg(long = "planted-probability", default_value_t = 0.0)]
    pub planted_probability: f64,
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Directory receiving one `tests_<family>` corpus per family.
    #[arg(long = "out-dir", default_value = "corpus")]
    pub out_dir: PathBuf,

    /// Family to write, repeatable. All families when omitted.
    #[arg(long = "family", value_enum)]
    pub families: Vec<FamilyArg>,

    /// Seed for the randomised families and fuzz cases.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Also write this many fuzz cases into `tests_fuzz`.
    #[arg(long = "fuzz-count", default_value_t = 0)]
    pub fuzz_count: u64,

    /// Chance that a fuzz case is impossible.
    #[arg(long = "impossible-probability", default_value_t = DEFAULT_IMPOSSIBLE_PROBABILITY)]
    pub impossible_probability: f64,
}

/// Options accepted by the `check` command.
#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    /// The input file the solver was given.
    pub input: PathBuf,

    /// The solver's captured standard output.
    pub stdout: PathBuf,

    /// The solver's captured standard error.
    #[arg(long)]
    pub stderr: Option<PathBuf>,

    /// The solver's exit status.
    #[arg(long = "exit-code", default_value_t = 0, allow_hyphen_values = true)]
    pub exit_code: i32,

    /// Treat non-canonical copy order as a validation failure.
    #[arg(long = "strict-order")]
    pub strict_order: bool,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file named on the command line could not be read.
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Running the harness failed.
    #[error(transparent)]
    Harness(#[from] HarnessError),
    /// Case generation failed.
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl CliError {
    /// Stable code of the underlying library error, if any.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Io { .. } => None,
            Self::Harness(err) => Some(err.code().as_str()),
            Self::Generate(err) => Some(err.code().as_str()),
        }
    }
}

/// Result of a `batch` or `fuzz` run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Records and counts.
    pub report: BatchReport,
    /// Where the records were written.
    pub results: Option<PathBuf>,
    /// Base seed of a fuzz campaign.
    pub seed: Option<u64>,
}

/// Result of a `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateSummary {
    /// Corpus directories written and their case counts.
    pub corpora: Vec<(PathBuf, usize)>,
}

/// Result of a `check` run.
#[derive(Debug, Clone)]
pub struct CheckSummary {
    /// The judged input.
    pub input: PathBuf,
    /// The judgement.
    pub classification: Classification,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub enum ExecutionSummary {
    /// A `batch` or `fuzz` run.
    Batch(BatchSummary),
    /// A `generate` run.
    Generate(GenerateSummary),
    /// A `check` run.
    Check(CheckSummary),
}

impl ExecutionSummary {
    /// Whether every judged run passed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        match self {
            Self::Batch(batch) => batch.report.is_clean(),
            Self::Generate(_) => true,
            Self::Check(check) => check.classification.verdict.is_pass(),
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the run cannot be set up. Failing tests are
/// part of the summary, not errors.
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Batch(args) => {
            span.record("command", field::display("batch"));
            run_batch(args)
        }
        Command::Fuzz(args) => {
            span.record("command", field::display("fuzz"));
            run_fuzz(args)
        }
        Command::Generate(args) => {
            span.record("command", field::display("generate"));
            run_generate(&args)
        }
        Command::Check(args) => {
            span.record("command", field::display("check"));
            run_check(&args)
        }
    }
}

#[instrument(name = "cli.batch", err, skip(args), fields(corpora = args.corpus.len(), jobs = field::Empty))]
pub(super) fn run_batch(args: BatchArgs) -> Result<ExecutionSummary, CliError> {
    let algorithms = args.solver.algorithms();
    let mut jobs: Vec<Job> = Vec::new();
    for dir in &args.corpus {
        for entry in load_corpus_dir(dir)? {
            jobs.extend(entry.jobs(&algorithms));
        }
    }
    Span::current().record("jobs", jobs.len());
    let archive_dir = args.solver.archive_dir.clone();
    execute(&args.solver, &jobs, archive_dir, None)
}

#[instrument(name = "cli.fuzz", err, skip(args), fields(count = args.count, seed = field::Empty))]
pub(super) fn run_fuzz(args: FuzzArgs) -> Result<ExecutionSummary, CliError> {
    let seed = args.seed.unwrap_or_else(clock_seed);
    Span::current().record("seed", seed);
    info!(seed, "fuzz campaign started");

    let config = FuzzConfig::default()
        .with_impossible_probability(args.impossible_probability)
        .with_planted_probability(args.planted_probability);
    let fuzzer = Fuzzer::new(config)?;
    let jobs = fuzz_jobs(&fuzzer, seed, args.count, &args.solver.algorithms())?;
    let archive_dir = args
        .solver
        .archive_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FUZZ_ARCHIVE));
    execute(&args.solver, &jobs, Some(archive_dir), Some(seed))
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            elapsed.as_secs() ^ u64::from(elapsed.subsec_nanos())
        })
}

fn execute(
    solver: &SolverArgs,
    jobs: &[Job],
    archive_dir: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<ExecutionSummary, CliError> {
    let executor = BatchExecutor::new(solver.command(), solver.batch_config(archive_dir))?;
    let report = executor.run(jobs)?;
    if let Some(path) = &solver.output {
        write_records(path, &report.records)?;
    }
    Ok(ExecutionSummary::Batch(BatchSummary {
        report,
        results: solver.output.clone(),
        seed,
    }))
}

#[instrument(name = "cli.generate", err, skip(args), fields(out_dir = %args.out_dir.display()))]
pub(super) fn run_generate(args: &GenerateArgs) -> Result<ExecutionSummary, CliError> {
    let families: Vec<Family> = if args.families.is_empty() {
        Family::all().to_vec()
    } else {
        args.families.iter().map(|&family| family.into()).collect()
    };

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let mut corpora = Vec::new();
    for family in families {
        let cases = family.generate(&mut rng)?;
        let dir = args.out_dir.join(format!("tests_{family}"));
        let written = write_corpus(&dir, &cases)?;
        corpora.push((dir, written.len()));
    }

    if args.fuzz_count > 0 {
        let fuzzer = Fuzzer::new(
            FuzzConfig::default().with_impossible_probability(args.impossible_probability),
        )?;
        let cases = fuzzer
            .campaign(args.seed, args.fuzz_count)
            .collect::<Result<Vec<_>, _>>()?;
        let dir = args.out_dir.join("tests_fuzz");
        let written = write_corpus(&dir, &cases)?;
        corpora.push((dir, written.len()));
    }

    Ok(ExecutionSummary::Generate(GenerateSummary { corpora }))
}

#[instrument(name = "cli.check", err, skip(args), fields(input = %args.input.display()))]
pub(super) fn run_check(args: &CheckArgs) -> Result<ExecutionSummary, CliError> {
    let text = read_text(&args.input)?;
    let stdout = read_text(&args.stdout)?;
    let stderr = args
        .stderr
        .as_deref()
        .map(read_text)
        .transpose()?
        .unwrap_or_default();
    let run = RunOutcome::Completed(Capture {
        stdout,
        stderr,
        exit_code: Some(args.exit_code),
        ..Capture::default()
    });

    let classifier = Classifier::new().with_strict_order(args.strict_order);
    let classification = match TestCase::parse(&text) {
        Ok(case) => classifier.classify((&case).into(), &run),
        Err(error) => classifier.classify((&error).into(), &run),
    };
    info!(outcome = %classification.verdict.code(), "check finished");
    Ok(ExecutionSummary::Check(CheckSummary {
        input: args.input.clone(),
        classification,
    }))
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Batch(batch) => render_batch(batch, &mut writer),
        ExecutionSummary::Generate(generate) => {
            for (dir, cases) in &generate.corpora {
                writeln!(writer, "{}\t{cases} cases", dir.display())?;
            }
            Ok(())
        }
        ExecutionSummary::Check(check) => render_check(check, &mut writer),
    }
}

fn render_batch(summary: &BatchSummary, writer: &mut impl Write) -> io::Result<()> {
    let report = &summary.report;
    if let Some(seed) = summary.seed {
        writeln!(writer, "seed: {seed}")?;
    }
    writeln!(writer, "runs: {}", report.records.len())?;
    if report.skipped > 0 {
        writeln!(writer, "skipped: {}", report.skipped)?;
    }
    render_counts(writer, "overall", report.aggregator.overall())?;
    for (algorithm, counts) in report.aggregator.by_algorithm() {
        render_counts(writer, &format!("algorithm {algorithm}"), counts)?;
    }
    for (source, counts) in report.aggregator.by_source() {
        render_counts(writer, &format!("source {source}"), counts)?;
    }

    let mut failures = report.records.iter().filter(|record| !record.passed).peekable();
    if failures.peek().is_some() {
        writeln!(writer, "failures:")?;
        for record in failures {
            writeln!(
                writer,
                "  {}\t{}\t{}\t{}",
                record.test, record.algorithm, record.outcome, record.detail
            )?;
        }
    }
    for path in &report.archived {
        writeln!(writer, "archived: {}", path.display())?;
    }
    if let Some(path) = &summary.results {
        writeln!(writer, "results: {}", path.display())?;
    }
    Ok(())
}

fn render_counts(writer: &mut impl Write, label: &str, counts: &OutcomeCounts) -> io::Result<()> {
    let mean = counts.mean_passing_time().map_or_else(
        || "n/a".to_owned(),
        |time| format!("{:.3} ms", time.as_secs_f64() * 1000.0),
    );
    writeln!(
        writer,
        "{label}\tpassed {}\tok {}\tvalidation {}\tparse {}\tno-solution {}/{}\timpossible {}\ttimeout {}\tprocess {}\tmean {mean}",
        counts.pass_rate(),
        counts.ok,
        counts.validation_failures,
        counts.parse_errors,
        counts.expected_no_solution,
        counts.unexpected_no_solution,
        counts.impossible,
        counts.timeouts,
        counts.process_errors,
    )
}

fn render_check(summary: &CheckSummary, writer: &mut impl Write) -> io::Result<()> {
    let classification = &summary.classification;
    writeln!(writer, "input: {}", summary.input.display())?;
    writeln!(writer, "outcome: {}", classification.verdict.code())?;
    writeln!(writer, "detail: {}", classification.verdict)?;
    if let Some(cost) = classification.reported_cost {
        writeln!(writer, "cost: {cost}")?;
    }
    for note in &classification.notes {
        writeln!(writer, "note: {note}")?;
    }
    Ok(())
}
