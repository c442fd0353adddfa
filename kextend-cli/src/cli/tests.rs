//! Unit tests for argument parsing and the command pipeline.

use super::commands::{run_check, run_generate};
use super::{
    CheckArgs, Cli, CliError, Command, ConventionArg, ExecutionSummary, GenerateArgs, OutputArg,
    render_summary, run_cli,
};

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use kextend_core::{Algorithm, OutcomeKind, Verdict};
use kextend_runner::load_corpus_dir;
use kextend_test_support::tracing::RecordingLayer;
use rstest::{fixture, rstest};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const EDGE_INPUT: &str = "2\n0 1\n0 0\n2\n0 0\n0 0\n1\n";
const EDGE_ANSWER: &str = "2\n0 1\n0 0\n1\n";

#[fixture]
fn workspace() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

fn write(dir: &Path, name: &str, contents: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

fn check_args(input: PathBuf, stdout: PathBuf) -> CheckArgs {
    CheckArgs {
        input,
        stdout,
        stderr: None,
        exit_code: 0,
        strict_order: false,
    }
}

#[rstest]
fn batch_parses_solver_options() -> TestResult {
    let cli = Cli::try_parse_from([
        "kextend",
        "batch",
        "--solver",
        "./solver",
        "--algorithm",
        "approx",
        "--convention",
        "positional",
        "--output-format",
        "compact",
        "--timeout",
        "5",
        "corpus/tests_tricky",
    ])?;
    let Command::Batch(args) = cli.command else {
        panic!("expected the batch command");
    };
    assert_eq!(args.solver.algorithms, [Algorithm::Approximate]);
    assert!(matches!(args.solver.convention, ConventionArg::Positional));
    assert!(matches!(args.solver.output_format, OutputArg::Compact));
    assert_eq!(args.solver.timeout_secs, 5);
    assert_eq!(args.corpus, [PathBuf::from("corpus/tests_tricky")]);
    Ok(())
}

#[rstest]
#[case::missing_corpus(&["kextend", "batch", "--solver", "s"][..])]
#[case::unknown_algorithm(&["kextend", "batch", "--solver", "s", "--algorithm", "greedy", "d"][..])]
#[case::zero_timeout(&["kextend", "batch", "--solver", "s", "--timeout", "0", "d"][..])]
#[case::unknown_convention(&["kextend", "fuzz", "--solver", "s", "--convention", "slash"][..])]
fn clap_rejects_invalid_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[rstest]
fn check_accepts_a_correct_answer(workspace: TempDir) -> TestResult {
    let input = write(workspace.path(), "edge.txt", EDGE_INPUT)?;
    let stdout = write(workspace.path(), "edge.out", EDGE_ANSWER)?;
    let summary = run_check(&check_args(input, stdout))?;
    assert!(summary.is_clean());
    let ExecutionSummary::Check(check) = summary else {
        panic!("expected a check summary");
    };
    assert_eq!(check.classification.verdict, Verdict::Ok);
    assert_eq!(check.classification.reported_cost, Some(1));
    Ok(())
}

#[rstest]
fn check_flags_an_understated_cost(workspace: TempDir) -> TestResult {
    let input = write(workspace.path(), "edge.txt", EDGE_INPUT)?;
    let stdout = write(workspace.path(), "edge.out", "2\n0 1\n0 0\n0\n")?;
    let summary = run_check(&check_args(input, stdout))?;
    assert!(!summary.is_clean());

    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    let text = String::from_utf8(buffer)?;
    assert!(text.contains("outcome: VALIDATION_FAILURE"));
    assert!(text.contains("cost: 0"));
    Ok(())
}

#[rstest]
fn check_uses_the_exit_code_and_stderr(workspace: TempDir) -> TestResult {
    let input = write(workspace.path(), "pigeonhole.txt", "1\n0\n1\n0\n2\n")?;
    let stdout = write(workspace.path(), "empty.out", "")?;
    let stderr = write(workspace.path(), "err.out", "ERROR: Impossible: k > C(n2,n1)\n")?;
    let mut args = check_args(input, stdout);
    args.stderr = Some(stderr);
    args.exit_code = 1;
    let ExecutionSummary::Check(check) = run_check(&args)? else {
        panic!("expected a check summary");
    };
    assert_eq!(check.classification.verdict.code(), OutcomeKind::Impossible);
    Ok(())
}

#[rstest]
fn check_reports_unreadable_files(workspace: TempDir) {
    let args = check_args(
        workspace.path().join("missing.txt"),
        workspace.path().join("missing.out"),
    );
    let err = run_check(&args).expect_err("input does not exist");
    assert!(matches!(err, CliError::Io { .. }));
    assert_eq!(err.code(), None);
}

#[rstest]
fn generate_writes_loadable_corpora(workspace: TempDir) -> TestResult {
    let args = GenerateArgs {
        out_dir: workspace.path().to_path_buf(),
        families: vec![super::FamilyArg::Tricky],
        seed: 3,
        fuzz_count: 4,
        impossible_probability: 0.5,
    };
    let ExecutionSummary::Generate(summary) = run_generate(&args)? else {
        panic!("expected a generate summary");
    };
    let dirs: Vec<_> = summary.corpora.iter().map(|(dir, _)| dir.clone()).collect();
    assert_eq!(
        dirs,
        [
            workspace.path().join("tests_tricky"),
            workspace.path().join("tests_fuzz"),
        ]
    );
    for (dir, count) in &summary.corpora {
        let entries = load_corpus_dir(dir)?;
        assert_eq!(entries.len(), *count);
    }
    assert_eq!(summary.corpora[1].1, 4);
    Ok(())
}

#[rstest]
fn run_cli_records_the_command(workspace: TempDir) -> TestResult {
    let input = write(workspace.path(), "edge.txt", EDGE_INPUT)?;
    let stdout = write(workspace.path(), "edge.out", EDGE_ANSWER)?;
    let cli = Cli {
        command: Command::Check(check_args(input, stdout)),
    };
    let (summary, layer) = RecordingLayer::capture(|| run_cli(cli));
    assert!(summary?.is_clean());
    let spans = layer.spans_named("cli.run");
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].fields.get("command").map(String::as_str), Some("check"));
    assert_eq!(layer.events_with_message("check finished").len(), 1);
    Ok(())
}

#[cfg(unix)]
mod solver_runs {
    use super::*;
    use kextend_runner::TestRecord;
    use kextend_test_support::fake_solver::FakeSolver;

    fn solver_flags(solver: &FakeSolver) -> Vec<String> {
        vec![
            "--solver".to_owned(),
            solver.program().display().to_string(),
            "--solver-arg".to_owned(),
            solver.script().display().to_string(),
            "--workers".to_owned(),
            "2".to_owned(),
        ]
    }

    #[rstest]
    fn batch_runs_every_corpus_case_with_both_algorithms(workspace: TempDir) -> TestResult {
        let corpus = workspace.path().join("tests_demo");
        fs::create_dir(&corpus)?;
        write(&corpus, "edge.txt", EDGE_INPUT)?;
        write(&corpus, "_OPIS.txt", "corpus description")?;
        let results = workspace.path().join("results.json");
        let solver = FakeSolver::printing(EDGE_ANSWER)?;

        let mut args = vec!["kextend".to_owned(), "batch".to_owned()];
        args.extend(solver_flags(&solver));
        args.extend([
            "--output".to_owned(),
            results.display().to_string(),
            corpus.display().to_string(),
        ]);
        let summary = run_cli(Cli::try_parse_from(args)?)?;
        assert!(summary.is_clean());

        let records: Vec<TestRecord> = serde_json_records(&results)?;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source == "demo" && r.outcome == "OK"));

        let mut buffer = Vec::new();
        render_summary(&summary, &mut buffer)?;
        let text = String::from_utf8(buffer)?;
        assert!(text.contains("runs: 2"));
        assert!(text.contains("overall\tpassed 2/2 (100.0%)"));
        assert!(text.contains("source demo"));
        assert!(!text.contains("failures:"));
        Ok(())
    }

    #[rstest]
    fn fuzz_archives_every_failing_seed(workspace: TempDir) -> TestResult {
        let solver = FakeSolver::printing("garbage\n")?;
        let archive = workspace.path().join("failures");
        let mut args = vec!["kextend".to_owned(), "fuzz".to_owned()];
        args.extend(solver_flags(&solver));
        args.extend(
            [
                "--algorithm",
                "exact",
                "--count",
                "2",
                "--seed",
                "11",
                "--impossible-probability",
                "0",
                "--archive-dir",
            ]
            .map(str::to_owned),
        );
        args.push(archive.display().to_string());

        let summary = run_cli(Cli::try_parse_from(args)?)?;
        assert!(!summary.is_clean());
        let ExecutionSummary::Batch(batch) = &summary else {
            panic!("expected a batch summary");
        };
        assert_eq!(batch.seed, Some(11));
        assert_eq!(batch.report.archived.len(), 2);
        assert!(batch.report.records.iter().all(|r| r.outcome == "PARSE_ERROR"));

        let mut buffer = Vec::new();
        render_summary(&summary, &mut buffer)?;
        let text = String::from_utf8(buffer)?;
        assert!(text.starts_with("seed: 11\n"));
        assert!(text.contains("failures:"));
        assert!(text.contains("archived: "));
        Ok(())
    }

    fn serde_json_records(path: &Path) -> Result<Vec<TestRecord>, Box<dyn std::error::Error>> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
