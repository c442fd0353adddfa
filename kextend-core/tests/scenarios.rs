//! End-to-end classification of the reference scenarios through the public
//! API: decode the solver's text, verify it, classify the run.

use std::time::Duration;

use kextend_core::{
    Capture, Classifier, CopyViolation, Graph, Mapping, OutcomeKind, RunOutcome, TestCase,
    Verdict, verify_copies,
};
use rstest::rstest;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn answer(stdout: &str) -> RunOutcome {
    RunOutcome::Completed(Capture::success(stdout, Duration::from_millis(1)))
}

fn rejection(stderr: &str) -> RunOutcome {
    RunOutcome::Completed(Capture {
        stderr: stderr.to_owned(),
        exit_code: Some(1),
        ..Capture::default()
    })
}

#[rstest]
#[case::forward("Copy 1: 0->0, 1->1", "0 1\n0 0")]
#[case::backward("Copy 1: 0->1, 1->0", "0 0\n1 0")]
fn single_edge_into_empty_pair_costs_one(#[case] mapping: &str, #[case] matrix: &str) -> TestResult {
    let case = TestCase::parse("2\n0 1\n0 0\n2\n0 0\n0 0\n1\n")?;
    let stdout = format!(
        "=== Results ===\nExtension cost: 1\nMappings:\n{mapping}\nExtended graph:\n{matrix}\n"
    );
    let classification = Classifier::new().classify((&case).into(), &answer(&stdout));
    assert_eq!(classification.verdict, Verdict::Ok);
    assert_eq!(classification.reported_cost, Some(1));
    Ok(())
}

#[test]
fn triangle_over_one_edge_costs_five() -> TestResult {
    let case = TestCase::parse("3\n0 1 1\n1 0 1\n1 1 0\n3\n0 1 0\n0 0 0\n0 0 0\n1\n")?;
    let classifier = Classifier::new();

    let honest = classifier.classify((&case).into(), &answer("3\n0 1 1\n1 0 1\n1 1 0\n5\n"));
    assert_eq!(honest.verdict.code(), OutcomeKind::Ok);

    let understated = classifier.classify((&case).into(), &answer("3\n0 1 1\n1 0 1\n1 1 0\n4\n"));
    assert_eq!(understated.verdict.code(), OutcomeKind::ValidationFailure);
    Ok(())
}

#[test]
fn two_paths_in_three_vertices_are_impossible() -> TestResult {
    let case = TestCase::parse("3\n0 1 0\n0 0 1\n0 0 0\n3\n0 0 0\n0 0 0\n0 0 0\n2\n")?;
    assert!(case.is_impossible());
    let classification = Classifier::new()
        .classify((&case).into(), &rejection("ERROR: Impossible: k > C(n2,n1)\n"));
    assert_eq!(classification.verdict, Verdict::Impossible);
    assert!(classification.verdict.is_pass());
    Ok(())
}

#[test]
fn same_image_twice_is_one_copy() -> TestResult {
    let pattern = Graph::from_rows([[0_u32, 1], [1, 0]])?;
    let host = Graph::from_rows([[0_u32, 1, 0], [1, 0, 0], [0, 0, 0]])?;
    let copies = [Mapping::from_targets([0, 1]), Mapping::from_targets([1, 0])];
    let err = verify_copies(&pattern, &host, &copies, 2).expect_err("duplicate image");
    assert!(matches!(
        err,
        CopyViolation::DuplicateImage { first: 1, second: 2, .. }
    ));

    let case = TestCase::new(pattern, Graph::empty(3), 2)?;
    let stdout = "Extension cost: 2\nMappings:\nCopy 1: 0->0, 1->1\nCopy 2: 0->1, 1->0\nExtended graph:\n0 1 0\n1 0 0\n0 0 0\n";
    let classification = Classifier::new().classify((&case).into(), &answer(stdout));
    assert_eq!(classification.verdict.code(), OutcomeKind::ValidationFailure);
    Ok(())
}
