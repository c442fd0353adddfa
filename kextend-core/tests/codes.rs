use kextend_core::{
    GraphError, GraphErrorCode, InputFormatError, InputFormatErrorCode, OutcomeKind,
    ParseFailure, ParseFailureCode, ProcessErrorKind, Verdict,
};
use rstest::rstest;

#[rstest]
#[case(Verdict::Ok, OutcomeKind::Ok, "OK")]
#[case(Verdict::Fail { reasons: Vec::new() }, OutcomeKind::ValidationFailure, "VALIDATION_FAILURE")]
#[case(
    Verdict::ParseError { failure: ParseFailure::EmptyOutput },
    OutcomeKind::ParseError,
    "PARSE_ERROR",
)]
#[case(Verdict::NoSolution { expected: false }, OutcomeKind::NoSolution, "NO_SOLUTION")]
#[case(Verdict::Impossible, OutcomeKind::Impossible, "IMPOSSIBLE")]
#[case(Verdict::Timeout, OutcomeKind::Timeout, "TIMEOUT")]
#[case(
    Verdict::ProcessError { kind: ProcessErrorKind::SpawnFailed, detail: String::new() },
    OutcomeKind::ProcessError,
    "PROCESS_ERROR",
)]
fn verdicts_map_to_stable_outcomes(
    #[case] verdict: Verdict,
    #[case] expected: OutcomeKind,
    #[case] text: &str,
) {
    assert_eq!(verdict.code(), expected);
    assert_eq!(expected.as_str(), text);
}

#[rstest]
#[case(InputFormatError::Empty, InputFormatErrorCode::Empty)]
#[case(InputFormatError::ZeroCopies, InputFormatErrorCode::ZeroCopies)]
#[case(InputFormatError::TrailingContent { line: 9 }, InputFormatErrorCode::TrailingContent)]
fn input_errors_carry_codes(#[case] error: InputFormatError, #[case] expected: InputFormatErrorCode) {
    assert_eq!(error.code(), expected);
}

#[test]
fn graph_and_parse_codes_are_prefixed() {
    let graph = GraphError::VertexOutOfRange { vertex: 4, order: 2 };
    assert_eq!(graph.code(), GraphErrorCode::VertexOutOfRange);
    assert!(graph.code().as_str().starts_with("GRAPH_"));
    assert!(ParseFailure::EmptyOutput.code().as_str().starts_with("PARSE_"));
    assert_eq!(ParseFailure::EmptyOutput.code(), ParseFailureCode::EmptyOutput);
}
