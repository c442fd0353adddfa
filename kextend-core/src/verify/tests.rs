use super::*;
use crate::{Graph, Mapping, test_utils::suite_proptest_config};
use proptest::prelude::*;
use rstest::rstest;
use test_strategy::Arbitrary;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn clique(order: usize) -> Graph {
    Graph::from_rows(
        (0..order)
            .map(|u| (0..order).map(|v| u32::from(u != v)).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
    .expect("clique rows are square")
}

fn case(pattern: Graph, target: Graph, copies: usize) -> TestCase {
    TestCase::new(pattern, target, copies).expect("valid test case")
}

fn solution(extended: Graph, mappings: Option<Vec<Mapping>>, reported_cost: u64) -> Solution {
    Solution {
        extended,
        mappings,
        reported_cost,
    }
}

#[rstest]
#[case::forward(vec![vec![0, 1], vec![0, 0]], [0, 1])]
#[case::backward(vec![vec![0, 0], vec![1, 0]], [1, 0])]
fn single_edge_into_empty_pair_costs_one(
    #[case] extended: Vec<Vec<u32>>,
    #[case] targets: [usize; 2],
) -> TestResult {
    let edge = Graph::from_rows(vec![vec![0, 1], vec![0, 0]])?;
    let case = case(edge, Graph::empty(2), 1);
    let answer = solution(
        Graph::from_rows(extended)?,
        Some(vec![Mapping::from_targets(targets)]),
        1,
    );
    assert_eq!(SolutionChecker::new(&case, &answer).check_all()?, 1);
    Ok(())
}

#[test]
fn triangle_over_one_edge_costs_five() -> TestResult {
    let target = Graph::from_rows(vec![vec![0, 1, 0], vec![0, 0, 0], vec![0, 0, 0]])?;
    let case = case(clique(3), target, 1);
    let answer = solution(clique(3), Some(vec![Mapping::from_targets([0, 1, 2])]), 5);
    let report = SolutionChecker::new(&case, &answer).collect_all();
    assert!(report.is_valid(), "{:?}", report.violations);
    assert_eq!(report.actual_cost, Some(5));
    assert!(report.mappings_checked);
    Ok(())
}

#[test]
fn same_vertex_set_is_one_copy() -> TestResult {
    let case = case(Graph::empty(2), Graph::empty(2), 2);
    let answer = solution(
        Graph::empty(2),
        Some(vec![Mapping::from_targets([0, 1]), Mapping::from_targets([1, 0])]),
        0,
    );
    let err = SolutionChecker::new(&case, &answer)
        .check_all()
        .expect_err("both copies occupy {0, 1}");
    match err {
        SolutionViolation::Copies(CopyViolation::DuplicateImage { first, second, image }) => {
            assert_eq!((first, second), (1, 2));
            assert_eq!(image, vec![0, 1]);
        }
        other => panic!("expected duplicate image, got {other:?}"),
    }
    Ok(())
}

#[rstest]
#[case::lenient(false, 0, 1)]
#[case::strict(true, 1, 0)]
fn canonical_order_is_a_warning_unless_strict(
    #[case] strict: bool,
    #[case] violations: usize,
    #[case] warnings: usize,
) {
    let case = case(Graph::empty(1), Graph::empty(2), 2);
    let answer = solution(
        Graph::empty(2),
        Some(vec![Mapping::from_targets([1]), Mapping::from_targets([0])]),
        0,
    );
    let report = SolutionChecker::new(&case, &answer)
        .with_strict_order(strict)
        .collect_all();
    assert_eq!(report.violations.len(), violations);
    assert_eq!(report.warnings.len(), warnings);
}

#[test]
fn missing_mappings_still_check_cost() {
    let case = case(Graph::empty(1), Graph::empty(2), 2);
    let answer = solution(clique(2), None, 1);
    let report = SolutionChecker::new(&case, &answer).collect_all();
    assert!(!report.mappings_checked);
    assert_eq!(
        report.violations,
        vec![SolutionViolation::Cost(CostViolation::CostMismatch {
            reported: 1,
            actual: 2,
        })]
    );
}

#[test]
fn collect_all_reports_every_failure() -> TestResult {
    let edge = Graph::from_rows(vec![vec![0, 1], vec![0, 0]])?;
    let case = case(edge, Graph::empty(3), 2);
    let answer = solution(
        Graph::from_rows(vec![vec![0, 1, 0], vec![0, 0, 0], vec![0, 0, 0]])?,
        Some(vec![Mapping::from_targets([0, 1]), Mapping::from_targets([1, 2])]),
        3,
    );
    let report = SolutionChecker::new(&case, &answer).collect_all();
    let codes: Vec<&str> = report
        .violations
        .iter()
        .map(|violation| match violation {
            SolutionViolation::Cost(v) => v.code().as_str(),
            SolutionViolation::Copies(v) => v.code().as_str(),
            SolutionViolation::Order(_) => "ORDER",
        })
        .collect();
    assert_eq!(codes, ["COST_MISMATCH", "COPIES_INVALID_EMBEDDING"]);
    assert_eq!(report.actual_cost, Some(1));
    Ok(())
}

/// Ways to corrupt a known-good answer.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum Tamper {
    #[weight(2)]
    MisreportCost,
    #[weight(2)]
    DuplicateFirstCopy,
    #[weight(1)]
    DropCopy,
}

fn graph_strategy(order: usize) -> impl Strategy<Value = Graph> {
    prop::collection::vec(prop::collection::vec(0_u32..3, order), order)
        .prop_map(|rows| Graph::from_rows(rows).expect("generated rows are square"))
}

/// A pattern, a target, and two distinct planted injections.
fn planted_strategy() -> impl Strategy<Value = (Graph, Graph, Vec<Mapping>)> {
    (1_usize..4)
        .prop_flat_map(|n1| (Just(n1), n1 + 1..6))
        .prop_flat_map(|(n1, n2)| {
            let order: Vec<usize> = (0..n2).collect();
            (
                graph_strategy(n1),
                graph_strategy(n2),
                Just(order.clone()).prop_shuffle(),
                Just(n1),
            )
        })
        .prop_map(|(pattern, target, shuffled, n1)| {
            let first = Mapping::from_targets(shuffled.iter().copied().take(n1));
            // Shifting one image onto the unused vertex guarantees a new set.
            let mut second_targets: Vec<usize> = shuffled.iter().copied().take(n1).collect();
            if let (Some(slot), Some(&spare)) = (second_targets.last_mut(), shuffled.get(n1)) {
                *slot = spare;
            }
            let second = Mapping::from_targets(second_targets);
            (pattern, target, vec![first, second])
        })
}

fn plant(pattern: &Graph, target: &Graph, mappings: &[Mapping]) -> Graph {
    let mut extended = target.clone();
    for mapping in mappings {
        for (u, fu) in mapping.assignments() {
            for (v, fv) in mapping.assignments() {
                extended
                    .raise_edge(fu, fv, pattern.edge_count(u, v))
                    .expect("planted vertices are inside the target");
            }
        }
    }
    extended
}

proptest! {
    #![proptest_config(suite_proptest_config(64))]

    #[test]
    fn planted_extension_passes_with_recomputed_cost(
        (pattern, target, mappings) in planted_strategy(),
    ) {
        let extended = plant(&pattern, &target, &mappings);
        let cost = extension_cost(&target, &extended).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(cost + target.size(), extended.size());
        let case = case(pattern, target, mappings.len());
        let answer = solution(extended, Some(mappings), cost);
        prop_assert_eq!(SolutionChecker::new(&case, &answer).check_all(), Ok(cost));
    }

    #[test]
    fn tampered_answers_are_rejected(
        (pattern, target, mappings) in planted_strategy(),
        tamper: Tamper,
    ) {
        let extended = plant(&pattern, &target, &mappings);
        let cost = extension_cost(&target, &extended).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let case = case(pattern, target, mappings.len());
        let answer = match tamper {
            Tamper::MisreportCost => solution(extended, Some(mappings), cost + 1),
            Tamper::DuplicateFirstCopy => {
                let first = mappings[0].clone();
                solution(extended, Some(vec![first.clone(), first]), cost)
            }
            Tamper::DropCopy => solution(extended, Some(mappings[..1].to_vec()), cost),
        };
        prop_assert!(SolutionChecker::new(&case, &answer).check_all().is_err());
    }

    #[test]
    fn accepted_copies_have_distinct_images(
        (n1, n2, shuffles) in (1_usize..4)
            .prop_flat_map(|n1| (Just(n1), n1..6))
            .prop_flat_map(|(n1, n2)| {
                let order: Vec<usize> = (0..n2).collect();
                (Just(n1), Just(n2), prop::collection::vec(Just(order).prop_shuffle(), 1..5))
            }),
    ) {
        let mappings: Vec<Mapping> = shuffles
            .iter()
            .map(|shuffled| Mapping::from_targets(shuffled.iter().copied().take(n1)))
            .collect();
        let images: Vec<_> = mappings.iter().map(Mapping::image).collect();
        let distinct = images
            .iter()
            .enumerate()
            .all(|(i, a)| images.iter().skip(i + 1).all(|b| a != b));
        let accepted = verify_copies(&clique(n1), &clique(n2), &mappings, mappings.len()).is_ok();
        prop_assert_eq!(accepted, distinct);
    }
}
