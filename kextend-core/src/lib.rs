//! Correctness oracle for k-copy multigraph extension solvers.
//!
//! The crate re-derives every claim a solver makes about its answer: that
//! each reported mapping embeds the pattern into the extended target, that
//! the `k` copies use pairwise distinct vertex sets, and that the extension
//! only adds edges and costs exactly what was reported. It also decodes both
//! solver output dialects, generates structured and seeded random cases, and
//! classifies and aggregates run outcomes.
//!
//! Nothing here spawns processes or touches the filesystem; see the runner
//! crate for that.

mod aggregate;
mod algorithm;
mod case;
mod classify;
mod error;
pub mod generate;
mod graph;
mod mapping;
mod output;
mod verify;

#[cfg(test)]
mod test_utils;

pub use crate::{
    aggregate::{Aggregator, OutcomeCounts, PassRate},
    algorithm::{Algorithm, UnknownAlgorithm},
    case::{Dimensions, TestCase, binomial},
    classify::{
        Capture, CaseInput, Classification, Classifier, ExecutionStage, OutcomeKind,
        ProcessErrorKind, RunOutcome, Verdict,
    },
    error::{GraphError, GraphErrorCode, GraphRole, InputFormatError, InputFormatErrorCode},
    generate::{
        GenerateError, GenerateErrorCode, GeneratedCase,
        fuzz::{FuzzConfig, Fuzzer, iteration_seed},
        structured::Family,
    },
    graph::Graph,
    mapping::Mapping,
    output::{
        Diagnostic, Dialect, ParseFailure, ParseFailureCode, Solution, SolverOutcome,
        parse_output, recognise_diagnostic, reported_time, reports_no_solution,
    },
    verify::{
        CopyViolation, CopyViolationCode, CostViolation, CostViolationCode, EmbeddingViolation,
        EmbeddingViolationCode, OrderViolation, SolutionCheck, SolutionChecker, SolutionReport,
        SolutionViolation, extension_cost, verify_canonical_order, verify_copies, verify_cost,
        verify_embedding,
    },
};
