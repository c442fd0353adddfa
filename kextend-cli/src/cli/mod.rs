//! Command-line interface of the solver harness.
//!
//! `batch` runs corpus directories, `fuzz` runs seeded random cases,
//! `generate` writes the structured families to disk and `check` re-judges a
//! saved solver answer offline.

mod commands;

pub use commands::{
    BatchArgs, BatchSummary, CheckArgs, CheckSummary, Cli, CliError, Command, ConventionArg,
    ExecutionSummary, FamilyArg, FuzzArgs, GenerateArgs, GenerateSummary, OutputArg, SolverArgs,
    render_summary, run_cli,
};

#[cfg(test)]
mod tests;
