//! Runs the external k-copy extension solver over a batch of cases.
//!
//! The runner owns everything that touches the operating system: launching
//! the solver with a wall-clock budget, scratch and archive directories,
//! corpus files and the JSON results file. Judging a run is left to
//! [`kextend_core::Classifier`].

mod archive;
mod command;
mod corpus;
mod error;
mod executor;
mod process;
mod record;

pub use crate::{
    archive::FailureArchive,
    command::{DEFAULT_TIMEOUT, FlagConvention, OutputRequest, SolverCommand},
    corpus::{CorpusEntry, fuzz_jobs, load_corpus_dir, write_corpus},
    error::{HarnessError, HarnessErrorCode},
    executor::{AbortSignal, BatchConfig, BatchExecutor, BatchReport, Job, JobInput},
    process::run_bounded,
    record::{TestRecord, write_records},
};
