//! How to invoke the solver.
//!
//! Solver builds have used two argument conventions over time: dashed flags
//! (`-a` for the approximate algorithm, `-v`/`-r` for verbose or compact
//! output) and a positional algorithm token (`exact`/`approx`).

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    process::Command,
    time::Duration,
};

use kextend_core::{Algorithm, RunOutcome};
use tracing::instrument;

use crate::{error::HarnessError, process::run_bounded};

/// Default wall-clock budget per run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Argument convention of the solver binary.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum FlagConvention {
    /// `solver <input> [-a] [-v|-r]`.
    #[default]
    Dashed,
    /// `solver <input> exact|approx [-v|-r]`.
    Positional,
}

impl FlagConvention {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashed => "dashed",
            Self::Positional => "positional",
        }
    }
}

impl fmt::Display for FlagConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which output dialect to ask the solver for.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum OutputRequest {
    /// Pass no format flag and accept whatever the solver prints.
    #[default]
    SolverDefault,
    /// Ask for the verbose dialect with `-v`.
    Verbose,
    /// Ask for the compact dialect with `-r`.
    Compact,
}

impl OutputRequest {
    const fn flag(self) -> Option<&'static str> {
        match self {
            Self::SolverDefault => None,
            Self::Verbose => Some("-v"),
            Self::Compact => Some("-r"),
        }
    }
}

/// A configured solver invocation.
#[derive(Clone, Debug)]
pub struct SolverCommand {
    program: PathBuf,
    leading_args: Vec<OsString>,
    convention: FlagConvention,
    output: OutputRequest,
    timeout: Duration,
}

impl SolverCommand {
    /// Invokes `program` with the dashed convention, the solver's default
    /// output and a 30 second budget.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            convention: FlagConvention::default(),
            output: OutputRequest::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Arguments placed before the input file, for wrappers or interpreters.
    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Selects the argument convention.
    #[must_use]
    pub const fn with_convention(mut self, convention: FlagConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Selects the requested output dialect.
    #[must_use]
    pub const fn with_output(mut self, output: OutputRequest) -> Self {
        self.output = output;
        self
    }

    /// Sets the wall-clock budget per run.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The solver executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The per-run budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks that the budget is usable.
    ///
    /// # Errors
    /// Returns [`HarnessError::InvalidConfig`] for a zero timeout.
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.timeout.is_zero() {
            return Err(HarnessError::InvalidConfig {
                reason: "timeout must be positive".to_owned(),
            });
        }
        Ok(())
    }

    /// Arguments after the program for one run.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Algorithm;
    /// use kextend_runner::{FlagConvention, OutputRequest, SolverCommand};
    ///
    /// let solver = SolverCommand::new("solver")
    ///     .with_convention(FlagConvention::Positional)
    ///     .with_output(OutputRequest::Compact);
    /// let args = solver.args("case.txt".as_ref(), Algorithm::Approximate);
    /// assert_eq!(args, ["case.txt", "approx", "-r"]);
    /// ```
    #[must_use]
    pub fn args(&self, input: &Path, algorithm: Algorithm) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        args.push(input.as_os_str().to_owned());
        match (self.convention, algorithm) {
            (FlagConvention::Dashed, Algorithm::Exact) => {}
            (FlagConvention::Dashed, Algorithm::Approximate) => args.push("-a".into()),
            (FlagConvention::Positional, algorithm) => args.push(algorithm.as_str().into()),
        }
        if let Some(flag) = self.output.flag() {
            args.push(flag.into());
        }
        args
    }

    /// Runs the solver on `input` with `algorithm`, bounded by the timeout.
    #[instrument(
        name = "runner.solve",
        skip(self, algorithm),
        fields(program = %self.program.display(), algorithm = %algorithm),
    )]
    pub fn run(&self, input: &Path, algorithm: Algorithm) -> RunOutcome {
        let mut command = Command::new(&self.program);
        command.args(self.args(input, algorithm));
        run_bounded(command, self.timeout)
    }
}
