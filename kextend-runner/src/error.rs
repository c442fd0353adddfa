//! Errors that abort a whole run.
//!
//! Only setup and bookkeeping failures live here. Everything that goes wrong
//! with an individual test is a [`kextend_core::Verdict`].

use std::{fmt, io, path::PathBuf};

use kextend_core::GenerateError;
use thiserror::Error;

/// A failure that prevents the run from continuing.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A corpus directory does not exist.
    #[error("corpus directory `{}` does not exist", path.display())]
    CorpusMissing {
        /// The missing directory.
        path: PathBuf,
    },
    /// A corpus directory or file could not be read.
    #[error("failed to read `{}`: {source}", path.display())]
    ReadCorpus {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The scratch directory for solver inputs could not be created.
    #[error("failed to create a scratch directory: {source}")]
    ScratchDir {
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A directory could not be created.
    #[error("failed to create directory `{}`: {source}", path.display())]
    CreateDir {
        /// Directory being created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A file could not be written.
    #[error("failed to write `{}`: {source}", path.display())]
    WriteFile {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Records could not be serialised.
    #[error("failed to serialise records: {source}")]
    Serialize {
        /// Underlying serialisation failure.
        #[source]
        source: serde_json::Error,
    },
    /// The worker pool could not be built.
    #[error("failed to build the worker pool: {source}")]
    WorkerPool {
        /// Error raised by rayon.
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
    /// A run setting is unusable.
    #[error("invalid run configuration: {reason}")]
    InvalidConfig {
        /// Human-friendly explanation.
        reason: String,
    },
    /// Case generation failed.
    #[error("case generation failed: {error}")]
    Generate {
        /// Generator failure.
        #[from]
        error: GenerateError,
    },
}

/// Stable codes describing [`HarnessError`] variants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum HarnessErrorCode {
    /// A corpus directory does not exist.
    CorpusMissing,
    /// A corpus directory or file could not be read.
    ReadCorpus,
    /// The scratch directory could not be created.
    ScratchDir,
    /// A directory could not be created.
    CreateDir,
    /// A file could not be written.
    WriteFile,
    /// Records could not be serialised.
    Serialize,
    /// The worker pool could not be built.
    WorkerPool,
    /// A run setting is unusable.
    InvalidConfig,
    /// Case generation failed.
    Generate,
}

impl HarnessErrorCode {
    /// Return the stable machine-readable representation of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CorpusMissing => "HARNESS_CORPUS_MISSING",
            Self::ReadCorpus => "HARNESS_READ_CORPUS",
            Self::ScratchDir => "HARNESS_SCRATCH_DIR",
            Self::CreateDir => "HARNESS_CREATE_DIR",
            Self::WriteFile => "HARNESS_WRITE_FILE",
            Self::Serialize => "HARNESS_SERIALIZE",
            Self::WorkerPool => "HARNESS_WORKER_POOL",
            Self::InvalidConfig => "HARNESS_INVALID_CONFIG",
            Self::Generate => "HARNESS_GENERATE",
        }
    }
}

impl fmt::Display for HarnessErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HarnessError {
    /// Retrieve the stable [`HarnessErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> HarnessErrorCode {
        match self {
            Self::CorpusMissing { .. } => HarnessErrorCode::CorpusMissing,
            Self::ReadCorpus { .. } => HarnessErrorCode::ReadCorpus,
            Self::ScratchDir { .. } => HarnessErrorCode::ScratchDir,
            Self::CreateDir { .. } => HarnessErrorCode::CreateDir,
            Self::WriteFile { .. } => HarnessErrorCode::WriteFile,
            Self::Serialize { .. } => HarnessErrorCode::Serialize,
            Self::WorkerPool { .. } => HarnessErrorCode::WorkerPool,
            Self::InvalidConfig { .. } => HarnessErrorCode::InvalidConfig,
            Self::Generate { .. } => HarnessErrorCode::Generate,
        }
    }

    pub(crate) fn write_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFile {
            path: path.into(),
            source,
        }
    }
}
