//! Verbatim copies of failing inputs.
//!
//! A failing input is saved as written, not as its seed, so it stays
//! inspectable after the generator changes.

use std::{
    fs,
    path::{Path, PathBuf},
};

use kextend_core::Algorithm;
use tracing::info;

use crate::error::HarnessError;

/// Directory receiving failing inputs.
#[derive(Clone, Debug)]
pub struct FailureArchive {
    dir: PathBuf,
}

impl FailureArchive {
    /// Uses `dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns [`HarnessError::CreateDir`] when the directory cannot be
    /// created.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| HarnessError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The archive directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a failure: `fuzz_fail_<seed>_<algorithm>.txt` for
    /// seeded cases, `fail_<source>_<name>_<algorithm>.txt` otherwise. Case
    /// names are only unique within their source.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::Algorithm;
    /// use kextend_runner::FailureArchive;
    ///
    /// assert_eq!(
    ///     FailureArchive::file_name("fuzz", "fuzz_7", Some(7), Algorithm::Exact),
    ///     "fuzz_fail_7_exact.txt",
    /// );
    /// assert_eq!(
    ///     FailureArchive::file_name("tricky", "case1", None, Algorithm::Exact),
    ///     "fail_tricky_case1_exact.txt",
    /// );
    /// ```
    #[must_use]
    pub fn file_name(source: &str, name: &str, seed: Option<u64>, algorithm: Algorithm) -> String {
        match seed {
            Some(seed) => format!("fuzz_fail_{seed}_{algorithm}.txt"),
            None => format!("fail_{source}_{name}_{algorithm}.txt"),
        }
    }

    /// Writes `input` under the failure's file name and returns its path.
    ///
    /// # Errors
    /// Returns [`HarnessError::WriteFile`] when the file cannot be written.
    pub fn persist(
        &self,
        source: &str,
        name: &str,
        seed: Option<u64>,
        algorithm: Algorithm,
        input: &str,
    ) -> Result<PathBuf, HarnessError> {
        let path = self.dir.join(Self::file_name(source, name, seed, algorithm));
        fs::write(&path, input).map_err(|source| HarnessError::write_file(&path, source))?;
        info!(path = %path.display(), "archived failing input");
        Ok(path)
    }
}
