//! Test corpora on disk.
//!
//! A corpus directory holds one solver input per `.txt` file. Files whose
//! name starts with `_` describe the corpus and are not cases. The source of
//! every case is the directory name without a leading `tests_`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use kextend_core::{Algorithm, Fuzzer, GeneratedCase};
use tracing::{debug, instrument};

use crate::{
    error::HarnessError,
    executor::{Job, JobInput},
};

/// Prefix stripped from corpus directory names to form the source.
const DIR_PREFIX: &str = "tests_";

/// One case read from a corpus directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusEntry {
    /// File stem.
    pub name: String,
    /// Directory name without the `tests_` prefix.
    pub source: String,
    /// The parsed case, or the verbatim text if it is malformed.
    pub input: JobInput,
}

impl CorpusEntry {
    /// One job per algorithm for this entry.
    pub fn jobs<'a>(&'a self, algorithms: &'a [Algorithm]) -> impl Iterator<Item = Job> + 'a {
        algorithms.iter().map(|&algorithm| Job {
            name: self.name.clone(),
            source: self.source.clone(),
            seed: None,
            algorithm,
            input: self.input.clone(),
        })
    }
}

fn source_name(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "corpus".to_owned());
    name.strip_prefix(DIR_PREFIX)
        .map(ToOwned::to_owned)
        .unwrap_or(name)
}

/// Reads every case in `dir`, sorted by file name.
///
/// # Errors
/// Returns [`HarnessError::CorpusMissing`] when `dir` is not a directory and
/// [`HarnessError::ReadCorpus`] when it or a case cannot be read.
#[instrument(name = "runner.load_corpus", fields(dir = %dir.display()))]
pub fn load_corpus_dir(dir: &Path) -> Result<Vec<CorpusEntry>, HarnessError> {
    if !dir.is_dir() {
        return Err(HarnessError::CorpusMissing {
            path: dir.to_path_buf(),
        });
    }
    let read_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| HarnessError::ReadCorpus { path, source }
    };
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error(dir))? {
        let path = entry.map_err(read_error(dir))?.path();
        let is_case = path.extension().is_some_and(|ext| ext == "txt")
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.starts_with('_'));
        if is_case && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let source = source_name(dir);
    files
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path).map_err(read_error(&path))?;
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let input = JobInput::parse(text);
            if let JobInput::Malformed { error, .. } = &input {
                debug!(%name, %error, "corpus entry is malformed; sending verbatim");
            }
            Ok(CorpusEntry {
                name,
                source: source.clone(),
                input,
            })
        })
        .collect()
}

/// Writes each case to `dir/<name>.txt`, creating `dir` if needed.
///
/// # Errors
/// Returns [`HarnessError`] when the directory or a file cannot be written.
#[instrument(name = "runner.write_corpus", skip(cases), fields(dir = %dir.display(), cases = cases.len()))]
pub fn write_corpus(dir: &Path, cases: &[GeneratedCase]) -> Result<Vec<PathBuf>, HarnessError> {
    fs::create_dir_all(dir).map_err(|source| HarnessError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    cases
        .iter()
        .map(|generated| {
            let path = dir.join(format!("{}.txt", generated.name));
            fs::write(&path, generated.case.to_input_string())
                .map_err(|source| HarnessError::write_file(&path, source))?;
            Ok(path)
        })
        .collect()
}

/// Generates `count` fuzz cases from `base_seed`, one job per algorithm each.
///
/// # Errors
/// Returns [`HarnessError::Generate`] if a case cannot be generated.
pub fn fuzz_jobs(
    fuzzer: &Fuzzer,
    base_seed: u64,
    count: u64,
    algorithms: &[Algorithm],
) -> Result<Vec<Job>, HarnessError> {
    let mut jobs = Vec::new();
    for generated in fuzzer.campaign(base_seed, count) {
        let generated = generated?;
        jobs.extend(algorithms.iter().map(|&algorithm| Job::generated(&generated, algorithm)));
    }
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kextend_core::{Family, FuzzConfig};
    use rand::{SeedableRng, rngs::SmallRng};
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn written_corpus_loads_back_with_its_source() -> TestResult {
        let root = TempDir::new()?;
        let dir = root.path().join("tests_tricky");
        let cases = Family::Tricky.generate(&mut SmallRng::seed_from_u64(1))?;
        write_corpus(&dir, &cases)?;
        fs::write(dir.join("_OPIS.txt"), "description, not a case")?;

        let entries = load_corpus_dir(&dir)?;
        assert_eq!(entries.len(), cases.len());
        assert!(entries.iter().all(|e| e.source == "tricky"));
        assert!(entries.iter().all(|e| matches!(e.input, JobInput::Case(_))));
        assert_eq!(entries[0].name, "tricky_01_direction");
        Ok(())
    }

    #[test]
    fn malformed_files_are_kept_verbatim() -> TestResult {
        let root = TempDir::new()?;
        fs::write(root.path().join("broken.txt"), "2\n0 x\n")?;
        let entries = load_corpus_dir(root.path())?;
        let JobInput::Malformed { text, .. } = &entries[0].input else {
            panic!("expected a malformed entry");
        };
        assert_eq!(text, "2\n0 x\n");
        Ok(())
    }

    #[test]
    fn missing_directories_are_reported() {
        let err = load_corpus_dir(Path::new("/nonexistent/kextend/corpus"))
            .expect_err("directory does not exist");
        assert!(matches!(err, HarnessError::CorpusMissing { .. }));
    }

    #[test]
    fn fuzz_jobs_pair_every_case_with_each_algorithm() -> TestResult {
        let fuzzer = Fuzzer::new(FuzzConfig::default())?;
        let jobs = fuzz_jobs(&fuzzer, 5, 3, &Algorithm::all())?;
        assert_eq!(jobs.len(), 6);
        assert_eq!(jobs[0].seed, jobs[1].seed);
        assert_ne!(jobs[0].algorithm, jobs[1].algorithm);
        assert!(jobs.iter().all(|job| job.source == "fuzz"));
        Ok(())
    }
}
