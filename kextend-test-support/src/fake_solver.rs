//! Scripted stand-ins for the solver binary.
//!
//! A [`FakeSolver`] is a `/bin/sh` script in its own temporary directory. It
//! prints canned output, optionally sleeps, records its arguments and exits
//! with a chosen status. Scripts are run through `/bin/sh` rather than
//! executed directly so concurrently spawning tests never hit `ETXTBSY` on a
//! freshly written file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

/// Shell used to run the scripts.
pub const SHELL: &str = "/bin/sh";

/// Builder for [`FakeSolver`].
#[derive(Clone, Debug, Default)]
pub struct FakeSolverBuilder {
    stdout: String,
    stderr: String,
    exit_code: i32,
    sleep_secs: Option<u32>,
    record_args: bool,
    echo_input: bool,
}

impl FakeSolverBuilder {
    /// Text printed on stdout.
    #[must_use]
    pub fn stdout(mut self, text: impl Into<String>) -> Self {
        self.stdout = text.into();
        self
    }

    /// Text printed on stderr.
    #[must_use]
    pub fn stderr(mut self, text: impl Into<String>) -> Self {
        self.stderr = text.into();
        self
    }

    /// Exit status.
    #[must_use]
    pub const fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Sleeps before printing, to provoke timeouts.
    #[must_use]
    pub const fn sleep_secs(mut self, secs: u32) -> Self {
        self.sleep_secs = Some(secs);
        self
    }

    /// Appends each argument, one per line, to `args.log` next to the script.
    #[must_use]
    pub const fn record_args(mut self) -> Self {
        self.record_args = true;
        self
    }

    /// Copies the input file (first argument) to stdout before the canned
    /// output.
    #[must_use]
    pub const fn echo_input(mut self) -> Self {
        self.echo_input = true;
        self
    }

    /// Writes the script.
    ///
    /// # Errors
    /// Propagates failures creating the directory or writing the script.
    pub fn build(self) -> io::Result<FakeSolver> {
        let dir = TempDir::new()?;
        let script = dir.path().join("solver.sh");
        let args_log = dir.path().join("args.log");
        fs::write(&script, self.render(&args_log))?;
        Ok(FakeSolver {
            dir,
            script,
            args_log,
        })
    }

    fn render(&self, args_log: &Path) -> String {
        let mut body = String::from("#!/bin/sh\n");
        if self.record_args {
            body.push_str(&format!(
                "printf '%s\\n' \"$@\" >> '{}'\n",
                args_log.display()
            ));
        }
        if let Some(secs) = self.sleep_secs {
            body.push_str(&format!("sleep {secs}\n"));
        }
        if self.echo_input {
            body.push_str("cat \"$1\"\n");
        }
        push_heredoc(&mut body, "", "KEXTEND_STDOUT", &self.stdout);
        push_heredoc(&mut body, " >&2", "KEXTEND_STDERR", &self.stderr);
        body.push_str(&format!("exit {}\n", self.exit_code));
        body
    }
}

fn push_heredoc(body: &mut String, redirect: &str, marker: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    body.push_str(&format!("cat{redirect} <<'{marker}'\n{text}"));
    if !text.ends_with('\n') {
        body.push('\n');
    }
    body.push_str(marker);
    body.push('\n');
}

/// A scripted solver living in a temporary directory.
#[derive(Debug)]
pub struct FakeSolver {
    dir: TempDir,
    script: PathBuf,
    args_log: PathBuf,
}

impl FakeSolver {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> FakeSolverBuilder {
        FakeSolverBuilder::default()
    }

    /// A solver that prints `stdout` and exits successfully.
    ///
    /// # Errors
    /// Propagates failures writing the script.
    pub fn printing(stdout: impl Into<String>) -> io::Result<Self> {
        Self::builder().stdout(stdout).build()
    }

    /// Program to spawn.
    #[must_use]
    pub fn program(&self) -> &Path {
        Path::new(SHELL)
    }

    /// Script path, passed as the first argument to [`Self::program`].
    #[must_use]
    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Directory holding the script, free for other test files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Every argument the script received, across all runs, excluding the
    /// script path itself.
    ///
    /// # Errors
    /// Propagates failures reading the log, other than it not existing yet.
    pub fn recorded_args(&self) -> io::Result<Vec<String>> {
        match fs::read_to_string(&self.args_log) {
            Ok(log) => Ok(log.lines().map(str::to_owned).collect()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}
