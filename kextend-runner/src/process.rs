//! Bounded execution of one solver process.
//!
//! The child is owned by a [`ChildGuard`] from spawn to exit. Whatever path
//! leaves [`run_bounded`], the guard kills the child if it is still running
//! and reaps it with a bounded wait.

use std::{
    io::{self, Read},
    process::{Child, Command, ExitStatus, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use kextend_core::{Capture, ProcessErrorKind, RunOutcome};
use tracing::{debug, warn};

/// Interval between exit checks.
const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Longest wait for a killed child to be reaped.
const REAP_GRACE: Duration = Duration::from_secs(2);
/// Time allowed after exit for the pipes to drain, even past the budget.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

type PipeReader = Receiver<io::Result<Vec<u8>>>;

struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    const fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        match self.child.as_mut() {
            Some(child) => {
                let status = child.try_wait()?;
                if status.is_some() {
                    self.child = None;
                }
                Ok(status)
            }
            None => Ok(None),
        }
    }

    fn kill_and_reap(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = child.id();
        if let Err(err) = child.kill() {
            // Already exited between the last poll and the kill.
            debug!(pid, error = %err, "kill failed");
        }
        let deadline = Instant::now() + REAP_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                Ok(None) => {
                    warn!(pid, "killed solver was not reaped within the grace period");
                    return;
                }
                Err(err) => {
                    warn!(pid, error = %err, "failed to reap killed solver");
                    return;
                }
            }
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill_and_reap();
    }
}

/// Drains `pipe` on its own thread. The thread is never joined, so a pipe
/// held open by a surviving grandchild cannot block the caller.
fn spawn_reader(pipe: Option<impl Read + Send + 'static>) -> PipeReader {
    let (sender, receiver) = mpsc::channel();
    match pipe {
        Some(mut pipe) => {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                let read = pipe.read_to_end(&mut buffer).map(|_| buffer);
                // The receiver is gone once the run has been given up on.
                let _ = sender.send(read);
            });
        }
        None => {
            let _ = sender.send(Ok(Vec::new()));
        }
    }
    receiver
}

/// Waits for one pipe until `deadline`; `None` means it was still open.
fn collect(reader: &PipeReader, deadline: Instant) -> io::Result<Option<String>> {
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(read) => Ok(Some(String::from_utf8_lossy(&read?).into_owned())),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(io::Error::other("output reader stopped")),
    }
}

/// Runs `command` until it exits or `timeout` elapses.
///
/// Output is decoded lossily as UTF-8. The budget covers draining the output
/// pipes as well: if the solver exits but something it left behind keeps a
/// pipe open past the budget, the run counts as timed out. Partial output is
/// discarded on timeout.
pub fn run_bounded(mut command: Command, timeout: Duration) -> RunOutcome {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let program = command.get_program().to_string_lossy().into_owned();
    let started = Instant::now();
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            return RunOutcome::Failed {
                kind: ProcessErrorKind::SpawnFailed,
                detail: format!("{program}: {err}"),
            };
        }
    };
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());
    let mut guard = ChildGuard::new(child);
    debug!(%program, timeout_ms = timeout.as_millis(), "solver spawned");

    let status = loop {
        match guard.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(err) => {
                return RunOutcome::Failed {
                    kind: ProcessErrorKind::Io,
                    detail: format!("waiting for {program}: {err}"),
                };
            }
        }
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            guard.kill_and_reap();
            warn!(%program, elapsed_ms = elapsed.as_millis(), "solver timed out and was killed");
            return RunOutcome::TimedOut { elapsed };
        }
        thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(elapsed)));
    };

    let deadline = (started + timeout).max(Instant::now() + DRAIN_GRACE);
    let drained = collect(&stdout, deadline)
        .and_then(|out| collect(&stderr, deadline).map(|err| out.zip(err)));
    let elapsed = started.elapsed();
    match drained {
        Ok(Some((stdout, stderr))) => {
            debug!(
                %program,
                exit_code = ?status.code(),
                elapsed_ms = elapsed.as_millis(),
                "solver exited"
            );
            RunOutcome::Completed(Capture {
                stdout,
                stderr,
                exit_code: status.code(),
                elapsed,
            })
        }
        Ok(None) => {
            warn!(
                %program,
                elapsed_ms = elapsed.as_millis(),
                "solver exited but its output stayed open past the budget"
            );
            RunOutcome::TimedOut { elapsed }
        }
        Err(err) => RunOutcome::Failed {
            kind: ProcessErrorKind::Io,
            detail: format!("reading output of {program}: {err}"),
        },
    }
}
