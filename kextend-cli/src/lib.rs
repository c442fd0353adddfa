//! Support library for the `kextend` binary.
//!
//! Exposes the command pipeline and logging setup so tests can drive the CLI
//! without spawning it.

pub mod cli;
pub mod logging;
