//! Logging initialisation for the `kextend` binary.
//!
//! Diagnostics go to stderr through a global `tracing` subscriber so stdout
//! carries only the summary. Two variables shape the stream:
//!
//! - `KEXTEND_LOG_FORMAT`: `human` (default) or `json`, one object per line.
//! - `KEXTEND_LOG_SPANS`: `close` (default) logs each solver run and batch
//!   span with its busy time when it ends, `full` adds span entry, `none`
//!   keeps events only.
//!
//! `RUST_LOG` overrides the filter. Without it the harness crates log at
//! `info` and everything else at `warn`. Records from crates using the `log`
//! facade are bridged in.

use std::{env, sync::OnceLock};

use thiserror::Error;
use tracing::{debug, warn};
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

const LOG_FORMAT_ENV: &str = "KEXTEND_LOG_FORMAT";
const LOG_SPANS_ENV: &str = "KEXTEND_LOG_SPANS";
const DEFAULT_FILTER: &str = "warn,kextend_cli=info,kextend_runner=info,kextend_core=info";

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Errors raised while initialising structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Environment variable contained invalid UTF-8 data.
    #[error("environment variable `{name}` contained invalid UTF-8: {source}")]
    InvalidUnicode {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Underlying parse failure.
        #[source]
        source: env::VarError,
    },
    /// A logging variable held a value it does not accept.
    #[error("unsupported value `{provided}` for `{name}`; expected one of {expected}")]
    UnsupportedValue {
        /// Name of the environment variable.
        name: &'static str,
        /// Raw value supplied by the user.
        provided: String,
        /// Accepted values.
        expected: &'static str,
    },
    /// Failed to install the global tracing subscriber.
    #[error("failed to install tracing subscriber: {source}")]
    InstallFailed {
        /// Error raised by `tracing_subscriber`.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, LoggingError> {
        match normalise(raw).as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(unsupported(LOG_FORMAT_ENV, other, "`human`, `json`")),
        }
    }
}

/// Which span lifecycle points are logged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum SpanEvents {
    None,
    #[default]
    Close,
    Full,
}

impl SpanEvents {
    fn parse(raw: &str) -> Result<Self, LoggingError> {
        match normalise(raw).as_str() {
            "none" => Ok(Self::None),
            "close" => Ok(Self::Close),
            "full" => Ok(Self::Full),
            other => Err(unsupported(LOG_SPANS_ENV, other, "`none`, `close`, `full`")),
        }
    }

    fn fmt_span(self) -> FmtSpan {
        match self {
            Self::None => FmtSpan::NONE,
            Self::Close => FmtSpan::CLOSE,
            Self::Full => FmtSpan::FULL,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct LogSettings {
    format: LogFormat,
    spans: SpanEvents,
}

impl LogSettings {
    /// Reads the settings through `lookup`, which behaves like [`env::var`].
    fn from_lookup<F>(lookup: F) -> Result<Self, LoggingError>
    where
        F: Fn(&'static str) -> Result<String, env::VarError>,
    {
        let format = read_var(&lookup, LOG_FORMAT_ENV, LogFormat::parse)?;
        let spans = read_var(&lookup, LOG_SPANS_ENV, SpanEvents::parse)?;
        Ok(Self {
            format: format.unwrap_or_default(),
            spans: spans.unwrap_or_default(),
        })
    }
}

fn normalise(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn unsupported(name: &'static str, provided: &str, expected: &'static str) -> LoggingError {
    LoggingError::UnsupportedValue {
        name,
        provided: provided.to_owned(),
        expected,
    }
}

fn read_var<F, T>(
    lookup: &F,
    name: &'static str,
    parse: fn(&str) -> Result<T, LoggingError>,
) -> Result<Option<T>, LoggingError>
where
    F: Fn(&'static str) -> Result<String, env::VarError>,
{
    match lookup(name) {
        Ok(raw) => parse(&raw).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source @ env::VarError::NotUnicode(_)) => {
            Err(LoggingError::InvalidUnicode { name, source })
        }
    }
}

/// Install global structured logging if it has not already been configured.
///
/// # Errors
/// Returns [`LoggingError`] if a logging variable contains invalid Unicode
/// or an unsupported value.
pub fn init_logging() -> Result<(), LoggingError> {
    if INITIALISED.get().is_some() {
        return Ok(());
    }

    let settings = LogSettings::from_lookup(|name| env::var(name))?;
    match install_subscriber(settings) {
        Ok(()) => debug!(?settings, "structured logging installed"),
        Err(LoggingError::InstallFailed { source }) => {
            warn!(error = %source, "structured logging already configured elsewhere");
        }
        Err(err) => return Err(err),
    }
    let _ = INITIALISED.set(());
    Ok(())
}

fn install_subscriber(settings: LogSettings) -> Result<(), LoggingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_span_events(settings.spans.fmt_span())
        .with_writer(std::io::stderr);

    let fmt_layer = match settings.format {
        LogFormat::Json => fmt_layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Human => fmt_layer.boxed(),
    };

    // A logger installed by someone else keeps the `log` slot.
    let _ = LogTracer::init();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|source| LoggingError::InstallFailed { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ffi::OsString;

    use rstest::rstest;

    fn lookup_from(
        vars: &'static [(&'static str, &'static str)],
    ) -> impl Fn(&'static str) -> Result<String, env::VarError> {
        move |name: &'static str| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
                .ok_or(env::VarError::NotPresent)
        }
    }

    #[test]
    fn unset_variables_give_human_output_with_close_events() {
        let settings = LogSettings::from_lookup(lookup_from(&[])).expect("defaults must apply");
        assert_eq!(settings, LogSettings {
            format: LogFormat::Human,
            spans: SpanEvents::Close,
        });
    }

    #[rstest]
    #[case(&[("KEXTEND_LOG_FORMAT", " JSON ")], LogFormat::Json, SpanEvents::Close)]
    #[case(&[("KEXTEND_LOG_SPANS", "none")], LogFormat::Human, SpanEvents::None)]
    #[case(
        &[("KEXTEND_LOG_FORMAT", "human"), ("KEXTEND_LOG_SPANS", "Full")],
        LogFormat::Human,
        SpanEvents::Full,
    )]
    fn settings_follow_the_environment(
        #[case] vars: &'static [(&'static str, &'static str)],
        #[case] format: LogFormat,
        #[case] spans: SpanEvents,
    ) {
        let settings = LogSettings::from_lookup(lookup_from(vars)).expect("settings must parse");
        assert_eq!(settings, LogSettings { format, spans });
    }

    #[rstest]
    #[case(&[("KEXTEND_LOG_FORMAT", "xml")], "KEXTEND_LOG_FORMAT", "xml")]
    #[case(&[("KEXTEND_LOG_SPANS", "enter")], "KEXTEND_LOG_SPANS", "enter")]
    fn unsupported_values_name_their_variable(
        #[case] vars: &'static [(&'static str, &'static str)],
        #[case] variable: &str,
        #[case] value: &str,
    ) {
        let err = LogSettings::from_lookup(lookup_from(vars)).expect_err("value is not supported");
        match err {
            LoggingError::UnsupportedValue { name, provided, .. } => {
                assert_eq!(name, variable);
                assert_eq!(provided, value);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_unicode_values_are_rejected() {
        let err = LogSettings::from_lookup(|name| {
            if name == LOG_SPANS_ENV {
                Err(env::VarError::NotUnicode(OsString::from("close")))
            } else {
                Err(env::VarError::NotPresent)
            }
        })
        .expect_err("non-Unicode value must fail");
        assert!(matches!(
            err,
            LoggingError::InvalidUnicode { name: LOG_SPANS_ENV, .. }
        ));
    }

    #[test]
    fn span_events_map_onto_fmt_span() {
        assert_eq!(SpanEvents::None.fmt_span(), FmtSpan::NONE);
        assert_eq!(SpanEvents::Close.fmt_span(), FmtSpan::CLOSE);
        assert_eq!(SpanEvents::Full.fmt_span(), FmtSpan::FULL);
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging().expect("logging must initialise");
        init_logging().expect("subsequent calls must be no-ops");
    }
}
