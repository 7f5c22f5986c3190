//! Custom tracing formatter for forwarder logs.
//!
//! The Azure Functions host interleaves forwarder output with application
//! logs, so every line is prefixed with `NR_FORWARDER` for filtering:
//!
//! ```text
//! NR_FORWARDER | INFO | forwarder started
//! NR_FORWARDER | ERROR | delivery failed after 3 attempts: unexpected status 403
//! ```
//!
//! Active spans are rendered with their fields in curly braces, from the
//! root span to the current one.

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::ForwarderError;

/// Log formatter that prefixes messages with `NR_FORWARDER`.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(&mut writer, "NR_FORWARDER | {} | ", metadata.level())?;

        // Include the full span hierarchy, root first.
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;

                let ext = span.extensions();
                if let Some(fields) = ext.get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global tracing subscriber with the forwarder formatter.
///
/// The filter silences HTTP-stack internals so host log streams only carry
/// forwarder output at the configured level.
pub fn init(log_level: &str) -> Result<(), ForwarderError> {
    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter).map_err(|e| {
            ForwarderError::InvalidConfig(format!("could not parse log level: {e}"))
        })?)
        .event_format(Formatter)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        ForwarderError::InvalidConfig(format!("failed to install tracing subscriber: {e}"))
    })
}
