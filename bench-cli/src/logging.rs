//! Log setup.
//!
//! Two outputs share one `tracing` subscriber:
//!
//! - the experiment log file: only events under [`EVENT_TARGET`], one line
//!   each, appended as `"<unix_ms>", "<pid>", "<thread>", "<record>"`
//! - stderr: diagnostics, filtered by `RUST_LOG` (default `info`)
//!
//! [`parse_line`] reads the file format back for `analyze`.

use anyhow::{Context, Result};
use bench_node::EVENT_TARGET;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{Directive, EnvFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Separator between the quoted columns of a log line.
const COLUMN_SEPARATOR: &str = "\", \"";

/// Formats an event as one quoted, comma-separated log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLineFormat;

impl<S, N> FormatEvent<S, N> for EventLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;
        let line = format_line(unix_ms(), std::process::id(), &thread_label(), &message);
        writeln!(writer, "{line}")
    }
}

/// Render one log line.
pub fn format_line(at_ms: u64, pid: u32, thread: &str, message: &str) -> String {
    let sep = COLUMN_SEPARATOR;
    format!("\"{at_ms}{sep}{pid}{sep}{thread}{sep}{message}\"")
}

/// Split a log line into its timestamp and message.
///
/// Returns `None` for lines not in the event log format.
pub fn parse_line(line: &str) -> Option<(u64, &str)> {
    let inner = line.trim().strip_prefix('"')?.strip_suffix('"')?;
    let mut columns = inner.splitn(4, COLUMN_SEPARATOR);
    let at_ms = columns.next()?.parse().ok()?;
    let _pid = columns.next()?;
    let _thread = columns.next()?;
    let message = columns.next()?;
    Some((at_ms, message))
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn thread_label() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

/// Install the global subscriber.
///
/// With `event_log`, event records are appended to that file. Diagnostics
/// always go to stderr.
pub fn init(event_log: Option<&Path>) -> Result<()> {
    let events_off: Directive = format!("{EVENT_TARGET}=off")
        .parse()
        .context("Invalid log directive")?;
    let diagnostics = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(events_off);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(diagnostics);

    let event_layer = match event_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(EventLineFormat)
                    .with_writer(Mutex::new(file))
                    .with_filter(Targets::new().with_target(EVENT_TARGET, Level::INFO)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(event_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct TestWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    struct TestWriterGuard {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl<'a> MakeWriter<'a> for TestWriter {
        type Writer = TestWriterGuard;

        fn make_writer(&'a self) -> Self::Writer {
            TestWriterGuard {
                buffer: self.buffer.clone(),
            }
        }
    }

    impl Write for TestWriterGuard {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parses_event_lines() {
        let line = r#""1700000000123", "4242", "node-0", "PUBL_MSG::node-0::node-0=7""#;
        assert_eq!(
            parse_line(line),
            Some((1_700_000_000_123, "PUBL_MSG::node-0::node-0=7"))
        );
    }

    #[test]
    fn message_may_contain_the_separator() {
        let line = format_line(5, 1, "t", r#"RECV_MSG::a::x", "y"#);
        assert_eq!(parse_line(&line), Some((5, r#"RECV_MSG::a::x", "y"#)));
    }

    #[test]
    fn rejects_other_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("PUBL_MSG::a::a=1"), None);
        assert_eq!(parse_line(r#""abc", "1", "t", "NODE_INIT::a""#), None);
        assert_eq!(parse_line(r#""1", "2""#), None);
    }

    #[test]
    fn event_format_writes_quoted_columns() {
        let writer = TestWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .event_format(EventLineFormat)
            .with_writer(writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: EVENT_TARGET, "{}", "NODE_INIT::a");
        });

        let output = String::from_utf8(writer.buffer.lock().unwrap().clone()).unwrap();
        let (at_ms, message) = parse_line(output.trim_end()).unwrap();
        assert!(at_ms > 0);
        assert_eq!(message, "NODE_INIT::a");
        assert!(output.contains(&format!("\"{}\"", std::process::id())));
    }
}
