//! Log output setup.
//!
//! Two layers share stderr:
//! - progress lines (target [`PROGRESS_TARGET`]) are written bare, one message
//!   per line, so a redirected batch log reads `[<timestamp>, CMD] ...`
//! - everything else goes through the regular `fmt` layer filtered by
//!   `RUST_LOG` (default `info`)
//!
//! ANSI colours are only used when stderr is a terminal.

use std::fmt::{self, Write as _};
use std::io::IsTerminal;

use tracing::{Event, Subscriber};
use tracing_subscriber::filter::{filter_fn, LevelFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Target of the `[<timestamp>, CMD]` / `[<timestamp>, Progress]` lines.
pub const PROGRESS_TARGET: &str = "cwas_batch::progress";

/// Writes only the event's fields: no time, level, target or span context.
/// Progress events carry nothing but their message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressFormat;

impl<S, N> FormatEvent<S, N> for ProgressFormat
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
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Layer that prints progress events and nothing else.
pub fn progress_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(make_writer)
        .with_ansi(false)
        .event_format(ProgressFormat)
        .with_filter(Targets::new().with_target(PROGRESS_TARGET, LevelFilter::INFO))
}

/// Install the global subscriber. Call once, at startup.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let diagnostics = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_filter(env_filter)
        .with_filter(filter_fn(|meta| meta.target() != PROGRESS_TARGET));

    tracing_subscriber::registry()
        .with(progress_layer(std::io::stderr))
        .with(diagnostics)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn progress_lines_are_bare_messages() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(progress_layer(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("worker", id = 3);
            let _entered = span.enter();
            tracing::info!(target: PROGRESS_TARGET, "[2026-01-01 00:00:00, CMD] tool -i a.vcf");
            tracing::info!(input = "a.vcf", "Job exited unsuccessfully");
            tracing::info!(target: PROGRESS_TARGET, "[2026-01-01 00:00:01, Progress] Done");
        });

        assert_eq!(
            captured.contents(),
            "[2026-01-01 00:00:00, CMD] tool -i a.vcf\n[2026-01-01 00:00:01, Progress] Done\n"
        );
    }
}
