use std::backtrace::Backtrace;
use std::env;
use std::panic::PanicHookInfo;

use tracing::Event;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Send the logs of the demo to a daily rotated file `<dir>/<app_name>.*`.
///
/// `RUST_LOG` overrides `level` if it is set. The returned guard flushes the
/// file writer when dropped.
pub fn init_logging(
    app_name: &str,
    dir: &str,
    level: &str,
) -> anyhow::Result<WorkerGuard> {
    install_panic_hook();

    let file = RollingFileAppender::new(Rotation::DAILY, dir, app_name);
    let (writer, guard) = tracing_appender::non_blocking(file);

    let file_layer = fmt::Layer::new()
        .with_span_events(fmt::format::FmtSpan::NONE)
        .with_writer(writer)
        .with_ansi(false)
        .event_format(LineFormatter {});

    let directives =
        env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| level.to_string());

    let subscriber = Registry::default()
        .with(EnvFilter::new(directives))
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("logging to {}/{} at {}", dir, app_name, level);
    Ok(guard)
}

/// Log a panic with its backtrace before the default hook prints it.
fn install_panic_hook() {
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic(info);
        prev(info);
    }));
}

fn log_panic(info: &PanicHookInfo) {
    let backtrace = Backtrace::force_capture().to_string();
    let message = info.to_string().replace('\n', " ");

    match info.location() {
        Some(loc) => tracing::error!(
            message = %message,
            backtrace = %backtrace,
            panic.file = loc.file(),
            panic.line = loc.line(),
        ),
        None => tracing::error!(message = %message, backtrace = %backtrace),
    }
}

/// One line per event: `<time> <level> <target>: <fields>`.
struct LineFormatter {}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        SystemTime {}.format_time(&mut writer)?;
        write!(writer, " {:>5} {}: ", meta.level().as_str(), meta.target())?;

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
