use std::fmt::{self as stdfmt, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use tagx_config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

// ---------------------------------------------------------------------------
// DomainFormat
// ---------------------------------------------------------------------------

/// Plain-text formatter that renders the `domain` field injected by the
/// `tx_*` macros as a `[domain]` prefix:
///
/// ```text
/// 2026-10-19T08:12:40Z DEBUG [compile] program compiled ty="app::User" fields=8 exprs=10
/// ```
struct DomainFormat {
    timer: SystemTime,
}

impl<S, N> FormatEvent<S, N> for DomainFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> fmt::FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        let ansi = writer.has_ansi_escapes();

        if self.timer.format_time(&mut writer).is_err() {
            write!(writer, "<unknown time>")?;
        }

        let level = *event.metadata().level();
        if ansi {
            let color = match level {
                Level::ERROR => "31",
                Level::WARN => "33",
                Level::INFO => "32",
                Level::DEBUG => "34",
                Level::TRACE => "35",
            };
            write!(writer, " \x1b[{color}m{level:>5}\x1b[0m ")?;
        } else {
            write!(writer, " {level:>5} ")?;
        }

        let mut fields = DomainFields::default();
        event.record(&mut fields);
        if let Some(domain) = &fields.domain {
            if ansi {
                write!(writer, "\x1b[1;36m[{domain}]\x1b[0m ")?;
            } else {
                write!(writer, "[{domain}] ")?;
            }
        }
        write!(writer, "{}", fields.message)?;
        if !fields.rest.is_empty() {
            write!(writer, " {}", fields.rest)?;
        }
        writeln!(writer)
    }
}

/// Splits `domain` and `message` from the remaining event fields.
#[derive(Default)]
struct DomainFields {
    domain: Option<String>,
    message: String,
    rest: String,
}

impl DomainFields {
    fn push(&mut self, name: &str, value: impl stdfmt::Display) {
        if !self.rest.is_empty() {
            self.rest.push(' ');
        }
        write!(&mut self.rest, "{name}={value}").ok();
    }
}

impl Visit for DomainFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "domain" => self.domain = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => self.push(name, format_args!("{value:?}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn stdfmt::Debug) {
        match field.name() {
            "domain" => self.domain = Some(format!("{value:?}").trim_matches('"').to_string()),
            "message" => {
                write!(&mut self.message, "{value:?}").ok();
            }
            name => self.push(name, format_args!("{value:?}")),
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field.name(), value);
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG`, when set, replaces the configured directives. The returned
/// guard flushes the log file on drop and must outlive every log call.
pub fn init_tracing(config: &LoggingConfig, base_dir: &Path) -> Result<Option<WorkerGuard>> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let directives = config.filter_directives();
        EnvFilter::try_new(&directives)
            .map_err(|e| anyhow::anyhow!("invalid log filter '{directives}': {e}"))?
    };
    let json = config.format == LogFormat::Json;

    let (file_sink, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = file_writer(&resolve(path, base_dir))?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer: BoxedLayer = if json {
        fmt::layer()
            .json()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .event_format(DomainFormat { timer: SystemTime })
            .with_writer(std::io::stderr)
            .boxed()
    };
    let file_layer: Option<BoxedLayer> = file_sink.map(|writer| {
        if json {
            fmt::layer()
                .json()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .boxed()
        } else {
            fmt::layer()
                .event_format(DomainFormat { timer: SystemTime })
                .with_ansi(false)
                .with_writer(writer)
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(stderr_layer.and_then(file_layer).with_filter(filter))
        .init();

    Ok(guard)
}

fn resolve(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("log file path has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name"))?;
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
