use console::style;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields,
    },
    registry::LookupSpan,
};

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }
}

pub struct LevelFormatter;

impl<S, N> FormatEvent<S, N> for LevelFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        match *event.metadata().level() {
            Level::TRACE => write!(writer, "{} ", style("[TRACE]").magenta()),
            Level::DEBUG => write!(writer, "{} ", style("[DEBUG]").blue()),
            Level::INFO => write!(writer, "{} ", style("[INFO]").green()),
            Level::WARN => write!(writer, "{} ", style("[WARN]").yellow()),
            Level::ERROR => write!(writer, "{} ", style("[ERROR]").red()),
        }?;

        write!(writer, "{}", visitor.message.unwrap_or_default())?;
        if !visitor.fields.is_empty() {
            write!(writer, " {}", style(visitor.fields.join(" ")).dim())?;
        }
        writeln!(writer)
    }
}

/// Map `-q` / `-v` counts to a level. Degraded fetches log at WARN, so they
/// stay hidden unless at least one `-v` is given.
pub fn filter_level(verbose: u8, quiet: bool) -> Option<Level> {
    if quiet {
        return None;
    }
    Some(match verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    })
}

pub fn setup_logging(verbose: u8, quiet: bool, json: bool) {
    let directive = match filter_level(verbose, quiet) {
        Some(level) => format!("ghmap={level}"),
        None => "off".to_string(),
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(directive)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(LevelFormatter).finish())
    };

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
