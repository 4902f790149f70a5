//! crates/logging/src/tracing_bridge.rs
//! Forwards `tracing` events into the default logging context.
//!
//! Libraries instrumented with `tracing` can share the channels of an
//! application that uses this crate: [`ChannelLayer`] turns every event into
//! a dispatched message. The event target becomes the component and the
//! event's file, module path and line become the location.
//!
//! | tracing level | channel level |
//! |---------------|---------------|
//! | `ERROR`       | `Critical`    |
//! | `WARN`        | `Component`   |
//! | `INFO`        | `Component`   |
//! | `DEBUG`       | `Logic`       |
//! | `TRACE`       | `Verbose`     |
//!
//! Fields other than `message` are appended as `name=value` pairs.
//!
//! ```rust,ignore
//! logging::init_tracing()?;
//! tracing::warn!(target: "cache", entries = 3, "evicting");
//! // dispatched as Component/"cache": "evicting entries=3"
//! ```

use std::fmt::{self, Write as _};

use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::global;
use crate::level::Level;
use crate::record::Location;

const UNKNOWN: &str = "<unknown>";

/// A tracing layer that dispatches events through the default context.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelLayer {
    _private: (),
}

impl ChannelLayer {
    /// Creates the layer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Maps a tracing level onto a channel level.
    #[must_use]
    pub const fn map_level(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::Critical,
            tracing::Level::WARN | tracing::Level::INFO => Level::Component,
            tracing::Level::DEBUG => Level::Logic,
            tracing::Level::TRACE => Level::Verbose,
        }
    }
}

impl<S> Layer<S> for ChannelLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let location = Location::new(
            metadata.file().unwrap_or(UNKNOWN),
            metadata.module_path().unwrap_or(UNKNOWN),
            metadata.line().unwrap_or(0),
        );

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        global::log_str(
            Self::map_level(metadata.level()),
            metadata.target(),
            location,
            None,
            &visitor.finish(),
        );
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={value}", field.name());
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        } else {
            self.push_field(field, format_args!("{value}"));
        }
    }
}

/// Installs a global tracing subscriber that forwards every event through
/// [`ChannelLayer`].
///
/// Fails when another global subscriber is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(ChannelLayer::new())
        .try_init()
}
