//! crates/logging/src/console.rs
//! The built-in console channel.
//!
//! Each record becomes one line prefixed with a local timestamp:
//!
//! ```text
//! 2024/03/05 07:08:09 net connected            (VERBOSE, LOGIC, COMPONENT)
//! 2024/03/05 07:08:09 42 files copied          (OUTPUT)
//! [CRITICAL] 2024/03/05 07:08:09 net a.rs:f:42: boom
//! ```
//!
//! An attached error is written on the following line.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::OnceLock;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::channel::Channel;
use crate::error::LogError;
use crate::level::Level;
use crate::record::Record;

/// Timestamp layout used by the console channel.
pub const TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]/[month padding:zero]/[day padding:zero] [hour padding:zero]:[minute padding:zero]:[second padding:zero]"
);

const FALLBACK_TIMESTAMP: &str = "1970/01/01 00:00:00";

/// Process stream a console channel writes to when it has no stream of its own.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DefaultStream {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
}

impl DefaultStream {
    /// Name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stderr => "stderr",
            Self::Stdout => "stdout",
        }
    }

    fn write_record(self, record: &Record<'_>, timestamp: &str) -> io::Result<()> {
        match self {
            Self::Stderr => render_record(&mut io::stderr().lock(), record, timestamp),
            Self::Stdout => {
                let mut out = io::stdout().lock();
                render_record(&mut out, record, timestamp)?;
                out.flush()
            }
        }
    }
}

impl fmt::Display for DefaultStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefaultStream {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" => Ok(Self::Stderr),
            "stdout" => Ok(Self::Stdout),
            _ => Err(LogError::InvalidConfig {
                key: "stream",
                value: s.to_owned(),
            }),
        }
    }
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// The local UTC offset, determined once and reused afterwards.
///
/// On Unix the offset can only be read safely while the process has a
/// single thread, so it is looked up when a [`LogContext`] is created and
/// cached from the first successful lookup on. Call this early in `main`,
/// before spawning threads, when nothing else creates a context first.
/// Returns `None` while no lookup has succeeded; [`Clock::Local`] writes UTC
/// until then. The cached offset does not follow later daylight saving
/// changes.
///
/// [`LogContext`]: crate::LogContext
pub fn local_offset() -> Option<UtcOffset> {
    resolve_offset(&LOCAL_OFFSET, || UtcOffset::current_local_offset().ok())
}

fn resolve_offset(
    cache: &OnceLock<UtcOffset>,
    lookup: impl FnOnce() -> Option<UtcOffset>,
) -> Option<UtcOffset> {
    if let Some(offset) = cache.get() {
        return Some(*offset);
    }
    let offset = lookup()?;
    Some(*cache.get_or_init(|| offset))
}

fn now_in(offset: Option<UtcOffset>) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    offset.map_or(now, |offset| now.to_offset(offset))
}

/// Source of console timestamps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Clock {
    /// Current local time using [`local_offset`], or UTC while the offset
    /// is unknown.
    #[default]
    Local,
    /// A fixed instant, for reproducible output.
    Fixed(PrimitiveDateTime),
}

impl Clock {
    /// Renders the current timestamp as `YYYY/MM/DD HH:MM:SS`.
    #[must_use]
    pub fn timestamp(&self) -> String {
        let formatted = match self {
            Self::Local => now_in(local_offset()).format(TIMESTAMP_FORMAT),
            Self::Fixed(instant) => instant.format(TIMESTAMP_FORMAT),
        };
        formatted.unwrap_or_else(|_| FALLBACK_TIMESTAMP.to_owned())
    }
}

/// Writes the console rendering of `record` to `out`.
///
/// ```
/// use logging::{Level, Location, Record, render_record};
///
/// let record = Record::new(Level::Output, "X", Location::new("a.rs", "f", 1), None, "hello");
/// let mut out = Vec::new();
/// render_record(&mut out, &record, "2024/03/05 07:08:09")?;
/// assert_eq!(out, b"2024/03/05 07:08:09 hello\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_record<W>(out: &mut W, record: &Record<'_>, timestamp: &str) -> io::Result<()>
where
    W: Write + ?Sized,
{
    match record.level() {
        Level::Output => writeln!(out, "{timestamp} {}", record.message())?,
        Level::Critical => {
            let location = record.location();
            writeln!(
                out,
                "[{}] {timestamp} {} {}:{}:{}: {}",
                record.level().label(),
                record.component(),
                location.file(),
                location.function(),
                location.line(),
                record.message(),
            )?;
        }
        Level::Verbose | Level::Logic | Level::Component => {
            writeln!(out, "{timestamp} {} {}", record.component(), record.message())?;
        }
    }

    if let Some(error) = record.error() {
        writeln!(out, "{error}")?;
    }
    Ok(())
}

/// Console channel writing to a stream of its own or to a process stream.
///
/// A stream installed with [`set_stream`](Self::set_stream) belongs to the
/// channel: it is flushed and closed on finalize. The default process stream
/// is never closed.
pub struct ConsoleChannel {
    stream: Option<Box<dyn Write + Send>>,
    default_stream: DefaultStream,
    clock: Clock,
}

impl ConsoleChannel {
    /// Creates a channel that writes to `default_stream`.
    #[must_use]
    pub fn new(default_stream: DefaultStream) -> Self {
        Self {
            stream: None,
            default_stream,
            clock: Clock::Local,
        }
    }

    /// Creates a channel that owns `stream`.
    #[must_use]
    pub fn to_stream(stream: Box<dyn Write + Send>) -> Self {
        let mut channel = Self::new(DefaultStream::default());
        channel.stream = Some(stream);
        channel
    }

    /// Replaces the clock used for timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the clock used for timestamps in place.
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Installs or clears the channel's own stream and returns the previous one.
    ///
    /// The previous stream is handed back unflushed; closing it is up to the
    /// caller.
    pub fn set_stream(
        &mut self,
        stream: Option<Box<dyn Write + Send>>,
    ) -> Option<Box<dyn Write + Send>> {
        std::mem::replace(&mut self.stream, stream)
    }

    /// Reports whether the channel writes to a stream of its own.
    #[must_use]
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Process stream used when the channel has no stream of its own.
    #[must_use]
    pub const fn default_stream(&self) -> DefaultStream {
        self.default_stream
    }
}

impl Channel for ConsoleChannel {
    fn log(&mut self, record: &Record<'_>) {
        let timestamp = self.clock.timestamp();
        let _ = match self.stream.as_mut() {
            Some(stream) => render_record(stream, record, &timestamp).and_then(|()| stream.flush()),
            None => self.default_stream.write_record(record, &timestamp),
        };
    }

    fn finalize(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush();
        }
    }
}

impl fmt::Debug for ConsoleChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleChannel")
            .field("has_stream", &self.stream.is_some())
            .field("default_stream", &self.default_stream)
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SharedBuffer;
    use crate::record::Location;
    use time::macros::datetime;

    const TS: &str = "2024/03/05 07:08:09";

    fn render(record: &Record<'_>) -> String {
        let mut out = Vec::new();
        render_record(&mut out, record, TS).expect("render into vec");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn output_level_omits_component() {
        let record = Record::new(
            Level::Output,
            "X",
            Location::new("a.c", "f", 1),
            None,
            "hello",
        );
        assert_eq!(render(&record), format!("{TS} hello\n"));
    }

    #[test]
    fn critical_level_includes_location() {
        let record = Record::new(
            Level::Critical,
            "net",
            Location::new("a.c", "f", 42),
            None,
            "boom",
        );
        assert_eq!(
            render(&record),
            format!("[CRITICAL] {TS} net a.c:f:42: boom\n")
        );
    }

    #[test]
    fn other_levels_include_component() {
        for level in [Level::Verbose, Level::Logic, Level::Component] {
            let record = Record::new(level, "db", Location::new("a.c", "f", 1), None, "ready");
            assert_eq!(render(&record), format!("{TS} db ready\n"));
        }
    }

    #[test]
    fn error_is_written_on_following_line_for_every_level() {
        let err = io::Error::other("oops");
        for level in Level::ALL {
            let record = Record::new(level, "db", Location::new("a.c", "f", 1), Some(&err), "m");
            let rendered = render(&record);
            let lines: Vec<&str> = rendered.lines().collect();
            assert_eq!(lines.len(), 2, "level {level}");
            assert_eq!(lines[1], "oops");
        }
    }

    #[test]
    fn fixed_clock_formats_zero_padded() {
        let clock = Clock::Fixed(datetime!(2024-03-05 07:08:09));
        assert_eq!(clock.timestamp(), TS);
    }

    #[test]
    fn offset_lookup_is_cached_after_first_success() {
        let cache = OnceLock::new();
        let east = UtcOffset::from_hms(2, 0, 0).unwrap();

        assert_eq!(resolve_offset(&cache, || None), None);
        assert_eq!(resolve_offset(&cache, || Some(east)), Some(east));
        assert_eq!(resolve_offset(&cache, || None), Some(east));
        assert_eq!(resolve_offset(&cache, || Some(UtcOffset::UTC)), Some(east));
    }

    #[test]
    fn local_time_uses_cached_offset() {
        let east = UtcOffset::from_hms(5, 30, 0).unwrap();
        assert_eq!(now_in(Some(east)).offset(), east);
        assert_eq!(now_in(None).offset(), UtcOffset::UTC);
    }

    #[test]
    fn local_clock_has_expected_shape() {
        let stamp = Clock::Local.timestamp();
        assert_eq!(stamp.len(), TS.len());
        assert_eq!(&stamp[4..5], "/");
        assert_eq!(&stamp[10..11], " ");
    }

    #[test]
    fn channel_writes_to_own_stream() {
        let buffer = SharedBuffer::new();
        let mut channel = ConsoleChannel::to_stream(Box::new(buffer.clone()))
            .with_clock(Clock::Fixed(datetime!(2024-03-05 07:08:09)));
        channel.log(&Record::new(
            Level::Output,
            "X",
            Location::new("a.c", "f", 1),
            None,
            "hello",
        ));
        assert_eq!(buffer.contents(), format!("{TS} hello\n"));
    }

    #[test]
    fn finalize_drops_own_stream_only() {
        let buffer = SharedBuffer::new();
        let mut channel = ConsoleChannel::to_stream(Box::new(buffer));
        assert!(channel.has_stream());
        channel.finalize();
        assert!(!channel.has_stream());

        let mut channel = ConsoleChannel::new(DefaultStream::Stderr);
        channel.finalize();
        assert_eq!(channel.default_stream(), DefaultStream::Stderr);
    }

    #[test]
    fn set_stream_returns_previous() {
        let mut channel = ConsoleChannel::new(DefaultStream::Stdout);
        assert!(channel.set_stream(Some(Box::new(SharedBuffer::new()))).is_none());
        assert!(channel.set_stream(None).is_some());
        assert!(!channel.has_stream());
    }

    #[test]
    fn default_stream_parses_names() {
        assert_eq!("stdout".parse::<DefaultStream>().unwrap(), DefaultStream::Stdout);
        assert_eq!("STDERR".parse::<DefaultStream>().unwrap(), DefaultStream::Stderr);
        assert!("printer".parse::<DefaultStream>().is_err());
        assert_eq!(DefaultStream::Stdout.to_string(), "stdout");
    }
}
