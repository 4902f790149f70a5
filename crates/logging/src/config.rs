//! crates/logging/src/config.rs
//! Configuration for a logging context.

use crate::console::DefaultStream;
use crate::error::{LogError, LogResult};

/// Initial capacity of the per-call message buffer.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 128;

/// Environment variable selecting the console's default stream.
pub const ENV_STREAM: &str = "CHANLOG_STREAM";
/// Environment variable overriding the message buffer capacity.
pub const ENV_MESSAGE_CAPACITY: &str = "CHANLOG_MESSAGE_CAPACITY";
/// Environment variable limiting the number of registered channels.
pub const ENV_MAX_CHANNELS: &str = "CHANLOG_MAX_CHANNELS";

/// Settings used when a [`LogContext`](crate::LogContext) is constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LogConfig {
    /// Stream the built-in console channel writes to.
    pub default_stream: DefaultStream,
    /// Initial capacity hint of the per-call message buffer.
    pub message_capacity: usize,
    /// Maximum number of registered channels, unlimited when `None`.
    pub max_channels: Option<usize>,
    /// Whether the context starts with the built-in console channel.
    pub console: bool,
}

impl LogConfig {
    /// Selects the console's default stream.
    #[must_use]
    pub const fn with_default_stream(mut self, stream: DefaultStream) -> Self {
        self.default_stream = stream;
        self
    }

    /// Sets the initial capacity hint of the message buffer.
    #[must_use]
    pub const fn with_message_capacity(mut self, capacity: usize) -> Self {
        self.message_capacity = capacity;
        self
    }

    /// Limits the number of registered channels.
    #[must_use]
    pub const fn with_max_channels(mut self, limit: Option<usize>) -> Self {
        self.max_channels = limit;
        self
    }

    /// Starts the context without the built-in console channel.
    #[must_use]
    pub const fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    /// Reads overrides from the process environment.
    ///
    /// See [`from_lookup`](Self::from_lookup) for the recognised variables.
    pub fn from_env() -> LogResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from a key lookup, starting from the defaults.
    ///
    /// Recognised keys are [`ENV_STREAM`] (`stderr` or `stdout`),
    /// [`ENV_MESSAGE_CAPACITY`] and [`ENV_MAX_CHANNELS`] (non-negative
    /// integers). Missing keys keep their default; unparsable values are
    /// reported as [`LogError::InvalidConfig`].
    ///
    /// ```
    /// use logging::{DefaultStream, LogConfig};
    ///
    /// let config = LogConfig::from_lookup(|key| match key {
    ///     "CHANLOG_STREAM" => Some("stdout".to_owned()),
    ///     _ => None,
    /// })?;
    /// assert_eq!(config.default_stream, DefaultStream::Stdout);
    /// # Ok::<(), logging::LogError>(())
    /// ```
    pub fn from_lookup<F>(lookup: F) -> LogResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_STREAM) {
            config.default_stream = value.parse()?;
        }
        if let Some(value) = lookup(ENV_MESSAGE_CAPACITY) {
            config.message_capacity = parse_count("message_capacity", &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CHANNELS) {
            config.max_channels = Some(parse_count("max_channels", &value)?);
        }
        Ok(config)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_stream: DefaultStream::Stderr,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            max_channels: None,
            console: true,
        }
    }
}

fn parse_count(key: &'static str, value: &str) -> LogResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| LogError::InvalidConfig {
            key,
            value: value.to_owned(),
        })
}
