#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `chanlog` is an embeddable logging facility. Callers emit leveled,
//! component-tagged messages, optionally with an attached error, and every
//! message is delivered to each registered output channel: the built-in
//! console, the platform log, log files or custom channels.
//!
//! This crate is the facade over the workspace:
//!
//! - [`logging`] holds the registry, the dispatcher, the console channel and
//!   the process-wide default context the macros log through;
//! - [`logging_sink`] holds the platform (syslog) channel and file-backed
//!   channels.
//!
//! [`Builder`] wires the usual setup: configure the default context, put the
//! platform channel ahead of the console, and hand back a [`ShutdownGuard`]
//! that finalizes every channel when `main` returns.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use chanlog::{Builder, ChannelSlot, LogConfig, OutChannel, Record, global};
//! use chanlog::{log_component, log_critical};
//!
//! fn remember(lines: &mut Arc<Mutex<Vec<String>>>, record: &Record<'_>) {
//!     let error = record.error_message().unwrap_or_default();
//!     lines.lock().unwrap().push(format!("{} {error}", record.message()));
//! }
//!
//! let _guard = Builder::new()
//!     .config(LogConfig::default().without_console())
//!     .init()?;
//!
//! let lines = Arc::new(Mutex::new(Vec::new()));
//! global::add_channel(ChannelSlot::owned(OutChannel::new(Arc::clone(&lines), remember, None)))?;
//!
//! let err = std::io::Error::other("connection reset");
//! log_component!("net", "connected to {}", "db1");
//! log_critical!("net", error = &err, "lost {}", "db1");
//!
//! assert_eq!(*lines.lock().unwrap(), vec!["connected to db1 ", "lost db1 connection reset"]);
//! # Ok::<(), chanlog::LogError>(())
//! ```

use std::fmt;

pub use logging::{
    COMPONENT, Channel, ChannelId, ChannelSlot, Clock, ConsoleChannel, DEFAULT_MESSAGE_CAPACITY,
    DefaultStream, ENV_MAX_CHANNELS, ENV_MESSAGE_CAPACITY, ENV_STREAM, ExitHook, ExitHookState,
    FinalizeFn, Level, Location, LogConfig, LogContext, LogError, LogFn, LogResult, OutChannel,
    Record, Registry, SharedChannel, ShutdownGuard, TIMESTAMP_FORMAT, global, local_offset,
    location, log_at, log_component, log_critical, log_logic, log_output, log_to, log_verbose,
    render_record, shutdown_guard,
};
#[cfg(feature = "test-support")]
pub use logging::{
    Capture, CaptureChannel, CapturedRecord, DefaultContextSession, SharedBuffer,
    default_context_session,
};
#[cfg(feature = "tracing")]
pub use logging::{ChannelLayer, init_tracing};

#[cfg(feature = "test-support")]
pub use logging_sink::{MemoryBackend, PlatformEntry};
#[cfg(unix)]
pub use logging_sink::{SyslogBackend, syslog};
pub use logging_sink::{PlatformBackend, PlatformChannel, PlatformPriority, open_log_file};

#[cfg(unix)]
use logging_sink::syslog::SyslogConfig;

enum Platform {
    Channel(ChannelSlot),
    #[cfg(unix)]
    Syslog(SyslogConfig),
}

impl Platform {
    fn into_slot(self) -> ChannelSlot {
        match self {
            Self::Channel(slot) => slot,
            #[cfg(unix)]
            Self::Syslog(config) => {
                ChannelSlot::owned(PlatformChannel::new(SyslogBackend::open(&config)))
            }
        }
    }
}

/// Sets up the process-wide default logging context.
///
/// The default builder keeps [`LogConfig::default`] and installs no platform
/// channel.
#[derive(Default)]
pub struct Builder {
    config: LogConfig,
    platform: Option<Platform>,
}

impl Builder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the configuration found in the process environment.
    pub fn from_env() -> LogResult<Self> {
        Ok(Self::new().config(LogConfig::from_env()?))
    }

    /// Replaces the context configuration.
    #[must_use]
    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs `slot` as the platform channel, ahead of the console.
    #[must_use]
    pub fn platform_channel(mut self, slot: ChannelSlot) -> Self {
        self.platform = Some(Platform::Channel(slot));
        self
    }

    /// Uses syslog(3) as the platform channel. The connection is opened by
    /// [`init`](Self::init) or [`build`](Self::build).
    #[cfg(unix)]
    #[must_use]
    pub fn syslog(mut self, config: SyslogConfig) -> Self {
        self.platform = Some(Platform::Syslog(config));
        self
    }

    /// Builds a standalone context instead of touching the default one.
    pub fn build(self) -> LogResult<LogContext> {
        let mut context = LogContext::new(self.config);
        if let Some(platform) = self.platform {
            context.install_platform_channel(platform.into_slot())?;
        }
        Ok(context)
    }

    /// Replaces the default context and returns the guard that runs its exit
    /// hook. Call it from `main` before spawning threads so console
    /// timestamps get the local offset.
    pub fn init(self) -> LogResult<ShutdownGuard> {
        global::init(self.config)?;
        if let Some(platform) = self.platform {
            global::install_platform_channel(platform.into_slot())?;
        }
        Ok(shutdown_guard())
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let platform = match &self.platform {
            None => "none",
            Some(Platform::Channel(_)) => "channel",
            #[cfg(unix)]
            Some(Platform::Syslog(_)) => "syslog",
        };
        f.debug_struct("Builder")
            .field("config", &self.config)
            .field("platform", &platform)
            .finish()
    }
}
