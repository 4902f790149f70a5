//! crates/logging/src/context.rs
//! The logging context: registry, built-in channels and the dispatcher.

use std::error::Error;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};

use crate::channel::{ChannelSlot, FinalizeFn, LogFn, OutChannel};
use crate::config::LogConfig;
use crate::console::{self, ConsoleChannel};
use crate::error::LogResult;
use crate::level::Level;
use crate::record::{Location, Record};
use crate::registry::{ChannelId, Registry};

/// Component name used for the facility's own diagnostics.
pub const COMPONENT: &str = "chanlog";

const CHANNEL_ALLOCATION_FAILED: &str = "No memory to allocate output channel.";
const BUFFER_ALLOCATION_FAILED: &str = "No memory for log message buffer.";

/// A self-contained logging facility.
///
/// The context owns the channel registry and remembers which registered
/// channels are the built-in console and platform channels. Tests construct
/// their own contexts; applications usually go through the process-wide
/// default in [`global`](crate::global).
///
/// Dropping a context runs its exit hook: if a channel was added since the
/// last teardown, every registered channel is finalized.
///
/// ```
/// use logging::{ChannelSlot, Level, LogConfig, LogContext, Record, location};
///
/// fn count(total: &mut usize, _record: &Record<'_>) {
///     *total += 1;
/// }
///
/// let mut context = LogContext::new(LogConfig::default().without_console());
/// let slot = context.create_channel(0usize, count, None).expect("room for a channel");
/// let id = context.add_channel(slot)?;
///
/// context.log(Level::Component, "db", location!(), None, format_args!("{} rows", 3));
/// assert_eq!(context.set_channel_data(id, 0usize), Some(1));
/// # Ok::<(), logging::LogError>(())
/// ```
pub struct LogContext {
    registry: Registry,
    config: LogConfig,
    console: Option<Arc<Mutex<ConsoleChannel>>>,
    console_id: Option<ChannelId>,
    platform_id: Option<ChannelId>,
}

impl LogContext {
    /// Creates a context, seeded with the console channel unless the
    /// configuration disables it.
    ///
    /// Also looks up the local UTC offset for console timestamps while the
    /// process may still be single-threaded; see [`local_offset`].
    ///
    /// [`local_offset`]: crate::local_offset
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        let _ = console::local_offset();
        let mut registry = Registry::with_limit(config.max_channels);
        let (console, console_id) = if config.console {
            let console = Arc::new(Mutex::new(ConsoleChannel::new(config.default_stream)));
            let id = registry.seed(ChannelSlot::borrowed(&console));
            (Some(console), Some(id))
        } else {
            (None, None)
        };

        Self {
            registry,
            config,
            console,
            console_id,
            platform_id: None,
        }
    }

    /// Creates a context with no channels at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(LogConfig::default().without_console())
    }

    /// Configuration the context was built with.
    #[must_use]
    pub const fn config(&self) -> &LogConfig {
        &self.config
    }

    /// The channel registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle to the built-in console channel, registered or not.
    ///
    /// Use it to redirect the console to a stream of its own or to change
    /// its clock.
    #[must_use]
    pub fn console(&self) -> Option<&Arc<Mutex<ConsoleChannel>>> {
        self.console.as_ref()
    }

    /// Id of the built-in console channel while it is registered.
    #[must_use]
    pub const fn console_id(&self) -> Option<ChannelId> {
        self.console_id
    }

    /// Id of the platform channel while it is registered.
    #[must_use]
    pub const fn platform_id(&self) -> Option<ChannelId> {
        self.platform_id
    }

    /// Builds an owned channel after reserving room for it in the registry.
    ///
    /// Returns `None` when the registry cannot take another channel; the
    /// failure is reported at [`Level::Critical`] through the channels that
    /// are already registered.
    pub fn create_channel<D>(
        &mut self,
        data: D,
        log: LogFn<D>,
        finalize: Option<FinalizeFn<D>>,
    ) -> Option<ChannelSlot>
    where
        D: Send + 'static,
    {
        if let Err(err) = self.registry.reserve() {
            self.log_str(
                Level::Critical,
                COMPONENT,
                crate::location!(),
                Some(&err),
                CHANNEL_ALLOCATION_FAILED,
            );
            return None;
        }
        Some(ChannelSlot::owned(OutChannel::new(data, log, finalize)))
    }

    /// Registers a channel at the head of the chain.
    pub fn add_channel(&mut self, slot: ChannelSlot) -> LogResult<ChannelId> {
        self.registry.add(slot)
    }

    /// Unregisters and finalizes a channel. Unknown ids are ignored.
    pub fn remove_channel(&mut self, id: ChannelId) -> bool {
        if self.console_id == Some(id) {
            self.console_id = None;
        }
        if self.platform_id == Some(id) {
            self.platform_id = None;
        }
        self.registry.remove(id)
    }

    /// Replaces the data handle of a registered [`OutChannel<D>`].
    ///
    /// Returns the previous handle, or `None` when `id` is not registered,
    /// is a borrowed channel, or holds a different data type.
    pub fn set_channel_data<D>(&mut self, id: ChannelId, data: D) -> Option<D>
    where
        D: 'static,
    {
        let channel = self
            .registry
            .get_mut(id)?
            .as_any_mut()?
            .downcast_mut::<OutChannel<D>>()?;
        Some(channel.set_data(data))
    }

    /// Removes the built-in console channel if it is registered.
    pub fn remove_console_channel(&mut self) -> bool {
        self.console_id
            .take()
            .is_some_and(|id| self.registry.remove(id))
    }

    /// Registers the built-in console channel again after a removal or
    /// teardown. Returns its id, or `None` when the context was built without
    /// a console.
    pub fn restore_console_channel(&mut self) -> LogResult<Option<ChannelId>> {
        if let Some(id) = self.console_id {
            return Ok(Some(id));
        }
        let Some(console) = self.console.as_ref() else {
            return Ok(None);
        };
        let id = self.registry.add(ChannelSlot::borrowed(console))?;
        self.console_id = Some(id);
        Ok(Some(id))
    }

    /// Registers the platform channel ahead of the channels already present.
    ///
    /// A previously installed platform channel is removed first.
    pub fn install_platform_channel(&mut self, slot: ChannelSlot) -> LogResult<ChannelId> {
        self.remove_platform_channel();
        let id = self.registry.add(slot)?;
        self.platform_id = Some(id);
        Ok(id)
    }

    /// Removes the platform channel if one is registered.
    pub fn remove_platform_channel(&mut self) -> bool {
        self.platform_id
            .take()
            .is_some_and(|id| self.registry.remove(id))
    }

    /// Finalizes every registered channel and empties the registry.
    ///
    /// Returns the number of channels finalized; a second call returns zero.
    pub fn finalize(&mut self) -> usize {
        self.console_id = None;
        self.platform_id = None;
        self.registry.teardown()
    }

    /// Runs the exit hook: tears the registry down if a channel was added
    /// since the last teardown. Returns whether the teardown ran.
    pub fn shutdown(&mut self) -> bool {
        if !self.registry.run_exit_hook() {
            return false;
        }
        self.console_id = None;
        self.platform_id = None;
        true
    }

    /// Formats a message once and delivers it to every registered channel.
    ///
    /// Never fails and never panics: when the message buffer cannot be
    /// reserved, a fixed critical notice is dispatched instead and the
    /// message is dropped.
    pub fn log(
        &mut self,
        level: Level,
        component: &str,
        location: Location,
        error: Option<&dyn Error>,
        args: fmt::Arguments<'_>,
    ) {
        let mut buffer = String::new();
        if buffer.try_reserve(self.config.message_capacity).is_err() {
            self.log_str(
                Level::Critical,
                COMPONENT,
                crate::location!(),
                None,
                BUFFER_ALLOCATION_FAILED,
            );
            return;
        }

        // A failing Display impl leaves whatever was rendered so far.
        let _ = buffer.write_fmt(args);
        self.log_str(level, component, location, error, &buffer);
    }

    /// Delivers an already rendered message to every registered channel.
    pub fn log_str(
        &mut self,
        level: Level,
        component: &str,
        location: Location,
        error: Option<&dyn Error>,
        message: &str,
    ) {
        let record = Record::new(level, component, location, error, message);
        self.registry.dispatch(&record);
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("console_id", &self.console_id)
            .field("platform_id", &self.platform_id)
            .finish()
    }
}
