//! crates/logging/src/global.rs
//! The process-wide default logging context.
//!
//! The process lazily gets one [`LogContext`], seeded with the console
//! channel and built from [`LogConfig::default`] unless [`init`] ran first.
//! Every thread logs into the same context, so a channel registered on one
//! thread sees messages from all of them. Calls are serialized by a mutex.
//! The free functions here mirror the context's methods and are what the
//! logging macros call.
//!
//! A channel that logs from inside its own `log` or `finalize` would re-enter
//! the context; such nested calls are dropped instead of deadlocking or
//! panicking. Registration functions report [`LogError::Unavailable`] in that
//! situation.

use std::cell::Cell;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::channel::{ChannelSlot, FinalizeFn, LogFn};
use crate::config::LogConfig;
use crate::console::ConsoleChannel;
use crate::context::LogContext;
use crate::error::{LogError, LogResult};
use crate::level::Level;
use crate::record::Location;
use crate::registry::ChannelId;

static CONTEXT: Mutex<Option<LogContext>> = Mutex::new(None);

thread_local! {
    // Set while this thread holds CONTEXT.
    static ENTERED: Cell<bool> = const { Cell::new(false) };
}

struct Entered;

impl Entered {
    fn enter() -> Option<Self> {
        ENTERED
            .try_with(|entered| (!entered.replace(true)).then_some(Self))
            .ok()
            .flatten()
    }
}

impl Drop for Entered {
    fn drop(&mut self) {
        let _ = ENTERED.try_with(|entered| entered.set(false));
    }
}

/// Runs `f` against the default context, creating it on first use.
///
/// Returns `None` when the current thread is already inside the context
/// further up the stack, or when the thread is shutting down.
pub fn with_context<R>(f: impl FnOnce(&mut LogContext) -> R) -> Option<R> {
    let _entered = Entered::enter()?;
    let mut slot = CONTEXT
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    let context = slot.get_or_insert_with(LogContext::default);
    Some(f(context))
}

fn with_context_or_unavailable<R>(f: impl FnOnce(&mut LogContext) -> LogResult<R>) -> LogResult<R> {
    with_context(f).unwrap_or(Err(LogError::Unavailable))
}

fn replace_context(next: Option<LogContext>) -> LogResult<Option<LogContext>> {
    let Some(_entered) = Entered::enter() else {
        return Err(LogError::Unavailable);
    };
    let mut slot = CONTEXT
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    Ok(std::mem::replace(&mut *slot, next))
}

/// Replaces the default context with one built from `config`.
///
/// A previous context is dropped after the new one is in place, which runs
/// its exit hook.
pub fn init(config: LogConfig) -> LogResult<()> {
    let previous = replace_context(Some(LogContext::new(config)))?;
    drop(previous);
    Ok(())
}

/// Drops the default context, running its exit hook.
///
/// The next logging call creates a fresh default context.
pub fn reset() -> LogResult<()> {
    let previous = replace_context(None)?;
    drop(previous);
    Ok(())
}

/// See [`LogContext::create_channel`].
pub fn create_channel<D>(
    data: D,
    log: LogFn<D>,
    finalize: Option<FinalizeFn<D>>,
) -> Option<ChannelSlot>
where
    D: Send + 'static,
{
    with_context(|context| context.create_channel(data, log, finalize)).flatten()
}

/// See [`LogContext::add_channel`].
pub fn add_channel(slot: ChannelSlot) -> LogResult<ChannelId> {
    with_context_or_unavailable(|context| context.add_channel(slot))
}

/// See [`LogContext::remove_channel`].
pub fn remove_channel(id: ChannelId) -> bool {
    with_context(|context| context.remove_channel(id)).unwrap_or(false)
}

/// See [`LogContext::set_channel_data`].
pub fn set_channel_data<D>(id: ChannelId, data: D) -> Option<D>
where
    D: 'static,
{
    with_context(|context| context.set_channel_data(id, data)).flatten()
}

/// Handle to the default context's console channel.
///
/// Release the lock before logging again from the same thread.
pub fn console() -> Option<Arc<Mutex<ConsoleChannel>>> {
    with_context(|context| context.console().cloned()).flatten()
}

/// See [`LogContext::remove_console_channel`].
pub fn remove_console_channel() -> bool {
    with_context(LogContext::remove_console_channel).unwrap_or(false)
}

/// See [`LogContext::restore_console_channel`].
pub fn restore_console_channel() -> LogResult<Option<ChannelId>> {
    with_context_or_unavailable(LogContext::restore_console_channel)
}

/// See [`LogContext::install_platform_channel`].
pub fn install_platform_channel(slot: ChannelSlot) -> LogResult<ChannelId> {
    with_context_or_unavailable(|context| context.install_platform_channel(slot))
}

/// See [`LogContext::remove_platform_channel`].
pub fn remove_platform_channel() -> bool {
    with_context(LogContext::remove_platform_channel).unwrap_or(false)
}

/// See [`LogContext::finalize`].
pub fn finalize() -> usize {
    with_context(LogContext::finalize).unwrap_or(0)
}

/// See [`LogContext::shutdown`].
pub fn shutdown() -> bool {
    with_context(LogContext::shutdown).unwrap_or(false)
}

/// See [`LogContext::log`]. Dropped silently when called re-entrantly.
pub fn log(
    level: Level,
    component: &str,
    location: Location,
    error: Option<&dyn Error>,
    args: fmt::Arguments<'_>,
) {
    with_context(|context| context.log(level, component, location, error, args));
}

/// See [`LogContext::log_str`].
pub fn log_str(
    level: Level,
    component: &str,
    location: Location,
    error: Option<&dyn Error>,
    message: &str,
) {
    with_context(|context| context.log_str(level, component, location, error, message));
}

/// Runs the default context's exit hook when dropped.
///
/// Statics are never dropped, so the default context has no destructor of
/// its own. Keep the guard alive in `main` so channels are finalized on every
/// return path, including early returns via `?`.
///
/// ```
/// use logging::{global, log_output};
///
/// fn main() {
///     let _guard = global::shutdown_guard();
///     log_output!("app", "started");
/// }
/// ```
#[must_use = "the exit hook runs when the guard is dropped"]
pub struct ShutdownGuard {
    _private: (),
}

/// Creates a [`ShutdownGuard`] for the default context.
pub fn shutdown_guard() -> ShutdownGuard {
    ShutdownGuard { _private: () }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        shutdown();
    }
}

impl fmt::Debug for ShutdownGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShutdownGuard")
    }
}
