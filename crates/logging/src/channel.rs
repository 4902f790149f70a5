//! crates/logging/src/channel.rs
//! Output channels and the ownership variants the registry stores.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::record::Record;

/// A destination for dispatched messages.
///
/// Channels receive every record in registry order. They have no way to
/// report failure back to the dispatcher: a channel that cannot write simply
/// drops the message.
///
/// Channels are `Send` so the process-wide default context can hand them to
/// whichever thread logs next. Calls into one registry are serialized, so a
/// channel never sees two records at once.
pub trait Channel: Send {
    /// Renders one record.
    fn log(&mut self, record: &Record<'_>);

    /// Releases channel resources. The registry calls this exactly once per
    /// registration, at removal or at teardown.
    fn finalize(&mut self) {}

    /// Type-erased access used by [`LogContext::set_channel_data`].
    ///
    /// [`LogContext::set_channel_data`]: crate::LogContext::set_channel_data
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

/// Log function of an [`OutChannel`].
pub type LogFn<D> = fn(&mut D, &Record<'_>);

/// Finalize function of an [`OutChannel`].
pub type FinalizeFn<D> = fn(&mut D);

/// A channel assembled from a data handle and plain functions.
///
/// This is the building block for custom sinks that do not warrant their own
/// type: the data handle carries whatever state the functions need (a writer,
/// a counter, a socket) and can be swapped after creation.
///
/// ```
/// use logging::{Level, Location, OutChannel, Record, Channel};
///
/// fn count(total: &mut usize, _record: &Record<'_>) {
///     *total += 1;
/// }
///
/// let mut channel = OutChannel::new(0usize, count, None);
/// let record = Record::new(Level::Logic, "demo", Location::new("a.rs", "f", 1), None, "hi");
/// channel.log(&record);
/// channel.log(&record);
/// assert_eq!(*channel.data(), 2);
/// ```
pub struct OutChannel<D> {
    data: D,
    log: LogFn<D>,
    finalize: Option<FinalizeFn<D>>,
}

impl<D> OutChannel<D> {
    /// Creates a channel from its data handle and functions.
    #[must_use]
    pub const fn new(data: D, log: LogFn<D>, finalize: Option<FinalizeFn<D>>) -> Self {
        Self {
            data,
            log,
            finalize,
        }
    }

    /// Borrows the data handle.
    #[must_use]
    pub const fn data(&self) -> &D {
        &self.data
    }

    /// Mutably borrows the data handle.
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Replaces the data handle and returns the previous one.
    ///
    /// The previous handle is not finalized; disposing of it is up to the
    /// caller.
    pub fn set_data(&mut self, data: D) -> D {
        std::mem::replace(&mut self.data, data)
    }

    /// Consumes the channel and returns its data handle.
    pub fn into_data(self) -> D {
        self.data
    }
}

impl<D: Send + 'static> Channel for OutChannel<D> {
    fn log(&mut self, record: &Record<'_>) {
        (self.log)(&mut self.data, record);
    }

    fn finalize(&mut self) {
        if let Some(finalize) = self.finalize {
            finalize(&mut self.data);
        }
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}

impl<D: fmt::Debug> fmt::Debug for OutChannel<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutChannel")
            .field("data", &self.data)
            .field("finalize", &self.finalize.is_some())
            .finish_non_exhaustive()
    }
}

/// A channel the caller keeps a handle to while it is registered.
pub type SharedChannel = Arc<Mutex<dyn Channel>>;

/// A channel together with who owns it.
///
/// The variant is fixed by the constructor used, so the registry never has to
/// consult a runtime flag to decide whether it may release a channel.
pub enum ChannelSlot {
    /// The registry owns the channel and drops it after finalizing.
    Owned(Box<dyn Channel>),
    /// The caller keeps the channel alive; the registry only finalizes it.
    Borrowed(SharedChannel),
}

impl ChannelSlot {
    /// Hands a channel over to the registry.
    pub fn owned<C>(channel: C) -> Self
    where
        C: Channel + 'static,
    {
        Self::Owned(Box::new(channel))
    }

    /// Registers a channel the caller keeps a handle to.
    ///
    /// The registry stores a clone of the `Arc`; finalizing the slot leaves
    /// the caller's handle intact so the channel can be inspected or
    /// registered again.
    ///
    /// Dispatch and finalize lock the channel and wait for a caller that
    /// holds the lock, so finalize is never skipped. Do not log or tear the
    /// registry down from a thread that is holding the lock itself: that
    /// thread would wait on its own guard.
    pub fn borrowed<C>(channel: &Arc<Mutex<C>>) -> Self
    where
        C: Channel + 'static,
    {
        let shared: SharedChannel = Arc::clone(channel) as SharedChannel;
        Self::Borrowed(shared)
    }

    /// Reports whether the registry releases this channel on finalize.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub(crate) fn log(&mut self, record: &Record<'_>) {
        match self {
            Self::Owned(channel) => channel.log(record),
            Self::Borrowed(channel) => lock_channel(channel).log(record),
        }
    }

    /// Runs the channel's finalize hook and releases it if owned.
    ///
    /// Consuming the slot makes a second finalize of the same registration
    /// impossible.
    pub fn finalize(self) {
        match self {
            Self::Owned(mut channel) => channel.finalize(),
            Self::Borrowed(channel) => lock_channel(&channel).finalize(),
        }
    }

    pub(crate) fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        match self {
            Self::Owned(channel) => channel.as_any_mut(),
            Self::Borrowed(_) => None,
        }
    }
}

// A channel that panicked inside `log` stays usable; dispatch already
// contained the panic.
fn lock_channel(channel: &SharedChannel) -> MutexGuard<'_, dyn Channel + 'static> {
    channel.lock().unwrap_or_else(|poison| poison.into_inner())
}

impl fmt::Debug for ChannelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owned(_) => f.write_str("ChannelSlot::Owned"),
            Self::Borrowed(_) => f.write_str("ChannelSlot::Borrowed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::record::Location;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn record(message: &str) -> Record<'_> {
        Record::new(
            Level::Component,
            "test",
            Location::new("t.rs", "t", 1),
            None,
            message,
        )
    }

    fn push(lines: &mut Vec<String>, record: &Record<'_>) {
        lines.push(record.message().to_owned());
    }

    fn clear(lines: &mut Vec<String>) {
        lines.clear();
        lines.push("finalized".to_owned());
    }

    #[test]
    fn out_channel_calls_log_function_with_data() {
        let mut channel = OutChannel::new(Vec::new(), push, None);
        channel.log(&record("one"));
        channel.log(&record("two"));
        assert_eq!(channel.data(), &["one", "two"]);
    }

    #[test]
    fn out_channel_finalize_runs_hook() {
        let mut channel = OutChannel::new(vec!["x".to_owned()], push, Some(clear));
        channel.finalize();
        assert_eq!(channel.into_data(), vec!["finalized".to_owned()]);
    }

    #[test]
    fn out_channel_finalize_without_hook_keeps_data() {
        let mut channel = OutChannel::new(vec!["x".to_owned()], push, None);
        channel.finalize();
        assert_eq!(channel.data().len(), 1);
    }

    #[test]
    fn set_data_returns_previous_handle() {
        let mut channel = OutChannel::new(vec!["old".to_owned()], push, None);
        let previous = channel.set_data(Vec::new());
        assert_eq!(previous, vec!["old".to_owned()]);
        assert!(channel.data().is_empty());
    }

    #[test]
    fn owned_slot_exposes_out_channel_for_downcast() {
        let mut slot = ChannelSlot::owned(OutChannel::new(Vec::<String>::new(), push, None));
        assert!(slot.is_owned());
        let any = slot.as_any_mut().expect("out channel is downcastable");
        assert!(any.downcast_mut::<OutChannel<Vec<String>>>().is_some());
    }

    #[test]
    fn borrowed_slot_finalize_keeps_callers_handle() {
        let shared = Arc::new(Mutex::new(OutChannel::new(
            Vec::<String>::new(),
            push,
            Some(clear),
        )));
        let mut slot = ChannelSlot::borrowed(&shared);
        assert!(!slot.is_owned());
        slot.log(&record("hello"));
        assert_eq!(shared.lock().unwrap().data(), &["hello"]);

        slot.finalize();
        assert_eq!(shared.lock().unwrap().data(), &["finalized"]);
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn borrowed_slot_finalize_waits_for_caller_lock() {
        let shared = Arc::new(Mutex::new(OutChannel::new(
            Vec::<String>::new(),
            push,
            Some(clear),
        )));
        let slot = ChannelSlot::borrowed(&shared);
        let (locked_tx, locked_rx) = mpsc::channel();

        let holder = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let guard = shared.lock().unwrap();
                locked_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                drop(guard);
            })
        };
        locked_rx.recv().unwrap();

        slot.finalize();
        holder.join().unwrap();
        assert_eq!(shared.lock().unwrap().data(), &["finalized"]);
    }

    #[test]
    fn borrowed_slot_finalizes_poisoned_channel() {
        let shared = Arc::new(Mutex::new(OutChannel::new(
            vec!["x".to_owned()],
            push,
            Some(clear),
        )));
        let poisoner = Arc::clone(&shared);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the channel lock");
        })
        .join();
        assert!(shared.is_poisoned());

        let mut slot = ChannelSlot::borrowed(&shared);
        slot.log(&record("after"));
        slot.finalize();

        let channel = shared.lock().unwrap_or_else(|poison| poison.into_inner());
        assert_eq!(channel.data(), &["finalized"]);
    }

    #[test]
    fn slot_debug_names_variant() {
        let slot = ChannelSlot::owned(OutChannel::new((), |_, _| {}, None));
        assert_eq!(format!("{slot:?}"), "ChannelSlot::Owned");
    }
}
