//! crates/logging/src/capture.rs
//! In-memory channels for inspecting dispatched messages.
//!
//! A [`Capture`] is a shared journal. Every [`CaptureChannel`] created from it
//! appends to the same journal under its own name, which makes the relative
//! order of channels observable.
//!
//! Available to tests of this crate and, with the `test-support` feature, to
//! dependent crates. [`default_context_session`] serializes tests that go
//! through the process-wide default context.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::channel::Channel;
use crate::global;
use crate::level::Level;
use crate::record::Record;

/// Owned copy of a record seen by a [`CaptureChannel`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    /// Name of the channel that received the record.
    pub channel: String,
    /// Level of the message.
    pub level: Level,
    /// Component that emitted the message.
    pub component: String,
    /// Source file of the log call.
    pub file: &'static str,
    /// Function (module path) of the log call.
    pub function: &'static str,
    /// Line of the log call.
    pub line: u32,
    /// Rendered error message, if an error was attached.
    pub error: Option<String>,
    /// Rendered message text.
    pub message: String,
}

#[derive(Debug, Default)]
struct Journal {
    records: Vec<CapturedRecord>,
    finalized: Vec<String>,
}

/// Shared journal of captured records and finalize calls.
#[derive(Clone, Debug, Default)]
pub struct Capture {
    journal: Arc<Mutex<Journal>>,
}

fn lock_journal(journal: &Mutex<Journal>) -> MutexGuard<'_, Journal> {
    journal.lock().unwrap_or_else(|poison| poison.into_inner())
}

impl Capture {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a channel that records into this journal under `name`.
    #[must_use]
    pub fn channel(&self, name: impl Into<String>) -> CaptureChannel {
        CaptureChannel {
            name: name.into(),
            journal: Arc::clone(&self.journal),
        }
    }

    /// Every captured record, in delivery order.
    #[must_use]
    pub fn records(&self) -> Vec<CapturedRecord> {
        lock_journal(&self.journal).records.clone()
    }

    /// Captured message texts, in delivery order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        lock_journal(&self.journal)
            .records
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Names of the channels that received records, in delivery order.
    #[must_use]
    pub fn channel_order(&self) -> Vec<String> {
        lock_journal(&self.journal)
            .records
            .iter()
            .map(|record| record.channel.clone())
            .collect()
    }

    /// Number of records received by the named channel.
    #[must_use]
    pub fn count_for(&self, name: &str) -> usize {
        lock_journal(&self.journal)
            .records
            .iter()
            .filter(|record| record.channel == name)
            .count()
    }

    /// Names of finalized channels, in finalize order.
    #[must_use]
    pub fn finalized(&self) -> Vec<String> {
        lock_journal(&self.journal).finalized.clone()
    }

    /// Number of times the named channel was finalized.
    #[must_use]
    pub fn finalize_count(&self, name: &str) -> usize {
        lock_journal(&self.journal)
            .finalized
            .iter()
            .filter(|finalized| *finalized == name)
            .count()
    }

    /// Forgets every record and finalize call.
    pub fn clear(&self) {
        let mut journal = lock_journal(&self.journal);
        journal.records.clear();
        journal.finalized.clear();
    }
}

/// Channel that copies every record into a [`Capture`] journal.
#[derive(Debug)]
pub struct CaptureChannel {
    name: String,
    journal: Arc<Mutex<Journal>>,
}

impl CaptureChannel {
    /// Name the channel records under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Channel for CaptureChannel {
    fn log(&mut self, record: &Record<'_>) {
        let location = record.location();
        lock_journal(&self.journal).records.push(CapturedRecord {
            channel: self.name.clone(),
            level: record.level(),
            component: record.component().to_owned(),
            file: location.file(),
            function: location.function(),
            line: location.line(),
            error: record.error_message(),
            message: record.message().to_owned(),
        });
    }

    fn finalize(&mut self) {
        lock_journal(&self.journal).finalized.push(self.name.clone());
    }
}

/// Cloneable in-memory writer, handy as a console channel stream.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Written bytes decoded as UTF-8 (lossily).
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock_bytes()).into_owned()
    }

    /// Reports whether nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_bytes().is_empty()
    }

    fn lock_bytes(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock_bytes().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn session_lock() -> &'static Mutex<()> {
    static SESSION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    SESSION_LOCK.get_or_init(|| Mutex::new(()))
}

/// Exclusive use of the process-wide default context.
///
/// Tests that register channels in [`global`] hold a session for their whole
/// body so that tests running in parallel do not log into each other's
/// channels. Starting a session drops whatever default context an earlier
/// test left behind; ending it does the same.
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
#[must_use = "the session ends when the guard is dropped"]
pub struct DefaultContextSession {
    _guard: MutexGuard<'static, ()>,
}

/// Starts a [`DefaultContextSession`], waiting for the previous one to end.
pub fn default_context_session() -> DefaultContextSession {
    let guard = session_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    let _ = global::reset();
    DefaultContextSession { _guard: guard }
}

impl Drop for DefaultContextSession {
    fn drop(&mut self) {
        let _ = global::reset();
    }
}

impl std::fmt::Debug for DefaultContextSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DefaultContextSession")
    }
}
