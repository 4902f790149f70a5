//! crates/logging-sink/src/memory.rs
//! In-memory platform backend for tests.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::platform::{PlatformBackend, PlatformPriority};

/// One entry written to a [`MemoryBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformEntry {
    /// Priority of the write.
    pub priority: PlatformPriority,
    /// Tag (component) of the write.
    pub tag: String,
    /// Written text.
    pub text: String,
}

/// Backend that keeps entries in memory. Clones share the same entries.
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<Vec<PlatformEntry>>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry written so far.
    #[must_use]
    pub fn entries(&self) -> Vec<PlatformEntry> {
        self.lock_entries().clone()
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<PlatformEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl PlatformBackend for MemoryBackend {
    fn write(&mut self, priority: PlatformPriority, tag: &str, text: &str) {
        self.lock_entries().push(PlatformEntry {
            priority,
            tag: tag.to_owned(),
            text: text.to_owned(),
        });
    }
}
