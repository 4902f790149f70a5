#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` provides the output channels that talk to something outside
//! the process: the platform log and log files. Both plug into the channel
//! registry of the [`logging`] crate like any other [`logging::Channel`].
//!
//! # Design
//!
//! - [`PlatformChannel`] renders records for a [`PlatformBackend`]. On Unix,
//!   `SyslogBackend` writes to syslog(3). With the `test-support` feature,
//!   `MemoryBackend` keeps entries in memory.
//! - [`open_log_file`] builds a [`logging::ConsoleChannel`] that appends to a
//!   file it owns.
//!
//! # Examples
//!
//! ```
//! use std::sync::mpsc::{self, Sender};
//!
//! use logging::{ChannelSlot, Level, LogConfig, LogContext, location};
//! use logging_sink::{PlatformBackend, PlatformChannel, PlatformPriority};
//!
//! struct Forward(Sender<(PlatformPriority, String)>);
//!
//! impl PlatformBackend for Forward {
//!     fn write(&mut self, priority: PlatformPriority, tag: &str, text: &str) {
//!         let _ = self.0.send((priority, format!("{tag}: {text}")));
//!     }
//! }
//!
//! let (tx, rx) = mpsc::channel();
//! let mut context = LogContext::new(LogConfig::default().without_console());
//! context.install_platform_channel(ChannelSlot::owned(PlatformChannel::new(Forward(tx))))?;
//!
//! context.log_str(Level::Logic, "sched", location!(), None, "tick");
//! assert_eq!(rx.try_recv().unwrap(), (PlatformPriority::Debug, "sched: tick".to_owned()));
//! # Ok::<(), logging::LogError>(())
//! ```

mod file;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod platform;

#[cfg(unix)]
#[allow(unsafe_code)]
/// Syslog backend for the platform channel.
pub mod syslog;

pub use file::open_log_file;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryBackend, PlatformEntry};
#[cfg(unix)]
pub use platform::SyslogBackend;
pub use platform::{PlatformBackend, PlatformChannel, PlatformPriority};
