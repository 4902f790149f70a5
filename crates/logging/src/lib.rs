#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` is a small multi-channel logging facility. A message is
//! formatted once and delivered to every registered output channel, most
//! recently registered first. Each message carries a [`Level`], a component
//! name, the [`Location`] of the log call and optionally an attached error.
//!
//! # Design
//!
//! - [`Channel`] is the sink abstraction. [`OutChannel`] assembles a channel
//!   from a data handle and plain functions; [`ConsoleChannel`] is the
//!   built-in timestamped console sink. Channels are `Send`.
//! - [`ChannelSlot`] fixes at registration time whether the registry owns the
//!   channel or the caller keeps a handle to it.
//! - [`Registry`] keeps the ordered chain and an [`ExitHook`] that tears the
//!   chain down once at exit if any channel was added.
//! - [`LogContext`] ties the registry to the built-in console and platform
//!   channels and does the formatting. The [`global`] module holds the
//!   process-wide default context, which the logging macros use from any
//!   thread.
//!
//! # Invariants
//!
//! - Every registered channel sees every dispatched message exactly once and
//!   in the same relative order.
//! - A registration is finalized exactly once, by removal or by teardown.
//! - Dispatch never returns an error and never panics; channel failures stay
//!   inside the channel.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use logging::{ChannelSlot, LogConfig, OutChannel, Record, global, log_component};
//!
//! fn remember(lines: &mut Arc<Mutex<Vec<String>>>, record: &Record<'_>) {
//!     lines.lock().unwrap().push(record.message().to_owned());
//! }
//!
//! global::init(LogConfig::default().without_console())?;
//! let lines = Arc::new(Mutex::new(Vec::new()));
//! global::add_channel(ChannelSlot::owned(OutChannel::new(Arc::clone(&lines), remember, None)))?;
//!
//! log_component!("db", "opened {} tables", 4);
//! std::thread::spawn(|| log_component!("db", "closed")).join().unwrap();
//! assert_eq!(*lines.lock().unwrap(), vec!["opened 4 tables", "closed"]);
//!
//! assert_eq!(global::finalize(), 1);
//! # Ok::<(), logging::LogError>(())
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`LogConfig`], [`Level`] and
//!   [`DefaultStream`].
//! - `tracing`: `ChannelLayer` and `init_tracing`, forwarding `tracing`
//!   events into the default context.
//! - `test-support`: `Capture`, `CaptureChannel`, `SharedBuffer` and
//!   `default_context_session` for tests of dependent crates.

#[cfg(any(test, feature = "test-support"))]
mod capture;
mod channel;
mod config;
mod console;
mod context;
mod error;
pub mod global;
mod level;
mod macros;
mod record;
mod registry;

#[cfg(feature = "tracing")]
mod tracing_bridge;

#[cfg(any(test, feature = "test-support"))]
pub use capture::{
    Capture, CaptureChannel, CapturedRecord, DefaultContextSession, SharedBuffer,
    default_context_session,
};
pub use channel::{Channel, ChannelSlot, FinalizeFn, LogFn, OutChannel, SharedChannel};
pub use config::{
    DEFAULT_MESSAGE_CAPACITY, ENV_MAX_CHANNELS, ENV_MESSAGE_CAPACITY, ENV_STREAM, LogConfig,
};
pub use console::{
    Clock, ConsoleChannel, DefaultStream, TIMESTAMP_FORMAT, local_offset, render_record,
};
pub use context::{COMPONENT, LogContext};
pub use error::{LogError, LogResult};
pub use global::{ShutdownGuard, shutdown_guard};
pub use level::Level;
pub use record::{Location, Record};
pub use registry::{ChannelId, ExitHook, ExitHookState, Registry};

#[cfg(feature = "tracing")]
pub use tracing_bridge::{ChannelLayer, init_tracing};
