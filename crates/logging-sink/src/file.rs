//! crates/logging-sink/src/file.rs
//! Console channels backed by a log file.

use std::fs::OpenOptions;
use std::io::{self, BufWriter};
use std::path::Path;

use logging::ConsoleChannel;

/// Opens `path` for appending and returns a console channel that owns it.
///
/// The file is created if missing. It is flushed after every record and
/// closed when the channel is finalized.
///
/// ```no_run
/// use logging::{ChannelSlot, global};
/// use logging_sink::open_log_file;
///
/// let channel = open_log_file("/var/log/indexer.log")?;
/// global::add_channel(ChannelSlot::owned(channel))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open_log_file<P: AsRef<Path>>(path: P) -> io::Result<ConsoleChannel> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    Ok(ConsoleChannel::to_stream(Box::new(BufWriter::new(file))))
}
