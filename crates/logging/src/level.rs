//! crates/logging/src/level.rs
//! Message levels and their labels.

use std::fmt;
use std::str::FromStr;

use crate::error::LogError;

/// Category tag attached to every dispatched message.
///
/// Levels are ordered from chattiest to most important, with [`Level::Output`]
/// last because it marks program output rather than diagnostics. The order is
/// only used for labeling and for per-channel rendering decisions; the
/// dispatcher never drops a message because of its level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Fine-grained tracing of internal steps.
    Verbose,
    /// Decisions taken by program logic.
    Logic,
    /// Component lifecycle and coarse progress.
    Component,
    /// Failures that need attention. Rendered with the source location.
    Critical,
    /// Program output intended for the user.
    Output,
}

impl Level {
    /// Every level, in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Verbose,
        Self::Logic,
        Self::Component,
        Self::Critical,
        Self::Output,
    ];

    /// Returns the upper-case label printed by the console channel.
    ///
    /// ```
    /// use logging::Level;
    ///
    /// assert_eq!(Level::Critical.label(), "CRITICAL");
    /// ```
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Verbose => "VERBOSE",
            Self::Logic => "LOGIC",
            Self::Component => "COMPONENT",
            Self::Critical => "CRITICAL",
            Self::Output => "OUTPUT",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LogError::InvalidConfig {
                key: "level",
                value: s.to_owned(),
            })
    }
}
