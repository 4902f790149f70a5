//! crates/logging/src/registry.rs
//! Ordered channel registry and the exit hook state machine.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::channel::ChannelSlot;
use crate::error::{LogError, LogResult};
use crate::record::Record;

/// Identity of a registered channel.
///
/// Ids are handed out in increasing order and never reused, so a stale id
/// can never refer to a channel registered later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Raw numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.0)
    }
}

/// State of the exit-time teardown.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExitHookState {
    /// No teardown is owed.
    #[default]
    Unarmed,
    /// A channel was added since the last teardown; the exit hook will tear
    /// the registry down.
    Armed,
    /// The exit hook ran. Adding a channel arms it again.
    Fired,
}

/// One-shot exit teardown tracker.
///
/// Legal transitions are `Unarmed -> Armed` and `Fired -> Armed` on add,
/// `Armed -> Unarmed` on a manual teardown and `Armed -> Fired` when the exit
/// hook runs. Anything else leaves the state unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExitHook {
    state: ExitHookState,
    times_armed: u64,
}

impl ExitHook {
    /// Creates an unarmed hook.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ExitHookState::Unarmed,
            times_armed: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ExitHookState {
        self.state
    }

    /// Reports whether a teardown is owed.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self.state, ExitHookState::Armed)
    }

    /// Number of times the hook went from not armed to armed.
    #[must_use]
    pub const fn times_armed(&self) -> u64 {
        self.times_armed
    }

    fn arm(&mut self) -> bool {
        if self.is_armed() {
            return false;
        }
        self.state = ExitHookState::Armed;
        self.times_armed += 1;
        true
    }

    fn disarm(&mut self) {
        if self.is_armed() {
            self.state = ExitHookState::Unarmed;
        }
    }

    fn fire(&mut self) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.state = ExitHookState::Fired;
        true
    }
}

struct Entry {
    id: ChannelId,
    slot: ChannelSlot,
}

/// Ordered set of registered channels.
///
/// Iteration runs from the most recently added channel to the oldest one.
/// Removal is a linear scan, which is fine for the handful of channels a
/// process registers.
pub struct Registry {
    // Oldest first; the head of the chain is the last element.
    entries: Vec<Entry>,
    next_id: u64,
    limit: Option<usize>,
    exit_hook: ExitHook,
}

impl Registry {
    /// Creates an empty registry without a channel limit.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limit(None)
    }

    /// Creates an empty registry that holds at most `limit` channels.
    #[must_use]
    pub const fn with_limit(limit: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            limit,
            exit_hook: ExitHook::new(),
        }
    }

    /// Makes sure one more channel can be registered.
    ///
    /// Fails when the configured limit is reached or the storage for the
    /// entry cannot be reserved.
    pub fn reserve(&mut self) -> LogResult<()> {
        if self.limit.is_some_and(|limit| self.entries.len() >= limit) {
            return Err(LogError::channel_limit());
        }
        self.entries
            .try_reserve(1)
            .map_err(LogError::channel_reserve)
    }

    /// Registers a channel at the head of the chain and arms the exit hook.
    pub fn add(&mut self, slot: ChannelSlot) -> LogResult<ChannelId> {
        self.reserve()?;
        let id = self.push(slot);
        self.exit_hook.arm();
        Ok(id)
    }

    /// Registers a built-in channel without arming the exit hook.
    pub(crate) fn seed(&mut self, slot: ChannelSlot) -> ChannelId {
        self.push(slot)
    }

    fn push(&mut self, slot: ChannelSlot) -> ChannelId {
        let id = ChannelId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, slot });
        id
    }

    /// Unregisters and finalizes the channel with the given id.
    ///
    /// Returns `false` without touching anything when the id is not
    /// registered.
    pub fn remove(&mut self, id: ChannelId) -> bool {
        let Some(position) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let entry = self.entries.remove(position);
        finalize_slot(entry.slot);
        true
    }

    /// Reports whether a channel with the given id is registered.
    #[must_use]
    pub fn contains(&self, id: ChannelId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no channel is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in dispatch order.
    pub fn ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.entries.iter().rev().map(|entry| entry.id)
    }

    /// The exit hook tracker.
    #[must_use]
    pub const fn exit_hook(&self) -> &ExitHook {
        &self.exit_hook
    }

    /// Finalizes every channel head to tail and empties the registry.
    ///
    /// Returns the number of channels finalized. Calling it again on an empty
    /// registry finalizes nothing. A channel whose finalize panics still
    /// counts; the channels after it are finalized as usual.
    pub fn teardown(&mut self) -> usize {
        self.exit_hook.disarm();
        self.finalize_all()
    }

    /// Runs the exit teardown if it is armed.
    ///
    /// Returns `true` when the teardown ran. A hook that is not armed does
    /// nothing, so channels finalized by an earlier teardown are never
    /// finalized twice.
    pub fn run_exit_hook(&mut self) -> bool {
        if !self.exit_hook.fire() {
            return false;
        }
        self.finalize_all();
        true
    }

    fn finalize_all(&mut self) -> usize {
        let entries = std::mem::take(&mut self.entries);
        let count = entries.len();
        for entry in entries.into_iter().rev() {
            finalize_slot(entry.slot);
        }
        count
    }

    pub(crate) fn get_mut(&mut self, id: ChannelId) -> Option<&mut ChannelSlot> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.slot)
    }

    /// Delivers `record` to every channel, head first.
    ///
    /// A channel that panics is skipped; the remaining channels still
    /// receive the record.
    pub fn dispatch(&mut self, record: &Record<'_>) {
        for entry in self.entries.iter_mut().rev() {
            let slot = &mut entry.slot;
            let _ = catch_unwind(AssertUnwindSafe(|| slot.log(record)));
        }
    }
}

// Contains a panicking finalize so it cannot cut teardown short or escape
// into a `Drop` that is already unwinding.
fn finalize_slot(slot: ChannelSlot) {
    let _ = catch_unwind(AssertUnwindSafe(move || slot.finalize()));
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("ids", &self.ids().collect::<Vec<_>>())
            .field("limit", &self.limit)
            .field("exit_hook", &self.exit_hook)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Capture;
    use crate::level::Level;
    use crate::record::Location;

    fn record(message: &str) -> Record<'_> {
        Record::new(
            Level::Logic,
            "registry",
            Location::new("r.rs", "r", 3),
            None,
            message,
        )
    }

    #[test]
    fn add_pushes_to_head() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        let first = registry.add(ChannelSlot::owned(capture.channel("first"))).unwrap();
        let second = registry.add(ChannelSlot::owned(capture.channel("second"))).unwrap();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![second, first]);

        registry.dispatch(&record("hello"));
        assert_eq!(capture.channel_order(), vec!["second", "first"]);
    }

    #[test]
    fn first_add_arms_exit_hook_once() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        assert_eq!(registry.exit_hook().state(), ExitHookState::Unarmed);

        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.add(ChannelSlot::owned(capture.channel("b"))).unwrap();

        assert!(registry.exit_hook().is_armed());
        assert_eq!(registry.exit_hook().times_armed(), 1);
    }

    #[test]
    fn seed_does_not_arm_exit_hook() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.seed(ChannelSlot::owned(capture.channel("console")));
        assert_eq!(registry.exit_hook().state(), ExitHookState::Unarmed);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_unlinks_and_finalizes() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        let a = registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        let b = registry.add(ChannelSlot::owned(capture.channel("b"))).unwrap();
        let c = registry.add(ChannelSlot::owned(capture.channel("c"))).unwrap();

        assert!(registry.remove(b));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![c, a]);
        assert_eq!(capture.finalized(), vec!["b"]);
    }

    #[test]
    fn remove_head_updates_order() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        let a = registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        let b = registry.add(ChannelSlot::owned(capture.channel("b"))).unwrap();

        assert!(registry.remove(b));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        let a = registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        assert!(registry.remove(a));

        assert!(!registry.remove(a));
        assert!(!registry.remove(ChannelId(99)));
        assert_eq!(capture.finalized(), vec!["a"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn teardown_finalizes_each_channel_once() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.add(ChannelSlot::owned(capture.channel("b"))).unwrap();

        assert_eq!(registry.teardown(), 2);
        assert_eq!(capture.finalized(), vec!["b", "a"]);
        assert!(registry.is_empty());
        assert_eq!(registry.exit_hook().state(), ExitHookState::Unarmed);

        assert_eq!(registry.teardown(), 0);
        assert_eq!(capture.finalized().len(), 2);
    }

    #[test]
    fn add_after_teardown_rearms_once() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.teardown();

        registry.add(ChannelSlot::owned(capture.channel("b"))).unwrap();
        registry.add(ChannelSlot::owned(capture.channel("c"))).unwrap();
        assert!(registry.exit_hook().is_armed());
        assert_eq!(registry.exit_hook().times_armed(), 2);
    }

    #[test]
    fn exit_hook_fires_once() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();

        assert!(registry.run_exit_hook());
        assert_eq!(registry.exit_hook().state(), ExitHookState::Fired);
        assert!(!registry.run_exit_hook());
        assert_eq!(capture.finalized(), vec!["a"]);
    }

    #[test]
    fn exit_hook_after_manual_teardown_does_nothing() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.teardown();

        assert!(!registry.run_exit_hook());
        assert_eq!(capture.finalized(), vec!["a"]);
    }

    #[test]
    fn exit_hook_rearms_after_firing() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.run_exit_hook();

        registry.add(ChannelSlot::owned(capture.channel("b"))).unwrap();
        assert!(registry.exit_hook().is_armed());
        assert!(registry.run_exit_hook());
        assert_eq!(capture.finalized(), vec!["a", "b"]);
    }

    #[test]
    fn limit_rejects_extra_channel() {
        let capture = Capture::new();
        let mut registry = Registry::with_limit(Some(1));
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();

        let err = registry
            .add(ChannelSlot::owned(capture.channel("b")))
            .unwrap_err();
        assert!(matches!(err, LogError::Allocation { .. }));
        assert_eq!(registry.len(), 1);
        assert!(capture.finalized().is_empty());
    }

    #[test]
    fn dispatch_survives_panicking_channel() {
        struct Panics;
        impl crate::Channel for Panics {
            fn log(&mut self, _record: &Record<'_>) {
                panic!("broken channel");
            }
        }

        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("tail"))).unwrap();
        registry.add(ChannelSlot::owned(Panics)).unwrap();

        registry.dispatch(&record("still delivered"));
        assert_eq!(capture.messages(), vec!["still delivered"]);
    }

    struct PanicOnFinalize;

    impl crate::Channel for PanicOnFinalize {
        fn log(&mut self, _record: &Record<'_>) {}

        fn finalize(&mut self) {
            panic!("finalize failed");
        }
    }

    #[test]
    fn teardown_finalizes_channels_after_a_panicking_finalize() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.add(ChannelSlot::owned(PanicOnFinalize)).unwrap();
        registry.add(ChannelSlot::owned(capture.channel("c"))).unwrap();

        assert_eq!(registry.teardown(), 3);
        assert_eq!(capture.finalized(), vec!["c", "a"]);
        assert!(registry.is_empty());
        assert_eq!(registry.exit_hook().state(), ExitHookState::Unarmed);
    }

    #[test]
    fn exit_hook_fires_despite_panicking_finalize() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.add(ChannelSlot::owned(PanicOnFinalize)).unwrap();

        assert!(registry.run_exit_hook());
        assert_eq!(capture.finalized(), vec!["a"]);
        assert_eq!(registry.exit_hook().state(), ExitHookState::Fired);
    }

    #[test]
    fn remove_contains_panicking_finalize() {
        let mut registry = Registry::new();
        let id = registry.add(ChannelSlot::owned(PanicOnFinalize)).unwrap();
        assert!(registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn ids_are_never_reused() {
        let capture = Capture::new();
        let mut registry = Registry::new();
        let a = registry.add(ChannelSlot::owned(capture.channel("a"))).unwrap();
        registry.remove(a);
        let b = registry.add(ChannelSlot::owned(capture.channel("b"))).unwrap();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
