//! Property tests for random add/remove sequences against a model.

use logging::{Capture, ChannelId, ChannelSlot, Registry};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Add,
    Remove(usize),
    RemoveStale,
    Teardown,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Add),
        3 => any::<usize>().prop_map(Op::Remove),
        1 => Just(Op::RemoveStale),
        1 => Just(Op::Teardown),
    ]
}

proptest! {
    #[test]
    fn registry_matches_model(ops in proptest::collection::vec(op(), 0..64)) {
        let capture = Capture::new();
        let mut registry = Registry::new();
        // Head first, like `Registry::ids`.
        let mut model: Vec<(ChannelId, String)> = Vec::new();
        let mut removed: Vec<ChannelId> = Vec::new();
        let mut expected_finalized: Vec<String> = Vec::new();
        let mut counter = 0_usize;

        for op in ops {
            match op {
                Op::Add => {
                    let name = format!("ch{counter}");
                    counter += 1;
                    let id = registry.add(ChannelSlot::owned(capture.channel(name.clone()))).unwrap();
                    model.insert(0, (id, name));
                }
                Op::Remove(index) => {
                    if model.is_empty() {
                        continue;
                    }
                    let (id, name) = model.remove(index % model.len());
                    prop_assert!(registry.remove(id));
                    removed.push(id);
                    expected_finalized.push(name);
                }
                Op::RemoveStale => {
                    if let Some(id) = removed.last().copied() {
                        prop_assert!(!registry.remove(id));
                    }
                }
                Op::Teardown => {
                    let count = registry.teardown();
                    prop_assert_eq!(count, model.len());
                    for (id, name) in model.drain(..) {
                        removed.push(id);
                        expected_finalized.push(name);
                    }
                }
            }

            let ids: Vec<ChannelId> = registry.ids().collect();
            let model_ids: Vec<ChannelId> = model.iter().map(|(id, _)| *id).collect();
            prop_assert_eq!(ids, model_ids);
            prop_assert_eq!(capture.finalized(), expected_finalized.clone());
        }

        registry.teardown();
        expected_finalized.extend(model.into_iter().map(|(_, name)| name));
        let finalized = capture.finalized();
        prop_assert_eq!(&finalized, &expected_finalized);
        for name in &finalized {
            prop_assert_eq!(capture.finalize_count(name), 1);
        }
    }

    #[test]
    fn ids_strictly_increase(adds in 1_usize..32) {
        let capture = Capture::new();
        let mut registry = Registry::new();
        let mut previous: Option<ChannelId> = None;
        for n in 0..adds {
            let id = registry.add(ChannelSlot::owned(capture.channel(format!("c{n}")))).unwrap();
            if n % 2 == 0 {
                registry.remove(id);
            }
            if let Some(previous) = previous {
                prop_assert!(id > previous);
            }
            previous = Some(id);
        }
    }
}
