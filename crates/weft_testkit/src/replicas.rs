//! Helpers for tests that run several replicas side by side.

use weft_core::{Action, ApplyOutcome, Config, OriginId, Store, Version};

/// An empty in-memory replica with a fixed origin and a logical clock.
///
/// A logical clock keeps stamps independent of wall time, so concurrent
/// writes tie on clock value and are decided by origin.
pub fn replica(origin: u64) -> Store {
    replica_with_config(Config::new().origin(OriginId::new(origin)).hybrid_clock(false))
}

/// An empty in-memory replica opened with `config`.
pub fn replica_with_config(config: Config) -> Store {
    let empty = Store::open_in_memory()
        .and_then(|store| store.snapshot())
        .expect("Failed to snapshot empty store");
    Store::from_snapshot_with_config(&empty, config).expect("Failed to open replica")
}

/// Every entity state of `store`, tombstones included, in stamp order.
pub fn state_of(store: &Store) -> Vec<Action> {
    store
        .actions(&Version::default())
        .expect("Failed to read actions")
}

/// Sends `from` everything `to` has not seen and commits `to`.
///
/// Returns one outcome per action sent.
pub fn merge_into(from: &Store, to: &mut Store) -> Vec<ApplyOutcome> {
    let version = to.version().expect("Failed to read version");
    let outcomes = from
        .actions(&version)
        .expect("Failed to read actions")
        .into_iter()
        .map(|action| to.apply_action(action).expect("Failed to apply action"))
        .collect();
    to.commit().expect("Failed to commit merge");
    outcomes
}

/// Merges every replica into every other one until they agree.
///
/// A replica that settles a merged cycle writes new tombstones, which the
/// replicas merged before it have not seen, so passes repeat until one
/// applies nothing.
pub fn merge_all(replicas: &mut [Store]) {
    loop {
        let mut applied = false;
        for i in 0..replicas.len() {
            for j in 0..replicas.len() {
                if i != j {
                    let (from, to) = pair_mut(replicas, i, j);
                    applied |= merge_into(from, to)
                        .iter()
                        .any(ApplyOutcome::is_applied);
                }
            }
        }
        if !applied {
            break;
        }
    }
}

fn pair_mut(replicas: &mut [Store], from: usize, to: usize) -> (&Store, &mut Store) {
    if from < to {
        let (left, right) = replicas.split_at_mut(to);
        (&left[from], &mut right[0])
    } else {
        let (left, right) = replicas.split_at_mut(from);
        (&right[0], &mut left[to])
    }
}

/// Asserts that all replicas hold the same entity states.
///
/// Version vectors are not compared: a write that was overwritten before it
/// reached a replica never advances that replica's vector.
///
/// # Panics
///
/// Panics with the index of the first replica that differs from the first.
pub fn assert_converged(replicas: &[Store]) {
    let Some((first, rest)) = replicas.split_first() else {
        return;
    };
    let expected = state_of(first);
    for (i, other) in rest.iter().enumerate() {
        assert_eq!(
            state_of(other),
            expected,
            "replica {} differs from replica 0",
            i + 1
        );
    }
}
