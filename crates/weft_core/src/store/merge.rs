//! Merging writes from other replicas.
//!
//! An incoming action goes through three gates, in order:
//!
//! 1. **Duplicate**: its stamp is covered by the kind's version vector. Skip.
//! 2. The vector and the local clock absorb the stamp.
//! 3. **Superseded** or **Rejected**: the stored state outranks it under
//!    [`Constraints::prevails`](crate::Constraints::prevails). It is reported
//!    as rejected when only a sticky label kept it out.
//!
//! Anything left is applied through the same path as a local write, so
//! indexes and the change log stay consistent. The stored state of every
//! entity is the highest ranked write the replica has seen, whatever order
//! the writes arrived in.
//!
//! Merged edges are not checked for cycles as they arrive. Their labels are
//! remembered and [`Store::settle`] breaks whatever cycles remain once the
//! batch is in. Merged writes are not committed; the caller commits when the
//! batch is done.

use super::Store;
use crate::clock::{Stamp, VersionVector};
use crate::constraints::Violation;
use crate::error::CoreResult;
use crate::graph::{Edge, Record, Table};
use crate::id::Id;
use crate::replication::{Action, ApplyOutcome, Change, Version};
use crate::types::Kind;
use tracing::{debug, trace, warn};

impl Store {
    /// Returns this replica's per-kind version vectors.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn version(&self) -> CoreResult<Version> {
        self.ensure_open()?;
        Ok(Version {
            nodes: self.graph.nodes.version().clone(),
            edges: self.graph.edges.version().clone(),
            atoms: self.graph.atoms.version().clone(),
        })
    }

    /// Current state of every entity whose last write `peer` has not seen.
    ///
    /// Tombstones are included. The result is in application order: by
    /// stamp, then kind, then id.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn actions(&self, peer: &Version) -> CoreResult<Vec<Action>> {
        self.ensure_open()?;
        let mut actions = Vec::new();
        unseen(&self.graph.nodes, &peer.nodes, &mut actions);
        unseen(&self.graph.edges, &peer.edges, &mut actions);
        unseen(&self.graph.atoms, &peer.atoms, &mut actions);
        actions.sort_by_key(Action::order_key);
        Ok(actions)
    }

    /// Applies one action received from a peer.
    ///
    /// Constraint violations are reported in the outcome, not as errors.
    ///
    /// # Errors
    ///
    /// Fails only if the store is closed.
    pub fn apply_action(&mut self, action: Action) -> CoreResult<ApplyOutcome> {
        self.ensure_open()?;
        let Action { id, stamp, change } = action;
        let outcome = match change {
            Change::Node(payload) => self.merge(id, stamp, payload),
            Change::Edge(payload) => {
                let acyclic = payload
                    .map(|edge| edge.label)
                    .filter(|&label| self.constraints.is_acyclic(label));
                let outcome = self.merge(id, stamp, payload);
                if let (Some(label), true) = (acyclic, outcome.is_applied()) {
                    self.unsettled.insert(label);
                }
                outcome
            }
            Change::Atom(payload) => self.merge(id, stamp, payload),
        };
        if outcome.is_applied() {
            self.stats.record_merged();
        } else {
            self.stats.record_ignored();
        }
        Ok(outcome)
    }

    /// Breaks the cycles that merged edges closed under acyclic labels.
    ///
    /// For each remaining cycle the edge with the lowest stamp is removed by a
    /// new local write, which replicates like any other. Replicas holding the
    /// same edges remove the same ones. [`Store::commit`] settles first, so
    /// committed state never holds such a cycle.
    ///
    /// Labels that are sticky for edges as well are left alone, since their
    /// edges cannot be removed.
    ///
    /// Returns each removed write with the violation it caused.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn settle(&mut self) -> CoreResult<Vec<(Action, Violation)>> {
        self.ensure_open()?;
        let mut removed = Vec::new();
        for label in std::mem::take(&mut self.unsettled) {
            if self.constraints.is_sticky(Kind::Edge, label) {
                warn!(%label, "edge label is sticky and acyclic; merged cycles kept");
                continue;
            }
            while let Some(cycle) = self.graph.edges.index().find_cycle(label) {
                let victim = cycle
                    .into_iter()
                    .filter_map(|id| {
                        let slot = self.graph.edges.slot(id)?;
                        Some((slot.stamp, id, slot.payload?))
                    })
                    .min_by_key(|&(stamp, id, _)| (stamp, id));
                let Some((lost, id, edge)) = victim else {
                    break;
                };
                let stamp = self.clock.tick();
                self.apply::<Edge>(id, stamp, None);
                let violation = Violation::Acyclic {
                    id,
                    label,
                    src: edge.src,
                    dst: edge.dst,
                };
                warn!(%id, origin = %lost.origin, %violation, "removed merged edge");
                removed.push((
                    Action {
                        id,
                        stamp: lost,
                        change: Change::Edge(Some(edge)),
                    },
                    violation,
                ));
            }
        }
        if !removed.is_empty() {
            debug!(removed = removed.len(), "settled merged cycles");
        }
        Ok(removed)
    }

    fn merge<R: Record>(&mut self, id: Id, stamp: Stamp, payload: Option<R>) -> ApplyOutcome {
        if !R::table_mut(&mut self.graph).version_mut().observe(stamp) {
            trace!(kind = %R::KIND, %id, clock = stamp.clock, "duplicate action");
            return ApplyOutcome::Duplicate;
        }
        self.clock.observe(stamp.clock);
        self.dirty = true;

        if let Some(slot) = R::table(&self.graph).slot(id) {
            let current = (slot.stamp, slot.payload.as_ref());
            if !self.constraints.prevails((stamp, payload.as_ref()), current) {
                // a later write lost only because the stored state is frozen
                let frozen = self.constraints.check_sticky(id, slot.payload.as_ref());
                if let (true, Err(violation)) = (stamp > slot.stamp, frozen) {
                    warn!(kind = %R::KIND, %id, origin = %stamp.origin, %violation, "rejected remote write");
                    return ApplyOutcome::Rejected(violation);
                }
                return ApplyOutcome::Superseded;
            }
        }
        self.apply(id, stamp, payload);
        ApplyOutcome::Applied
    }
}

fn unseen<R: Record>(table: &Table<R>, peer: &VersionVector, out: &mut Vec<Action>) {
    out.extend(table.unseen_by(peer).map(|(id, slot)| Action {
        id,
        stamp: slot.stamp,
        change: R::change(slot.payload.clone()),
    }));
}
