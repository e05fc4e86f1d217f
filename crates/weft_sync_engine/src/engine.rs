//! Sync engine over encoded messages.

use crate::applier::SyncApplier;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use weft_core::{Action, ApplyOutcome, Violation};
use weft_sync_protocol::{ActionsMessage, MalformedAction, VersionMessage};

/// The current state of the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Not syncing.
    Idle,
    /// Merging a peer's actions into this replica.
    Pulling,
    /// Merging this replica's actions into a peer.
    Pushing,
    /// The last cycle completed.
    Synced,
    /// The last cycle failed.
    Error,
}

impl SyncState {
    /// Returns true while a cycle is running.
    pub fn is_active(&self) -> bool {
        matches!(self, SyncState::Pulling | SyncState::Pushing)
    }

    /// Returns true if a new cycle may start.
    pub fn can_start_sync(&self) -> bool {
        !self.is_active()
    }
}

/// Statistics about sync operations.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Actions blobs joined.
    pub joins: u64,
    /// Actions received, malformed ones included.
    pub actions_received: u64,
    /// Actions that changed this replica.
    pub applied: u64,
    /// Actions that lost last-writer-wins.
    pub superseded: u64,
    /// Actions seen before.
    pub duplicates: u64,
    /// Actions dropped for breaking a constraint.
    pub rejected: u64,
    /// Actions that could not be decoded.
    pub malformed: u64,
    /// Actions placed in outgoing blobs.
    pub actions_sent: u64,
    /// Completed [`SyncEngine::sync_with`] cycles.
    pub cycles_completed: u64,
    /// End of the last completed cycle.
    pub last_sync_time: Option<Instant>,
    /// Message of the last failure.
    pub last_error: Option<String>,
}

/// A merged write dropped because it broke a constraint.
///
/// Either the write was refused on arrival, or it was an edge removed later
/// to break a cycle it helped close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The dropped action.
    pub action: Action,
    /// The broken constraint.
    pub violation: Violation,
}

/// What joining one actions blob did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Every decoded action, in application order.
    pub actions: Vec<Action>,
    /// Actions that changed this replica, in application order.
    pub applied: Vec<Action>,
    /// Number of actions that lost last-writer-wins.
    pub superseded: usize,
    /// Number of actions seen before.
    pub duplicates: usize,
    /// Actions dropped for breaking a constraint.
    pub rejected: Vec<Rejection>,
    /// Actions that could not be decoded.
    pub malformed: Vec<MalformedAction>,
}

impl JoinReport {
    /// Number of actions in the blob.
    #[must_use]
    pub fn received(&self) -> usize {
        self.decoded() + self.malformed.len()
    }

    /// Number of actions that decoded.
    #[must_use]
    pub fn decoded(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if nothing was rejected or malformed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.malformed.is_empty()
    }

    /// Folds `other` into this report.
    pub fn absorb(&mut self, other: JoinReport) {
        self.actions.extend(other.actions);
        self.applied.extend(other.applied);
        self.superseded += other.superseded;
        self.duplicates += other.duplicates;
        self.rejected.extend(other.rejected);
        self.malformed.extend(other.malformed);
    }

    fn record(&mut self, action: Action, outcome: ApplyOutcome) {
        self.actions.push(action.clone());
        match outcome {
            ApplyOutcome::Applied => self.applied.push(action),
            ApplyOutcome::Superseded => self.superseded += 1,
            ApplyOutcome::Duplicate => self.duplicates += 1,
            ApplyOutcome::Rejected(violation) => {
                self.rejected.push(Rejection { action, violation });
            }
        }
    }
}

/// Result of a two-way sync cycle.
#[derive(Debug, Clone)]
pub struct SyncCycleResult {
    /// What this replica took from the peer.
    pub pulled: JoinReport,
    /// What the peer took from this replica.
    pub pushed: JoinReport,
    /// Pull and push rounds run.
    pub rounds: usize,
    /// Wall time of the cycle.
    pub duration: Duration,
}

/// Syncs one replica with its peers.
///
/// The three message-level steps are [`SyncEngine::version`],
/// [`SyncEngine::actions`] and [`SyncEngine::join`]; any transport that moves
/// the blobs between replicas will do. [`SyncEngine::sync_with`] runs both
/// directions against an engine in the same process.
pub struct SyncEngine<A: SyncApplier> {
    config: SyncConfig,
    applier: Arc<A>,
    state: RwLock<SyncState>,
    stats: RwLock<SyncStats>,
}

impl<A: SyncApplier> SyncEngine<A> {
    /// Creates a new sync engine.
    pub fn new(config: SyncConfig, applier: A) -> Self {
        Self {
            config,
            applier: Arc::new(applier),
            state: RwLock::new(SyncState::Idle),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Gets the applier.
    pub fn applier(&self) -> &A {
        &self.applier
    }

    /// Gets the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        *self.state.read()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    fn set_state(&self, state: SyncState) {
        *self.state.write() = state;
    }

    /// Encodes this replica's version vectors.
    ///
    /// # Errors
    ///
    /// Fails if the replica cannot be read.
    pub fn version(&self) -> SyncResult<Vec<u8>> {
        let version = self.applier.version()?;
        Ok(VersionMessage::new(version).encode()?)
    }

    /// Encodes the actions a peer with `peer_version` is missing.
    ///
    /// At most [`SyncConfig::batch_size`] actions are included, lowest stamps
    /// first; joining them and asking again yields the rest.
    ///
    /// # Errors
    ///
    /// Fails on a malformed version blob or if the replica cannot be read.
    pub fn actions(&self, peer_version: &[u8]) -> SyncResult<Vec<u8>> {
        let peer = VersionMessage::decode(peer_version)?;
        let mut actions = self.applier.actions_since(&peer.version)?;
        actions.truncate(self.config.batch_size);
        self.stats.write().actions_sent += actions.len() as u64;
        debug!(actions = actions.len(), "encoding actions for peer");
        Ok(ActionsMessage::new(actions).encode()?)
    }

    /// Merges an actions blob into this replica and commits it.
    ///
    /// Actions are applied in stamp order whatever order they arrive in.
    /// Rejected and malformed actions are reported; the rest still apply.
    /// Merged edges that close a cycle under an acyclic label are settled
    /// before the commit, and the ones removed are reported as rejected.
    ///
    /// # Errors
    ///
    /// Fails if the blob framing is unreadable or the replica fails.
    pub fn join(&self, actions: &[u8]) -> SyncResult<JoinReport> {
        let mut report = self.merge(actions)?;
        self.finish(&mut report)?;
        Ok(report)
    }

    /// Applies an actions blob without committing.
    fn merge(&self, actions: &[u8]) -> SyncResult<JoinReport> {
        let decoded = ActionsMessage::decode_lenient(actions)?;
        for bad in &decoded.malformed {
            warn!(index = bad.index, error = %bad.message, "skipping malformed action");
        }

        let mut ordered = decoded.actions;
        ordered.sort_by_key(Action::order_key);
        let outcomes = self.applier.apply_batch(ordered.clone())?;

        let mut report = JoinReport {
            malformed: decoded.malformed,
            ..JoinReport::default()
        };
        for (action, outcome) in ordered.into_iter().zip(outcomes) {
            report.record(action, outcome);
        }

        {
            let mut stats = self.stats.write();
            stats.joins += 1;
            stats.actions_received += report.received() as u64;
            stats.applied += report.applied.len() as u64;
            stats.superseded += report.superseded as u64;
            stats.duplicates += report.duplicates as u64;
            stats.rejected += report.rejected.len() as u64;
            stats.malformed += report.malformed.len() as u64;
        }
        debug!(
            received = report.received(),
            applied = report.applied.len(),
            superseded = report.superseded,
            duplicates = report.duplicates,
            rejected = report.rejected.len(),
            malformed = report.malformed.len(),
            "joined actions"
        );
        Ok(report)
    }

    /// Settles and commits what [`Self::merge`] applied.
    fn finish(&self, report: &mut JoinReport) -> SyncResult<()> {
        let removed = self.applier.finish()?;
        if removed.is_empty() {
            return Ok(());
        }
        self.stats.write().rejected += removed.len() as u64;
        for (action, violation) in removed {
            warn!(id = %action.id, %violation, "merged edge dropped");
            report.rejected.push(Rejection { action, violation });
        }
        Ok(())
    }

    /// Runs a two-way cycle with `peer`: pull its actions, then push ours.
    ///
    /// Each direction repeats until a round brings nothing new or
    /// [`SyncConfig::max_rounds`] is reached.
    ///
    /// # Errors
    ///
    /// Fails if either replica fails or a cycle is already running.
    pub fn sync_with<B: SyncApplier>(&self, peer: &SyncEngine<B>) -> SyncResult<SyncCycleResult> {
        let start = Instant::now();
        if !self.state().can_start_sync() {
            return Err(SyncError::InvalidStateTransition {
                from: format!("{:?}", self.state()),
                to: "sync".into(),
            });
        }

        self.set_state(SyncState::Pulling);
        let pulled = match self.transfer(peer, self) {
            Ok(result) => result,
            Err(e) => return Err(self.fail(e)),
        };

        self.set_state(SyncState::Pushing);
        let pushed = match self.transfer(self, peer) {
            Ok(result) => result,
            Err(e) => return Err(self.fail(e)),
        };

        self.set_state(SyncState::Synced);
        let result = SyncCycleResult {
            rounds: pulled.1 + pushed.1,
            pulled: pulled.0,
            pushed: pushed.0,
            duration: start.elapsed(),
        };
        {
            let mut stats = self.stats.write();
            stats.cycles_completed += 1;
            stats.last_sync_time = Some(Instant::now());
            stats.last_error = None;
        }
        info!(
            pulled = result.pulled.applied.len(),
            pushed = result.pushed.applied.len(),
            rounds = result.rounds,
            "sync cycle complete"
        );
        Ok(result)
    }

    /// Moves actions from `from` to `to` until nothing new arrives.
    fn transfer<X: SyncApplier, Y: SyncApplier>(
        &self,
        from: &SyncEngine<X>,
        to: &SyncEngine<Y>,
    ) -> SyncResult<(JoinReport, usize)> {
        let mut total = JoinReport::default();
        let mut rounds = 0;
        while rounds < self.config.max_rounds {
            rounds += 1;
            let blob = from.actions(&to.version()?)?;
            let report = to.merge(&blob)?;
            let progressed = report.decoded() > 0;
            total.absorb(report);
            if !progressed {
                break;
            }
        }
        // settle once, after the last batch
        to.finish(&mut total)?;
        Ok((total, rounds))
    }

    fn fail(&self, error: SyncError) -> SyncError {
        self.set_state(SyncState::Error);
        self.stats.write().last_error = Some(error.to_string());
        warn!(%error, "sync cycle failed");
        error
    }
}
