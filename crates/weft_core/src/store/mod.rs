//! The store facade.

mod merge;
mod query;

#[cfg(feature = "std")]
use crate::dir::StoreDir;

use crate::change_log::{ChangeLog, Event};
use crate::clock::{Clock, Stamp};
use crate::config::Config;
use crate::constraints::{Constraints, Violation};
use crate::error::{CoreError, CoreResult};
use crate::graph::{Atom, Edge, Graph, Node, Record};
use crate::id::Id;
use crate::journal::Journal;
use crate::snapshot::{self, Restored};
use crate::stats::{GraphStats, StatsSnapshot, StoreStats};
use crate::types::{Kind, Label, OriginId, SequenceNumber};
use std::collections::BTreeSet;
#[cfg(feature = "std")]
use std::path::Path;
use tracing::{debug, info};
use weft_storage::{InMemoryBackend, StorageBackend};

/// An embedded, versioned property-graph replica.
///
/// A store holds nodes, edges and atoms keyed by [`Id`], keeps their
/// secondary indexes, enforces declared [`Constraints`] and records every
/// committed transition in a change log.
///
/// # Transactions
///
/// Writes apply immediately: the writer reads its own uncommitted writes.
/// [`Store::commit`] makes them durable and moves their events to the change
/// log, where [`Store::barrier`] picks them up. A write that breaks a
/// constraint fails before touching anything.
///
/// # Sync
///
/// [`Store::version`], [`Store::actions`] and [`Store::apply_action`] are the
/// three steps of the exchange between replicas; see `weft_sync_engine` for
/// the byte-level protocol.
///
/// # Example
///
/// ```rust
/// use weft_core::{Id, Label, Store};
///
/// let mut store = Store::open_in_memory()?;
/// let (a, b, link) = (Id::mint(), Id::mint(), Id::mint());
/// store.set_node(a, Label(1))?;
/// store.set_node(b, Label(1))?;
/// store.set_edge(link, a, Label(2), b)?;
/// store.commit()?;
///
/// assert_eq!(store.edges_by_src(a)?, vec![(link, Label(2), b)]);
/// assert_eq!(store.barrier()?.len(), 3);
/// # Ok::<(), weft_core::CoreError>(())
/// ```
pub struct Store {
    config: Config,
    constraints: Constraints,
    clock: Clock,
    graph: Graph,
    log: ChangeLog,
    /// Acyclic labels that merged edges may have closed a cycle in.
    unsettled: BTreeSet<Label>,
    journal: Journal,
    sequence: SequenceNumber,
    /// State differs from the last journal frame.
    dirty: bool,
    is_open: bool,
    stats: StoreStats,
    #[cfg(feature = "std")]
    dir: Option<StoreDir>,
}

impl Store {
    /// Opens a store in a directory with default configuration.
    ///
    /// # Errors
    ///
    /// Fails if the directory is locked, unreadable, or holds a corrupt journal.
    #[cfg(feature = "std")]
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a store in a directory.
    ///
    /// The directory is locked for as long as the store stays open.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the store directory
    /// * `config` - Store configuration
    ///
    /// # Errors
    ///
    /// Fails if the directory is locked, unreadable, or holds a corrupt journal.
    #[cfg(feature = "std")]
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        use weft_storage::FileBackend;

        let dir = StoreDir::open(path.as_ref(), config.create_if_missing)?;
        let backend = FileBackend::open(&dir.journal_path())?;
        let mut store = Self::open_with_backend(config, Box::new(backend))?;
        info!(path = %dir.path().display(), origin = %store.origin(), "opened store");
        store.dir = Some(dir);
        Ok(store)
    }

    /// Opens a store over a journal backend, resuming from its last frame.
    ///
    /// # Errors
    ///
    /// Fails on storage errors or a corrupt journal.
    pub fn open_with_backend(config: Config, backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let mut journal = Journal::new(backend);
        let restored = match journal.recover()? {
            Some(bytes) => Some(snapshot::decode(&bytes)?),
            None => None,
        };
        Ok(Self::assemble(config, journal, restored))
    }

    /// Opens an empty store in memory.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other constructors.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_backend(Config::default(), Box::new(InMemoryBackend::new()))
    }

    /// Loads a store from snapshot bytes produced by [`Store::snapshot`].
    ///
    /// The loaded store journals into memory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the bytes are not a readable snapshot.
    pub fn from_snapshot(bytes: &[u8]) -> CoreResult<Self> {
        Self::from_snapshot_with_config(bytes, Config::default())
    }

    /// Loads a store from snapshot bytes with custom configuration.
    ///
    /// Set [`Config::origin`] when the snapshot seeds a second replica, so
    /// the two do not stamp writes with the same origin.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the bytes are not a readable snapshot.
    pub fn from_snapshot_with_config(bytes: &[u8], config: Config) -> CoreResult<Self> {
        let restored = snapshot::decode(bytes)?;
        let journal = Journal::new(Box::new(InMemoryBackend::new()));
        Ok(Self::assemble(config, journal, Some(restored)))
    }

    /// Copies the current state into a new in-memory replica with a fresh origin.
    ///
    /// Constraints are carried over. Events are not.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn fork(&self) -> CoreResult<Self> {
        let bytes = self.snapshot()?;
        let config = self
            .config
            .clone()
            .origin(OriginId::random())
            .constraints(self.constraints.clone());
        Self::from_snapshot_with_config(&bytes, config)
    }

    fn assemble(config: Config, journal: Journal, restored: Option<Restored>) -> Self {
        let (origin, last, sequence, graph) = match restored {
            Some(r) => (config.origin.unwrap_or(r.origin), r.clock, r.sequence, r.graph),
            None => (
                config.origin.unwrap_or_else(OriginId::random),
                0,
                SequenceNumber::default(),
                Graph::default(),
            ),
        };
        debug!(%origin, %sequence, frames = journal.frames(), "assembled store");
        Self {
            constraints: config.constraints.clone(),
            clock: Clock::resume(origin, last, config.hybrid_clock),
            config,
            graph,
            log: ChangeLog::new(),
            unsettled: BTreeSet::new(),
            journal,
            sequence,
            dirty: false,
            is_open: true,
            stats: StoreStats::new(),
            #[cfg(feature = "std")]
            dir: None,
        }
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open {
            Ok(())
        } else {
            Err(CoreError::StoreClosed)
        }
    }

    /// Returns true until [`Store::close`] succeeds.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Origin stamped on this replica's writes.
    #[must_use]
    pub fn origin(&self) -> OriginId {
        self.clock.origin()
    }

    /// Sequence of the last commit.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    /// Configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read access to the tables.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    // === Constraints ===

    /// Declared constraints.
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Declares `label` sticky for entities of `kind`.
    ///
    /// Returns false if it already was. Applies to writes from now on.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn declare_sticky(&mut self, kind: Kind, label: Label) -> CoreResult<bool> {
        self.ensure_open()?;
        Ok(self.constraints.declare_sticky(kind, label))
    }

    /// Declares edge `label` acyclic.
    ///
    /// Returns false if it already was. Existing cycles are left alone; new
    /// edges may not add one.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn declare_acyclic(&mut self, label: Label) -> CoreResult<bool> {
        self.ensure_open()?;
        Ok(self.constraints.declare_acyclic(label))
    }

    // === Entities ===

    /// Returns the node `id` if present.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn node(&self, id: Id) -> CoreResult<Option<Node>> {
        self.get(id)
    }

    /// Returns the edge `id` if present.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn edge(&self, id: Id) -> CoreResult<Option<Edge>> {
        self.get(id)
    }

    /// Returns the atom `id` if present.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn atom(&self, id: Id) -> CoreResult<Option<Atom>> {
        self.get(id)
    }

    /// Returns the payload of kind `R` stored under `id`, if present.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn get<R: Record>(&self, id: Id) -> CoreResult<Option<R>> {
        self.ensure_open()?;
        self.stats.record_read();
        Ok(R::table(&self.graph).get(id).cloned())
    }

    /// Sets node `id` to carry `label`.
    ///
    /// # Errors
    ///
    /// Fails on a constraint violation or if the store is closed.
    pub fn set_node(&mut self, id: Id, label: Label) -> CoreResult<()> {
        self.write(id, Some(Node::new(label)))
    }

    /// Removes node `id`. Edges and atoms referring to it are left alone.
    ///
    /// # Errors
    ///
    /// Fails on a constraint violation or if the store is closed.
    pub fn remove_node(&mut self, id: Id) -> CoreResult<()> {
        self.write::<Node>(id, None)
    }

    /// Sets edge `id` to link `src` to `dst` under `label`.
    ///
    /// # Errors
    ///
    /// Fails on a constraint violation or if the store is closed.
    pub fn set_edge(&mut self, id: Id, src: Id, label: Label, dst: Id) -> CoreResult<()> {
        self.write(id, Some(Edge::new(src, label, dst)))
    }

    /// Removes edge `id`.
    ///
    /// # Errors
    ///
    /// Fails on a constraint violation or if the store is closed.
    pub fn remove_edge(&mut self, id: Id) -> CoreResult<()> {
        self.write::<Edge>(id, None)
    }

    /// Sets atom `id` to attach `value` to `src` under `label`.
    ///
    /// # Errors
    ///
    /// Fails on a constraint violation or if the store is closed.
    pub fn set_atom(
        &mut self,
        id: Id,
        src: Id,
        label: Label,
        value: impl Into<Vec<u8>>,
    ) -> CoreResult<()> {
        self.write(id, Some(Atom::new(src, label, value)))
    }

    /// Removes atom `id`.
    ///
    /// # Errors
    ///
    /// Fails on a constraint violation or if the store is closed.
    pub fn remove_atom(&mut self, id: Id) -> CoreResult<()> {
        self.write::<Atom>(id, None)
    }

    /// Sets `id` to `payload`, or removes it for `None`.
    ///
    /// Setting the value already stored is a no-op unless a sticky constraint
    /// rejects it.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation` if the write breaks a declared
    /// constraint; nothing is changed in that case.
    pub fn write<R: Record>(&mut self, id: Id, payload: Option<R>) -> CoreResult<()> {
        self.ensure_open()?;
        if let Err(violation) = self.check(id, payload.as_ref()) {
            self.stats.record_rejected_write();
            debug!(kind = %R::KIND, %id, %violation, "write rejected");
            return Err(violation.into());
        }
        if R::table(&self.graph).get(id) == payload.as_ref() {
            return Ok(());
        }
        let stamp = self.clock.tick();
        self.apply(id, stamp, payload);
        self.stats.record_write();
        Ok(())
    }

    fn check<R: Record>(&self, id: Id, proposed: Option<&R>) -> Result<(), Violation> {
        self.constraints
            .check_sticky(id, R::table(&self.graph).get(id))?;
        match proposed {
            Some(payload) => payload.validate(id, &self.graph, &self.constraints),
            None => Ok(()),
        }
    }

    /// The single mutation path: updates table, indexes and version, and stages the event.
    fn apply<R: Record>(&mut self, id: Id, stamp: Stamp, payload: Option<R>) {
        let prev = R::table_mut(&mut self.graph).write(id, stamp, payload.clone());
        self.log.stage(R::event(id, prev, payload));
        self.dirty = true;
    }

    // === Lifecycle ===

    /// Makes all writes since the last commit durable and moves their events
    /// to the change log.
    ///
    /// Cycles left by merged edges are settled first (see [`Store::settle`]).
    /// Returns the sequence of the commit. Committing with nothing changed
    /// writes nothing and returns the previous sequence.
    ///
    /// Each commit appends a frame holding the whole graph, so its cost grows
    /// with the store rather than with the writes since the last commit. The
    /// journal is rewritten as a single frame once it passes
    /// [`Config::max_journal_size()`].
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or the journal cannot be written. The
    /// writes stay in place and uncommitted, so the commit can be retried.
    pub fn commit(&mut self) -> CoreResult<SequenceNumber> {
        self.ensure_open()?;
        self.settle()?;
        if !self.dirty {
            return Ok(self.sequence);
        }
        let sequence = self.sequence.next();
        let bytes = snapshot::encode(self.origin(), self.clock.last(), sequence, &self.graph)?;
        self.journal.append(&bytes, self.config.sync_on_commit)?;
        self.sequence = sequence;
        self.dirty = false;
        let events = self.log.commit();
        self.stats.record_commit();
        debug!(%sequence, events, bytes = bytes.len(), "committed");

        if self.journal.size()? > self.config.max_journal_size {
            self.journal.rewrite(&bytes)?;
            self.stats.record_compaction();
            debug!(%sequence, "compacted journal");
        }
        Ok(sequence)
    }

    /// Drains every committed event, in commit order.
    ///
    /// Events of writes not yet committed are not returned.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn barrier(&mut self) -> CoreResult<Vec<Event>> {
        self.ensure_open()?;
        Ok(self.log.drain())
    }

    /// Commits, flushes the journal and releases the store directory.
    ///
    /// Every later call except [`Store::is_open`] fails with `StoreClosed`.
    /// Committed events not yet drained are discarded.
    ///
    /// # Errors
    ///
    /// Fails if the store is already closed or the final commit fails, in
    /// which case the store stays open.
    pub fn close(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        self.commit()?;
        self.journal.sync()?;
        self.is_open = false;
        #[cfg(feature = "std")]
        {
            self.dir = None;
        }
        info!(origin = %self.origin(), sequence = %self.sequence, "closed store");
        Ok(())
    }

    /// Encodes the current state, uncommitted writes included, as snapshot bytes.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or encoding fails.
    pub fn snapshot(&self) -> CoreResult<Vec<u8>> {
        self.ensure_open()?;
        snapshot::encode(self.origin(), self.clock.last(), self.sequence, &self.graph)
    }

    /// Commits, then rewrites the journal as a single frame.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or the journal cannot be written.
    pub fn compact(&mut self) -> CoreResult<()> {
        self.commit()?;
        let bytes = self.snapshot()?;
        self.journal.rewrite(&bytes)?;
        self.stats.record_compaction();
        info!(sequence = %self.sequence, bytes = bytes.len(), "compacted journal");
        Ok(())
    }

    /// Operation counters since open.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Entity counts and log sizes.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn graph_stats(&self) -> CoreResult<GraphStats> {
        self.ensure_open()?;
        Ok(GraphStats {
            nodes: self.graph.nodes.counts(),
            edges: self.graph.edges.counts(),
            atoms: self.graph.atoms.counts(),
            staged: self.log.staged_len(),
            undrained: self.log.pending_len(),
            sequence: self.sequence,
        })
    }

    /// Number of frames in the journal.
    #[must_use]
    pub fn journal_frames(&self) -> usize {
        self.journal.frames()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("origin", &self.origin())
            .field("sequence", &self.sequence)
            .field("is_open", &self.is_open)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
