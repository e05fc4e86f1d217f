//! # Weft Core
//!
//! Embedded, versioned property-graph store for Weft.
//!
//! This crate provides:
//! - Nodes, edges and atoms keyed by 128-bit [`Id`]s, with secondary indexes
//! - Sticky and acyclic [`Constraints`] checked on every write
//! - A change log of committed transitions, drained through [`Store::barrier`]
//! - A checksummed snapshot journal for durability
//! - Per-kind version vectors and stamped [`Action`]s for replica sync
//!
//! ## Usage
//!
//! ```rust
//! use weft_core::{Id, Kind, Label, Store};
//!
//! const PERSON: Label = Label(1);
//! const NAME: Label = Label(2);
//!
//! let mut store = Store::open_in_memory()?;
//! store.declare_sticky(Kind::Node, PERSON)?;
//!
//! let (ada, name) = (Id::mint(), Id::mint());
//! store.set_node(ada, PERSON)?;
//! store.set_atom(name, ada, NAME, b"Ada".to_vec())?;
//! store.commit()?;
//!
//! assert_eq!(store.atoms_by_label_value(NAME, b"A")?, vec![(name, ada)]);
//! assert!(store.remove_node(ada).is_err());
//! # Ok::<(), weft_core::CoreError>(())
//! ```
//!
//! ## Key Invariants
//!
//! - Indexes hold exactly the present entities
//! - A rejected write changes nothing
//! - Events become visible only after the commit that produced them
//! - Merging is idempotent; replicas that saw the same writes agree

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_log;
mod clock;
mod config;
mod constraints;
#[cfg(feature = "std")]
mod dir;
mod error;
mod graph;
mod id;
pub mod journal;
mod replication;
mod snapshot;
mod stats;
mod store;
mod types;

pub use change_log::{ChangeLog, ChangeType, Event};
pub use clock::{Clock, Stamp, VersionVector};
pub use config::Config;
pub use constraints::{Constraints, Violation};
#[cfg(feature = "std")]
pub use dir::StoreDir;
pub use error::{CoreError, CoreResult};
pub use graph::{
    Atom, AtomIndex, Edge, EdgeIndex, Graph, Node, NodeIndex, Record, Slot, Table, TableCounts,
};
pub use id::{mint, Id};
pub use journal::Journal;
pub use replication::{Action, ApplyOutcome, Change, Version};
pub use snapshot::SNAPSHOT_ENVELOPE;
pub use stats::{GraphStats, StatsSnapshot, StoreStats};
pub use store::Store;
pub use types::{Kind, Label, OriginId, SequenceNumber};
