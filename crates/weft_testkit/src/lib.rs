//! # Weft Testkit
//!
//! Test utilities for Weft.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - Property-based test generators using proptest
//! - Helpers for running and comparing several replicas
//!
//! ## Usage
//!
//! ```rust
//! use weft_core::{Id, Label};
//! use weft_testkit::prelude::*;
//!
//! let mut replicas = vec![replica(1), replica(2)];
//! replicas[0].set_node(Id::mint(), Label(1)).unwrap();
//! replicas[0].commit().unwrap();
//! merge_all(&mut replicas);
//! assert_converged(&replicas);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod replicas;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::replicas::*;
}

pub use fixtures::*;
pub use generators::*;
pub use replicas::*;
