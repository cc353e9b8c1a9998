//! Cinnabar Memory: process-local storage adapter for the cinnabar engine.
//!
//! [`MemoryStore`] implements every storage role the engine collaborates
//! with (history, snapshots, commit, queries) over plain maps behind one
//! lock. It is the reference adapter: tests and examples run against it, and
//! a new backend can be checked against its commit and query semantics.

pub mod query;
pub mod store;

pub use query::{Comparator, ComparatorBuilder, Predicate, PredicateBuilder};
pub use store::MemoryStore;
