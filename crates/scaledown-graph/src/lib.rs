//! scaledown-graph: Neo4j access for tenant resource graphs.
//!
//! Every read and write the scale-down engine issues flows through the
//! [`GraphStore`] trait so that tenant scoping, node-layer selection, and
//! parameter binding are handled in one place.

pub mod client;
pub mod memory;
pub mod mutations;
pub mod predicate;
pub mod queries;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use memory::MemoryStore;
pub use predicate::{PropertyPredicate, ALLOWED_PATTERN_PATHS, MAX_PATTERN_CRITERIA};
pub use queries::{EdgeRecord, NodeRecord};
pub use store::GraphStore;
