//! scaledown-core: Shared types, configuration, and progress reporting.
//!
//! This crate provides the foundational types used by every scale-down crate:
//! - Tenant and node-layer identifiers for store-facing queries
//! - Property map aliases shared by extraction, metrics, and export
//! - The synchronous progress observer interface
//! - Layered configuration loading

pub mod config;
pub mod progress;
pub mod types;

pub use config::ScaleDownConfig;
pub use progress::ProgressObserver;
pub use types::{NodeLayer, Properties, PropertyMap, TenantId, LINEAGE_RELATIONSHIP};
