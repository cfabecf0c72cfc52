//! Error types for the scaledown-engine crate.

use thiserror::Error;

/// Pipeline stage a store failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extract,
    Sample,
    Delete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Extract => "extract",
            Self::Sample => "sample",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ScaleDownError {
    #[error("Tenant not found: {tenant_id}")]
    NotFound { tenant_id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No data: zero resource nodes loaded for tenant {tenant_id}")]
    NoData { tenant_id: String },

    #[error("Store error during {phase} for tenant {tenant_id}: {source}")]
    Store {
        phase: Phase,
        tenant_id: String,
        #[source]
        source: scaledown_graph::GraphError,
    },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScaleDownError {
    /// Wrap a store failure with the phase and tenant it interrupted.
    pub fn store(
        phase: Phase,
        tenant_id: &scaledown_core::TenantId,
    ) -> impl FnOnce(scaledown_graph::GraphError) -> Self + '_ {
        move |source| Self::Store {
            phase,
            tenant_id: tenant_id.to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScaleDownError>;
