//! Criteria-driven selection.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use scaledown_core::{NodeLayer, TenantId};
use scaledown_graph::{GraphStore, PropertyPredicate};

use crate::error::{Phase, Result, ScaleDownError};

/// Selects abstracted-layer nodes whose properties match every criterion.
///
/// Criteria are validated into a [`PropertyPredicate`] before the store is
/// touched, so a rejected key never reaches a query.
pub struct PatternSampler<'s, S: GraphStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: GraphStore + ?Sized> PatternSampler<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub async fn sample(
        &self,
        tenant_id: &TenantId,
        criteria: &BTreeMap<String, Value>,
    ) -> Result<BTreeSet<String>> {
        let predicate = PropertyPredicate::new(criteria)
            .map_err(|e| ScaleDownError::InvalidArgument(e.to_string()))?;

        let ids = self
            .store
            .find_matching(tenant_id, NodeLayer::Abstracted, &predicate)
            .await
            .map_err(ScaleDownError::store(Phase::Sample, tenant_id))?;

        tracing::debug!(
            tenant_id = %tenant_id,
            clauses = predicate.clauses().len(),
            matched = ids.len(),
            "Pattern selection complete"
        );
        Ok(ids.into_iter().collect())
    }
}
