pub mod grants_gov;
pub mod types;

use crate::grants::types::{OpportunityHit, SearchCriteria, SearchResponse};
use anyhow::Context;
use serde_json::Value;

#[async_trait::async_trait]
pub trait GrantsSearch: Send + Sync {
    /// Posts `criteria` to the upstream search endpoint as-is and returns the JSON body.
    ///
    /// A non-success status surfaces as [`crate::error::UpstreamError`].
    async fn search(&self, criteria: &Value) -> anyhow::Result<Value>;
}

/// Runs a typed search and extracts the hit list from the response.
pub async fn search_hits(
    client: &dyn GrantsSearch,
    criteria: &SearchCriteria,
) -> anyhow::Result<Vec<OpportunityHit>> {
    let body = serde_json::to_value(criteria).context("failed to encode search criteria")?;
    let raw = client.search(&body).await?;
    let parsed = serde_json::from_value::<SearchResponse>(raw)
        .context("failed to decode Grants.gov response into SearchResponse")?;
    Ok(parsed.into_hits())
}
