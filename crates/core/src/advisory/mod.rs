pub mod prompt;

use crate::config::Settings;
use crate::grants::types::{normalize_hits, NormalizedGrant, SearchCriteria};
use crate::grants::{search_hits, GrantsSearch};
use crate::llm::CompletionClient;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResult {
    pub grants: Vec<NormalizedGrant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_suggestions: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct AdvisoryOptions {
    pub rows: u32,
    pub include_close_date: bool,
}

impl AdvisoryOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            rows: settings.advisory_rows,
            include_close_date: settings.advisory_include_close_date,
        }
    }
}

#[derive(Debug)]
pub enum AdvisoryError {
    EmptyQuery,
    Search(anyhow::Error),
    Completion(anyhow::Error),
}

impl fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvisoryError::EmptyQuery => f.write_str("missing or empty query"),
            AdvisoryError::Search(err) => write!(f, "grant search failed: {err:#}"),
            AdvisoryError::Completion(err) => write!(f, "advisory completion failed: {err:#}"),
        }
    }
}

impl std::error::Error for AdvisoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdvisoryError::EmptyQuery => None,
            AdvisoryError::Search(err) | AdvisoryError::Completion(err) => Some(&**err),
        }
    }
}

/// Returns the query unchanged, or `EmptyQuery` when it is missing or blank.
pub fn validate_query(query: Option<&str>) -> Result<&str, AdvisoryError> {
    query
        .filter(|q| !q.trim().is_empty())
        .ok_or(AdvisoryError::EmptyQuery)
}

#[derive(Clone)]
pub struct AdvisoryComposer {
    grants: Arc<dyn GrantsSearch>,
    llm: Option<Arc<dyn CompletionClient>>,
    options: AdvisoryOptions,
}

impl AdvisoryComposer {
    pub fn new(
        grants: Arc<dyn GrantsSearch>,
        llm: Option<Arc<dyn CompletionClient>>,
        options: AdvisoryOptions,
    ) -> Self {
        Self {
            grants,
            llm,
            options,
        }
    }

    /// Searches open opportunities for `query` and asks the completion client for advice.
    ///
    /// Without a completion client the result carries grants only.
    pub async fn compose(&self, query: Option<&str>) -> Result<AdvisoryResult, AdvisoryError> {
        let query = validate_query(query)?;

        let criteria = SearchCriteria::open_opportunities(query, self.options.rows);
        let hits = search_hits(self.grants.as_ref(), &criteria)
            .await
            .map_err(AdvisoryError::Search)?;
        let grants = normalize_hits(hits);

        let Some(llm) = &self.llm else {
            tracing::debug!(grants = grants.len(), "no completion client; returning grants only");
            return Ok(AdvisoryResult {
                grants,
                ai_suggestions: None,
            });
        };

        let messages = prompt::conversation(query.trim(), &grants, self.options.include_close_date);
        let text = llm
            .complete(messages)
            .await
            .map_err(AdvisoryError::Completion)?;

        tracing::info!(
            grants = grants.len(),
            provider = ?llm.provider(),
            "advisory composed"
        );

        Ok(AdvisoryResult {
            grants,
            ai_suggestions: Some(text.trim().to_string()),
        })
    }
}
