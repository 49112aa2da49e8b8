use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const DETAIL_URL_BASE: &str = "https://www.grants.gov/search-results-detail/";
pub const MAX_ROWS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OppStatus {
    Forecasted,
    Posted,
}

impl OppStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OppStatus::Forecasted => "forecasted",
            OppStatus::Posted => "posted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OppStatuses(pub Vec<OppStatus>);

impl fmt::Display for OppStatuses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("|");
        f.write_str(&joined)
    }
}

impl Serialize for OppStatuses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Descending sort on one upstream field, sent as `field|desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDesc(pub &'static str);

impl fmt::Display for SortDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|desc", self.0)
    }
}

impl Serialize for SortDesc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Request body for the Grants.gov `search2` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub keyword: String,
    pub opp_statuses: OppStatuses,
    pub sort_by: SortDesc,
    pub rows: u32,
    pub start_record_num: u32,
}

impl SearchCriteria {
    /// Open opportunities matching `keyword`, newest first.
    pub fn open_opportunities(keyword: &str, rows: u32) -> Self {
        Self {
            keyword: keyword.to_string(),
            opp_statuses: OppStatuses(vec![OppStatus::Forecasted, OppStatus::Posted]),
            sort_by: SortDesc("openDate"),
            rows: rows.clamp(1, MAX_ROWS),
            start_record_num: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    #[serde(default)]
    pub opp_hits: Option<Vec<OpportunityHit>>,
}

impl SearchResponse {
    pub fn into_hits(self) -> Vec<OpportunityHit> {
        self.data.and_then(|d| d.opp_hits).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityHit {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, alias = "agencyName", deserialize_with = "lenient_string")]
    pub agency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub open_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub close_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGrant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl From<OpportunityHit> for NormalizedGrant {
    fn from(hit: OpportunityHit) -> Self {
        let link = hit.id.as_deref().map(detail_link);
        Self {
            id: hit.id,
            title: hit.title,
            agency: hit.agency,
            open_date: hit.open_date,
            close_date: hit.close_date,
            link,
        }
    }
}

pub fn detail_link(id: &str) -> String {
    format!("{DETAIL_URL_BASE}{}", urlencoding::encode(id))
}

pub fn normalize_hits(hits: Vec<OpportunityHit>) -> Vec<NormalizedGrant> {
    hits.into_iter().map(NormalizedGrant::from).collect()
}

/// Strings pass through, numbers are stringified, anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
