use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::advanced::{AdvancedFilter, SortOption};
use crate::dispatch::{QueryKind, SearchMode};
use crate::stats::{SortOrder, StatsType};

/// A single heterogeneous field -> value document returned by the search engine.
pub type Record = serde_json::Map<String, Value>;

/// Body of a `/build/*-query` call. Each variant serializes to the flat
/// object its endpoint expects.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BuildRequest {
    Patent {
        patent_ids: Vec<String>,
    },
    Examiner {
        examiners: Vec<String>,
        search_type: SearchMode,
        limit: u32,
    },
    LawFirm {
        lawfirms: Vec<String>,
        search_type: SearchMode,
        limit: u32,
    },
    Prosecutor {
        prosecutors: Vec<String>,
        search_type: SearchMode,
        limit: u32,
    },
    Attorney {
        attorneys: Vec<String>,
        search_type: SearchMode,
        limit: u32,
    },
    Gau {
        gaus: Vec<String>,
        limit: u32,
    },
    Advanced {
        filters: Vec<AdvancedFilter>,
        limit: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Option<SortOption>,
    },
}

impl BuildRequest {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Patent { .. } => "/build/patent-query",
            Self::Examiner { .. } => "/build/examiner-query",
            Self::LawFirm { .. } => "/build/lawfirm-query",
            Self::Prosecutor { .. } => "/build/prosecutor-query",
            Self::Attorney { .. } => "/build/attorney-query",
            Self::Gau { .. } => "/build/gau-query",
            Self::Advanced { .. } => "/build/advanced-query",
        }
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Patent { .. } => QueryKind::Patent,
            Self::Examiner { .. } => QueryKind::Examiner,
            Self::LawFirm { .. } => QueryKind::LawFirm,
            Self::Prosecutor { .. } => QueryKind::Prosecutor,
            Self::Attorney { .. } => QueryKind::Attorney,
            Self::Gau { .. } => QueryKind::Gau,
            Self::Advanced { .. } => QueryKind::Advanced,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BuildResponse {
    pub solr_query_url: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExecuteRequest<'a> {
    pub solr_query_url: &'a str,
}

/// Payload of a successful `/execute-query`. Top-level fields the console
/// does not use are kept so exports post the payload back as received.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub total_found: u64,
    #[serde(default)]
    pub results: Vec<Record>,
    #[serde(flatten)]
    pub extra: Record,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TotalStats {
    #[serde(default)]
    pub total_patents: i64,
    #[serde(default)]
    pub total_approved: i64,
    #[serde(default)]
    pub total_pending: i64,
    #[serde(default)]
    pub total_abandoned: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExaminerStatsRequest {
    pub from_date: String,
    pub to_date: String,
    pub limit: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RangeStatsRequest {
    #[serde(rename = "type")]
    pub stats_type: StatsType,
    pub from_date: String,
    pub to_date: String,
    pub limit: u32,
    pub sort_order: SortOrder,
}
