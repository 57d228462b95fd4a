//! Cross-reference fields lifted from a singleton patent lookup, and the
//! follow-up searches they enable.

use serde_json::Value;
use tracing::info;

use crate::backend::{Backend, BuildRequest, Record, ResultSet};
use crate::dispatch::{self, DispatchError, Origin, QueryLocator, SearchMode};
use crate::session::Session;

pub const FOLLOW_UP_LIMIT: u32 = 10;
pub const FOLLOW_UP_GAU_LIMIT: u32 = 20;
const FOLLOW_UP_MODE: SearchMode = SearchMode::LatestFiled;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FollowUp {
    Examiner,
    LawFirm,
    Attorney,
    Gau,
}

impl FollowUp {
    pub const ALL: [FollowUp; 4] = [
        FollowUp::Examiner,
        FollowUp::LawFirm,
        FollowUp::Attorney,
        FollowUp::Gau,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "examiner" => Some(Self::Examiner),
            "lawfirm" | "law-firm" | "law_firm" | "firm" => Some(Self::LawFirm),
            "attorney" | "attorneys" => Some(Self::Attorney),
            "gau" | "gaus" => Some(Self::Gau),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Examiner => "examiner",
            Self::LawFirm => "lawfirm",
            Self::Attorney => "attorney",
            Self::Gau => "gau",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatentContext {
    pub examiner: Option<String>,
    pub lawfirm: Option<String>,
    pub attorneys: Vec<String>,
    pub gaus: Vec<String>,
}

impl PatentContext {
    /// Extracts the context fields, tolerating any shape: a field of the
    /// wrong type is treated as absent.
    pub fn from_record(record: &Record) -> Self {
        let examiner = record
            .get("examiner")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let lawfirm = record
            .get("law_firm")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let attorneys = record
            .get("all_attorney_names")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let gaus = record
            .get("gau")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            examiner,
            lawfirm,
            attorneys,
            gaus,
        }
    }

    pub fn enabled(&self, follow_up: FollowUp) -> bool {
        match follow_up {
            FollowUp::Examiner => self.examiner.is_some(),
            FollowUp::LawFirm => self.lawfirm.is_some(),
            FollowUp::Attorney => !self.attorneys.is_empty(),
            FollowUp::Gau => !self.gaus.is_empty(),
        }
    }

    pub fn enabled_actions(&self) -> Vec<FollowUp> {
        FollowUp::ALL
            .into_iter()
            .filter(|f| self.enabled(*f))
            .collect()
    }

    /// The build request a follow-up issues, or `None` if its field is empty.
    pub fn follow_up_request(&self, follow_up: FollowUp) -> Option<BuildRequest> {
        match follow_up {
            FollowUp::Examiner => self.examiner.as_ref().map(|e| BuildRequest::Examiner {
                examiners: vec![e.clone()],
                search_type: FOLLOW_UP_MODE,
                limit: FOLLOW_UP_LIMIT,
            }),
            FollowUp::LawFirm => self.lawfirm.as_ref().map(|f| BuildRequest::LawFirm {
                lawfirms: vec![f.to_lowercase()],
                search_type: FOLLOW_UP_MODE,
                limit: FOLLOW_UP_LIMIT,
            }),
            FollowUp::Attorney => self.attorneys.first().map(|a| BuildRequest::Attorney {
                attorneys: vec![a.clone()],
                search_type: FOLLOW_UP_MODE,
                limit: FOLLOW_UP_LIMIT,
            }),
            FollowUp::Gau => {
                if self.gaus.is_empty() {
                    None
                } else {
                    Some(BuildRequest::Gau {
                        gaus: self.gaus.clone(),
                        limit: FOLLOW_UP_GAU_LIMIT,
                    })
                }
            }
        }
    }
}

/// Context for an executed patent search: present only for exactly one record.
pub fn derive(results: &ResultSet) -> Option<PatentContext> {
    match results.results.as_slice() {
        [only] => Some(PatentContext::from_record(only)),
        _ => None,
    }
}

/// Issues the follow-up search for `follow_up`. The context itself survives
/// so result titles can name the pivot value.
pub async fn explore_context(
    session: &mut Session,
    backend: &dyn Backend,
    follow_up: FollowUp,
) -> Result<QueryLocator, DispatchError> {
    session.clear_error();
    let request = match session.context() {
        None => Err(DispatchError::validation("No patent context available")),
        Some(ctx) => ctx.follow_up_request(follow_up).ok_or_else(|| {
            DispatchError::validation(format!(
                "No {} available in the patent context",
                follow_up.name()
            ))
        }),
    };
    let request = request.map_err(|e| dispatch::surface(session, e))?;
    info!(follow_up = follow_up.name(), "exploring patent context");
    dispatch::dispatch(session, backend, request, Origin::FollowUp).await
}
