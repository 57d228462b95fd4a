//! Field/operator/value filter rows posted to `/build/advanced-query`.

use serde::Serialize;

use crate::backend::{Backend, BuildRequest};
use crate::dispatch::{self, DispatchError, Origin, QueryLocator};
use crate::session::Session;
use crate::stats::SortOrder;
use crate::tags::DisplayFragment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Id,
    Title,
    Examiner,
    LawFirm,
    AllAttorneyNames,
    DisposalType,
    AppDateYear,
}

impl FilterField {
    pub const ALL: [FilterField; 7] = [
        FilterField::Id,
        FilterField::Title,
        FilterField::Examiner,
        FilterField::LawFirm,
        FilterField::AllAttorneyNames,
        FilterField::DisposalType,
        FilterField::AppDateYear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Examiner => "examiner",
            Self::LawFirm => "law_firm",
            Self::AllAttorneyNames => "all_attorney_names",
            Self::DisposalType => "disposal_type",
            Self::AppDateYear => "app_date_year",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|f| f.as_str() == v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    StartsWith,
    Range,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 4] = [
        FilterOperator::Equals,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
        FilterOperator::Range,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Contains => "contains",
            Self::StartsWith => "starts_with",
            Self::Range => "range",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|o| o.as_str() == v)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdvancedFilter {
    pub field: FilterField,
    pub operator: FilterOperator,
    pub value: String,
}

impl AdvancedFilter {
    /// Trims `value` and checks it against the operator. A range must be
    /// `start-end` with exactly one separator and both bounds present.
    pub fn new(
        field: FilterField,
        operator: FilterOperator,
        value: &str,
    ) -> Result<Self, DispatchError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(DispatchError::validation("Filter value must not be empty"));
        }
        if operator == FilterOperator::Range {
            let bounds: Vec<&str> = value.split('-').collect();
            if bounds.len() != 2 || bounds.iter().any(|b| b.trim().is_empty()) {
                return Err(DispatchError::validation(format!(
                    "Range value '{value}' must look like start-end"
                )));
            }
        }
        Ok(Self {
            field,
            operator,
            value: value.to_string(),
        })
    }

    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.field.as_str(),
            self.operator.as_str(),
            self.value
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortOption {
    pub field: String,
    pub order: SortOrder,
}

impl SortOption {
    /// `field[:asc|desc]`, descending when no order is given.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (field, order) = match raw.split_once(':') {
            Some((field, order)) => (
                field,
                SortOrder::parse(order)
                    .ok_or_else(|| format!("invalid sort order '{}'", order.trim()))?,
            ),
            None => (raw, SortOrder::Desc),
        };
        let field = field.trim();
        if field.is_empty() {
            return Err("sort field must not be empty".to_string());
        }
        Ok(Self {
            field: field.to_string(),
            order,
        })
    }
}

/// Same add/remove discipline as a tag list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterList {
    rows: Vec<AdvancedFilter>,
}

impl FilterList {
    pub fn add(&mut self, filter: AdvancedFilter) {
        self.rows.push(filter);
    }

    pub fn remove(&mut self, index: usize) -> Option<AdvancedFilter> {
        if index >= self.rows.len() {
            return None;
        }
        Some(self.rows.remove(index))
    }

    pub fn rows(&self) -> &[AdvancedFilter] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> DisplayFragment {
        DisplayFragment::from_labels(self.rows.iter().map(AdvancedFilter::label))
    }
}

pub async fn build_advanced(
    session: &mut Session,
    backend: &dyn Backend,
    limit: u32,
    sort: Option<SortOption>,
) -> Result<QueryLocator, DispatchError> {
    session.clear_error();
    if session.filters.is_empty() {
        return Err(dispatch::surface(
            session,
            DispatchError::validation("Please add at least one filter"),
        ));
    }
    let request = BuildRequest::Advanced {
        filters: session.filters.rows().to_vec(),
        limit,
        sort,
    };
    dispatch::dispatch(session, backend, request, Origin::User).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_serializes_with_wire_names() {
        let f = AdvancedFilter::new(FilterField::LawFirm, FilterOperator::StartsWith, " Foo ").unwrap();
        assert_eq!(
            serde_json::to_value(&f).unwrap(),
            json!({"field": "law_firm", "operator": "starts_with", "value": "Foo"})
        );
    }

    #[test]
    fn range_needs_two_bounds() {
        assert!(AdvancedFilter::new(FilterField::AppDateYear, FilterOperator::Range, "2019-2023").is_ok());
        for bad in ["2019", "2019-", "-2023", "2019-2020-2021"] {
            assert!(
                AdvancedFilter::new(FilterField::AppDateYear, FilterOperator::Range, bad).is_err(),
                "{bad} accepted"
            );
        }
        assert!(AdvancedFilter::new(FilterField::Title, FilterOperator::Equals, "  ").is_err());
    }

    #[test]
    fn sort_option_parsing() {
        assert_eq!(
            SortOption::parse("app_date:asc").unwrap(),
            SortOption {
                field: "app_date".into(),
                order: SortOrder::Asc
            }
        );
        assert_eq!(SortOption::parse("app_date").unwrap().order, SortOrder::Desc);
        assert!(SortOption::parse(":asc").is_err());
        assert!(SortOption::parse("app_date:sideways").is_err());
    }

    #[test]
    fn field_and_operator_names_parse() {
        assert_eq!(FilterField::parse("all-attorney-names"), Some(FilterField::AllAttorneyNames));
        assert_eq!(FilterOperator::parse("starts_with"), Some(FilterOperator::StartsWith));
        assert_eq!(FilterOperator::parse("like"), None);
    }

    #[test]
    fn list_render_indices_follow_removals() {
        let mut list = FilterList::default();
        for v in ["a", "b", "c"] {
            list.add(AdvancedFilter::new(FilterField::Title, FilterOperator::Contains, v).unwrap());
        }
        list.remove(0);
        let labels: Vec<_> = list.render().chips.into_iter().map(|c| (c.index, c.label)).collect();
        assert_eq!(
            labels,
            vec![(0, "title contains b".to_string()), (1, "title contains c".to_string())]
        );
    }
}
