use crate::backend::TotalStats;
use crate::stats::{ClassificationCount, ExaminerStats, RangeStats, SortOrder, StatsEntry};
use crate::utils::format_thousands;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsCard {
    pub rank: usize,
    pub name: String,
    pub application_count: Option<i64>,
    pub unique_gau_count: Option<i64>,
    /// Selectable; selecting one issues a GAU search.
    pub gaus: Vec<ClassificationCount>,
    pub unique_cpc_count: Option<i64>,
    /// Display only.
    pub cpcs: Vec<ClassificationCount>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsView {
    pub title: String,
    pub count_line: String,
    pub cards: Vec<StatsCard>,
}

fn cards(entries: &[StatsEntry]) -> Vec<StatsCard> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| StatsCard {
            rank: i + 1,
            name: e.name.clone(),
            application_count: e.application_count,
            unique_gau_count: e.unique_gau_count,
            gaus: e.gaus.clone(),
            unique_cpc_count: e.unique_cpc_count,
            cpcs: e.cpcs.clone(),
        })
        .collect()
}

pub fn render_examiner_stats(stats: &ExaminerStats) -> StatsView {
    StatsView {
        title: "Top Examiners (By Date Range)".to_string(),
        count_line: format!("{} examiner(s)", stats.entries.len()),
        cards: cards(&stats.entries),
    }
}

pub fn render_stats_results(stats: &RangeStats) -> StatsView {
    let key = stats.stats_type.key();
    let lead = match stats.sort_order {
        SortOrder::Asc => "Least",
        SortOrder::Desc => "Top",
    };
    StatsView {
        title: format!("{lead} {key}s (By Date Range)"),
        count_line: format!("{} {key}(s)", stats.entries.len()),
        cards: cards(&stats.entries),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TotalsView {
    pub figures: Vec<(&'static str, String)>,
}

pub fn render_totals(totals: &TotalStats) -> TotalsView {
    TotalsView {
        figures: vec![
            ("Total Patents", format_thousands(totals.total_patents)),
            ("Issued", format_thousands(totals.total_approved)),
            ("Pending", format_thousands(totals.total_pending)),
            ("Abandoned", format_thousands(totals.total_abandoned)),
        ],
    }
}
