use clap::{CommandFactory, Parser, Subcommand};

use crate::advanced::{FilterField, FilterOperator};
use crate::context::FollowUp;
use crate::dispatch::{QueryKind, SearchMode};
use crate::export::ExportFormat;
use crate::stats::{SortOrder, StatsType};
use crate::tags::TagKind;
use crate::utils::parse_positive_u32;

fn parse_tag_kind(s: &str) -> Result<TagKind, String> {
    TagKind::parse(s).ok_or_else(|| format!("unknown list '{s}' (patent, examiner, lawfirm, prosecutor)"))
}

fn parse_query_kind(s: &str) -> Result<QueryKind, String> {
    match QueryKind::parse(s) {
        Some(kind) if kind.tag_kind().is_some() => Ok(kind),
        _ => Err(format!("unknown search '{s}' (patent, examiner, lawfirm, prosecutor)")),
    }
}

fn parse_mode(s: &str) -> Result<SearchMode, String> {
    SearchMode::parse(s).ok_or_else(|| format!("unknown search mode '{s}'"))
}

fn parse_follow_up(s: &str) -> Result<FollowUp, String> {
    FollowUp::parse(s).ok_or_else(|| format!("unknown follow-up '{s}' (examiner, lawfirm, attorney, gau)"))
}

fn parse_field(s: &str) -> Result<FilterField, String> {
    FilterField::parse(s).ok_or_else(|| format!("unknown field '{s}'"))
}

fn parse_operator(s: &str) -> Result<FilterOperator, String> {
    FilterOperator::parse(s)
        .ok_or_else(|| format!("unknown operator '{s}' (equals, contains, starts_with, range)"))
}

fn parse_stats_type(s: &str) -> Result<StatsType, String> {
    StatsType::parse(s).ok_or_else(|| format!("unknown stats type '{s}'"))
}

fn parse_sort_order(s: &str) -> Result<SortOrder, String> {
    SortOrder::parse(s).ok_or_else(|| format!("unknown sort order '{s}' (asc, desc)"))
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(s).ok_or_else(|| format!("unknown format '{s}' (json, excel)"))
}

/// One console line.
#[derive(Parser, Debug)]
#[command(
    name = "patentscope",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_help_flag = true
)]
pub struct ConsoleLine {
    #[command(subcommand)]
    pub cmd: ConsoleCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConsoleCommand {
    /// Add a value to a list (patent, examiner, lawfirm, prosecutor)
    Add {
        #[arg(value_parser = parse_tag_kind)]
        list: TagKind,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Remove the entry at INDEX from a list
    #[command(visible_alias = "rm")]
    Remove {
        #[arg(value_parser = parse_tag_kind)]
        list: TagKind,
        index: usize,
    },
    /// Show all lists
    Tags,
    /// Build a query from a list
    Search {
        #[arg(value_parser = parse_query_kind)]
        kind: QueryKind,
        #[arg(short = 'm', long, value_parser = parse_mode)]
        mode: Option<SearchMode>,
        #[arg(short = 'n', long, value_parser = parse_positive_u32)]
        limit: Option<u32>,
    },
    /// Execute the current query
    #[command(visible_alias = "run")]
    Execute,
    /// Open the current query in the system browser
    Open,
    /// Follow up on the patent context (examiner, lawfirm, attorney, gau)
    Explore {
        #[arg(value_parser = parse_follow_up)]
        target: FollowUp,
    },
    /// Build a GAU query for one or more codes
    Gau {
        #[arg(required = true)]
        codes: Vec<String>,
        #[arg(short = 'n', long, value_parser = parse_positive_u32)]
        limit: Option<u32>,
    },
    /// Manage advanced filter rows
    Filter {
        #[command(subcommand)]
        action: FilterCommand,
    },
    /// Build a query from the advanced filter rows
    Advanced {
        #[arg(short = 'n', long, value_parser = parse_positive_u32)]
        limit: Option<u32>,
        /// field[:asc|desc]
        #[arg(long)]
        sort: Option<String>,
    },
    /// Statistics
    Stats {
        #[command(subcommand)]
        kind: StatsCommand,
    },
    /// Save the current results (json, excel)
    Download {
        #[arg(value_parser = parse_format)]
        format: ExportFormat,
        #[arg(short = 'o', long)]
        out: Option<String>,
    },
    /// Show the current query, results and context
    Show,
    /// List commands
    Help,
    /// Leave the console
    #[command(visible_alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum FilterCommand {
    /// Add a row: FIELD OPERATOR VALUE
    Add {
        #[arg(value_parser = parse_field)]
        field: FilterField,
        #[arg(value_parser = parse_operator)]
        operator: FilterOperator,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Remove the row at INDEX
    #[command(visible_alias = "rm")]
    Remove { index: usize },
    /// Show the rows
    List,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum StatsCommand {
    /// Portfolio totals
    Total,
    /// Top examiners in a date range
    Examiners {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(short = 'n', long, value_parser = parse_positive_u32)]
        limit: Option<u32>,
    },
    /// Rank by type in a date range
    Range {
        #[arg(value_parser = parse_stats_type)]
        stats_type: StatsType,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(short = 'n', long, value_parser = parse_positive_u32)]
        limit: Option<u32>,
        #[arg(long, value_parser = parse_sort_order)]
        sort: Option<SortOrder>,
    },
    /// Set the default date range: FROM TO (YYYY-MM-DD)
    Dates { from: String, to: String },
    /// List the stats types
    Types,
}

/// Splits and parses a console line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let tokens = shlex::split(trimmed).ok_or_else(|| "unbalanced quotes".to_string())?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let cmd = ConsoleLine::try_parse_from(&tokens)
        .map_err(|e| e.to_string().trim_end().to_string())?
        .cmd;
    Ok(Some(with_typed_spacing(cmd, trimmed)))
}

const QUOTING: [char; 4] = ['"', '\'', '\\', '#'];

/// Re-reads free-text values from the typed line so inner spacing survives
/// the word split. Lines with any quoting keep the split words.
fn with_typed_spacing(mut cmd: ConsoleCommand, line: &str) -> ConsoleCommand {
    match &mut cmd {
        ConsoleCommand::Add { value, .. } => {
            if let Some(raw) = typed_remainder(line, 2) {
                *value = vec![raw];
            }
        }
        ConsoleCommand::Filter {
            action: FilterCommand::Add { value, .. },
        } => {
            if let Some(raw) = typed_remainder(line, 4) {
                *value = vec![raw];
            }
        }
        _ => {}
    }
    cmd
}

/// Everything after the first `skip` words of `line`, as typed.
fn typed_remainder(line: &str, skip: usize) -> Option<String> {
    if line.contains(QUOTING) {
        return None;
    }
    let mut rest = line.trim();
    for _ in 0..skip {
        let (_, tail) = rest.split_once(char::is_whitespace)?;
        rest = tail.trim_start();
    }
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Joins trailing words back into one value.
pub fn join_value(words: &[String]) -> String {
    words.join(" ")
}

pub fn render_console_help() -> String {
    let cmd = ConsoleLine::command();
    let mut out = String::from("Commands:\n");
    for sub in cmd.get_subcommands() {
        let mut usage = sub.get_name().to_string();
        for arg in sub.get_positionals() {
            let name = arg.get_id().as_str().to_uppercase();
            usage.push(' ');
            if arg.is_required_set() {
                usage.push_str(&format!("<{name}>"));
            } else {
                usage.push_str(&format!("[{name}]"));
            }
        }
        if sub.get_subcommands().next().is_some() {
            let names: Vec<&str> = sub.get_subcommands().map(|s| s.get_name()).collect();
            usage.push_str(&format!(" <{}>", names.join("|")));
        }
        out.push_str(&format!("  {usage:<36}"));
        if let Some(about) = sub.get_about() {
            out.push_str(&about.to_string());
        }
        out.push('\n');
    }
    out
}
