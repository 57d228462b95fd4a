use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "patentscope",
    version,
    about = "interactive patent search query builder",
    long_about = "patentscope collects patent IDs, examiners, law firms and prosecutors, asks the backend to build a search-engine query, executes it and renders the results and statistics.\n\nExamples:\n  patentscope\n  patentscope --api-url http://search.internal:8000 --limit 25\n  patentscope --script ./queries.txt --no-color\n\nType `help` at the prompt for the console commands."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v info, -vv debug)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.patentscope/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file (if absent) and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 's',
        long = "sc",
        visible_alias = "script",
        value_name = "FILE",
        help_heading = "Input",
        help = "Read console commands from a file instead of stdin."
    )]
    pub script: Option<String>,

    #[arg(
        short = 'a',
        long = "api",
        visible_alias = "api-url",
        value_name = "URL",
        help_heading = "Backend",
        help = "Backend base URL (default http://localhost:8000)."
    )]
    pub api_url: Option<String>,

    #[arg(
        short = 't',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Backend",
        help = "Request timeout in seconds (no timeout unless set)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'l',
        long = "lim",
        visible_alias = "limit",
        value_name = "N",
        help_heading = "Search",
        help = "Default result limit for searches (default 10)."
    )]
    pub limit: Option<u32>,

    #[arg(
        short = 'm',
        long = "md",
        visible_alias = "mode",
        value_name = "MODE",
        help_heading = "Search",
        help = "Default search mode: latest_filed, latest_approved, count, last_10_years, latest_10_approved."
    )]
    pub mode: Option<String>,

    #[arg(
        long = "sl",
        visible_alias = "stats-limit",
        value_name = "N",
        help_heading = "Search",
        help = "Default limit for statistics (default 10)."
    )]
    pub stats_limit: Option<u32>,

    #[arg(
        short = 'o',
        long = "dd",
        visible_alias = "download-dir",
        value_name = "DIR",
        help_heading = "Export",
        help = "Directory exports are written to (default: current directory)."
    )]
    pub download_dir: Option<String>,
}
