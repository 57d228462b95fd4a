use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use itertools::Itertools;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::advanced::{self, AdvancedFilter, SortOption};
use crate::backend::{Backend, HttpBackend, HttpOptions};
use crate::cli::args::CliArgs;
use crate::cli::command::{self, ConsoleCommand, FilterCommand, StatsCommand};
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::context;
use crate::dispatch::{self, DispatchError, Origin, SearchMode, SearchOptions, SystemOpener, UrlOpener};
use crate::export;
use crate::output;
use crate::render;
use crate::session::Session;
use crate::stats::{self, StatsType};
use crate::tags::TagKind;

fn print_banner() {
    const BANNER: &str = r#"
                 __             __
    ____  ____ _/ /____  ____  / /_______________  ____  ___
   / __ \/ __ `/ __/ _ \/ __ \/ __/ ___/ ___/ __ \/ __ \/ _ \
  / /_/ / /_/ / /_/  __/ / / / /_(__  ) /__/ /_/ / /_/ /  __/
 / .___/\__,_/\__/\___/_/ /_/\__/____/\___/\____/ .___/\___/
/_/                                            /_/
"#;
    print!("{}", BANNER);
    println!("       v{} - patent search query console", env!("CARGO_PKG_VERSION"));
    println!();
}

#[derive(Clone, Debug)]
struct RunConfig {
    http: HttpOptions,
    script: Option<PathBuf>,
    settings: ConsoleSettings,
    no_color: bool,
    verbose: u8,
}

/// Defaults the console applies when a command leaves an option out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub default_limit: u32,
    pub default_mode: SearchMode,
    pub stats_limit: u32,
    pub download_dir: PathBuf,
    pub show_spinner: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            default_limit: dispatch::DEFAULT_LIMIT,
            default_mode: SearchMode::LatestFiled,
            stats_limit: stats::DEFAULT_STATS_LIMIT,
            download_dir: PathBuf::from("."),
            show_spinner: false,
        }
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let api_url = args
        .api_url
        .or(cfg.api_url)
        .unwrap_or_else(|| crate::backend::DEFAULT_API_URL.to_string());
    let timeout_seconds = args.timeout.or(cfg.timeout).filter(|s| *s > 0);

    let default_limit = args.limit.or(cfg.default_limit).unwrap_or(dispatch::DEFAULT_LIMIT);
    if default_limit == 0 {
        return Err("invalid default_limit, expected positive integer".to_string());
    }
    let stats_limit = args
        .stats_limit
        .or(cfg.stats_limit)
        .unwrap_or(stats::DEFAULT_STATS_LIMIT);
    if stats_limit == 0 {
        return Err("invalid stats_limit, expected positive integer".to_string());
    }

    let mode_raw = args.mode.or(cfg.default_search_mode);
    let default_mode = match mode_raw.as_deref() {
        Some(raw) => SearchMode::parse(raw).ok_or_else(|| format!("invalid search mode '{raw}'"))?,
        None => SearchMode::LatestFiled,
    };

    let download_dir = args
        .download_dir
        .or(cfg.download_dir)
        .map(|d| config::expand_tilde(&d))
        .unwrap_or_else(|| PathBuf::from("."));

    let script = args.script.map(|s| config::expand_tilde(&s));
    let show_spinner = script.is_none() && std::io::stderr().is_terminal();

    Ok(RunConfig {
        http: HttpOptions {
            api_url,
            timeout_seconds,
        },
        script,
        settings: ConsoleSettings {
            default_limit,
            default_mode,
            stats_limit,
            download_dir,
            show_spinner,
        },
        no_color,
        verbose: args.verbose,
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// What a single console line produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Step {
    pub output: String,
    pub quit: bool,
}

impl Step {
    fn text(output: String) -> Self {
        Self {
            output,
            quit: false,
        }
    }
}

/// Owns the session and routes console commands to the library workflows.
pub struct Console {
    session: Session,
    backend: Arc<dyn Backend>,
    opener: Box<dyn UrlOpener>,
    settings: ConsoleSettings,
}

impl Console {
    pub fn new(
        backend: Arc<dyn Backend>,
        opener: Box<dyn UrlOpener>,
        settings: ConsoleSettings,
        session: Session,
    ) -> Self {
        Self {
            session,
            backend,
            opener,
            settings,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn spinner(&self, message: &'static str) -> ProgressBar {
        if !self.settings.show_spinner {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Parses and runs one line. Errors are rendered into the output; the
    /// console keeps going.
    pub async fn handle_line(&mut self, line: &str) -> Step {
        let cmd = match command::parse_line(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Step::default(),
            Err(e) => return Step::text(output::error_line(&e)),
        };
        debug!(?cmd, "console command");
        if cmd == ConsoleCommand::Quit {
            return Step {
                output: String::new(),
                quit: true,
            };
        }
        match self.run(cmd).await {
            Ok(text) => Step::text(text),
            Err(e) if e.is_superseded() => Step::default(),
            Err(e) => {
                let message = self
                    .session
                    .error()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                Step::text(output::error_line(&message))
            }
        }
    }

    async fn run(&mut self, cmd: ConsoleCommand) -> Result<String, DispatchError> {
        let backend = Arc::clone(&self.backend);
        let backend = backend.as_ref();
        match cmd {
            ConsoleCommand::Add { list, value } => {
                let fragment = self.session.add_tag(list, &command::join_value(&value));
                Ok(output::tags(list.heading(), &fragment))
            }
            ConsoleCommand::Remove { list, index } => {
                let fragment = self.session.remove_tag(list, index);
                Ok(output::tags(list.heading(), &fragment))
            }
            ConsoleCommand::Tags => Ok(self.all_lists()),
            ConsoleCommand::Search { kind, mode, limit } => {
                let options = SearchOptions {
                    mode: mode.unwrap_or(self.settings.default_mode),
                    limit: limit.unwrap_or(self.settings.default_limit),
                };
                let pb = self.spinner("Building query");
                let res = dispatch::build_query(&mut self.session, backend, kind, options).await;
                pb.finish_and_clear();
                Ok(output::locator(&res?))
            }
            ConsoleCommand::Execute => {
                let pb = self.spinner("Executing query");
                let res = dispatch::execute_query(&mut self.session, backend).await;
                pb.finish_and_clear();
                res?;
                Ok(self.results_text())
            }
            ConsoleCommand::Open => {
                let url = dispatch::execute_query_manually(&mut self.session, self.opener.as_ref())?;
                Ok(output::info_line(&format!("Opened {url}")))
            }
            ConsoleCommand::Explore { target } => {
                let pb = self.spinner("Building follow-up query");
                let res = context::explore_context(&mut self.session, backend, target).await;
                pb.finish_and_clear();
                Ok(output::locator(&res?))
            }
            ConsoleCommand::Gau { codes, limit } => {
                let limit = limit.unwrap_or(render::QUICK_FILTER_LIMIT);
                let pb = self.spinner("Building GAU query");
                let res =
                    dispatch::search_gau(&mut self.session, backend, codes, limit, Origin::User)
                        .await;
                pb.finish_and_clear();
                Ok(output::locator(&res?))
            }
            ConsoleCommand::Filter { action } => self.filter(action),
            ConsoleCommand::Advanced { limit, sort } => {
                self.session.clear_error();
                let sort = match sort.as_deref().map(SortOption::parse).transpose() {
                    Ok(sort) => sort,
                    Err(e) => {
                        return Err(dispatch::surface(
                            &mut self.session,
                            DispatchError::Validation(e),
                        ))
                    }
                };
                let limit = limit.unwrap_or(self.settings.default_limit);
                let pb = self.spinner("Building advanced query");
                let res = advanced::build_advanced(&mut self.session, backend, limit, sort).await;
                pb.finish_and_clear();
                Ok(output::locator(&res?))
            }
            ConsoleCommand::Stats { kind } => self.stats(kind).await,
            ConsoleCommand::Download { format, out } => {
                let out = out.map(|o| config::expand_tilde(&o));
                let pb = self.spinner("Downloading");
                let res = export::download(
                    &mut self.session,
                    backend,
                    format,
                    out.as_deref(),
                    &self.settings.download_dir,
                )
                .await;
                pb.finish_and_clear();
                let path = res?;
                Ok(output::info_line(&format!("Saved {}", path.display())))
            }
            ConsoleCommand::Show => Ok(self.show()),
            ConsoleCommand::Help => Ok(command::render_console_help()),
            ConsoleCommand::Quit => Ok(String::new()),
        }
    }

    fn filter(&mut self, action: FilterCommand) -> Result<String, DispatchError> {
        match action {
            FilterCommand::Add {
                field,
                operator,
                value,
            } => {
                self.session.clear_error();
                let row = AdvancedFilter::new(field, operator, &command::join_value(&value))
                    .map_err(|e| dispatch::surface(&mut self.session, e))?;
                self.session.filters.add(row);
            }
            FilterCommand::Remove { index } => {
                self.session.clear_error();
                self.session.filters.remove(index);
            }
            FilterCommand::List => {}
        }
        Ok(output::tags("Filters", &self.session.filters.render()))
    }

    async fn stats(&mut self, kind: StatsCommand) -> Result<String, DispatchError> {
        let backend = Arc::clone(&self.backend);
        let backend = backend.as_ref();
        let range = self.session.date_range;
        let default_from = stats::format_date(range.from);
        let default_to = stats::format_date(range.to);
        match kind {
            StatsCommand::Total => {
                let pb = self.spinner("Loading totals");
                let res = stats::load_totals(&mut self.session, backend).await;
                pb.finish_and_clear();
                Ok(output::totals(&render::render_totals(&res?)))
            }
            StatsCommand::Examiners { from, to, limit } => {
                let from = from.unwrap_or(default_from);
                let to = to.unwrap_or(default_to);
                let limit = limit.unwrap_or(self.settings.stats_limit);
                let pb = self.spinner("Loading examiner statistics");
                let res =
                    stats::examiner_stats_by_date(&mut self.session, backend, &from, &to, limit)
                        .await;
                pb.finish_and_clear();
                Ok(output::stats(&render::render_examiner_stats(&res?)))
            }
            StatsCommand::Range {
                stats_type,
                from,
                to,
                limit,
                sort,
            } => {
                let from = from.unwrap_or(default_from);
                let to = to.unwrap_or(default_to);
                let limit = limit.unwrap_or(self.settings.stats_limit);
                let pb = self.spinner("Loading statistics");
                let res = stats::stats_by_date_range(
                    &mut self.session,
                    backend,
                    stats_type,
                    &from,
                    &to,
                    limit,
                    sort.unwrap_or_default(),
                )
                .await;
                pb.finish_and_clear();
                Ok(output::stats(&render::render_stats_results(&res?)))
            }
            StatsCommand::Dates { from, to } => {
                self.session.clear_error();
                let (from, to) = stats::validate_range(&from, &to)
                    .map_err(|e| dispatch::surface(&mut self.session, e))?;
                self.session.date_range = stats::DateRange { from, to };
                Ok(output::format_kv_line(
                    "Dates",
                    &format!("{} to {}", stats::format_date(from), stats::format_date(to)),
                ))
            }
            StatsCommand::Types => Ok(StatsType::ALL
                .iter()
                .map(|t| output::format_kv_line(t.key(), t.label()))
                .join("\n")),
        }
    }

    fn all_lists(&self) -> String {
        let fragments: Vec<_> = TagKind::ALL
            .into_iter()
            .map(|kind| (kind, self.session.tags.get(kind).render()))
            .collect();
        let mut out = output::tag_lists(&fragments);
        out.push('\n');
        out.push_str(&output::tags("Filters", &self.session.filters.render()));
        out
    }

    fn results_text(&self) -> String {
        let Some(results) = self.session.exportable_results() else {
            return String::new();
        };
        let view = render::render_results(
            results,
            self.session.last_kind(),
            self.session.context(),
        );
        let mut out = output::results(&view);
        let actions = output::context_actions(self.session.context());
        if !actions.is_empty() {
            out.push_str("\n\n");
            out.push_str(&actions);
        }
        out
    }

    fn show(&self) -> String {
        let mut parts = Vec::new();
        if let Some(locator) = self.session.locator() {
            parts.push(output::locator(locator));
        }
        let results = self.results_text();
        if !results.is_empty() {
            parts.push(results);
        } else {
            let actions = output::context_actions(self.session.context());
            if !actions.is_empty() {
                parts.push(actions);
            }
        }
        if parts.is_empty() {
            parts.push(output::info_line("Nothing to show yet"));
        }
        parts.join("\n\n")
    }
}

async fn run_lines<R>(console: &mut Console, reader: R, prompt: bool) -> Result<(), String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        if prompt {
            print!("patentscope> ");
            let _ = std::io::stdout().flush();
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read input: {e}")),
        };
        let step = console.handle_line(&line).await;
        if !step.output.is_empty() {
            println!("{}", step.output);
        }
        if step.quit {
            break;
        }
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let backend = HttpBackend::new(&run.http).map_err(|e| e.to_string())?;
    info!(api_url = backend.base_url(), "backend configured");

    let interactive = run.script.is_none() && std::io::stdin().is_terminal();
    if interactive {
        print_banner();
        println!("{}", output::format_kv_line("Backend", backend.base_url()));
        println!("{}", output::format_kv_line("Help", "type `help` for commands"));
        println!();
    }

    let session = Session::new(Local::now().date_naive());
    let mut console = Console::new(
        Arc::new(backend),
        Box::new(SystemOpener),
        run.settings,
        session,
    );

    match run.script.as_ref() {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| format!("failed to open script '{}': {e}", path.display()))?;
            run_lines(&mut console, BufReader::new(file), false).await
        }
        None => run_lines(&mut console, BufReader::new(tokio::io::stdin()), interactive).await,
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", CliArgs::command().render_long_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let default_path = config::default_config_path();

    if args.init_config {
        let path = user_config_path
            .or(default_path)
            .ok_or_else(|| "could not determine a config path; pass --config".to_string())?;
        let written = config::ensure_default_config_file(&path)?;
        let state = if written { "written" } else { "already exists" };
        println!("{}", output::format_kv_line("Config", &format!("{} ({state})", path.display())));
        return Ok(());
    }

    let cfg = match (user_config_path.as_ref(), default_path.as_ref()) {
        (Some(path), _) => config::load_config(path, false)?,
        (None, Some(path)) => config::load_config(path, true)?,
        (None, None) => ConfigFile::default(),
    };

    init_logging(args.verbose);
    let run = build_run_config(args, cfg)?;
    debug!(verbose = run.verbose, "starting console");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
