use crate::cli::args::CliArgs;
use crate::dispatch::SearchMode;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(limit) = args.limit {
        if limit == 0 {
            return Err("invalid limit, expected positive integer".to_string());
        }
    }
    if let Some(limit) = args.stats_limit {
        if limit == 0 {
            return Err("invalid stats-limit, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.mode.as_deref() {
        SearchMode::parse(raw).ok_or_else(|| format!("invalid --mode '{raw}'"))?;
    }
    if let Some(raw) = args.api_url.as_deref() {
        reqwest::Url::parse(raw.trim()).map_err(|e| format!("invalid --api-url '{raw}': {e}"))?;
    }
    Ok(())
}
