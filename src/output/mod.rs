//! Terminal text for everything the console shows. Each function returns the
//! styled text; the caller decides where to print it.

use colored::Colorize;
use itertools::Itertools;

use crate::context::PatentContext;
use crate::dispatch::QueryLocator;
use crate::render::stats::StatsCard;
use crate::render::{ResultsView, StatsView, TotalsView};
use crate::stats::ClassificationCount;
use crate::tags::{DisplayFragment, TagKind};

fn bracket(inner: String) -> String {
    format!("{}{}{}", "[".bold().white(), inner, "]".bold().white())
}

pub fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<10}: {}", label, value)
}

pub fn error_line(message: &str) -> String {
    format!("{} {}", bracket("ERR".bold().red().to_string()), message.red())
}

pub fn info_line(message: &str) -> String {
    format!("{} {}", bracket("*".bold().green().to_string()), message.bold().white())
}

pub fn tags(heading: &str, fragment: &DisplayFragment) -> String {
    let mut out = format!("{}", format!("{heading}:").bold().white());
    if fragment.is_empty() {
        out.push_str(&format!(" {}", "(none)".dimmed()));
        return out;
    }
    for chip in &fragment.chips {
        out.push_str(&format!(
            "\n\t {} {}",
            bracket(chip.index.to_string().bold().blue().to_string()),
            chip.label.bold().cyan()
        ));
    }
    out
}

pub fn tag_lists(fragments: &[(TagKind, DisplayFragment)]) -> String {
    fragments
        .iter()
        .map(|(kind, fragment)| tags(kind.heading(), fragment))
        .join("\n")
}

pub fn locator(locator: &QueryLocator) -> String {
    format!(
        "{} {}\n\t{}",
        bracket("OK".bold().green().to_string()),
        "Generated query:".bold().white(),
        locator.display().cyan()
    )
}

pub fn context_actions(context: Option<&PatentContext>) -> String {
    let Some(ctx) = context else {
        return String::new();
    };
    let actions = ctx.enabled_actions();
    if actions.is_empty() {
        return String::new();
    }
    let mut out = format!("{}", "Patent context:".bold().white());
    if let Some(examiner) = &ctx.examiner {
        out.push_str(&format!("\n\t examiner: {}", bracket(examiner.bold().purple().to_string())));
    }
    if let Some(firm) = &ctx.lawfirm {
        out.push_str(&format!("\n\t law firm: {}", bracket(firm.bold().purple().to_string())));
    }
    if !ctx.attorneys.is_empty() {
        out.push_str(&format!(
            "\n\t attorneys: {}",
            bracket(ctx.attorneys.join(", ").bold().purple().to_string())
        ));
    }
    if !ctx.gaus.is_empty() {
        out.push_str(&format!(
            "\n\t gaus: {}",
            bracket(ctx.gaus.join(", ").bold().purple().to_string())
        ));
    }
    let names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
    out.push_str(&format!(
        "\n\t {} {}",
        "follow up with:".dimmed(),
        format!("explore <{}>", names.join("|")).yellow()
    ));
    out
}

fn classification_line(label: &str, items: &[ClassificationCount]) -> String {
    let rendered = items
        .iter()
        .map(|c| match c.application_count {
            Some(n) => format!("{} ({n})", c.code),
            None => c.code.clone(),
        })
        .join(", ");
    format!("\n\t {} {}", format!("{label}:").bold().white(), rendered.blue())
}

pub fn results(view: &ResultsView) -> String {
    let mut out = format!(
        "{}\n{}",
        view.title.bold().green(),
        view.count_line.bold().white()
    );
    if let Some(message) = view.empty_message {
        out.push_str(&format!("\n{}", message.yellow()));
        return out;
    }
    if !view.quick_filters.is_empty() {
        out.push_str(&format!(
            "\n{} {}",
            "Unique Group Art Unit (GAU):".bold().white(),
            "(gau <code> to search)".dimmed()
        ));
        for f in &view.quick_filters {
            out.push_str(&format!(
                "\n\t GAU {} {}",
                f.code.bold().blue(),
                format!("({})", f.count).yellow()
            ));
        }
    }
    for card in &view.cards {
        out.push_str(&format!(
            "\n\n{}",
            bracket(format!("Result #{}", card.number).bold().cyan().to_string())
        ));
        for field in &card.fields {
            out.push_str(&format!(
                "\n\t {} {}",
                format!("{}:", field.label).bold().white(),
                field.value
            ));
        }
    }
    out
}

fn stats_card(card: &StatsCard) -> String {
    let mut out = format!(
        "\n\n{} {}",
        bracket(format!("#{}", card.rank).bold().cyan().to_string()),
        card.name.bold().purple()
    );
    if let Some(n) = card.application_count {
        out.push_str(&format!("\n\t {} {n}", "Total Applications:".bold().white()));
    }
    if let Some(n) = card.unique_gau_count {
        out.push_str(&format!("\n\t {} {n}", "Unique GAUs:".bold().white()));
    }
    if !card.gaus.is_empty() {
        out.push_str(&classification_line("GAUs", &card.gaus));
    }
    if let Some(n) = card.unique_cpc_count {
        out.push_str(&format!("\n\t {} {n}", "Unique CPCs:".bold().white()));
    }
    if !card.cpcs.is_empty() {
        out.push_str(&classification_line("CPC Classifications", &card.cpcs));
    }
    out
}

pub fn stats(view: &StatsView) -> String {
    let mut out = format!(
        "{}\n{}",
        view.title.bold().green(),
        view.count_line.bold().white()
    );
    for card in &view.cards {
        out.push_str(&stats_card(card));
    }
    out
}

pub fn totals(view: &TotalsView) -> String {
    view.figures
        .iter()
        .map(|(label, value)| format_kv_line(label, &value.bold().to_string()))
        .join("\n")
}
