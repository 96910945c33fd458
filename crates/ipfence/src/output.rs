//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one rule per line.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use ipfence_core::ReconciliationPlan;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, plain uses `plain_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn notice(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.expect("serialization should not fail")
}

// ── Plans ────────────────────────────────────────────────────────────

/// Terraform-style diff of a plan: `-` removals, `+` additions, and the
/// retained rules unmarked.
pub fn render_plan(plan: &ReconciliationPlan, color: bool) -> String {
    let mut out = String::new();

    if plan.public_account {
        let _ = writeln!(
            out,
            "Account has no IP rules and is publicly reachable; nothing will be restricted."
        );
        return out.trim_end().to_owned();
    }
    if plan.noop {
        let _ = writeln!(out, "No changes. IP rules are up to date.");
    }

    for rule in &plan.to_remove {
        let line = format!("- {rule}");
        let _ = writeln!(out, "{}", paint(&line, color, |s| s.red().to_string()));
    }
    for rule in plan.final_set.iter().filter(|r| !plan.to_add.contains(*r)) {
        let _ = writeln!(out, "  {rule}");
    }
    for rule in &plan.to_add {
        let line = format!("+ {rule}");
        let _ = writeln!(out, "{}", paint(&line, color, |s| s.green().to_string()));
    }

    if !plan.noop {
        let summary = format!(
            "Plan: {} to add, {} to remove.",
            plan.to_add.len(),
            plan.to_remove.len()
        );
        let _ = write!(out, "\n{}", paint(&summary, color, |s| s.bold().to_string()));
    }
    out.trim_end().to_owned()
}

fn paint(text: &str, color: bool, style: impl Fn(&str) -> String) -> String {
    if color { style(text) } else { text.to_owned() }
}

// ── Progress ─────────────────────────────────────────────────────────

/// Spinner on stderr while waiting on Azure. Hidden for quiet runs,
/// structured output, and non-interactive stderr.
pub fn spinner(global: &GlobalOpts, message: &str) -> ProgressBar {
    let visible = !global.quiet
        && global.output == OutputFormat::Table
        && io::stderr().is_terminal();
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
