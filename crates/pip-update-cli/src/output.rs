use anstyle::{AnsiColor, Effects, Style};
use pip_update_core::config::ColorChoice;
use pip_update_core::types::OutcomeCategory;
use serde::Serialize;
use std::io::IsTerminal;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// How the terminal report is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Presentation {
    pub color: bool,
}

impl Presentation {
    pub fn resolve(forcecolor: bool, nocolor: bool, choice: ColorChoice) -> Self {
        let term = std::env::var("TERM").ok();
        Self::resolve_with(
            forcecolor,
            nocolor,
            choice,
            std::io::stdout().is_terminal(),
            term.as_deref(),
        )
    }

    /// `--forcecolor` beats `--nocolor`, which beats the config file; `auto`
    /// colors only a real terminal with a capable `TERM`.
    pub fn resolve_with(
        forcecolor: bool,
        nocolor: bool,
        choice: ColorChoice,
        stdout_is_terminal: bool,
        term: Option<&str>,
    ) -> Self {
        let color = if forcecolor {
            true
        } else if nocolor {
            false
        } else {
            match choice {
                ColorChoice::Always => true,
                ColorChoice::Never => false,
                ColorChoice::Auto => {
                    stdout_is_terminal && term.is_some_and(|t| !t.is_empty() && t != "dumb")
                }
            }
        };
        Self { color }
    }

    pub fn paint(&self, style: Style, text: &str) -> String {
        if self.color {
            colorize(style, text)
        } else {
            text.to_string()
        }
    }
}

pub fn category_style(category: OutcomeCategory) -> Style {
    match category {
        OutcomeCategory::Ok => Style::new().fg_color(Some(AnsiColor::Green.into())),
        OutcomeCategory::Warnings => Style::new().fg_color(Some(AnsiColor::Yellow.into())),
        OutcomeCategory::Weird => Style::new()
            .fg_color(Some(AnsiColor::Magenta.into()))
            .effects(Effects::BOLD),
        OutcomeCategory::Failed => Style::new()
            .fg_color(Some(AnsiColor::Red.into()))
            .effects(Effects::BOLD),
        OutcomeCategory::Skipped => Style::new().effects(Effects::DIMMED),
        OutcomeCategory::WouldUpgrade => Style::new().fg_color(Some(AnsiColor::Cyan.into())),
    }
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Lay out a table. Widths come from the plain cell text; `style(row, col)`
/// may wrap an already padded cell, so escape codes never shift columns.
pub fn format_table(
    headers: &[&str],
    rows: &[Vec<String>],
    presentation: Presentation,
    style: impl Fn(usize, usize) -> Option<Style>,
) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    lines.push(header_row.join("  ").trim_end().to_string());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    lines.push(sep.join("  "));

    for (r, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(c, cell)| {
                let w = widths.get(c).copied().unwrap_or(0);
                let padded = format!("{:width$}", cell, width = w);
                match style(r, c) {
                    Some(s) => presentation.paint(s, &padded),
                    None => padded,
                }
            })
            .collect();
        lines.push(cells.join("  ").trim_end().to_string());
    }
    lines
}
