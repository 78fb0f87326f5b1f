//! Terminal widgets shared by the pages: headers, cards, tables, alerts,
//! confirmations and pick-lists.

use anyhow::Result;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use inquire::{Confirm, Select};
use std::fmt::Display;

use crate::format::{Tone, format_currency, format_status};

const GREEN: Color = Color::Rgb { r: 4, g: 120, b: 87 };
const RED: Color = Color::Rgb { r: 185, g: 28, b: 28 };
const BLUE: Color = Color::Rgb { r: 37, g: 99, b: 235 };
const GREY: Color = Color::Rgb { r: 115, g: 115, b: 115 };

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Success => GREEN,
        Tone::Danger => RED,
        Tone::Primary => BLUE,
        Tone::Muted => GREY,
    }
}

pub fn page_header(title: &str) {
    println!("\n--- {title} ---");
}

/// Label/value pair shown as a one-line card.
pub fn card(label: &str, value: &str) {
    println!("  {label}: {value}");
}

pub fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_header(headers.iter().map(|h| Cell::new(h).add_attribute(Attribute::Bold)));
    table
}

pub fn money_cell(value: f64) -> Cell {
    Cell::new(format_currency(value)).set_alignment(CellAlignment::Right)
}

/// Money cell coloured green when >= 0 and red otherwise.
pub fn signed_money_cell(value: f64) -> Cell {
    let color = if value >= 0.0 { GREEN } else { RED };
    money_cell(value).fg(color)
}

pub fn debt_cell(value: f64) -> Cell {
    let cell = money_cell(value).add_attribute(Attribute::Bold);
    if value > 0.0 { cell.fg(RED) } else { cell }
}

pub fn status_cell(status: &str) -> Cell {
    let s = format_status(status);
    Cell::new(s.label).fg(tone_color(s.tone))
}

pub fn bold(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).add_attribute(Attribute::Bold)
}

pub fn opt(value: &Option<String>) -> String {
    value.clone().filter(|v| !v.trim().is_empty()).unwrap_or_else(|| "-".to_string())
}

pub fn success(msg: &str) {
    println!("✅ {msg}");
}

/// Blocking error line, the terminal version of `alert()`.
pub fn alert(msg: &str) {
    println!("❌ {msg}");
}

pub fn empty(msg: &str) {
    println!("({msg})");
}

pub fn confirm(question: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new(question).with_default(default).prompt()?)
}

/// Choice wrapper that prints a label but hands back the id.
#[derive(Clone)]
pub struct Choice<T: Clone> {
    pub label: String,
    pub value: T,
}

impl<T: Clone> Display for Choice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

impl<T: Clone> Choice<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Pick one of `choices`, starting on the one equal to `current` if any.
pub fn pick<T: Clone + PartialEq>(prompt: &str, choices: Vec<Choice<T>>, current: Option<&T>) -> Result<T> {
    if choices.is_empty() {
        anyhow::bail!("No hay opciones disponibles para '{prompt}'");
    }
    let cursor = current
        .and_then(|c| choices.iter().position(|ch| &ch.value == c))
        .unwrap_or(0);
    let picked = Select::new(prompt, choices)
        .with_starting_cursor(cursor)
        .with_page_size(12)
        .prompt()?;
    Ok(picked.value)
}

/// Same as [`pick`] with a leading "none" entry.
pub fn pick_optional<T: Clone + PartialEq>(
    prompt: &str,
    none_label: &str,
    choices: Vec<Choice<T>>,
    current: Option<&T>,
) -> Result<Option<T>> {
    let mut all = vec![Choice::new(none_label, None)];
    all.extend(choices.into_iter().map(|c| Choice::new(c.label, Some(c.value))));
    let current = current.cloned().map(Some);
    pick(prompt, all, current.as_ref())
}

/// Fixed option lists (select boxes) as `(value, label)` pairs.
pub fn pick_static(prompt: &str, options: &[(&str, &str)], current: &str) -> Result<String> {
    let choices = options
        .iter()
        .map(|(value, label)| Choice::new(*label, value.to_string()))
        .collect();
    pick(prompt, choices, Some(&current.to_string()))
}
