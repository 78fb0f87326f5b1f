//! Display formatting shared by every page: pesos, dates and status badges.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// es-CO puts a no-break space between the sign and the amount.
const NBSP: char = '\u{a0}';

/// Formats a value as Colombian pesos without decimals, e.g. `$ 1.234.567`.
pub fn format_currency(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let digits = format!("{:.0}", value.round().abs());
    let grouped = group_thousands(&digits);
    // sign of the unrounded value: -0.4 reads "-$ 0"
    if value < 0.0 {
        format!("-${NBSP}{grouped}")
    } else {
        format!("${NBSP}{grouped}")
    }
}

/// Same as [`format_currency`] for raw form input. Garbage counts as zero.
pub fn format_currency_str(raw: &str) -> String {
    format_currency(parse_amount(raw))
}

/// Lenient number parsing: takes the leading numeric part, else 0.
pub fn parse_amount(raw: &str) -> f64 {
    static LEADING_NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = LEADING_NUMBER.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("static regex")
    });
    re.find(raw.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Renders a date or timestamp as `DD/MM/YYYY`.
///
/// Plain `YYYY-MM-DD` strings are split by hand so no timezone can shift
/// them. Timestamps with an offset are shown in UTC; naive timestamps are
/// shown as written.
pub fn format_date(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return "N/A".to_string();
    }

    if input.len() == 10 && input.contains('-') {
        let parts: Vec<&str> = input.split('-').collect();
        if let [year, month, day] = parts.as_slice() {
            return format!("{day}/{month}/{year}");
        }
    }

    match parse_timestamp(input) {
        Some(dt) => dt.format("%d/%m/%Y").to_string(),
        None => "Fecha Inválida".to_string(),
    }
}

/// `HH:MM` part of a timestamp, or empty when it has none.
pub fn format_time(input: &str) -> String {
    parse_timestamp(input.trim())
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Parses the timestamp shapes the backend emits into a naive UTC value.
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Colour family of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Danger,
    Primary,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabel {
    pub label: String,
    pub tone: Tone,
}

/// Label and colour for an order/receivable status.
pub fn format_status(status: &str) -> StatusLabel {
    let s = status.trim().to_lowercase();
    let (label, tone) = match s.as_str() {
        "pagado" => ("PAGADO", Tone::Success),
        "pendiente" => ("PENDIENTE", Tone::Danger),
        "parcial" => ("PARCIAL", Tone::Primary),
        "cancelado" => ("CANCELADO", Tone::Danger),
        "credito" => ("CRÉDITO", Tone::Danger),
        _ => {
            return StatusLabel {
                label: s.to_uppercase(),
                tone: Tone::Muted,
            };
        }
    };
    StatusLabel {
        label: label.to_string(),
        tone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_matches_es_co() {
        assert_eq!(format_currency(0.0), "$\u{a0}0");
        assert_eq!(format_currency(999.0), "$\u{a0}999");
        assert_eq!(format_currency(1000.0), "$\u{a0}1.000");
        assert_eq!(format_currency(1234567.0), "$\u{a0}1.234.567");
        assert_eq!(format_currency(2500.5), "$\u{a0}2.501");
        assert_eq!(format_currency(-45000.0), "-$\u{a0}45.000");
        assert_eq!(format_currency(-0.4), "-$\u{a0}0");
        assert_eq!(format_currency(-0.0), "$\u{a0}0");
        assert_eq!(format_currency(f64::NAN), "$\u{a0}0");
    }

    #[test]
    fn currency_from_raw_input() {
        assert_eq!(format_currency_str("15000"), "$\u{a0}15.000");
        assert_eq!(format_currency_str(" 12.5abc"), "$\u{a0}13");
        assert_eq!(format_currency_str("abc"), "$\u{a0}0");
        assert_eq!(format_currency_str(""), "$\u{a0}0");
        assert_eq!(parse_amount("-3e2"), -300.0);
    }

    #[test]
    fn dates() {
        assert_eq!(format_date(""), "N/A");
        assert_eq!(format_date("2025-01-09"), "09/01/2025");
        assert_eq!(format_date("2025-01-09T23:30:00"), "09/01/2025");
        assert_eq!(format_date("2025-01-09T23:30:00-05:00"), "10/01/2025");
        assert_eq!(format_date("2025-01-09 08:00:00.123"), "09/01/2025");
        assert_eq!(format_date("ayer"), "Fecha Inválida");
        assert_eq!(format_time("2025-01-09T08:05:59"), "08:05");
        assert_eq!(format_time("2025-01-09"), "00:00");
        assert_eq!(format_time("nope"), "");
    }

    #[test]
    fn statuses() {
        assert_eq!(format_status("Pagado").label, "PAGADO");
        assert_eq!(format_status("pagado").tone, Tone::Success);
        assert_eq!(format_status("credito").label, "CRÉDITO");
        assert_eq!(format_status("parcial").tone, Tone::Primary);
        let other = format_status("en_ruta");
        assert_eq!(other.label, "EN_RUTA");
        assert_eq!(other.tone, Tone::Muted);
        assert_eq!(format_status("").label, "");
    }
}
