//! Day / month / year selection with day-of-month clamping.

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use inquire::Select;

pub const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];
pub const YEARS: std::ops::RangeInclusive<i32> = 2024..=2030;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Today's date as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    today().format("%Y-%m-%d").to_string()
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month >= 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// Date held as three independent parts. The day is always clamped to the
/// length of the current month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripleDate {
    year: i32,
    month: u32,
    day: u32,
}

impl TripleDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        let month = month.clamp(1, 12);
        let day = day.clamp(1, days_in_month(year, month));
        Self { year, month, day }
    }

    /// Parses `YYYY-MM-DD`; anything else starts from today.
    pub fn parse_or_today(value: &str) -> Self {
        let parts: Vec<&str> = value.trim().split('-').collect();
        if let [y, m, d] = parts.as_slice() {
            if let (Ok(y), Ok(m), Ok(d)) = (y.parse::<i32>(), m.parse::<u32>(), d.parse::<u32>()) {
                if (1..=12).contains(&m) && d >= 1 {
                    return Self::new(y, m, d);
                }
            }
        }
        let t = today();
        Self::new(t.year(), t.month(), t.day())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn set_year(&mut self, year: i32) {
        *self = Self::new(year, self.month, self.day);
    }

    pub fn set_month(&mut self, month: u32) {
        *self = Self::new(self.year, month, self.day);
    }

    pub fn set_day(&mut self, day: u32) {
        *self = Self::new(self.year, self.month, day);
    }
}

impl std::fmt::Display for TripleDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// First and last day of a `YYYY-MM` month, both as `YYYY-MM-DD`.
pub fn month_bounds(month: &str) -> Option<(String, String)> {
    let (y, m) = month.trim().split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let last = days_in_month(year, month);
    Some((
        format!("{year:04}-{month:02}-01"),
        format!("{year:04}-{month:02}-{last:02}"),
    ))
}

pub fn current_month() -> String {
    today().format("%Y-%m").to_string()
}

/// Asks year, then month, then day. The day list only offers days that
/// exist in the chosen month.
pub fn prompt_triple_date(label: &str, initial: &str) -> Result<TripleDate> {
    let mut date = TripleDate::parse_or_today(initial);
    println!("{label}");

    let years: Vec<i32> = YEARS.collect();
    let year_cursor = years.iter().position(|y| *y == date.year()).unwrap_or(0);
    let year = Select::new("  Año:", years).with_starting_cursor(year_cursor).prompt()?;
    date.set_year(year);

    let months: Vec<String> = MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(i, l)| format!("{:02} {}", i + 1, l))
        .collect();
    let month_choice = Select::new("  Mes:", months.clone())
        .with_starting_cursor(date.month() as usize - 1)
        .prompt()?;
    let month = months.iter().position(|m| *m == month_choice).unwrap_or(0) as u32 + 1;
    date.set_month(month);

    let days: Vec<String> = (1..=date.days_in_month()).map(|d| format!("{d:02}")).collect();
    let day = Select::new("  Día:", days)
        .with_starting_cursor(date.day() as usize - 1)
        .prompt()?;
    date.set_day(day.parse().unwrap_or(1));

    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn invalid_day_is_clamped() {
        let d = TripleDate::parse_or_today("2025-02-31");
        assert_eq!(d.to_string(), "2025-02-28");

        let mut d = TripleDate::parse_or_today("2025-01-31");
        d.set_month(4);
        assert_eq!(d.to_string(), "2025-04-30");

        let mut leap = TripleDate::parse_or_today("2024-02-29");
        leap.set_year(2025);
        assert_eq!(leap.to_string(), "2025-02-28");

        let mut d = TripleDate::new(2025, 6, 10);
        d.set_day(40);
        assert_eq!(d.day(), 30);
    }

    #[test]
    fn malformed_value_starts_today() {
        let t = today();
        for bad in ["", "2025-13-01", "hoy", "2025-02"] {
            let d = TripleDate::parse_or_today(bad);
            assert_eq!(d.to_string(), t.format("%Y-%m-%d").to_string(), "input {bad:?}");
        }
    }

    #[test]
    fn bounds_of_month() {
        assert_eq!(
            month_bounds("2024-02"),
            Some(("2024-02-01".to_string(), "2024-02-29".to_string()))
        );
        assert_eq!(
            month_bounds("2025-11"),
            Some(("2025-11-01".to_string(), "2025-11-30".to_string()))
        );
        assert_eq!(month_bounds("2025-13"), None);
        assert_eq!(month_bounds("noviembre"), None);
    }
}
