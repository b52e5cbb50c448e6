//! Invoice date parsing.
//!
//! Invoices in this layout family print day-first dates, so `12/03/2024`
//! is the 12th of March.

use chrono::NaiveDate;

use super::patterns::{DATE_DAY_MONTH_NAME, DATE_DMY, DATE_MONTH_NAME_DAY, DATE_YMD};

/// Parse the first calendar date found in `text`.
///
/// Tries ISO-like year-first dates, then day-first numeric dates, then
/// dates with an English month name.
pub fn parse_invoice_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_YMD.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DMY.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = parse_year(&caps[3]);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_DAY_MONTH_NAME.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        if let Some(date) = month_from_name(&caps[2])
            .and_then(|month| NaiveDate::from_ymd_opt(year, month, day))
        {
            return Some(date);
        }
    }

    if let Some(caps) = DATE_MONTH_NAME_DAY.captures(text) {
        let day: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return month_from_name(&caps[1]).and_then(|month| NaiveDate::from_ymd_opt(year, month, day));
    }

    None
}

/// Format a date as the `YYYY MM` month key.
pub fn format_month_key(date: NaiveDate) -> String {
    date.format("%Y %m").to_string()
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june",
        "july", "august", "september", "october", "november", "december",
    ];

    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| *m == name || (name.len() == 3 && m.starts_with(&name)) || (name == "sept" && *m == "september"))
        .map(|i| i as u32 + 1)
}
