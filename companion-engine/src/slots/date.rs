//! Calendar-date extraction for expense utterances.
//!
//! Precedence is fixed: relative words first, then "N일 전", then an absolute
//! "[M월] D일". A stated month greater than the current month is taken to mean
//! the previous year, so "12월 30일" spoken in January lands on last December.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

static DAYS_AGO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*일\s*전").expect("valid regex"));
static MONTH_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*월\s*(\d{1,2})\s*일").expect("valid regex"));
static DAY_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*일").expect("valid regex"));

/// Resolve a transaction date mentioned in free text, or `None` when the
/// utterance carries no recognizable date phrase.
pub fn extract_expense_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.contains("오늘") {
        return Some(today);
    }
    if text.contains("어제") {
        return today.checked_sub_days(Days::new(1));
    }
    if text.contains("그저께") || text.contains("그제") {
        return today.checked_sub_days(Days::new(2));
    }
    if let Some(caps) = DAYS_AGO_RE.captures(text) {
        let days: u64 = caps[1].parse().ok()?;
        return today.checked_sub_days(Days::new(days));
    }
    if let Some(caps) = MONTH_DAY_RE.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        return resolve_month_day(month, day, today);
    }
    if let Some(caps) = DAY_ONLY_RE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        return NaiveDate::from_ymd_opt(today.year(), today.month(), day);
    }
    None
}

/// Month/day with the year-end rollover rule: a month numerically ahead of the
/// current one belongs to the previous year.
fn resolve_month_day(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let year = if month > today.month() {
        today.year() - 1
    } else {
        today.year()
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// User-facing rendering of a resolved date: 오늘, 어제, or "M월 D일".
pub fn friendly_date(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "오늘".to_string()
    } else if Some(date) == today.checked_sub_days(Days::new(1)) {
        "어제".to_string()
    } else {
        format!("{}월 {}일", date.month(), date.day())
    }
}
