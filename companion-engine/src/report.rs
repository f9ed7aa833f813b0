//! Expense-inquiry support: named reporting periods, the period-phrase
//! parser, and won formatting for summaries.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::slots::money::has_spending_verb;

/// Named reporting period for an expense inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "period", content = "month")]
pub enum Period {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    /// An explicit month number, already resolved to a year by the rollover
    /// rule (a month ahead of the current one means last year).
    Month { year: i32, month: u32 },
    /// Default when a report is asked for without a period phrase.
    Recent30Days,
}

const REPORT_KEYWORDS: &[&str] = &["얼마", "내역", "소비", "지출", "리포트", "가계부"];

static EXPLICIT_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*월").expect("valid regex"));

/// Classify an utterance as an expense inquiry.
///
/// Needs a report keyword together with a period phrase; "얼마 + spending
/// verb" alone is accepted with the rolling 30-day default.
pub fn parse_report_query(text: &str, today: NaiveDate) -> Option<Period> {
    let has_keyword = REPORT_KEYWORDS.iter().any(|k| text.contains(k));
    if !has_keyword {
        return None;
    }
    if let Some(period) = parse_period(text, today) {
        return Some(period);
    }
    if text.contains("얼마") && has_spending_verb(text) {
        return Some(Period::Recent30Days);
    }
    None
}

/// First matching period phrase, relative words before the explicit month.
pub fn parse_period(text: &str, today: NaiveDate) -> Option<Period> {
    if text.contains("오늘") {
        return Some(Period::Today);
    }
    if text.contains("어제") {
        return Some(Period::Yesterday);
    }
    if text.contains("이번 주") || text.contains("이번주") {
        return Some(Period::ThisWeek);
    }
    if text.contains("지난주") || text.contains("지난 주") || text.contains("저번주") {
        return Some(Period::LastWeek);
    }
    if text.contains("이번 달") || text.contains("이번달") {
        return Some(Period::ThisMonth);
    }
    if text.contains("지난달") || text.contains("지난 달") || text.contains("저번달") {
        return Some(Period::LastMonth);
    }
    if let Some(caps) = EXPLICIT_MONTH_RE.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        let year = if month > today.month() {
            today.year() - 1
        } else {
            today.year()
        };
        return Some(Period::Month { year, month });
    }
    None
}

impl Period {
    /// Inclusive date range covered by the period.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Period::Today => (today, today),
            Period::Yesterday => {
                let d = today.checked_sub_days(Days::new(1)).unwrap_or(today);
                (d, d)
            }
            Period::ThisWeek => {
                let start = start_of_week(today);
                (start, today)
            }
            Period::LastWeek => {
                let this_start = start_of_week(today);
                let start = this_start.checked_sub_days(Days::new(7)).unwrap_or(this_start);
                let end = this_start.checked_sub_days(Days::new(1)).unwrap_or(this_start);
                (start, end)
            }
            Period::ThisMonth => month_range(today.year(), today.month()),
            Period::LastMonth => {
                let (year, month) = if today.month() == 1 {
                    (today.year() - 1, 12)
                } else {
                    (today.year(), today.month() - 1)
                };
                month_range(year, month)
            }
            Period::Month { year, month } => month_range(*year, *month),
            Period::Recent30Days => {
                let start = today.checked_sub_days(Days::new(29)).unwrap_or(today);
                (start, today)
            }
        }
    }

    /// Short Korean label used in report summaries.
    pub fn display(&self) -> String {
        match self {
            Period::Today => "오늘".to_string(),
            Period::Yesterday => "어제".to_string(),
            Period::ThisWeek => "이번 주".to_string(),
            Period::LastWeek => "지난주".to_string(),
            Period::ThisMonth => "이번 달".to_string(),
            Period::LastMonth => "지난달".to_string(),
            Period::Month { month, .. } => format!("{month}월"),
            Period::Recent30Days => "최근 30일".to_string(),
        }
    }
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as u64;
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

fn month_range(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 1, 1).expect("valid date"));
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(start);
    (start, end)
}

/// Thousands-separated amount, e.g. `1234500` → `"1,234,500"`.
pub fn format_won(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Spoken-friendly decomposition into 억/만/천 groups,
/// e.g. `123456789` → `"1억 2345만 6789원"`, `12500` → `"1만 2500원"`.
pub fn format_spoken_won(amount: i64) -> String {
    if amount <= 0 {
        return "0원".to_string();
    }
    let eok = amount / 100_000_000;
    let man = (amount % 100_000_000) / 10_000;
    let rest = amount % 10_000;

    let mut parts = Vec::new();
    if eok > 0 {
        parts.push(format!("{eok}억"));
    }
    if man > 0 {
        parts.push(format!("{man}만"));
    }
    if rest > 0 {
        if rest % 1_000 == 0 {
            parts.push(format!("{}천", rest / 1_000));
        } else {
            parts.push(rest.to_string());
        }
    }
    format!("{}원", parts.join(" "))
}
