//! Booking-flow slots: the three fixed service time windows and the
//! relative-only booking date parser.
//!
//! Booking dates deliberately support fewer phrases than expense dates
//! (내일/모레/"N일 후" only); absolute month-day input re-prompts instead.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A matched service time window (all windows start at 9am).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub time_option: u8,
    pub time_display: &'static str,
    pub hours: u8,
}

struct TimeWindowSpec {
    id: u8,
    keywords: &'static [&'static str],
    display: &'static str,
    hours: u8,
}

const TIME_WINDOWS: &[TimeWindowSpec] = &[
    TimeWindowSpec {
        id: 1,
        keywords: &["12시", "점심", "오전", "3시간", "12시까지"],
        display: "오전 9시부터 오후 12시",
        hours: 3,
    },
    TimeWindowSpec {
        id: 2,
        keywords: &["3시까지", "15시", "6시간", "오후 3시", "3시"],
        display: "오전 9시부터 오후 3시",
        hours: 6,
    },
    TimeWindowSpec {
        id: 3,
        keywords: &["6시까지", "18시", "9시간", "저녁", "오후 6시", "6시"],
        display: "오전 9시부터 오후 6시",
        hours: 9,
    },
];

/// Keyword-containment match over the three windows, first window wins.
pub fn extract_time_window(text: &str) -> Option<TimeWindow> {
    TIME_WINDOWS
        .iter()
        .find(|spec| spec.keywords.iter().any(|k| text.contains(k)))
        .map(|spec| TimeWindow {
            time_option: spec.id,
            time_display: spec.display,
            hours: spec.hours,
        })
}

/// A resolved booking date (single-day bookings: start == end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDate {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub display_text: String,
}

static DAYS_LATER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*일?\s*후").expect("valid regex"));

/// Relative booking dates only: 내일, 모레, "N일 후".
pub fn extract_booking_date(text: &str, today: NaiveDate) -> Option<BookingDate> {
    if text.contains("내일") {
        return single_day(today.checked_add_days(Days::new(1))?, "내일");
    }
    if text.contains("모레") {
        return single_day(today.checked_add_days(Days::new(2))?, "모레");
    }
    if let Some(caps) = DAYS_LATER_RE.captures(text) {
        let days: u64 = caps[1].parse().ok()?;
        let date = today.checked_add_days(Days::new(days))?;
        return single_day(date, &format!("{days}일 후"));
    }
    None
}

fn single_day(date: NaiveDate, display: &str) -> Option<BookingDate> {
    Some(BookingDate {
        start_date: date,
        end_date: date,
        display_text: display.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_matching_is_ordered() {
        assert_eq!(extract_time_window("내일 3시까지").map(|w| w.time_option), Some(2));
        assert_eq!(extract_time_window("12시까지 부탁해").map(|w| w.time_option), Some(1));
        assert_eq!(extract_time_window("저녁까지요").map(|w| w.time_option), Some(3));
        assert_eq!(extract_time_window("아무때나요"), None);
    }

    #[test]
    fn window_carries_hours_and_display() {
        let window = extract_time_window("6시간 정도요").unwrap();
        assert_eq!(window.hours, 6);
        assert_eq!(window.time_display, "오전 9시부터 오후 3시");
    }

    #[test]
    fn relative_booking_dates() {
        let today = day(2025, 5, 1);
        let tomorrow = extract_booking_date("내일 부탁해요", today).unwrap();
        assert_eq!(tomorrow.start_date, day(2025, 5, 2));
        assert_eq!(tomorrow.end_date, day(2025, 5, 2));
        assert_eq!(tomorrow.display_text, "내일");

        let later = extract_booking_date("3일 후에 와주세요", today).unwrap();
        assert_eq!(later.start_date, day(2025, 5, 4));
        assert_eq!(later.display_text, "3일 후");
    }

    #[test]
    fn absolute_dates_are_not_understood_here() {
        let today = day(2025, 5, 1);
        assert_eq!(extract_booking_date("5월 10일에요", today), None);
    }
}
