//! Stateless slot extraction: pure functions that pull structured values
//! (dates, amounts, categories, merchants, time windows, addresses) out of a
//! raw utterance. Everything here is deterministic and side-effect free.

pub mod address;
pub mod category;
pub mod date;
pub mod money;
pub mod schedule;

pub use address::extract_address;
pub use category::{infer_category, infer_merchant};
pub use date::{extract_expense_date, friendly_date};
pub use money::{extract_amount, has_spending_verb};
pub use schedule::{BookingDate, TimeWindow, extract_booking_date, extract_time_window};

use chrono::NaiveDate;

use crate::expense::ExpenseCandidate;

/// Canonical form used by all keyword matching: lowercased (for latin text),
/// whitespace collapsed, trimmed.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assemble a full expense candidate from one utterance.
///
/// Requires a positive amount and a spending verb; everything else is
/// inferred. The date is optional — when unresolved, the candidate asks the
/// flow for one follow-up confirmation turn.
pub fn parse_expense_candidate(text: &str, today: NaiveDate) -> Option<ExpenseCandidate> {
    let normalized = normalize(text);
    let amount = extract_amount(&normalized)?;
    if !has_spending_verb(&normalized) {
        return None;
    }

    let category = infer_category(&normalized);
    let merchant_name = infer_merchant(&normalized, category);
    let transaction_date = extract_expense_date(&normalized, today);

    Some(ExpenseCandidate {
        amount,
        category: category.to_string(),
        merchant_name,
        needs_date_confirmation: transaction_date.is_none(),
        transaction_date,
        original_text: text.trim().to_string(),
    })
}
