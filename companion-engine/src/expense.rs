//! Expense-logging dialogue flow: Idle → AwaitingDate → Idle, with at most
//! one follow-up turn to pin down a missing transaction date.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::{ExpenseLedger, NewExpense};
use crate::response::{EngineResponse, ResponseGenerator};
use crate::session::SessionState;
use crate::slots;

/// A spending event extracted from one utterance, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCandidate {
    /// Whole won, always positive.
    pub amount: i64,
    pub category: String,
    pub merchant_name: String,
    pub transaction_date: Option<NaiveDate>,
    /// True iff the utterance carried no resolvable date.
    pub needs_date_confirmation: bool,
    pub original_text: String,
}

/// Drives an [`ExpenseCandidate`] to a finalized, date-complete record.
pub struct ExpenseFlow {
    ledger: Arc<dyn ExpenseLedger>,
}

impl ExpenseFlow {
    pub fn new(ledger: Arc<dyn ExpenseLedger>) -> Self {
        Self { ledger }
    }

    /// Entry for a fresh candidate. Complete candidates finalize immediately;
    /// date-less ones are parked on the session for one confirmation turn.
    pub async fn handle_candidate(
        &self,
        generator: &ResponseGenerator,
        state: &mut SessionState,
        candidate: ExpenseCandidate,
        user_id: i64,
        today: NaiveDate,
    ) -> EngineResponse {
        match candidate.transaction_date {
            Some(date) => self.finalize(generator, candidate, date, user_id, today).await,
            None => {
                info!(amount = candidate.amount, "expense date missing, asking for confirmation");
                let prompt = generator.expense_date_request(&candidate);
                state.hold_expense_for_date(candidate);
                prompt
            }
        }
    }

    /// Follow-up turn while a date confirmation is outstanding. Only date
    /// extraction runs here; the rest of the candidate is already fixed.
    pub async fn handle_date_reply(
        &self,
        generator: &ResponseGenerator,
        state: &mut SessionState,
        text: &str,
        user_id: i64,
        today: NaiveDate,
    ) -> EngineResponse {
        let normalized = slots::normalize(text);
        let Some(date) = slots::extract_expense_date(&normalized, today) else {
            // Unresolved again: keep the candidate parked, re-prompt.
            return generator.expense_date_retry();
        };
        let Some(candidate) = state.take_pending_expense() else {
            warn!("date confirmation flag set without a pending candidate");
            return generator.flow_error();
        };
        self.finalize(generator, candidate, date, user_id, today).await
    }

    async fn finalize(
        &self,
        generator: &ResponseGenerator,
        candidate: ExpenseCandidate,
        date: NaiveDate,
        user_id: i64,
        today: NaiveDate,
    ) -> EngineResponse {
        let record = NewExpense {
            merchant_name: candidate.merchant_name.clone(),
            amount: candidate.amount,
            category: candidate.category.clone(),
            transaction_date: date,
            memo: Some(candidate.original_text.clone()),
        };
        let saved = match self.ledger.create_expense(user_id, record).await {
            Ok(()) => {
                info!(user_id, amount = candidate.amount, category = %candidate.category, "expense recorded");
                true
            }
            Err(e) => {
                // Collaborator failure degrades the confirmation, nothing more.
                warn!(user_id, error = %e, "expense persistence failed");
                false
            }
        };
        generator.expense_saved(&candidate, date, today, saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::InMemoryExpenseLedger;
    use crate::error::{EngineError, Result};
    use crate::response::{ResponseType, TemplatePicker};
    use crate::slots::parse_expense_candidate;
    use async_trait::async_trait;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    fn generator() -> ResponseGenerator {
        ResponseGenerator::new(TemplatePicker::Fixed(0))
    }

    #[tokio::test]
    async fn missing_date_takes_one_round_trip() {
        let ledger = Arc::new(InMemoryExpenseLedger::new());
        let flow = ExpenseFlow::new(ledger.clone());
        let generator = generator();
        let mut state = SessionState::default();

        let candidate = parse_expense_candidate("5000원 점심 먹었어", today()).unwrap();
        let first = flow
            .handle_candidate(&generator, &mut state, candidate, 1, today())
            .await;
        assert_eq!(first.kind, ResponseType::ExpenseDateRequest);
        assert!(state.awaiting_date_confirmation);
        assert!(state.pending_expense.is_some());

        let second = flow
            .handle_date_reply(&generator, &mut state, "어제", 1, today())
            .await;
        assert_eq!(second.kind, ResponseType::ExpenseSaved);
        assert!(!state.awaiting_date_confirmation);
        assert!(state.pending_expense.is_none());
        assert_eq!(ledger.count_for(1), 1);

        let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
        let data = second.data.unwrap();
        assert_eq!(data["transactionDate"], yesterday.to_string());
        assert!(second.content.contains("어제"));
    }

    #[tokio::test]
    async fn dated_utterance_finalizes_in_one_turn() {
        let ledger = Arc::new(InMemoryExpenseLedger::new());
        let flow = ExpenseFlow::new(ledger.clone());
        let generator = generator();
        let mut state = SessionState::default();

        let candidate = parse_expense_candidate("오늘 2만원 썼어", today()).unwrap();
        let response = flow
            .handle_candidate(&generator, &mut state, candidate, 1, today())
            .await;
        assert_eq!(response.kind, ResponseType::ExpenseSaved);
        assert!(!state.awaiting_date_confirmation);
        assert_eq!(ledger.count_for(1), 1);
        assert!(response.content.contains("오늘"));
        assert!(response.content.contains("20,000"));
    }

    #[tokio::test]
    async fn unresolved_date_reply_reprompts_without_losing_the_candidate() {
        let ledger = Arc::new(InMemoryExpenseLedger::new());
        let flow = ExpenseFlow::new(ledger);
        let generator = generator();
        let mut state = SessionState::default();

        let candidate = parse_expense_candidate("3천원 커피 샀어", today()).unwrap();
        flow.handle_candidate(&generator, &mut state, candidate, 1, today())
            .await;

        let retry = flow
            .handle_date_reply(&generator, &mut state, "글쎄요", 1, today())
            .await;
        assert_eq!(retry.kind, ResponseType::ExpenseDateRequest);
        assert!(state.awaiting_date_confirmation);
        assert!(state.pending_expense.is_some());
    }

    struct FailingLedger;

    #[async_trait]
    impl ExpenseLedger for FailingLedger {
        async fn create_expense(&self, _user_id: i64, _expense: NewExpense) -> Result<()> {
            Err(EngineError::collaborator("ledger", "down"))
        }

        async fn expense_history(
            &self,
            _user_id: i64,
            _period: crate::report::Period,
        ) -> Result<crate::collaborators::ExpenseReport> {
            Err(EngineError::collaborator("ledger", "down"))
        }
    }

    #[tokio::test]
    async fn persistence_failure_degrades_the_confirmation_only() {
        let flow = ExpenseFlow::new(Arc::new(FailingLedger));
        let generator = generator();
        let mut state = SessionState::default();

        let candidate = parse_expense_candidate("오늘 5000원 냈어", today()).unwrap();
        let response = flow
            .handle_candidate(&generator, &mut state, candidate, 1, today())
            .await;
        assert_eq!(response.kind, ResponseType::ExpenseSaved);
        assert!(response.content.contains("저장이 어려워요"));
        assert_eq!(response.data.unwrap()["saved"], false);
    }
}
