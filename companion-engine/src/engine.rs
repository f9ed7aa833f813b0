//! The conversation engine: one entry point per user turn. Classifies the
//! utterance against the session state, routes it to the right flow or
//! handler, and always comes back with a response the caller can ship.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};

use crate::booking::BookingFlow;
use crate::collaborators::{ExpenseLedger, RecommendationProvider, ServiceCatalog};
use crate::error::Result;
use crate::expense::ExpenseFlow;
use crate::intent::{self, Intent};
use crate::response::{EngineResponse, ResponseGenerator, TemplatePicker};
use crate::session::SessionStore;
use crate::slots;

/// Session-aware dialogue orchestrator. Cheap to share behind an `Arc`.
pub struct ConversationEngine {
    store: Arc<dyn SessionStore>,
    generator: ResponseGenerator,
    expense: ExpenseFlow,
    booking: BookingFlow,
    ledger: Arc<dyn ExpenseLedger>,
    recommender: Arc<dyn RecommendationProvider>,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        ledger: Arc<dyn ExpenseLedger>,
        catalog: Arc<dyn ServiceCatalog>,
        recommender: Arc<dyn RecommendationProvider>,
    ) -> Self {
        Self {
            store,
            generator: ResponseGenerator::default(),
            expense: ExpenseFlow::new(ledger.clone()),
            booking: BookingFlow::new(catalog),
            ledger,
            recommender,
        }
    }

    /// Pin template selection, mainly for tests.
    pub fn with_picker(mut self, picker: TemplatePicker) -> Self {
        self.generator = ResponseGenerator::new(picker);
        self
    }

    /// Handle one user turn. Never fails from the caller's point of view:
    /// internal errors come back as an error-typed response.
    pub async fn process_message(
        &self,
        session_id: &str,
        user_id: i64,
        message: &str,
    ) -> EngineResponse {
        self.process_message_at(session_id, user_id, message, Local::now().date_naive())
            .await
    }

    /// Same as [`process_message`](Self::process_message) with an explicit
    /// reference date for relative phrases like 어제 or 내일.
    pub async fn process_message_at(
        &self,
        session_id: &str,
        user_id: i64,
        message: &str,
        today: NaiveDate,
    ) -> EngineResponse {
        let mut state = match self.store.acquire(session_id).await {
            Ok(state) => state,
            Err(e) => {
                error!(session_id, error = %e, "session acquisition failed");
                return self.generator.flow_error();
            }
        };

        let intent = intent::classify(message, &state, today);
        info!(session_id, user_id, intent = intent.label(), "turn classified");

        match intent {
            Intent::ActiveBooking => {
                self.booking
                    .handle_turn(&self.generator, &mut state, message, today)
                    .await
            }
            Intent::PendingExpenseDate => {
                self.expense
                    .handle_date_reply(&self.generator, &mut state, message, user_id, today)
                    .await
            }
            Intent::Greeting => self.generator.greeting(),
            Intent::Capability => self.generator.capability(),
            Intent::PortalNavigation => self.generator.welfare_portal(),
            Intent::DetailFollowUp => self.handle_detail_follow_up(&mut state, message).await,
            Intent::Recommendation { category } => {
                self.handle_recommendation(&mut state, category.as_deref(), message)
                    .await
            }
            Intent::BookingStart => self.booking.start(&self.generator, &mut state),
            Intent::ExpenseLog { candidate } => {
                self.expense
                    .handle_candidate(&self.generator, &mut state, candidate, user_id, today)
                    .await
            }
            Intent::ExpenseInquiry { period } => {
                match self.ledger.expense_history(user_id, period).await {
                    Ok(report) => self.generator.expense_inquiry(period, &report),
                    Err(e) => {
                        warn!(user_id, error = %e, "expense history lookup failed");
                        self.generator.soft_failure()
                    }
                }
            }
            Intent::General => self.generator.general(&slots::normalize(message)),
        }
    }

    /// Drop all stored state for one session.
    pub async fn reset_session(&self, session_id: &str) -> Result<()> {
        info!(session_id, "session reset");
        self.store.reset(session_id).await
    }

    async fn handle_detail_follow_up(
        &self,
        state: &mut crate::session::SessionState,
        message: &str,
    ) -> EngineResponse {
        // The memory is one-shot: consumed on the first follow-up.
        let Some(services) = state.take_recommendation() else {
            return self.generator.general(&slots::normalize(message));
        };
        match self.recommender.describe(&services, message).await {
            Ok(detail) => self.generator.welfare_detail(detail),
            Err(e) => {
                warn!(error = %e, "detail elaboration failed");
                self.generator.soft_failure()
            }
        }
    }

    async fn handle_recommendation(
        &self,
        state: &mut crate::session::SessionState,
        category: Option<&str>,
        message: &str,
    ) -> EngineResponse {
        match self.recommender.recommend(category, message).await {
            Ok(recommendation) => {
                state.remember_recommendation(recommendation.services);
                self.generator.welfare_recommendation(recommendation.content)
            }
            Err(e) => {
                warn!(error = %e, "recommendation failed");
                self.generator.soft_failure()
            }
        }
    }
}
