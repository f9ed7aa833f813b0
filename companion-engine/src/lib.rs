pub mod booking;
pub mod collaborators;
pub mod engine;
pub mod error;
pub mod expense;
pub mod intent;
pub mod report;
pub mod response;
pub mod session;
pub mod slots;

// Re-export commonly used types
pub use booking::{BookingDraft, BookingFlow, BookingStep};
pub use collaborators::{
    BookableService, CachedServiceCatalog, ExpenseLedger, ExpenseReport,
    FallbackRecommendationProvider, InMemoryExpenseLedger, NewExpense, Recommendation,
    RecommendationProvider, ServiceCatalog, ServiceSummary, StaticServiceCatalog,
};
pub use engine::ConversationEngine;
pub use error::{EngineError, Result};
pub use expense::{ExpenseCandidate, ExpenseFlow};
pub use intent::Intent;
pub use report::Period;
pub use response::{EngineResponse, ResponseGenerator, ResponseType, TemplatePicker};
pub use session::{InMemorySessionStore, SessionState, SessionStore};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate};
    use std::sync::Arc;

    fn engine() -> ConversationEngine {
        ConversationEngine::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryExpenseLedger::new()),
            Arc::new(StaticServiceCatalog),
            Arc::new(FallbackRecommendationProvider),
        )
        .with_picker(TemplatePicker::Fixed(0))
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    #[tokio::test]
    async fn booking_scenario_runs_end_to_end() {
        let engine = engine();
        let say = |text: &'static str| engine.process_message_at("s1", 1, text, today());

        assert_eq!(say("복지서비스 예약하고 싶어").await.kind, ResponseType::BookingStart);
        assert_eq!(say("가정간병 서비스요").await.kind, ResponseType::ServiceSelected);
        assert_eq!(say("내일 3시까지").await.kind, ResponseType::TimeDetailsCollected);
        assert_eq!(
            say("서울시 강남구 테헤란로 123").await.kind,
            ResponseType::AddressCollected
        );

        let confirmed = say("네 맞아요").await;
        assert_eq!(confirmed.kind, ResponseType::BookingConfirmed);
        assert_eq!(confirmed.needs_navigation, Some(true));
        let navigation = confirmed.navigation_data.unwrap();
        assert_eq!(navigation.service_name, "가정간병 돌봄");
        assert_eq!(
            navigation.start_date,
            NaiveDate::from_ymd_opt(2025, 7, 11).unwrap()
        );
        assert_eq!(navigation.time_option, 2);

        // The draft is gone, so the next turn routes normally again.
        assert_eq!(say("안녕").await.kind, ResponseType::Greeting);
    }

    #[tokio::test]
    async fn expense_round_trip_through_the_engine() {
        let engine = engine();

        let ask = engine
            .process_message_at("s1", 1, "5000원 점심 먹었어", today())
            .await;
        assert_eq!(ask.kind, ResponseType::ExpenseDateRequest);

        let saved = engine.process_message_at("s1", 1, "어제", today()).await;
        assert_eq!(saved.kind, ResponseType::ExpenseSaved);
        assert_eq!(saved.data.unwrap()["transactionDate"], "2025-07-09");

        // Inquiry uses the real calendar, so log a second expense dated today.
        let real_today = Local::now().date_naive();
        engine
            .process_message_at("s1", 1, "오늘 2만원 택시비 냈어", real_today)
            .await;
        let report = engine
            .process_message_at("s1", 1, "오늘 얼마 썼어?", real_today)
            .await;
        assert_eq!(report.kind, ResponseType::ExpenseInquiry);
        assert!(report.content.contains("20,000"));
    }

    #[tokio::test]
    async fn recommendation_memory_feeds_one_detail_follow_up() {
        let engine = engine();

        let rec = engine.process_message_at("s1", 1, "오늘 뭐할까?", today()).await;
        assert_eq!(rec.kind, ResponseType::WelfareRecommendation);

        let detail = engine
            .process_message_at("s1", 1, "자세히 알려줘", today())
            .await;
        assert_eq!(detail.kind, ResponseType::WelfareDetail);
        assert!(detail.content.contains("담당기관"));

        // Memory is one-shot; the same question now falls through to general.
        let again = engine
            .process_message_at("s1", 1, "자세히 알려줘", today())
            .await;
        assert_eq!(again.kind, ResponseType::General);
    }

    #[tokio::test]
    async fn general_chat_leaves_the_session_untouched() {
        let engine = engine();
        let first = engine
            .process_message_at("s1", 1, "날씨가 참 좋네요", today())
            .await;
        let second = engine
            .process_message_at("s1", 1, "날씨가 참 좋네요", today())
            .await;
        assert_eq!(first.kind, ResponseType::General);
        assert_eq!(second.kind, ResponseType::General);
        assert_eq!(first.content, second.content);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let engine = engine();
        engine
            .process_message_at("s1", 1, "복지서비스 예약하고 싶어", today())
            .await;

        // The other session is not inside the booking flow.
        let other = engine.process_message_at("s2", 2, "안녕", today()).await;
        assert_eq!(other.kind, ResponseType::Greeting);

        // The first one still is.
        let same = engine
            .process_message_at("s1", 1, "정서지원 서비스", today())
            .await;
        assert_eq!(same.kind, ResponseType::ServiceSelected);
    }

    #[tokio::test]
    async fn reset_abandons_an_active_flow() {
        let engine = engine();
        engine
            .process_message_at("s1", 1, "복지서비스 예약하고 싶어", today())
            .await;
        engine.reset_session("s1").await.unwrap();

        let response = engine.process_message_at("s1", 1, "안녕", today()).await;
        assert_eq!(response.kind, ResponseType::Greeting);
    }
}
