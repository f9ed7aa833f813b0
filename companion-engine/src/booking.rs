//! Service-booking dialogue flow: a linear four-step machine
//! (service → date/time → address → confirmation) with no skipping and no
//! backward transition except full cancellation. Any internal error resets
//! the draft rather than keeping partial state.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::collaborators::{BookableService, ServiceCatalog};
use crate::error::{EngineError, Result};
use crate::response::{EngineResponse, NavigationData, ResponseGenerator};
use crate::session::SessionState;
use crate::slots;

/// Current step of an active booking dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    ServiceSelection,
    DetailsInput,
    AddressInput,
    Confirmation,
}

/// In-progress booking, filled in step by step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDraft {
    pub step: BookingStep,
    pub service_id: Option<i64>,
    pub service_name: Option<String>,
    pub service_category: Option<String>,
    pub service_price: Option<i64>,
    pub time_option: Option<u8>,
    pub time_display: Option<String>,
    pub hours: Option<u8>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub date_display_text: Option<String>,
    pub address: Option<String>,
}

impl BookingDraft {
    pub fn new() -> Self {
        Self {
            step: BookingStep::ServiceSelection,
            service_id: None,
            service_name: None,
            service_category: None,
            service_price: None,
            time_option: None,
            time_display: None,
            hours: None,
            start_date: None,
            end_date: None,
            date_display_text: None,
            address: None,
        }
    }

    /// Navigation payload for the booking UI; fails when any step was skipped.
    fn navigation(&self) -> Result<NavigationData> {
        let missing = |field: &str| EngineError::FlowError(format!("booking draft missing {field}"));
        Ok(NavigationData {
            kind: "welfare_booking_modal",
            service_id: self.service_id.ok_or_else(|| missing("service_id"))?,
            service_name: self.service_name.clone().ok_or_else(|| missing("service_name"))?,
            start_date: self.start_date.ok_or_else(|| missing("start_date"))?,
            end_date: self.end_date.ok_or_else(|| missing("end_date"))?,
            time_option: self.time_option.ok_or_else(|| missing("time_option"))?,
            address: self.address.clone().ok_or_else(|| missing("address"))?,
        })
    }
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self::new()
    }
}

const BOOKING_START_KEYWORDS: &[&str] = &[
    "복지서비스 예약",
    "복지 서비스 예약",
    "복지예약",
    "서비스 예약",
    "예약하고 싶어",
    "예약해줘",
    "예약하고 싶다",
    "예약 신청",
    "가정간병 예약",
    "일상가사 예약",
    "정서지원 예약",
    "돌봄 서비스 예약",
    "돌봄 예약",
];

const POSITIVE_KEYWORDS: &[&str] = &["응", "네", "예", "맞아", "맞습니다", "좋아", "확인", "진행"];
const NEGATIVE_KEYWORDS: &[&str] = &["아니", "아니요", "틀려", "다시", "취소"];

/// Whether the utterance asks to start a service booking.
pub fn is_booking_request(text: &str) -> bool {
    BOOKING_START_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Drives the four-step booking dialogue for one session.
pub struct BookingFlow {
    catalog: Arc<dyn ServiceCatalog>,
}

impl BookingFlow {
    pub fn new(catalog: Arc<dyn ServiceCatalog>) -> Self {
        Self { catalog }
    }

    /// Open a fresh draft at `ServiceSelection` and greet.
    pub fn start(&self, generator: &ResponseGenerator, state: &mut SessionState) -> EngineResponse {
        info!("booking flow started");
        state.booking_draft = Some(BookingDraft::new());
        generator.booking_start()
    }

    /// One turn of an active booking dialogue. The draft owns the turn
    /// unconditionally; an internal error discards it (fail-safe reset).
    pub async fn handle_turn(
        &self,
        generator: &ResponseGenerator,
        state: &mut SessionState,
        text: &str,
        today: NaiveDate,
    ) -> EngineResponse {
        let Some(step) = state.booking_draft.as_ref().map(|draft| draft.step) else {
            return generator.flow_error();
        };
        let normalized = slots::normalize(text);
        let result = match step {
            BookingStep::ServiceSelection => {
                self.handle_service_selection(generator, state, &normalized).await
            }
            BookingStep::DetailsInput => Ok(self.handle_details(generator, state, &normalized, today)),
            BookingStep::AddressInput => Ok(self.handle_address(generator, state, text)),
            BookingStep::Confirmation => self.handle_confirmation(generator, state, &normalized),
        };
        match result {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "booking flow failed, resetting draft");
                state.booking_draft = None;
                generator.flow_error()
            }
        }
    }

    async fn handle_service_selection(
        &self,
        generator: &ResponseGenerator,
        state: &mut SessionState,
        text: &str,
    ) -> Result<EngineResponse> {
        let services = match self.catalog.list_bookable_services().await {
            Ok(services) => services,
            Err(e) => {
                // Catalog trouble must not corrupt the draft; stay in step.
                warn!(error = %e, "service catalog lookup failed");
                return Ok(generator.soft_failure());
            }
        };

        let Some(service) = match_service(&services, text) else {
            return Ok(generator.service_selection_retry());
        };

        let draft = state
            .booking_draft
            .as_mut()
            .ok_or_else(|| EngineError::FlowError("no active booking draft".to_string()))?;
        draft.service_id = Some(service.id);
        draft.service_name = Some(service.name.clone());
        draft.service_category = Some(service.category.clone());
        draft.service_price = Some(service.price);
        draft.step = BookingStep::DetailsInput;

        info!(service = %service.name, "booking service selected");
        Ok(generator.service_selected(&service.name))
    }

    fn handle_details(
        &self,
        generator: &ResponseGenerator,
        state: &mut SessionState,
        text: &str,
        today: NaiveDate,
    ) -> EngineResponse {
        let time = slots::extract_time_window(text);
        let date = slots::extract_booking_date(text, today);

        // Both slots must come from the same utterance; re-prompt names the
        // missing piece.
        let Some(time) = time else {
            return generator.time_selection_retry();
        };
        let Some(date) = date else {
            return generator.date_selection_retry();
        };

        let Some(draft) = state.booking_draft.as_mut() else {
            return generator.flow_error();
        };
        draft.time_option = Some(time.time_option);
        draft.time_display = Some(time.time_display.to_string());
        draft.hours = Some(time.hours);
        draft.start_date = Some(date.start_date);
        draft.end_date = Some(date.end_date);
        draft.date_display_text = Some(date.display_text.clone());
        draft.step = BookingStep::AddressInput;

        let service_name = draft.service_name.clone().unwrap_or_default();
        generator.time_details_collected(&date.display_text, time.time_display, &service_name)
    }

    fn handle_address(
        &self,
        generator: &ResponseGenerator,
        state: &mut SessionState,
        raw_text: &str,
    ) -> EngineResponse {
        let Some(address) = slots::extract_address(raw_text) else {
            return generator.address_input_retry();
        };

        let Some(draft) = state.booking_draft.as_mut() else {
            return generator.flow_error();
        };
        draft.address = Some(address);
        draft.step = BookingStep::Confirmation;
        generator.address_collected()
    }

    fn handle_confirmation(
        &self,
        generator: &ResponseGenerator,
        state: &mut SessionState,
        text: &str,
    ) -> Result<EngineResponse> {
        // Positive wins over negative, so every utterance classifies as
        // exactly one of positive / negative / unrecognized.
        if POSITIVE_KEYWORDS.iter().any(|k| text.contains(k)) {
            let draft = state
                .booking_draft
                .take()
                .ok_or_else(|| EngineError::FlowError("no active booking draft".to_string()))?;
            // The draft is already taken, so a skipped-step error lands on
            // the fail-safe reset path.
            let navigation = draft.navigation()?;
            info!(service = %navigation.service_name, "booking confirmed");
            return Ok(generator.booking_confirmed(navigation));
        }

        if NEGATIVE_KEYWORDS.iter().any(|k| text.contains(k)) {
            info!("booking cancelled by user");
            state.booking_draft = None;
            return Ok(generator.booking_cancelled());
        }

        Ok(generator.confirmation_retry())
    }
}

/// Match an utterance against the catalog via generated keyword sets.
fn match_service<'a>(services: &'a [BookableService], text: &str) -> Option<&'a BookableService> {
    services.iter().find(|service| {
        service_keywords(&service.name, &service.category)
            .iter()
            .any(|keyword| text.contains(keyword.as_str()))
    })
}

/// Expand a service's name and category into match keywords, mirroring how
/// users actually refer to the care services.
fn service_keywords(name: &str, category: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    if name.contains("가정간병") {
        keywords.extend(
            ["가정간병", "간병", "가정 간병", "간병 서비스", "가정간병서비스", "가정간병 서비스"]
                .map(String::from),
        );
    } else if name.contains("일상가사") {
        keywords.extend(
            ["일상가사", "가사", "일상 가사", "가사 서비스", "일상가사서비스", "가사돌봄", "가사 돌봄"]
                .map(String::from),
        );
    } else if name.contains("정서지원") {
        keywords.extend(
            ["정서지원", "정서 지원", "정서지원서비스", "정서지원 서비스", "정서 돌봄", "정서돌봄"]
                .map(String::from),
        );
    }

    match category {
        "간병지원" => keywords.extend(["간병", "간병지원", "간병서비스"].map(String::from)),
        "가사지원" => {
            keywords.extend(["가사", "가사지원", "가사서비스", "청소", "빨래", "집안일"].map(String::from))
        }
        "정서지원" => keywords.extend(["정서", "정서지원", "정서서비스", "말벗", "상담"].map(String::from)),
        _ => {}
    }

    // Unknown services still match on their literal name and category.
    keywords.push(name.to_string());
    keywords.push(category.to_string());
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::StaticServiceCatalog;
    use crate::response::{ResponseType, TemplatePicker};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    fn generator() -> ResponseGenerator {
        ResponseGenerator::new(TemplatePicker::Fixed(0))
    }

    fn flow() -> BookingFlow {
        BookingFlow::new(Arc::new(StaticServiceCatalog))
    }

    async fn advance(flow: &BookingFlow, state: &mut SessionState, text: &str) -> EngineResponse {
        flow.handle_turn(&generator(), state, text, today()).await
    }

    #[test]
    fn booking_request_detection() {
        assert!(is_booking_request("복지서비스 예약하고 싶어"));
        assert!(is_booking_request("돌봄 예약 부탁해"));
        assert!(!is_booking_request("오늘 뭐할까"));
    }

    #[tokio::test]
    async fn date_only_answer_reprompts_for_time_and_does_not_advance() {
        let flow = flow();
        let mut state = SessionState::default();
        flow.start(&generator(), &mut state);
        advance(&flow, &mut state, "가정간병").await;
        assert_eq!(state.booking_draft.as_ref().unwrap().step, BookingStep::DetailsInput);

        let response = advance(&flow, &mut state, "내일").await;
        assert_eq!(response.kind, ResponseType::TimeSelectionRetry);
        assert_eq!(state.booking_draft.as_ref().unwrap().step, BookingStep::DetailsInput);
    }

    #[tokio::test]
    async fn unknown_service_reprompts_in_place() {
        let flow = flow();
        let mut state = SessionState::default();
        flow.start(&generator(), &mut state);
        let response = advance(&flow, &mut state, "우주여행 서비스").await;
        assert_eq!(response.kind, ResponseType::ServiceSelectionRetry);
        assert_eq!(
            state.booking_draft.as_ref().unwrap().step,
            BookingStep::ServiceSelection
        );
    }

    #[tokio::test]
    async fn unrecognized_confirmation_keeps_the_draft() {
        let flow = flow();
        let mut state = SessionState::default();
        flow.start(&generator(), &mut state);
        advance(&flow, &mut state, "일상가사").await;
        advance(&flow, &mut state, "내일 3시까지").await;
        advance(&flow, &mut state, "서울시 강남구 테헤란로 123").await;
        assert_eq!(state.booking_draft.as_ref().unwrap().step, BookingStep::Confirmation);

        let response = advance(&flow, &mut state, "글쎄요").await;
        assert_eq!(response.kind, ResponseType::ConfirmationRetry);
        assert_eq!(state.booking_draft.as_ref().unwrap().step, BookingStep::Confirmation);
    }

    #[tokio::test]
    async fn negative_confirmation_cancels_and_clears() {
        let flow = flow();
        let mut state = SessionState::default();
        flow.start(&generator(), &mut state);
        advance(&flow, &mut state, "정서지원").await;
        advance(&flow, &mut state, "모레 12시까지").await;
        advance(&flow, &mut state, "부산시 해운대구 달맞이길 5").await;

        let response = advance(&flow, &mut state, "아니요 취소할래").await;
        assert_eq!(response.kind, ResponseType::BookingCancelled);
        assert!(state.booking_draft.is_none());
    }

    #[tokio::test]
    async fn invalid_address_reprompts_in_place() {
        let flow = flow();
        let mut state = SessionState::default();
        flow.start(&generator(), &mut state);
        advance(&flow, &mut state, "가사돌봄").await;
        advance(&flow, &mut state, "3일 후 6시까지").await;

        let response = advance(&flow, &mut state, "몰라요").await;
        assert_eq!(response.kind, ResponseType::AddressInputRetry);
        assert_eq!(state.booking_draft.as_ref().unwrap().step, BookingStep::AddressInput);
    }

    #[tokio::test]
    async fn full_flow_ends_with_navigation_payload() {
        let flow = flow();
        let mut state = SessionState::default();
        flow.start(&generator(), &mut state);
        advance(&flow, &mut state, "가정간병").await;
        advance(&flow, &mut state, "내일 3시까지").await;
        advance(&flow, &mut state, "서울시 강남구 테헤란로 123").await;

        let response = advance(&flow, &mut state, "네").await;
        assert_eq!(response.kind, ResponseType::BookingConfirmed);
        assert_eq!(response.needs_navigation, Some(true));
        let navigation = response.navigation_data.unwrap();
        assert_eq!(navigation.service_name, "가정간병 돌봄");
        assert_eq!(navigation.time_option, 2);
        assert_eq!(navigation.address, "서울시 강남구 테헤란로 123");
        assert!(state.booking_draft.is_none());
    }
}
