//! Response generation: wire types returned to the caller and the template
//! pools all user-facing copy comes from. Pool picks go through
//! [`TemplatePicker`] so tests can pin the choice.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value, json};

use crate::collaborators::ExpenseReport;
use crate::expense::ExpenseCandidate;
use crate::report::{Period, format_spoken_won, format_won};
use crate::slots::friendly_date;

pub const WELFARE_PORTAL_URL: &str = "https://www.bokjiro.go.kr";

/// Response type tag, serialized snake_case to match the consumer contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Greeting,
    Capability,
    WelfarePortalRequest,
    WelfareRecommendation,
    WelfareDetail,
    ExpenseDateRequest,
    ExpenseSaved,
    ExpenseInquiry,
    BookingStart,
    ServiceSelected,
    TimeDetailsCollected,
    AddressCollected,
    BookingConfirmed,
    BookingCancelled,
    ServiceSelectionRetry,
    TimeSelectionRetry,
    DateSelectionRetry,
    AddressInputRetry,
    ConfirmationRetry,
    Error,
    General,
}

/// Payload telling the UI to open the booking modal pre-filled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationData {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub service_id: i64,
    pub service_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub time_option: u8,
    pub address: String,
}

/// One turn's reply to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    pub content: String,
    pub needs_voice: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_navigation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_data: Option<NavigationData>,
}

impl EngineResponse {
    pub fn new(kind: ResponseType, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            needs_voice: true,
            data: None,
            needs_navigation: None,
            navigation_data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_navigation(mut self, navigation: NavigationData) -> Self {
        self.needs_navigation = Some(true);
        self.navigation_data = Some(navigation);
        self
    }
}

/// Template selection strategy: random in production, pinned under test.
#[derive(Debug, Clone, Copy)]
pub enum TemplatePicker {
    Random,
    Fixed(usize),
}

impl TemplatePicker {
    pub fn pick<'a>(&self, pool: &[&'a str]) -> &'a str {
        debug_assert!(!pool.is_empty());
        match self {
            TemplatePicker::Random => pool[rand::random_range(0..pool.len())],
            TemplatePicker::Fixed(index) => pool[index % pool.len()],
        }
    }
}

const GREETING_POOL: &[&str] = &[
    "안녕하세요! 오늘 기분은 어떠신가요? 필요한 정보가 있으시면 언제든 말씀해주세요!",
    "안녕하세요! 좋은 하루 보내고 계신가요? 무엇을 도와드릴까요?",
    "안녕하세요! 반가워요! 오늘 어떤 것을 도와드릴까요?",
    "안녕하세요! 오늘도 좋은 하루네요! 궁금한 것이 있으시면 언제든 말씀해주세요!",
];

const CAPABILITY_POOL: &[&str] = &[
    "저는 주로 복지서비스 정보 안내와 금융 서비스 지원을 도와드릴 수 있어요! 혹시 구체적으로 필요한 내용을 알려주시면 더 자세히 도와드릴게요!",
    "저는 복지서비스 추천, 가계부 관리, 소비 내역 기록 등을 도와드릴 수 있어요! 무엇이 필요하신지 말씀해주세요!",
    "복지서비스 정보 안내와 가계부 관리가 저의 주요 기능이에요! 어떤 도움이 필요하신지 구체적으로 말씀해주시면 더 좋은 서비스를 제공해드릴게요!",
    "저는 여러분의 복지 생활과 가계 관리를 도와드리는 AI 도우미예요! 복지서비스 추천부터 소비 내역 관리까지, 필요한 것이 있으시면 언제든 말씀해주세요!",
];

const PORTAL_POOL: &[&str] = &[
    "복지로 사이트로 이동할 준비가 되었어요! 이동을 원하시면 확인 부탁드릴게요!",
    "복지로 사이트로 안내해드릴게요! 이동하시겠어요? 확인해주세요!",
    "복지로 홈페이지로 바로 이동하실 수 있어요! 이동하시겠습니까?",
];

const NAME_POOL: &[&str] = &[
    "저는 금복이라고 합니다. 가계부 관리와 복지서비스 추천을 도와드릴 수 있어요!",
    "금복이예요! 여러분의 가계 관리와 복지 생활을 도와드리는 AI 도우미입니다!",
    "안녕하세요, 저는 금복이에요! 돈 관리와 복지서비스가 저의 전문 분야랍니다!",
];

const HELP_POOL: &[&str] = &[
    "네, 어떤 도움이 필요하신가요? 가계부 기록이나 복지서비스 추천을 도와드릴 수 있어요!",
    "물론이죠! 소비 내역 기록, 가계부 관리, 복지서비스 안내 등 무엇이든 말씀해주세요!",
    "도움이 필요하시군요! 구체적으로 어떤 것을 도와드릴까요? 가계부? 복지서비스?",
];

const THANKS_POOL: &[&str] = &[
    "천만에요! 언제든 도움이 필요하시면 말씀해주세요!",
    "별말씀을요! 더 궁금한 것이 있으시면 언제든 물어보세요!",
    "도움이 되었다니 다행이에요! 또 필요한 것이 있으시면 말씀해주세요!",
    "기쁘게 도와드렸어요! 앞으로도 언제든 불러주세요!",
];

const GENERAL_POOL: &[&str] = &[
    "네, 말씀해주세요! 어떤 것을 도와드릴까요?",
    "궁금한 것이 있으시면 언제든 말씀해주세요!",
    "더 자세히 말씀해주시면 도움을 드릴 수 있을 것 같아요!",
    "무엇이든 편하게 말씀해주세요!",
];

/// Turns flow results into user-facing replies.
pub struct ResponseGenerator {
    picker: TemplatePicker,
}

impl ResponseGenerator {
    pub fn new(picker: TemplatePicker) -> Self {
        Self { picker }
    }

    pub fn greeting(&self) -> EngineResponse {
        EngineResponse::new(ResponseType::Greeting, self.picker.pick(GREETING_POOL))
    }

    pub fn capability(&self) -> EngineResponse {
        EngineResponse::new(ResponseType::Capability, self.picker.pick(CAPABILITY_POOL))
    }

    pub fn welfare_portal(&self) -> EngineResponse {
        EngineResponse::new(ResponseType::WelfarePortalRequest, self.picker.pick(PORTAL_POOL))
            .with_data(json!({
                "actionType": "navigate_to_welfare_portal",
                "actionUrl": WELFARE_PORTAL_URL,
            }))
    }

    /// Generic-chat fallback, refined by a few well-known cues first.
    pub fn general(&self, text: &str) -> EngineResponse {
        let content = if text.contains("가계부") {
            "가계부 기능이 궁금하시군요! \"5000원 점심 먹었어\" 이런 식으로 말씀해주시면 자동으로 가계부에 기록해드려요 📝"
                .to_string()
        } else if text.contains("이름") || text.contains("누구") {
            self.picker.pick(NAME_POOL).to_string()
        } else if text.contains("도움") || text.contains("도와줘") {
            self.picker.pick(HELP_POOL).to_string()
        } else if text.contains("고마") || text.contains("감사") {
            self.picker.pick(THANKS_POOL).to_string()
        } else {
            self.picker.pick(GENERAL_POOL).to_string()
        };
        EngineResponse::new(ResponseType::General, content)
    }

    pub fn welfare_recommendation(&self, content: String) -> EngineResponse {
        EngineResponse::new(ResponseType::WelfareRecommendation, content)
    }

    pub fn welfare_detail(&self, content: String) -> EngineResponse {
        EngineResponse::new(ResponseType::WelfareDetail, content)
    }

    pub fn expense_date_request(&self, candidate: &ExpenseCandidate) -> EngineResponse {
        EngineResponse::new(
            ResponseType::ExpenseDateRequest,
            format!(
                "{}원 {} 내역을 기록할게요. 언제 사용하신 금액인가요? 예: 오늘, 어제, 3일 전, 8월 15일",
                format_won(candidate.amount),
                candidate.category
            ),
        )
    }

    pub fn expense_date_retry(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::ExpenseDateRequest,
            "날짜를 알아듣지 못했어요. 언제 사용하신 금액인가요? 예: 오늘, 어제, 3일 전, 8월 15일",
        )
    }

    /// Confirmation for a finalized expense. `saved` is false when the
    /// persistence collaborator failed; the record is acknowledged either way.
    pub fn expense_saved(
        &self,
        candidate: &ExpenseCandidate,
        date: NaiveDate,
        today: NaiveDate,
        saved: bool,
    ) -> EngineResponse {
        let date_text = friendly_date(date, today);
        let content = if saved {
            format!(
                "{}에 {}(으)로 {}원 사용하신 내역을 가계부에 기록했어요!",
                date_text,
                candidate.category,
                format_won(candidate.amount)
            )
        } else {
            format!(
                "{}에 {}(으)로 {}원 사용하신 것은 알겠는데, 지금은 저장이 어려워요. 잠시 후 다시 말씀해주세요.",
                date_text,
                candidate.category,
                format_won(candidate.amount)
            )
        };
        EngineResponse::new(ResponseType::ExpenseSaved, content).with_data(json!({
            "merchantName": candidate.merchant_name,
            "amount": candidate.amount,
            "category": candidate.category,
            "transactionDate": date,
            "saved": saved,
        }))
    }

    pub fn expense_inquiry(&self, period: Period, report: &ExpenseReport) -> EngineResponse {
        let label = period.display();
        let content = if report.total_amount == 0 {
            format!("{label}에는 기록된 소비 내역이 없어요.")
        } else {
            let mut lines = vec![format!(
                "{label} 총 {}원({}) 쓰셨어요.",
                format_won(report.total_amount),
                format_spoken_won(report.total_amount)
            )];
            for total in report.totals_by_category.iter().take(3) {
                lines.push(format!(
                    "- {}: {}원 ({}건)",
                    total.category,
                    format_won(total.total_amount),
                    total.count
                ));
            }
            lines.join("\n")
        };
        let data = serde_json::to_value(report).unwrap_or(Value::Null);
        EngineResponse::new(ResponseType::ExpenseInquiry, content)
            .with_data(json!({ "period": period, "report": data }))
    }

    pub fn booking_start(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::BookingStart,
            "안녕하세요! 어떤 복지 서비스를 예약하고 싶으신가요? 가정간병 서비스와 일상가사 서비스, 정서지원 서비스중 선택하실 수 있습니다.",
        )
    }

    pub fn service_selected(&self, service_name: &str) -> EngineResponse {
        EngineResponse::new(
            ResponseType::ServiceSelected,
            format!(
                "좋습니다 {service_name}을 예약하실 날짜와 원하는 시간대, 주소를 알려주시겠어요? 선택할 수 있는 시간대는 오전 9시부터 오후 12시, 오전 9시부터 오후 3시, 오전 9시부터 오후 6시까지 입니다"
            ),
        )
    }

    pub fn service_selection_retry(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::ServiceSelectionRetry,
            "어떤 서비스를 원하시는지 정확히 말씀해주세요. 가정간병 서비스, 일상가사 서비스, 정서지원 서비스 중에서 선택해주세요.",
        )
    }

    pub fn time_details_collected(
        &self,
        date_text: &str,
        time_display: &str,
        service_name: &str,
    ) -> EngineResponse {
        EngineResponse::new(
            ResponseType::TimeDetailsCollected,
            format!(
                "{date_text} {time_display}까지 {service_name}을 예약하시겠군요 그럼 주소를 알려주시겠어요?"
            ),
        )
    }

    pub fn time_selection_retry(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::TimeSelectionRetry,
            "시간대를 명확히 말씀해주세요. 예: \"내일 3시까지\", \"모레 오후 6시까지\"",
        )
    }

    pub fn date_selection_retry(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::DateSelectionRetry,
            "날짜를 명확히 말씀해주세요. 예: \"내일\", \"모레\", \"3일 후\"",
        )
    }

    pub fn address_collected(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::AddressCollected,
            "해당 주소로 예약을 진행하려고 하는데 맞으신가요? 확인해주시면 예약 페이지로 안내해드리겠습니다",
        )
    }

    pub fn address_input_retry(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::AddressInputRetry,
            "주소를 정확히 말씀해주세요. 예: \"서울시 강남구 테헤란로 123\"",
        )
    }

    pub fn booking_confirmed(&self, navigation: NavigationData) -> EngineResponse {
        EngineResponse::new(
            ResponseType::BookingConfirmed,
            "확인감사합니다 예약 페이지로 안내해드리겠습니다 잠시만 기다려주세요",
        )
        .with_navigation(navigation)
    }

    pub fn booking_cancelled(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::BookingCancelled,
            "예약을 취소했습니다. 다시 예약하시려면 \"복지서비스 예약하고 싶어\"라고 말씀해주세요.",
        )
    }

    pub fn confirmation_retry(&self) -> EngineResponse {
        EngineResponse::new(ResponseType::ConfirmationRetry, "\"예\" 또는 \"아니요\"로 답변해주세요.")
    }

    pub fn flow_error(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::Error,
            "처리 중 오류가 발생했습니다. 다시 시도해주세요.",
        )
    }

    pub fn soft_failure(&self) -> EngineResponse {
        EngineResponse::new(
            ResponseType::Error,
            "요청은 알아들었는데 지금은 처리하기가 어려워요. 잠시 후 다시 말씀해주세요.",
        )
    }
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new(TemplatePicker::Random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_picker_is_deterministic() {
        let picker = TemplatePicker::Fixed(1);
        assert_eq!(picker.pick(GREETING_POOL), GREETING_POOL[1]);
        assert_eq!(picker.pick(GREETING_POOL), GREETING_POOL[1]);
        // Index wraps around the pool length.
        assert_eq!(TemplatePicker::Fixed(7).pick(PORTAL_POOL), PORTAL_POOL[1]);
    }

    #[test]
    fn general_response_prefers_known_cues() {
        let generator = ResponseGenerator::new(TemplatePicker::Fixed(0));
        assert!(generator.general("가계부 어떻게 써?").content.contains("가계부 기능"));
        assert!(generator.general("너 이름이 뭐야").content.contains("금복이"));
        assert_eq!(generator.general("음...").content, GENERAL_POOL[0]);
    }

    #[test]
    fn portal_response_carries_action_url() {
        let generator = ResponseGenerator::new(TemplatePicker::Fixed(0));
        let response = generator.welfare_portal();
        assert_eq!(response.kind, ResponseType::WelfarePortalRequest);
        let data = response.data.unwrap();
        assert_eq!(data["actionUrl"], WELFARE_PORTAL_URL);
    }

    #[test]
    fn response_serializes_camel_case_with_type_tag() {
        let response = EngineResponse::new(ResponseType::General, "hi");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "general");
        assert_eq!(value["needsVoice"], true);
        assert!(value.get("navigationData").is_none());
    }
}
