//! Intent classification: an ordered rule list over the normalized utterance
//! and the session state. First match wins; active dialogue flows sit at the
//! top so they own the turn regardless of what the utterance looks like.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::booking;
use crate::expense::ExpenseCandidate;
use crate::report::{self, Period};
use crate::session::SessionState;
use crate::slots;

/// What the engine decided to do with one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "intent")]
pub enum Intent {
    /// A booking draft is active; the booking flow consumes the turn.
    ActiveBooking,
    /// An expense is parked waiting for its date; the expense flow consumes
    /// the turn.
    PendingExpenseDate,
    Greeting,
    Capability,
    PortalNavigation,
    /// Remembered recommendation plus a detail keyword.
    DetailFollowUp,
    Recommendation { category: Option<String> },
    BookingStart,
    ExpenseLog { candidate: ExpenseCandidate },
    ExpenseInquiry { period: Period },
    General,
}

impl Intent {
    /// Stable name for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::ActiveBooking => "active_booking",
            Intent::PendingExpenseDate => "pending_expense_date",
            Intent::Greeting => "greeting",
            Intent::Capability => "capability",
            Intent::PortalNavigation => "portal_navigation",
            Intent::DetailFollowUp => "detail_follow_up",
            Intent::Recommendation { .. } => "recommendation",
            Intent::BookingStart => "booking_start",
            Intent::ExpenseLog { .. } => "expense_log",
            Intent::ExpenseInquiry { .. } => "expense_inquiry",
            Intent::General => "general",
        }
    }
}

const CAPABILITY_ANY: &[&str] = &["무엇", "도와", "할일"];

const PORTAL_KEYWORDS: &[&str] = &[
    "복지로",
    "복지로 사이트",
    "복지 사이트",
    "복지로 이동",
    "복지로 가기",
    "복지로 웹사이트",
    "복지포털",
    "복지 포털",
    "복지로 홈페이지",
];

const DETAIL_KEYWORDS: &[&str] = &[
    "자세히",
    "상세히",
    "더 알려줘",
    "더 알고 싶어",
    "정보 알려줘",
    "어떤 서비스",
    "무슨 서비스",
    "뭔가요",
    "뭐예요",
    "설명해줘",
    "알려주세요",
    "궁금해",
];

const ACTIVITY_KEYWORDS: &[&str] = &[
    "오늘 뭐할까",
    "오늘 뭐하지",
    "오늘 할일",
    "오늘 뭐해",
    "뭐할까",
    "뭐하지",
    "심심해",
    "심심하다",
    "할게 없어",
    "할게없어",
    "할일없어",
    "할일 없어",
    "추천해줘",
    "추천해주세요",
    "뭐 좋은거 있나",
    "뭐 좋은거 있을까",
    "오늘 프로그램",
    "오늘 서비스",
    "이용할 수 있는",
    "할 수 있는",
    "복지서비스",
    "복지 서비스",
    "서비스 추천",
    "프로그램 추천",
    "건강",
    "운동",
    "문화",
    "교육",
    "봉사",
    "취미",
    "여가",
    "일자리",
    "취업",
];

/// Category refinement for recommendations; ordered, first hit wins.
const ACTIVITY_CATEGORIES: &[(&str, &[&str])] = &[
    ("건강", &["건강", "운동", "체조", "걷기", "산책", "스포츠", "헬스", "의료"]),
    ("문화", &["문화", "음악", "미술", "독서", "영화", "공연", "예술", "취미"]),
    ("교육", &["교육", "배우기", "공부", "강의", "수업", "학습", "스마트폰", "컴퓨터"]),
    ("사회", &["봉사", "모임", "커뮤니티", "만남", "사회", "참여", "활동"]),
    ("돌봄", &["돌봄", "지원", "도움", "케어", "관리", "상담", "치료"]),
    ("취업", &["일자리", "취업", "일", "직업", "근무", "고용", "구직"]),
];

fn is_capability_question(text: &str) -> bool {
    (text.contains("뭘") && (text.contains("할수") || text.contains("할 수")))
        || (text.contains("어떤") && text.contains("기능"))
        || CAPABILITY_ANY.iter().any(|k| text.contains(k))
}

fn activity_category(text: &str) -> Option<String> {
    ACTIVITY_CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| (*category).to_string())
}

/// Classify one utterance against the current session state.
pub fn classify(text: &str, state: &SessionState, today: NaiveDate) -> Intent {
    // Active flows monopolize the turn; everything else is keyword routing.
    if state.booking_draft.is_some() {
        return Intent::ActiveBooking;
    }
    if state.awaiting_date_confirmation {
        return Intent::PendingExpenseDate;
    }

    let normalized = slots::normalize(text);

    if normalized.contains("안녕") {
        return Intent::Greeting;
    }
    if is_capability_question(&normalized) {
        return Intent::Capability;
    }
    if PORTAL_KEYWORDS.iter().any(|k| normalized.contains(k)) {
        return Intent::PortalNavigation;
    }
    if state.last_recommended.is_some() && DETAIL_KEYWORDS.iter().any(|k| normalized.contains(k)) {
        return Intent::DetailFollowUp;
    }
    if booking::is_booking_request(&normalized) {
        return Intent::BookingStart;
    }
    if ACTIVITY_KEYWORDS.iter().any(|k| normalized.contains(k)) {
        return Intent::Recommendation {
            category: activity_category(&normalized),
        };
    }
    if let Some(candidate) = slots::parse_expense_candidate(text, today) {
        return Intent::ExpenseLog { candidate };
    }
    if let Some(period) = report::parse_report_query(&normalized, today) {
        return Intent::ExpenseInquiry { period };
    }

    Intent::General
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingDraft;
    use crate::collaborators::ServiceSummary;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    fn classify_fresh(text: &str) -> Intent {
        classify(text, &SessionState::default(), today())
    }

    #[test]
    fn active_booking_owns_the_turn_even_for_greetings() {
        let mut state = SessionState::default();
        state.booking_draft = Some(BookingDraft::new());
        assert_eq!(classify("안녕하세요", &state, today()), Intent::ActiveBooking);
    }

    #[test]
    fn pending_expense_date_owns_the_turn() {
        let mut state = SessionState::default();
        state.awaiting_date_confirmation = true;
        assert_eq!(
            classify("오늘 뭐할까", &state, today()),
            Intent::PendingExpenseDate
        );
    }

    #[test]
    fn greeting_and_capability() {
        assert_eq!(classify_fresh("안녕!"), Intent::Greeting);
        assert_eq!(classify_fresh("뭘 할 수 있어?"), Intent::Capability);
        assert_eq!(classify_fresh("어떤 기능이 있나요"), Intent::Capability);
    }

    #[test]
    fn portal_navigation() {
        assert_eq!(classify_fresh("복지로 사이트 열어줘"), Intent::PortalNavigation);
    }

    #[test]
    fn detail_follow_up_needs_recommendation_memory() {
        assert_ne!(classify_fresh("자세히 알려줘"), Intent::DetailFollowUp);

        let mut state = SessionState::default();
        state.remember_recommendation(vec![ServiceSummary {
            name: "독서 시간".to_string(),
            summary: "여유로운 독서".to_string(),
            organization: "지역도서관".to_string(),
        }]);
        assert_eq!(
            classify("자세히 알려줘", &state, today()),
            Intent::DetailFollowUp
        );
    }

    #[test]
    fn recommendation_with_category_refinement() {
        assert_eq!(
            classify_fresh("오늘 뭐할까?"),
            Intent::Recommendation { category: None }
        );
        assert_eq!(
            classify_fresh("건강에 좋은 프로그램 추천해줘"),
            Intent::Recommendation {
                category: Some("건강".to_string())
            }
        );
    }

    #[test]
    fn booking_start_wins_over_activity_keywords() {
        assert_eq!(classify_fresh("돌봄 서비스 예약하고 싶어"), Intent::BookingStart);
    }

    #[test]
    fn expense_log_carries_the_candidate() {
        match classify_fresh("5000원 점심 먹었어") {
            Intent::ExpenseLog { candidate } => {
                assert_eq!(candidate.amount, 5_000);
                assert!(candidate.needs_date_confirmation);
            }
            other => panic!("expected ExpenseLog, got {other:?}"),
        }
    }

    #[test]
    fn expense_inquiry_with_period() {
        assert_eq!(
            classify_fresh("이번 달 지출 내역 알려줘"),
            Intent::ExpenseInquiry {
                period: Period::ThisMonth
            }
        );
    }

    #[test]
    fn anything_else_is_general() {
        assert_eq!(classify_fresh("날씨가 참 좋네요"), Intent::General);
    }
}
