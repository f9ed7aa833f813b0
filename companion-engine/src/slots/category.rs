//! Spending-category and merchant inference.
//!
//! Both are fixed ordered tables; the first entry whose keyword set intersects
//! the utterance wins.

/// Closed category set; the last entry is the default.
pub const DEFAULT_CATEGORY: &str = "기타";

const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    (
        "식비",
        &[
            "점심", "저녁", "아침", "먹었", "식사", "밥", "커피", "음식", "간식", "치킨", "식당",
        ],
    ),
    ("교통", &["버스", "지하철", "택시", "교통", "기차", "주유"]),
    ("쇼핑", &["쇼핑", "옷", "신발", "마트", "장봤", "샀"]),
    ("의료", &["병원", "약국", "약", "진료", "치료", "건강검진"]),
    ("생활용품", &["세제", "휴지", "생활용품", "청소용품", "주방용품"]),
    ("문화", &["영화", "공연", "책", "여가", "문화", "취미"]),
    ("통신", &["통신", "핸드폰", "휴대폰", "요금", "인터넷"]),
];

/// Well-known merchant aliases, checked before the per-category default.
const MERCHANT_TABLE: &[(&str, &[&str])] = &[
    ("스타벅스", &["스타벅스", "스벅"]),
    ("이마트", &["이마트"]),
    ("롯데마트", &["롯데마트"]),
    ("홈플러스", &["홈플러스"]),
    ("GS25", &["gs25", "지에스25", "지에스편의점"]),
    ("CU", &["cu편의점", "씨유"]),
    ("맥도날드", &["맥도날드", "맥날"]),
    ("올리브영", &["올리브영"]),
    ("다이소", &["다이소"]),
];

const CATEGORY_DEFAULT_MERCHANTS: &[(&str, &str)] = &[
    ("식비", "일반음식점"),
    ("교통", "대중교통"),
    ("쇼핑", "일반상점"),
    ("의료", "병원"),
    ("생활용품", "생활잡화점"),
    ("문화", "문화시설"),
    ("통신", "통신사"),
];

/// First category whose keyword set intersects the text; 기타 when none does.
pub fn infer_category(text: &str) -> &'static str {
    CATEGORY_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Merchant name for the utterance: a well-known alias match first, then the
/// category's default label.
pub fn infer_merchant(text: &str, category: &str) -> String {
    for (merchant, aliases) in MERCHANT_TABLE {
        if aliases.iter().any(|alias| text.contains(alias)) {
            return (*merchant).to_string();
        }
    }
    CATEGORY_DEFAULT_MERCHANTS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| "일반상점".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_category_wins() {
        assert_eq!(infer_category("점심 먹고 버스 탔어"), "식비");
        assert_eq!(infer_category("버스 타고 왔어"), "교통");
        assert_eq!(infer_category("병원 다녀왔어"), "의료");
        assert_eq!(infer_category("복권 당첨됐어"), "기타");
    }

    #[test]
    fn known_merchant_beats_category_default() {
        assert_eq!(infer_merchant("스벅에서 커피 마셨어", "식비"), "스타벅스");
        assert_eq!(infer_merchant("커피 마셨어", "식비"), "일반음식점");
    }

    #[test]
    fn unknown_category_falls_back_to_generic_store() {
        assert_eq!(infer_merchant("뭔가 샀어", "기타"), "일반상점");
    }
}
