//! Monetary-amount extraction.
//!
//! Patterns are tried in a fixed priority order; the first hit wins. Amounts
//! are whole won only, and a zero amount is treated as no amount at all.

use std::sync::LazyLock;

use regex::Regex;

/// Verbs that signal a spending event ("먹었", "썼", "샀", ...).
pub const SPENDING_VERBS: &[&str] = &[
    "먹었", "썼", "샀", "구매", "지불", "결제", "냈", "쇼핑했",
];

static COMMA_WON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})+)\s*원").expect("valid regex"));
static THOUSAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*천\s*원?").expect("valid regex"));
static TEN_THOUSAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*만\s*원?").expect("valid regex"));
static PLAIN_WON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*원").expect("valid regex"));
// Bare number followed by a spending verb inside the same clause (no sentence
// punctuation in between).
static BARE_NUMBER_VERB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)[^\d.,!?]{0,20}(먹었|썼|샀|구매|지불|결제|냈|쇼핑했)").expect("valid regex")
});

/// Pull a won amount out of free text, or `None` when no pattern matches or
/// the amount resolves to zero.
pub fn extract_amount(text: &str) -> Option<i64> {
    let amount = if let Some(caps) = COMMA_WON_RE.captures(text) {
        caps[1].replace(',', "").parse::<i64>().ok()?
    } else if let Some(caps) = THOUSAND_RE.captures(text) {
        caps[1].parse::<i64>().ok()? * 1_000
    } else if let Some(caps) = TEN_THOUSAND_RE.captures(text) {
        caps[1].parse::<i64>().ok()? * 10_000
    } else if let Some(caps) = PLAIN_WON_RE.captures(text) {
        caps[1].parse::<i64>().ok()?
    } else if let Some(caps) = BARE_NUMBER_VERB_RE.captures(text) {
        caps[1].parse::<i64>().ok()?
    } else {
        return None;
    };

    (amount > 0).then_some(amount)
}

/// Whether the utterance carries any spending verb.
pub fn has_spending_verb(text: &str) -> bool {
    SPENDING_VERBS.iter().any(|verb| text.contains(verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_unit_laws() {
        assert_eq!(extract_amount("3천원 커피 샀어"), Some(3_000));
        assert_eq!(extract_amount("2만원 썼어"), Some(20_000));
        assert_eq!(extract_amount("12,500원 결제했어"), Some(12_500));
        assert_eq!(extract_amount("5000원 점심 먹었어"), Some(5_000));
    }

    #[test]
    fn comma_grouping_beats_plain_digits() {
        assert_eq!(extract_amount("1,234,000원 냈어"), Some(1_234_000));
    }

    #[test]
    fn thousand_suffix_without_won() {
        assert_eq!(extract_amount("5천 썼어"), Some(5_000));
        assert_eq!(extract_amount("3만 지불했어"), Some(30_000));
    }

    #[test]
    fn bare_number_needs_a_spending_verb_in_the_same_clause() {
        assert_eq!(extract_amount("버스비 1500 냈어"), Some(1_500));
        assert_eq!(extract_amount("1500. 그런데 냈어"), None);
        assert_eq!(extract_amount("버스 번호 1500"), None);
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert_eq!(extract_amount("0원 썼어"), None);
    }

    #[test]
    fn no_amount() {
        assert_eq!(extract_amount("오늘 뭐할까"), None);
    }
}
