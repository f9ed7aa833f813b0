//! Address extraction for the booking flow.
//!
//! Single heuristic: the longest run of Korean text containing an
//! administrative-unit or building suffix. Anything shorter than five
//! characters is treated as no address at all.

use std::sync::LazyLock;

use regex::Regex;

const MIN_ADDRESS_CHARS: usize = 5;

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[가-힣\s\d-]*(?:구|동|로|길|아파트|빌딩|시|군|읍|면)[가-힣\s\d-]*")
        .expect("valid regex")
});

/// Longest address-looking run in the utterance, or `None` when nothing long
/// enough is found. Length is counted in characters, not bytes.
pub fn extract_address(text: &str) -> Option<String> {
    ADDRESS_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .max_by_key(|candidate| candidate.chars().count())
        .filter(|candidate| candidate.chars().count() >= MIN_ADDRESS_CHARS)
        .map(str::to_string)
}
