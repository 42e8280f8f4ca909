//! Sora link detection in free-form chat text.

use std::sync::LazyLock;

use regex::Regex;

static SORA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://sora\.chatgpt\.com/[^\s<>"]+"#).expect("static regex is valid")
});

/// All Sora URLs in `text`, in order of appearance.
pub fn find_video_urls(text: &str) -> Vec<&str> {
    SORA_URL.find_iter(text).map(|m| m.as_str()).collect()
}

/// True if `candidate` starts with a Sora URL.
pub fn is_video_url(candidate: &str) -> bool {
    SORA_URL.find(candidate).is_some_and(|m| m.start() == 0)
}

/// First `max` chars of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
