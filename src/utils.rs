//! Shared string helpers for planstream
//!
//! Everything here counts characters, never bytes, so task text coming
//! back from a model can be sliced without panicking on multi-byte UTF-8.

/// Return the first `max_chars` characters of `s`.
///
/// # Examples
/// ```
/// use planstream::utils::truncate_str;
///
/// assert_eq!(truncate_str("hello world", 5), "hello");
///
/// let emoji = "hello 🌍 world";
/// assert_eq!(truncate_str(emoji, 7), "hello 🌍");
/// ```
#[inline]
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Number of characters in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Pull the outermost JSON object out of a model reply.
///
/// Models wrap JSON in markdown fences or lead with a sentence of prose;
/// this returns the slice from the first `{` to the last `}`, or `None`
/// when the reply holds no object at all.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = text.trim();
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
