//! Utility functions for IRC line handling.

/// Maximum length of an IRC message, CRLF included.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Truncates a string to at most `max_bytes` bytes without breaking
/// a multi-byte UTF-8 codepoint at the end.
///
/// # Examples
///
/// ```
/// use slirc_client::util::truncate_utf8_safe;
///
/// assert_eq!(truncate_utf8_safe("hello world", 5), "hello");
///
/// // Multi-byte chars are not split
/// let emoji = "Hello 👋 World";
/// assert_eq!(truncate_utf8_safe(emoji, 8), "Hello ");
///
/// assert_eq!(truncate_utf8_safe("hi", 10), "hi");
/// ```
#[inline]
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// Split `line` at the first occurrence of `separator`.
///
/// The remainder is empty when the separator is absent.
///
/// ```
/// use slirc_client::util::pop;
///
/// assert_eq!(pop("nick!ident@host", '!'), ("nick", "ident@host"));
/// assert_eq!(pop("server.name", '!'), ("server.name", ""));
/// ```
#[inline]
pub fn pop(line: &str, separator: char) -> (&str, &str) {
    line.split_once(separator).unwrap_or((line, ""))
}

/// Total byte length of a set of lines.
pub fn text_len<S: AsRef<str>>(lines: &[S]) -> usize {
    lines.iter().map(|l| l.as_ref().len()).sum()
}
