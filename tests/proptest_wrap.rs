//! Property-based tests for line wrapping and the codec.
//!
//! Uses proptest to verify that:
//! 1. Text that fits is returned untouched
//! 2. Every wrapped line fits the limit and no words are lost
//! 3. Parsing arbitrary bytes never panics
//! 4. Well-formed lines survive parse then export

use bytes::Bytes;
use proptest::prelude::*;
use slirc_client::wrap::wrap_lines;
use slirc_client::{Charset, IrcEncode, Message};

// =============================================================================
// STRATEGIES
// =============================================================================

/// Words of ASCII or Cyrillic letters, joined by single spaces.
fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            prop::string::string_regex("[a-zA-Z0-9]{1,12}").expect("valid regex"),
            prop::string::string_regex("[а-яА-Я]{1,8}").expect("valid regex"),
        ],
        0..80,
    )
    .prop_map(|words| words.join(" "))
}

fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,8}")
        .expect("valid regex")
}

fn channel_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[#&][a-zA-Z0-9_\\-]{1,49}").expect("valid regex")
}

/// Trailing text without CR, LF, NUL or BEL.
fn message_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0\x07]{0,300}").expect("valid regex")
}

fn normalise(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn fitting_text_is_untouched(text in text_strategy(), slack in 0usize..64) {
        let limit = text.len() + slack;
        prop_assert_eq!(wrap_lines(&[text.as_str()], limit), vec![text.clone()]);
    }

    #[test]
    fn wrapped_lines_fit_and_keep_words(text in text_strategy(), limit in 16usize..200) {
        let wrapped = wrap_lines(&[text.as_str()], limit);
        for line in &wrapped {
            prop_assert!(line.len() <= limit, "{:?} longer than {}", line, limit);
        }
        prop_assert_eq!(normalise(&wrapped.join(" ")), normalise(&text));
    }

    #[test]
    fn parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..600)) {
        let cp1251 = Charset::for_label("windows-1251");
        let _ = Message::parse(Bytes::from(bytes.clone()), None);
        let _ = Message::parse(Bytes::from(bytes), cp1251);
    }

    #[test]
    fn privmsg_round_trip(
        nick in nickname_strategy(),
        channel in channel_strategy(),
        text in message_text_strategy(),
    ) {
        let line = format!(":{}!u@host PRIVMSG {} :{}", nick, channel, text);
        let msg = Message::parse(Bytes::from(line.clone()), None).unwrap();
        prop_assert_eq!(msg.nick(), nick);
        prop_assert_eq!(msg.param(0).unwrap(), channel.as_str());
        prop_assert_eq!(msg.text().unwrap(), text.as_str());
        prop_assert_eq!(msg.to_bytes(), format!("{}\r\n", line).into_bytes());
    }
}
