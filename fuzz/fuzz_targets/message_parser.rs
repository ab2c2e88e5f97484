//! Fuzz target for IRC line parsing
//!
//! Feeds arbitrary bytes to the parser with and without a legacy charset and
//! checks that a parsed message exports without panicking.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use slirc_client::{Charset, IrcEncode, Message};

fuzz_target!(|data: &[u8]| {
    // Longer lines never reach the parser; the framing codec rejects them
    if data.is_empty() || data.len() > 512 {
        return;
    }

    for charset in [None, Charset::for_label("windows-1251")] {
        if let Ok(msg) = Message::parse(Bytes::copy_from_slice(data), charset) {
            let _ = msg.params();
            let _ = msg.nick();
            let _ = msg.to_bytes();
        }
    }
});
