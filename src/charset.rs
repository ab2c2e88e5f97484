//! Character-set strategies for wire bytes.
//!
//! A connection either speaks strict UTF-8 or UTF-8 with a legacy single-byte
//! fallback. The fallback table comes from `encoding_rs`; this module only
//! restricts it to single-byte encodings and exposes the two directions the
//! codec needs.
//!
//! Every [`Message`](crate::Message) carries an [`Encoding`] chosen per line:
//! bytes stay canonical and are decoded only when a textual accessor runs.

use std::borrow::Cow;
use std::fmt;

use encoding::Encoding as EncodingTable;

/// Byte substituted for characters the legacy table cannot represent.
const UNMAPPABLE: u8 = b'?';

/// A single-byte legacy character map, e.g. `windows-1251` or `koi8-r`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    table: &'static EncodingTable,
}

impl Charset {
    /// Look up a charset by its WHATWG label.
    ///
    /// Returns `None` for unknown labels and for encodings that are not
    /// single-byte (UTF-8, UTF-16, the CJK multi-byte families).
    ///
    /// ```
    /// use slirc_client::Charset;
    ///
    /// assert!(Charset::for_label("windows-1251").is_some());
    /// assert!(Charset::for_label("cp1251").is_some());
    /// assert!(Charset::for_label("utf-8").is_none());
    /// assert!(Charset::for_label("shift_jis").is_none());
    /// ```
    pub fn for_label(label: &str) -> Option<Self> {
        let table = EncodingTable::for_label(label.trim().as_bytes())?;
        if !table.is_single_byte() {
            return None;
        }
        Some(Self { table })
    }

    /// Canonical name of the underlying table.
    pub fn name(&self) -> &'static str {
        self.table.name()
    }

    /// Decode raw bytes through the table. Every byte maps to exactly one char.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        self.table.decode_without_bom_handling(bytes).0
    }

    /// Encode text through the table, one byte per char.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            if ch.is_ascii() {
                out.push(ch as u8);
                continue;
            }
            let (bytes, _, had_errors) = self.table.encode(ch.encode_utf8(&mut buf));
            match bytes.as_ref() {
                [byte] if !had_errors => out.push(*byte),
                _ => out.push(UNMAPPABLE),
            }
        }
        out
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.name()).finish()
    }
}

/// How the bytes of one message are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Bytes are validated UTF-8.
    Utf8,
    /// Bytes go through a legacy single-byte table.
    Legacy(Charset),
}

impl Encoding {
    /// Pick the encoding for an inbound line: legacy only if a charset is
    /// configured and the line is not valid UTF-8.
    pub fn detect(line: &[u8], charset: Option<Charset>) -> Self {
        match charset {
            Some(charset) if !is_utf8(line) => Encoding::Legacy(charset),
            _ => Encoding::Utf8,
        }
    }

    /// Decode bytes to text.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes),
            Encoding::Legacy(charset) => charset.decode(bytes),
        }
    }

    /// Whether this is the legacy byte variant.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Encoding::Legacy(_))
    }
}

/// Whether `bytes` are valid UTF-8.
#[inline]
pub fn is_utf8(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok()
}
