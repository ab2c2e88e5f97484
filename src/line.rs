//! Line-based codec for tokio.
//!
//! Frames are newline-terminated. The decoder yields raw line bytes with the
//! terminator (`\n` or `\r\n`) removed and skips empty lines; decoding to text
//! happens later so a malformed line never tears the stream down. The encoder
//! writes a [`Message`]'s wire form.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::encode::IrcEncode;
use crate::error::ProtocolError;
use crate::message::Message;
use crate::util::MAX_MESSAGE_SIZE;

/// Line-based codec that handles newline-terminated messages.
///
/// By default, lines are limited to 512 bytes (IRC standard).
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length, terminator included
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the standard 512 byte limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_MESSAGE_SIZE)
    }

    /// Create a codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Maximum accepted line length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_terminator(mut line: BytesMut) -> Bytes {
    if line.last() == Some(&b'\n') {
        line.truncate(line.len() - 1);
    }
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, ProtocolError> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                // No complete line yet - remember where we stopped
                self.next_index = src.len();
                if src.len() >= self.max_len {
                    return Err(ProtocolError::MessageTooLong {
                        actual: src.len(),
                        limit: self.max_len,
                    });
                }
                return Ok(None);
            };

            let end = self.next_index + offset + 1;
            self.next_index = 0;
            if end > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: end,
                    limit: self.max_len,
                });
            }

            let line = strip_terminator(src.split_to(end));
            if !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, ProtocolError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if src.is_empty() {
            return Ok(None);
        }
        // Unterminated final line
        let line = strip_terminator(src.split());
        Ok((!line.is_empty()).then_some(line))
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        msg.encode(&mut dst.writer())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_crlf_and_lf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PING :a\r\nPING :b\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING :a"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING :b"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_skips_empty_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"\r\n\nPING :x\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING :x"[..]);
    }

    #[test]
    fn test_decode_partial() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PING"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b" :x\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING :x"[..]);
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::new();
        let mut line = vec![b'a'; 600];
        line.extend_from_slice(b"\r\n");
        let mut buf = BytesMut::from(&line[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::MessageTooLong { limit: 512, .. })
        ));
    }

    #[test]
    fn test_decode_exact_limit() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from(&b"PING :abc\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"PING :abc"[..]);
    }

    #[test]
    fn test_decode_eof_unterminated() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"ERROR :Closing link"[..]);
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap().unwrap(),
            &b"ERROR :Closing link"[..]
        );
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_keeps_legacy_bytes() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #a :\xEF\xF0\r\n"[..]);
        assert_eq!(
            codec.decode(&mut buf).unwrap().unwrap(),
            &b"PRIVMSG #a :\xEF\xF0"[..]
        );
    }

    #[test]
    fn test_encode_message() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Message::new("NICK", ["ircfw"]), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"NICK :ircfw\r\n");
    }
}
