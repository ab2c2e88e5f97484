//! Wire encoding for outbound messages.
//!
//! [`IrcEncode`] writes a message straight into any [`Write`] implementor, so
//! the write task can encode into the framed sink's `BytesMut` without an
//! intermediate `String`.
//!
//! # Example
//!
//! ```
//! use slirc_client::encode::IrcEncode;
//! use slirc_client::Message;
//!
//! let msg = Message::new("PRIVMSG", ["#channel", "Hello!"]);
//! assert_eq!(msg.to_bytes(), b"PRIVMSG #channel :Hello!\r\n");
//!
//! let ping = Message::new("PING", ["irc.demsh.org"]);
//! assert_eq!(ping.to_bytes(), b"PING :irc.demsh.org\r\n");
//! ```

use std::io::{self, Write};

mod message;

/// A trait for encoding IRC protocol elements directly to a byte stream.
pub trait IrcEncode {
    /// Encode this value to the given writer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write fails.
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<usize>;

    /// Encode this value to a new `Vec<u8>`.
    #[must_use]
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(512); // IRC max line length
        let _ = self.encode(&mut buf);
        buf
    }
}

/// Commands whose parameters are always sent as one space-joined trailing argument.
const JOINED_TRAILING: &[&str] = &["PING", "PONG", "NICK", "QUIT"];

/// Whether `command` sends its parameters joined into a single trailing argument.
#[inline]
pub(crate) fn joins_trailing(command: &str) -> bool {
    JOINED_TRAILING
        .iter()
        .any(|c| c.eq_ignore_ascii_case(command))
}

/// Write a command whose last argument is always colon-prefixed.
pub(crate) fn write_cmd_freeform<W: Write, P: AsRef<[u8]>>(
    w: &mut W,
    cmd: &[u8],
    args: &[P],
) -> io::Result<usize> {
    w.write_all(cmd)?;
    let mut written = cmd.len();

    let Some((last, middle)) = args.split_last() else {
        return Ok(written);
    };

    for arg in middle {
        w.write_all(b" ")?;
        w.write_all(arg.as_ref())?;
        written += 1 + arg.as_ref().len();
    }

    w.write_all(b" :")?;
    w.write_all(last.as_ref())?;
    written += 2 + last.as_ref().len();
    Ok(written)
}

/// Write a command with every argument joined by spaces into the trailing one.
pub(crate) fn write_cmd_joined<W: Write, P: AsRef<[u8]>>(
    w: &mut W,
    cmd: &[u8],
    args: &[P],
) -> io::Result<usize> {
    w.write_all(cmd)?;
    let mut written = cmd.len();

    if args.is_empty() {
        return Ok(written);
    }

    w.write_all(b" :")?;
    written += 2;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            w.write_all(b" ")?;
            written += 1;
        }
        w.write_all(arg.as_ref())?;
        written += arg.as_ref().len();
    }
    Ok(written)
}

/// Cut `line` at its first embedded CR or LF.
#[inline]
pub(crate) fn sanitize(line: &mut Vec<u8>) {
    if let Some(pos) = line.iter().position(|&b| b == b'\r' || b == b'\n') {
        line.truncate(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_cmd_freeform() {
        let mut buf = Vec::new();
        let n = write_cmd_freeform(&mut buf, b"PRIVMSG", &["#chan", "hello world"]).unwrap();
        assert_eq!(buf, b"PRIVMSG #chan :hello world");
        assert_eq!(n, buf.len());

        let mut buf = Vec::new();
        write_cmd_freeform(&mut buf, b"JOIN", &["#chan"]).unwrap();
        assert_eq!(buf, b"JOIN :#chan");

        let mut buf = Vec::new();
        write_cmd_freeform::<_, &str>(&mut buf, b"QUIT", &[]).unwrap();
        assert_eq!(buf, b"QUIT");
    }

    #[test]
    fn test_write_cmd_joined() {
        let mut buf = Vec::new();
        let n = write_cmd_joined(&mut buf, b"PONG", &["a", "b c"]).unwrap();
        assert_eq!(buf, b"PONG :a b c");
        assert_eq!(n, buf.len());
    }

    #[test]
    fn test_joins_trailing() {
        assert!(joins_trailing("PING"));
        assert!(joins_trailing("quit"));
        assert!(!joins_trailing("PRIVMSG"));
    }

    #[test]
    fn test_sanitize() {
        let mut line = b"PRIVMSG #a :hi\r\nQUIT :injected".to_vec();
        sanitize(&mut line);
        assert_eq!(line, b"PRIVMSG #a :hi");

        let mut line = b"PING :x".to_vec();
        sanitize(&mut line);
        assert_eq!(line, b"PING :x");
    }
}
