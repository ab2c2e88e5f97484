//! IRC messages.
//!
//! A [`Message`] keeps the prefix and parameters as byte slices of the frame
//! it was parsed from, together with the [`Encoding`] chosen for that frame.
//! Text accessors decode on demand, so a legacy-charset line is never
//! re-encoded on its way back out.
//!
//! # Parsing
//!
//! ```
//! use slirc_client::Message;
//!
//! let msg: Message = ":demsh!~demsh@12a8e790 PRIVMSG #ircfw-test :heyo people!"
//!     .parse()
//!     .unwrap();
//! assert_eq!(msg.prefix().as_deref(), Some("demsh!~demsh@12a8e790"));
//! assert_eq!(msg.nick(), "demsh");
//! assert_eq!(msg.command(), "PRIVMSG");
//! assert_eq!(msg.params(), vec!["#ircfw-test", "heyo people!"]);
//! ```

mod nom_parser;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use tokio::time::Instant;

use self::nom_parser::{parse_line, TrailingRule};
use crate::charset::{is_utf8, Charset, Encoding};
use crate::encode::IrcEncode;
use crate::error::ProtocolError;
use crate::response::Response;
use crate::util::pop;
use crate::validation::{has_nul, validate_line};

/// A single IRC protocol line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    prefix: Option<Bytes>,
    command: String,
    params: Vec<Bytes>,
    encoding: Encoding,
    deadline: Option<Instant>,
}

impl Message {
    /// Parse one frame (line terminator already stripped).
    ///
    /// With a legacy `charset` configured, a frame that is not valid UTF-8 is
    /// tagged [`Encoding::Legacy`] and decoded through that table.
    pub fn parse(line: Bytes, charset: Option<Charset>) -> Result<Self, ProtocolError> {
        if line.is_empty() {
            return Err(ProtocolError::MalformedLine("empty line".to_string()));
        }
        if has_nul(&line) {
            return Err(ProtocolError::MalformedLine("line contains NUL".to_string()));
        }

        let encoding = Encoding::detect(&line, charset);
        validate_line(&encoding.decode(&line))?;

        let rule = if encoding.is_legacy() {
            TrailingRule::Colon
        } else {
            TrailingRule::SpaceColon
        };
        let parsed = parse_line(&line, rule)
            .ok_or_else(|| ProtocolError::MalformedLine(encoding.decode(&line).into_owned()))?;

        Ok(Self {
            prefix: parsed.prefix.map(|p| line.slice_ref(p)),
            command: encoding.decode(parsed.command).into_owned(),
            params: parsed.params.iter().map(|p| line.slice_ref(p)).collect(),
            encoding,
            deadline: None,
        })
    }

    /// Build an outbound UTF-8 message.
    pub fn new<I, S>(command: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: None,
            command: command.to_string(),
            params: params.into_iter().map(|p| Bytes::from(p.into())).collect(),
            encoding: Encoding::Utf8,
            deadline: None,
        }
    }

    /// Build an outbound message, encoding every parameter through `charset`
    /// when one is configured.
    ///
    /// The message is tagged legacy only if some encoded parameter is not
    /// valid UTF-8; pure ASCII text stays on the UTF-8 variant.
    pub fn outbound<S: AsRef<str>>(command: &str, params: &[S], charset: Option<Charset>) -> Self {
        let params = params
            .iter()
            .map(|p| match charset {
                Some(charset) => Bytes::from(charset.encode(p.as_ref())),
                None => Bytes::copy_from_slice(p.as_ref().as_bytes()),
            })
            .collect();
        Self::from_raw_params(command, params, charset)
    }

    /// Build an outbound message from already encoded parameters.
    pub fn from_raw_params(command: &str, params: Vec<Bytes>, charset: Option<Charset>) -> Self {
        let encoding = match charset {
            Some(charset) if params.iter().any(|p| !is_utf8(p)) => Encoding::Legacy(charset),
            _ => Encoding::Utf8,
        };
        Self {
            prefix: None,
            command: command.to_string(),
            params,
            encoding,
            deadline: None,
        }
    }

    /// Attach a source prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(Bytes::copy_from_slice(prefix.as_bytes()));
        self
    }

    /// Attach a send deadline. The write task drops the message once it passes.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// The command, e.g. `PRIVMSG` or `001`.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The numeric reply, if the command is a known three digit code.
    pub fn response(&self) -> Option<Response> {
        self.command.parse().ok()
    }

    /// Decoded prefix without the leading `:`.
    pub fn prefix(&self) -> Option<Cow<'_, str>> {
        self.prefix.as_deref().map(|p| self.encoding.decode(p))
    }

    /// Nick portion of the prefix (everything before `!`), or empty.
    pub fn nick(&self) -> String {
        match self.prefix() {
            Some(prefix) => pop(&prefix, '!').0.to_string(),
            None => String::new(),
        }
    }

    /// Decoded parameter `idx`.
    pub fn param(&self, idx: usize) -> Option<Cow<'_, str>> {
        self.params.get(idx).map(|p| self.encoding.decode(p))
    }

    /// All decoded parameters.
    pub fn params(&self) -> Vec<Cow<'_, str>> {
        self.params.iter().map(|p| self.encoding.decode(p)).collect()
    }

    /// Number of parameters.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Message text: the second parameter.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.param(1)
    }

    /// The parameter that names the channel this line concerns.
    ///
    /// RPL_TOPIC carries it in position 1 and RPL_NAMREPLY in position 2;
    /// every other command in position 0.
    pub fn channel_name(&self) -> Option<Cow<'_, str>> {
        let idx = match self.response() {
            Some(Response::RPL_TOPIC) => 1,
            Some(Response::RPL_NAMREPLY) => 2,
            _ => 0,
        };
        self.param(idx)
    }

    /// How this message's bytes are interpreted.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether this message is on the legacy byte variant.
    pub fn is_legacy(&self) -> bool {
        self.encoding.is_legacy()
    }

    /// Send deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Raw prefix bytes.
    pub fn raw_prefix(&self) -> Option<&[u8]> {
        self.prefix.as_deref()
    }

    /// Raw parameter bytes.
    pub fn raw_params(&self) -> &[Bytes] {
        &self.params
    }

    /// Wire form including CRLF.
    pub fn export(&self) -> Vec<u8> {
        self.to_bytes()
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        Self::parse(Bytes::copy_from_slice(line.as_bytes()), None)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.to_bytes();
        let line = line.strip_suffix(b"\r\n").unwrap_or(&line);
        f.write_str(&self.encoding.decode(line))
    }
}
