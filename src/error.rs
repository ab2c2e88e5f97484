//! Error types for the IRC client core.
//!
//! [`ProtocolError`] covers the wire: framing, decoding and line validation.
//! [`ClientError`] is what the public API and [`Client::wait`](crate::Client::wait)
//! surface. Validation failures of caller input carry a
//! [`ValidationError`](crate::validation::ValidationError).

use thiserror::Error;

use crate::validation::ValidationError;

/// Convenience type alias for Results using [`ClientError`].
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Wire-level errors produced while framing or parsing lines.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the maximum message size.
    #[error("message too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Observed length, including the line terminator when present.
        actual: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// Illegal control character in a line.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),

    /// The line could not be split into prefix, command and parameters.
    #[error("malformed line: {0}")]
    MalformedLine(String),
}

/// Errors surfaced by [`Client`](crate::Client) and [`Channel`](crate::Channel).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// An inbound line was unparsable. Recovered locally; the line is dropped.
    #[error("malformed line: {0}")]
    MalformedLine(#[source] ProtocolError),

    /// A nickname supplied by the caller was rejected before any network effect.
    #[error("invalid nick {nick:?}: {cause}")]
    InvalidNick {
        /// The rejected nickname.
        nick: String,
        /// Why it was rejected.
        #[source]
        cause: ValidationError,
    },

    /// A channel name supplied by the caller was rejected before any network effect.
    #[error("invalid channel {channel:?}: {cause}")]
    InvalidChannel {
        /// The rejected channel name.
        channel: String,
        /// Why it was rejected.
        #[source]
        cause: ValidationError,
    },

    /// The server refused a JOIN (e.g. 473 invite-only).
    #[error("join {channel:?} rejected ({code}): {reason}")]
    JoinRejected {
        /// Channel that was refused.
        channel: String,
        /// Numeric reply code.
        code: u16,
        /// Server supplied reason text.
        reason: String,
    },

    /// No traffic from the server within the alive window.
    #[error("server timed out")]
    Timeout,

    /// Socket read/write failure or an oversize frame.
    #[error("transport failure: {0}")]
    Transport(#[from] ProtocolError),

    /// The server closed the connection, or an internal queue closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// A channel was killed before it finished joining.
    #[error("channel {0:?} closed")]
    ChannelClosed(String),

    /// A bounded queue stayed full past the send timeout.
    #[error("queue send timed out")]
    QueueTimeout,

    /// The caller's deadline or timeout elapsed while waiting for a JOIN.
    #[error("join {0:?} cancelled")]
    JoinCancelled(String),

    /// The configuration failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Whether this error tears the whole connection down.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout | ClientError::Transport(_) | ClientError::ConnectionClosed
        )
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Transport(ProtocolError::Io(err))
    }
}
