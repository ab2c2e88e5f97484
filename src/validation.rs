//! Validation of nicknames, channel names and raw lines.
//!
//! These are pure predicates used by the codec (line validation), by the
//! dispatch table (deciding whether a target is a nick or a channel) and by
//! the public API (rejecting caller input before anything hits the wire).
//!
//! The rules follow RFC 1459 §1.3 as servers in the wild apply them:
//!
//! - Nicknames: 1-9 ASCII bytes, no `,`, space, NUL or BEL, and not starting
//!   with a channel prefix (`#` or `&`).
//! - Channel names: 1-200 ASCII bytes, no `,`, space, NUL or BEL, and starting
//!   with `#` or `&`.
//! - Lines: no NUL or BEL anywhere.

use crate::error::ProtocolError;

/// Maximum nickname length in bytes.
pub const NICK_LENGTH_LIMIT: usize = 9;

/// Maximum channel name length in bytes.
pub const CHAN_LENGTH_LIMIT: usize = 200;

/// Characters never valid inside a nickname or channel name.
const INVALID_NAME_CHARS: &[char] = &[',', ' ', '\x00', '\x07'];

/// Characters never valid inside an IRC line.
pub const FORBIDDEN_LINE_CHARS: &[char] = &['\x00', '\x07'];

/// Valid channel prefix characters.
const CHANNEL_PREFIXES: &[char] = &['#', '&'];

/// Result of validation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The input was empty.
    Empty,
    /// The input was too long.
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length.
        actual: usize,
    },
    /// The input contains bytes outside of ASCII.
    NonAscii,
    /// Invalid character found at position.
    InvalidChar {
        /// The invalid character.
        ch: char,
        /// Position in the string.
        position: usize,
    },
    /// Missing required channel prefix.
    MissingPrefix,
    /// Invalid first character.
    InvalidFirstChar {
        /// The invalid character.
        ch: char,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Empty => write!(f, "input is empty"),
            ValidationError::TooLong { max, actual } => {
                write!(f, "input too long: {} bytes (max {})", actual, max)
            }
            ValidationError::NonAscii => write!(f, "input is not ASCII"),
            ValidationError::InvalidChar { ch, position } => {
                write!(f, "invalid character {:?} at position {}", ch, position)
            }
            ValidationError::MissingPrefix => write!(f, "does not start with # or &"),
            ValidationError::InvalidFirstChar { ch } => {
                write!(f, "invalid first character: {:?}", ch)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn check_name(name: &str, max_len: usize) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    if name.len() > max_len {
        return Err(ValidationError::TooLong {
            max: max_len,
            actual: name.len(),
        });
    }
    if !name.is_ascii() {
        return Err(ValidationError::NonAscii);
    }
    if let Some((position, ch)) = name
        .char_indices()
        .find(|(_, c)| INVALID_NAME_CHARS.contains(c))
    {
        return Err(ValidationError::InvalidChar { ch, position });
    }
    Ok(())
}

/// Validate an IRC nickname.
///
/// # Examples
///
/// ```
/// use slirc_client::validation::validate_nick;
///
/// assert!(validate_nick("ircfw").is_ok());
/// assert!(validate_nick("").is_err());
/// assert!(validate_nick("xxxxxxxxxx").is_err()); // 10 bytes
/// assert!(validate_nick("#abc").is_err());
/// assert!(validate_nick("a b").is_err());
/// ```
pub fn validate_nick(nick: &str) -> Result<(), ValidationError> {
    check_name(nick, NICK_LENGTH_LIMIT)?;
    match nick.chars().next() {
        Some(ch) if CHANNEL_PREFIXES.contains(&ch) => Err(ValidationError::InvalidFirstChar { ch }),
        _ => Ok(()),
    }
}

/// Validate an IRC channel name.
///
/// # Examples
///
/// ```
/// use slirc_client::validation::validate_channel;
///
/// assert!(validate_channel("#mania").is_ok());
/// assert!(validate_channel("&local").is_ok());
/// assert!(validate_channel("mania").is_err());
/// assert!(validate_channel("#a,#b").is_err());
/// assert!(validate_channel("#мания").is_err());
/// ```
pub fn validate_channel(channel: &str) -> Result<(), ValidationError> {
    check_name(channel, CHAN_LENGTH_LIMIT)?;
    if !channel.starts_with(CHANNEL_PREFIXES) {
        return Err(ValidationError::MissingPrefix);
    }
    Ok(())
}

/// Reject a decoded line containing NUL or BEL.
pub fn validate_line(line: &str) -> Result<(), ProtocolError> {
    match line.chars().find(|c| FORBIDDEN_LINE_CHARS.contains(c)) {
        Some(ch) => Err(ProtocolError::IllegalControlChar(ch)),
        None => Ok(()),
    }
}

/// Check whether raw bytes contain a NUL.
#[inline]
pub fn has_nul(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}

/// Check if a string is a valid nickname.
#[inline]
pub fn is_nick(nick: &str) -> bool {
    validate_nick(nick).is_ok()
}

/// Check if a string is a valid channel name.
#[inline]
pub fn is_channel(channel: &str) -> bool {
    validate_channel(channel).is_ok()
}
