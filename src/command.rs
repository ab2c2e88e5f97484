//! Inbound command classification.
//!
//! The dispatch table in [`handlers`](crate::handlers) switches on this enum
//! rather than on raw strings; parameters stay in the [`Message`].

use std::fmt;

use crate::message::Message;
use crate::response::Response;

/// The command of an inbound line.
///
/// Unknown commands are captured in the `Raw` variant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// `PING server`
    PING,
    /// `PONG server`
    PONG,
    /// `PRIVMSG target text`
    PRIVMSG,
    /// `NOTICE target text`
    NOTICE,
    /// `ERROR message`
    ERROR,
    /// `JOIN channel`
    JOIN,
    /// `NICK nickname`
    NICK,
    /// `PART channel`
    PART,
    /// `MODE target modes`
    MODE,
    /// A known numeric reply.
    Response(Response),
    /// Anything else.
    Raw(String),
}

impl Command {
    /// Classify a command token. Case-insensitive.
    pub fn new(name: &str) -> Self {
        if let Ok(response) = name.parse::<Response>() {
            return Command::Response(response);
        }
        match name.to_ascii_uppercase().as_str() {
            "PING" => Command::PING,
            "PONG" => Command::PONG,
            "PRIVMSG" => Command::PRIVMSG,
            "NOTICE" => Command::NOTICE,
            "ERROR" => Command::ERROR,
            "JOIN" => Command::JOIN,
            "NICK" => Command::NICK,
            "PART" => Command::PART,
            "MODE" => Command::MODE,
            _ => Command::Raw(name.to_string()),
        }
    }
}

impl From<&Message> for Command {
    fn from(msg: &Message) -> Self {
        Command::new(msg.command())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PING => f.write_str("PING"),
            Command::PONG => f.write_str("PONG"),
            Command::PRIVMSG => f.write_str("PRIVMSG"),
            Command::NOTICE => f.write_str("NOTICE"),
            Command::ERROR => f.write_str("ERROR"),
            Command::JOIN => f.write_str("JOIN"),
            Command::NICK => f.write_str("NICK"),
            Command::PART => f.write_str("PART"),
            Command::MODE => f.write_str("MODE"),
            Command::Response(resp) => write!(f, "{}", resp),
            Command::Raw(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(Command::new("PRIVMSG"), Command::PRIVMSG);
        assert_eq!(Command::new("privmsg"), Command::PRIVMSG);
        assert_eq!(Command::new("005"), Command::Response(Response::RPL_ISUPPORT));
        assert_eq!(Command::new("999"), Command::Raw("999".to_string()));
        assert_eq!(Command::new("CAP"), Command::Raw("CAP".to_string()));
    }

    #[test]
    fn test_from_message() {
        let msg: Message = ":srv 473 ircfw #secret :Cannot join channel (+i)".parse().unwrap();
        assert_eq!(
            Command::from(&msg),
            Command::Response(Response::ERR_INVITEONLYCHAN)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::new("001").to_string(), "001");
        assert_eq!(Command::new("join").to_string(), "JOIN");
    }
}
