//! Numeric replies the client reacts to.
//!
//! Only the numerics with a handler (or a deliberate no-op) are listed;
//! anything else parses as an unknown command and is logged.

use std::str::FromStr;

/// IRC numeric reply codes.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    /// `001 <nick> :Welcome to the Internet Relay Network <nick>!<user>@<host>`
    RPL_WELCOME = 1,
    /// `004 <nick> <servername> <version> <available user modes> <available channel modes>`
    RPL_MYINFO = 4,
    /// `005 <nick> <token>[=<value>]... :are supported by this server`
    RPL_ISUPPORT = 5,
    /// `275 <nick> <target> :is using a secure connection`
    RPL_WHOISSSL = 275,
    /// `311 <nick> <target> <user> <host> * :<realname>`
    RPL_WHOISUSER = 311,
    /// `312 <nick> <target> <server> :<server info>`
    RPL_WHOISSERVER = 312,
    /// `319 <nick> <target> :{[@|+]<channel>}`
    RPL_WHOISCHANNELS = 319,
    /// `332 <nick> <channel> :<topic>`
    RPL_TOPIC = 332,
    /// `333 <nick> <channel> <setter> <unix time>`
    RPL_TOPICWHOTIME = 333,
    /// `353 <nick> <symbol> <channel> :[prefix]<nick>{ [prefix]<nick>}`
    RPL_NAMREPLY = 353,
    /// `372 <nick> :- <text>`
    RPL_MOTD = 372,
    /// `375 <nick> :- <server> Message of the day -`
    RPL_MOTDSTART = 375,
    /// `376 <nick> :End of MOTD command`
    RPL_ENDOFMOTD = 376,
    /// `396 <nick> <host> :is now your displayed host`
    RPL_HOSTHIDDEN = 396,
    /// `403 <nick> <channel> :No such channel`
    ERR_NOSUCHCHANNEL = 403,
    /// `405 <nick> <channel> :You have joined too many channels`
    ERR_TOOMANYCHANNELS = 405,
    /// `471 <nick> <channel> :Cannot join channel (+l)`
    ERR_CHANNELISFULL = 471,
    /// `473 <nick> <channel> :Cannot join channel (+i)`
    ERR_INVITEONLYCHAN = 473,
    /// `474 <nick> <channel> :Cannot join channel (+b)`
    ERR_BANNEDFROMCHAN = 474,
    /// `475 <nick> <channel> :Cannot join channel (+k)`
    ERR_BADCHANNELKEY = 475,
}

impl Response {
    /// Returns the numeric code as u16
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Creates a Response from a numeric code
    pub fn from_code(code: u16) -> Option<Response> {
        Some(match code {
            1 => Response::RPL_WELCOME,
            4 => Response::RPL_MYINFO,
            5 => Response::RPL_ISUPPORT,
            275 => Response::RPL_WHOISSSL,
            311 => Response::RPL_WHOISUSER,
            312 => Response::RPL_WHOISSERVER,
            319 => Response::RPL_WHOISCHANNELS,
            332 => Response::RPL_TOPIC,
            333 => Response::RPL_TOPICWHOTIME,
            353 => Response::RPL_NAMREPLY,
            372 => Response::RPL_MOTD,
            375 => Response::RPL_MOTDSTART,
            376 => Response::RPL_ENDOFMOTD,
            396 => Response::RPL_HOSTHIDDEN,
            403 => Response::ERR_NOSUCHCHANNEL,
            405 => Response::ERR_TOOMANYCHANNELS,
            471 => Response::ERR_CHANNELISFULL,
            473 => Response::ERR_INVITEONLYCHAN,
            474 => Response::ERR_BANNEDFROMCHAN,
            475 => Response::ERR_BADCHANNELKEY,
            _ => return None,
        })
    }

    /// Check if this is an error response (4xx, 5xx)
    #[inline]
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }

    /// Check if this reply refuses a JOIN.
    #[inline]
    pub fn is_join_error(&self) -> bool {
        matches!(
            self,
            Response::ERR_NOSUCHCHANNEL
                | Response::ERR_TOOMANYCHANNELS
                | Response::ERR_CHANNELISFULL
                | Response::ERR_INVITEONLYCHAN
                | Response::ERR_BANNEDFROMCHAN
                | Response::ERR_BADCHANNELKEY
        )
    }

    /// Check if this is a WHOIS reply.
    #[inline]
    pub fn is_whois_related(&self) -> bool {
        matches!(
            self,
            Response::RPL_WHOISSSL
                | Response::RPL_WHOISUSER
                | Response::RPL_WHOISSERVER
                | Response::RPL_WHOISCHANNELS
        )
    }
}

impl FromStr for Response {
    type Err = ParseResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 3 {
            return Err(ParseResponseError::InvalidFormat);
        }
        let code: u16 = s.parse().map_err(|_| ParseResponseError::InvalidFormat)?;
        Response::from_code(code).ok_or(ParseResponseError::UnknownCode(code))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.code())
    }
}

/// Error when parsing a response code
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseResponseError {
    /// The string was not a three digit number
    InvalidFormat,
    /// The numeric code is not a known response
    UnknownCode(u16),
}

impl std::fmt::Display for ParseResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid response code format"),
            Self::UnknownCode(code) => write!(f, "unknown response code: {}", code),
        }
    }
}

impl std::error::Error for ParseResponseError {}
