//! Nom-based line parser over raw bytes.
//!
//! The parser never decodes: it only locates the prefix, the command and the
//! parameter boundaries so that the owning [`Message`](super::Message) can keep
//! byte-exact slices of the original frame.

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, space1},
    combinator::{opt, verify},
    error::{context, VerboseError},
    sequence::{preceded, terminated},
    IResult,
};

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// How the trailing parameter is located when a line has middle parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TrailingRule {
    /// Split at the first `" :"`.
    SpaceColon,
    /// Split at the first `':'` anywhere in the parameter string.
    Colon,
}

/// Byte slices of one parsed line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ParsedLine<'a> {
    pub prefix: Option<&'a [u8]>,
    pub command: &'a [u8],
    pub params: Vec<&'a [u8]>,
}

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &[u8]) -> ParseResult<&[u8], &[u8]> {
    context(
        "parsing message prefix",
        preceded(char(':'), take_till1(|b: u8| b == b' ')),
    )(input)
}

/// Parse the command token. A leading `:` means the prefix had no command after it.
fn parse_command(input: &[u8]) -> ParseResult<&[u8], &[u8]> {
    context(
        "parsing IRC command",
        verify(take_till1(|b: u8| b == b' '), |cmd: &[u8]| cmd[0] != b':'),
    )(input)
}

fn parse_head(input: &[u8]) -> ParseResult<&[u8], (Option<&[u8]>, &[u8])> {
    let (input, prefix) = context(
        "parsing optional prefix",
        opt(terminated(parse_prefix, space1)),
    )(input)?;
    let (input, command) = context("parsing required command", parse_command)(input)?;
    Ok((input, (prefix, command)))
}

fn middle_tokens(middle: &[u8]) -> Vec<&[u8]> {
    middle.split(|&b| b == b' ').filter(|t| !t.is_empty()).collect()
}

/// Split a parameter string into middle tokens and an optional trailing one.
pub(crate) fn split_params(line: &[u8], rule: TrailingRule) -> Vec<&[u8]> {
    if line.is_empty() {
        return Vec::new();
    }
    if line[0] == b':' {
        return vec![&line[1..]];
    }

    let split = match rule {
        TrailingRule::SpaceColon => line
            .windows(2)
            .position(|w| w == b" :")
            .map(|idx| (idx, idx + 2)),
        TrailingRule::Colon => line.iter().position(|&b| b == b':').map(|idx| (idx, idx + 1)),
    };

    match split {
        Some((end, start)) => {
            let mut params = middle_tokens(&line[..end]);
            params.push(&line[start..]);
            params
        }
        None => middle_tokens(line),
    }
}

/// Parse a complete line (terminator already stripped) into its components.
///
/// Returns `None` when the line has no command.
pub(crate) fn parse_line(input: &[u8], rule: TrailingRule) -> Option<ParsedLine<'_>> {
    let (rest, (prefix, command)) = parse_head(input).ok()?;
    let params_str = rest.strip_prefix(b" ").unwrap_or(rest);
    Some(ParsedLine {
        prefix,
        command,
        params: split_params(params_str, rule),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let parsed = parse_line(
            b":demsh!~demsh@12a8e790 PRIVMSG #ircfw-test :heyo people!",
            TrailingRule::SpaceColon,
        )
        .unwrap();
        assert_eq!(parsed.prefix, Some(&b"demsh!~demsh@12a8e790"[..]));
        assert_eq!(parsed.command, b"PRIVMSG");
        assert_eq!(parsed.params, vec![&b"#ircfw-test"[..], b"heyo people!"]);
    }

    #[test]
    fn test_parse_without_prefix() {
        let parsed = parse_line(b"PING :irc.demsh.org", TrailingRule::SpaceColon).unwrap();
        assert_eq!(parsed.prefix, None);
        assert_eq!(parsed.command, b"PING");
        assert_eq!(parsed.params, vec![&b"irc.demsh.org"[..]]);
    }

    #[test]
    fn test_parse_no_params() {
        let parsed = parse_line(b"QUIT", TrailingRule::SpaceColon).unwrap();
        assert_eq!(parsed.command, b"QUIT");
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn test_parse_missing_command() {
        assert!(parse_line(b"", TrailingRule::SpaceColon).is_none());
        assert!(parse_line(b":prefix.only", TrailingRule::SpaceColon).is_none());
        assert!(parse_line(b":prefix ", TrailingRule::SpaceColon).is_none());
    }

    #[test]
    fn test_middle_params_collapse_spaces() {
        assert_eq!(
            split_params(b"a  b   c", TrailingRule::SpaceColon),
            vec![&b"a"[..], b"b", b"c"]
        );
    }

    #[test]
    fn test_trailing_keeps_spaces() {
        assert_eq!(
            split_params(b"#chan : spaced  out ", TrailingRule::SpaceColon),
            vec![&b"#chan"[..], b" spaced  out "]
        );
        assert_eq!(split_params(b": only", TrailingRule::SpaceColon), vec![&b" only"[..]]);
    }

    #[test]
    fn test_colon_rule_splits_at_first_colon() {
        assert_eq!(
            split_params(b"nick #chan:text", TrailingRule::Colon),
            vec![&b"nick"[..], b"#chan", b"text"]
        );
        assert_eq!(
            split_params(b"nick #chan:text", TrailingRule::SpaceColon),
            vec![&b"nick"[..], b"#chan:text"]
        );
    }
}
