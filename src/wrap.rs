//! Splitting chat text so every line fits a message budget.
//!
//! Lines are broken at the last space inside the budget, or hard-cut at a
//! UTF-8 boundary when a single word is longer than the budget. A leading
//! mIRC color is carried onto each continuation line.

use crate::colors::leading_color;
use crate::util::{text_len, truncate_utf8_safe};

/// Upper bound on pieces produced from one line.
pub const RECURSION_LIMIT: usize = 1000;

/// Bytes reserved for the color sequence re-emitted on continuation lines.
const COLOR_OVERHEAD: usize = 2;

/// Wrap `lines` so that each produced line is at most `limit` bytes.
///
/// When the total text already fits, the lines are returned untouched.
///
/// ```
/// use slirc_client::wrap::wrap_lines;
///
/// assert_eq!(wrap_lines(&["short"], 64), vec!["short".to_string()]);
/// assert_eq!(
///     wrap_lines(&["one two three"], 8),
///     vec!["one two".to_string(), "three".to_string()]
/// );
/// ```
pub fn wrap_lines<S: AsRef<str>>(lines: &[S], limit: usize) -> Vec<String> {
    if text_len(lines) <= limit {
        return lines.iter().map(|l| l.as_ref().to_string()).collect();
    }
    lines
        .iter()
        .flat_map(|l| split_by_len(l.as_ref(), limit))
        .collect()
}

/// Split a single line into pieces of at most `limit` bytes.
///
/// Surrounding whitespace of each piece is trimmed. An empty line or a zero
/// limit produces nothing.
pub fn split_by_len(line: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = line.trim().to_string();

    for _ in 0..RECURSION_LIMIT {
        if limit == 0 || rest.is_empty() {
            break;
        }

        let color = leading_color(&rest);
        let budget = match color {
            Some(_) if limit <= COLOR_OVERHEAD => break,
            Some(_) => limit - COLOR_OVERHEAD,
            None => limit,
        };

        if rest.len() <= budget {
            pieces.push(rest);
            return pieces;
        }

        // A piece must carry text beyond the re-emitted color
        let floor = color.map_or(0, |c| c.sequence().len());
        let head = truncate_utf8_safe(&rest, budget);
        let cut = match head.rfind(' ') {
            Some(idx) if idx > floor => idx,
            _ => head.len(),
        };
        if cut <= floor {
            break;
        }

        let piece = rest[..cut].trim_end().to_string();
        let tail = rest[cut..].trim_start();
        let next = match color {
            Some(color) if !tail.is_empty() => color.sequence() + tail,
            _ => tail.to_string(),
        };

        if piece.len() > floor {
            pieces.push(piece);
        }
        rest = next;
    }

    pieces
}
