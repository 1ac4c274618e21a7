//! Deck-list line parsing.
//!
//! Two line shapes are understood:
//!
//! - *import* lines, written by people or exported by deck builders:
//!   `4 Lightning Bolt`, `2 Lightning Bolt (2ED)`, `1 Brainstorm (ICE) 61`
//! - *canonical* lines, written by [`DeckAggregate::serialize`](crate::DeckAggregate::serialize):
//!   `<quantity> <card id>`
//!
//! Parsing is pure. Blank lines yield `Ok(None)`; a line that is
//! structurally unusable yields [`DecklistError::Parse`].

use crate::error::{DecklistError, Result};
use crate::models::{CardRef, DeckLineEntry};

/// Section headers emitted by common deck-list exporters.
const SECTION_HEADERS: &[&str] = &[
    "deck",
    "main",
    "maindeck",
    "mainboard",
    "sideboard",
    "commander",
    "companion",
    "maybeboard",
];

/// Parse a human-authored import line.
///
/// The quantity is mandatory and never assumed. A `(SET)` suffix goes to
/// `set_hint`, a collector number following it to `collector_number`;
/// neither is part of the card name.
pub fn parse_import_line(line: &str) -> Result<Option<DeckLineEntry>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || is_comment(trimmed) || is_section_header(trimmed) {
        return Ok(None);
    }

    let (head, rest) = split_first_token(trimmed);
    let quantity =
        parse_quantity(head).ok_or_else(|| parse_error(trimmed, "missing leading quantity"))?;
    if quantity == 0 {
        return Err(parse_error(trimmed, "quantity must be at least 1"));
    }

    let (name, set_hint, collector_number) = split_set_suffix(rest);
    if name.is_empty() {
        return Err(parse_error(trimmed, "missing card name"));
    }

    Ok(Some(DeckLineEntry {
        quantity,
        card: CardRef::Name(name.to_string()),
        set_hint,
        collector_number,
    }))
}

/// Parse a persisted `"<quantity> <id>"` line.
///
/// A missing or unreadable quantity defaults to 1 so one damaged line does
/// not fail a whole deck load. A line without an identifier is an error.
pub fn parse_canonical_line(line: &str) -> Result<Option<DeckLineEntry>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut tokens = trimmed.split_whitespace();
    let head = tokens.next().unwrap_or_default();
    let id = tokens
        .next()
        .ok_or_else(|| parse_error(trimmed, "missing card identifier"))?;

    let quantity = head.parse::<u32>().ok().filter(|q| *q >= 1).unwrap_or(1);

    Ok(Some(DeckLineEntry {
        quantity,
        card: CardRef::Id(id.to_string()),
        set_hint: None,
        collector_number: None,
    }))
}

fn parse_error(line: &str, reason: &str) -> DecklistError {
    DecklistError::Parse {
        line: line.to_string(),
        reason: reason.to_string(),
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with('#')
}

fn is_section_header(line: &str) -> bool {
    let word = line.trim_end_matches(':').trim().to_ascii_lowercase();
    SECTION_HEADERS.contains(&word.as_str())
}

fn split_first_token(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    }
}

/// `4` and `4x` both read as 4.
fn parse_quantity(token: &str) -> Option<u32> {
    let digits = token
        .strip_suffix('x')
        .or_else(|| token.strip_suffix('X'))
        .unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Split `Name (SET) 123` into its parts.
///
/// Only the last parenthesised group can be a set, and only when it holds a
/// set code and either ends the line or is followed by one collector number.
/// Any other parentheses are part of the card name.
fn split_set_suffix(rest: &str) -> (&str, Option<String>, Option<String>) {
    let whole = (rest.trim(), None, None);
    let Some(open) = rest.rfind('(') else {
        return whole;
    };
    let name = rest[..open].trim();
    let after_open = &rest[open + 1..];

    let Some(close) = after_open.find(')') else {
        // Truncated export line such as `1 Opt (XLN`.
        return if is_set_code(after_open.trim()) {
            (name, None, None)
        } else {
            whole
        };
    };
    let set = after_open[..close].trim();
    let mut tail = after_open[close + 1..].split_whitespace();
    let collector_number = tail.next().map(str::to_string);
    if tail.next().is_some() || !is_set_code(set) {
        return whole;
    }

    (name, Some(set.to_string()), collector_number)
}

/// Set codes are short and alphanumeric: `2ED`, `M10`, `PLST`.
fn is_set_code(token: &str) -> bool {
    (2..=6).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
