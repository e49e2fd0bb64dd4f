//! Configuration file lines.

use crate::Error;

/// Assignment separator.
pub const SEPARATOR: char = '=';

/// Comment marker at the start of a line.
pub const COMMENT: char = '#';

/// Prefix of every emitted configuration name.
pub const PREFIX: &str = "CONFIG_";

/// A `NAME=value` line of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    /// Name without prefix.
    pub name: &'a str,
    /// Raw value.
    pub raw: &'a str,
}

/// Classified value of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    /// `y`: enabled.
    Yes,
    /// `m`: built as module.
    Module,
    /// `n`: disabled.
    No,
    /// Any other literal value.
    Other(&'a str),
}

impl<'a> Assignment<'a> {
    /// Classifies the value.
    pub fn value(&self) -> Value<'a> {
        match self.raw {
            "y" => Value::Yes,
            "m" => Value::Module,
            "n" => Value::No,
            other => Value::Other(other),
        }
    }
}

/// Splits configuration text into lines.
///
/// `\n`, `\r\n` and a lone `\r` end a line.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (line, next) = match rest.find(|c: char| c == '\n' || c == '\r') {
            Some(pos) if rest[pos..].starts_with("\r\n") => (&rest[..pos], &rest[pos + 2..]),
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };
        rest = next;
        Some(line)
    })
}

/// Whitespace removed from the end of a line.
///
/// Includes the information separators `\x1c` to `\x1f`.
fn is_trailing_space(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

/// Parses a line of a configuration file.
///
/// Returns `None` for lines that are not assignments or are comments.
/// Trailing whitespace including the line terminator is ignored.
pub fn parse_line(line: &str) -> Result<Option<Assignment<'_>>, Error> {
    if !line.contains(SEPARATOR) {
        return Ok(None);
    }
    if line.starts_with(COMMENT) {
        return Ok(None);
    }

    let mut parts = line.trim_end_matches(is_trailing_space).split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(raw), None) => Ok(Some(Assignment { name, raw })),
        _ => Err(Error::MultipleSeparators),
    }
}
