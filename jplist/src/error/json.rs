/*!
 Errors that can happen when parsing JSON text.
*/

use std::fmt::{Display, Formatter, Result};

/// Errors that can happen when parsing JSON text
///
/// Every variant carries the byte offset in the source document where the
/// malformed token starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonParseError {
    /// The document ended where a value was required
    UnexpectedEnd(usize),
    /// A byte sequence that does not start any JSON token
    InvalidToken(usize),
    /// A valid token appeared where a different one was required
    Expected(usize, &'static str),
    /// An object member did not start with a string key
    MissingKey(usize),
    UnterminatedString(usize),
    UnterminatedComment(usize),
    InvalidEscape(usize),
    /// A `\u` escape with bad hex digits or an unpaired surrogate
    InvalidUnicode(usize),
    InvalidUtf8(usize),
    InvalidNumber(usize),
    /// Arrays and objects nested deeper than the reader allows
    TooDeep(usize),
}

impl JsonParseError {
    /// The byte offset of the token that caused the failure
    pub fn offset(&self) -> usize {
        match self {
            JsonParseError::UnexpectedEnd(offset)
            | JsonParseError::InvalidToken(offset)
            | JsonParseError::Expected(offset, _)
            | JsonParseError::MissingKey(offset)
            | JsonParseError::UnterminatedString(offset)
            | JsonParseError::UnterminatedComment(offset)
            | JsonParseError::InvalidEscape(offset)
            | JsonParseError::InvalidUnicode(offset)
            | JsonParseError::InvalidUtf8(offset)
            | JsonParseError::InvalidNumber(offset)
            | JsonParseError::TooDeep(offset) => *offset,
        }
    }

    /// A description of the failure without its position
    pub fn message(&self) -> String {
        match self {
            JsonParseError::UnexpectedEnd(_) => "unexpected end of document".to_string(),
            JsonParseError::InvalidToken(_) => "invalid token".to_string(),
            JsonParseError::Expected(_, what) => format!("expected {what}"),
            JsonParseError::MissingKey(_) => "expected a string object key".to_string(),
            JsonParseError::UnterminatedString(_) => "unterminated string".to_string(),
            JsonParseError::UnterminatedComment(_) => "unterminated comment".to_string(),
            JsonParseError::InvalidEscape(_) => "invalid escape".to_string(),
            JsonParseError::InvalidUnicode(_) => "invalid unicode escape".to_string(),
            JsonParseError::InvalidUtf8(_) => "string is not valid UTF-8".to_string(),
            JsonParseError::InvalidNumber(_) => "invalid number".to_string(),
            JsonParseError::TooDeep(_) => "document nested too deeply".to_string(),
        }
    }
}

impl Display for JsonParseError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        write!(fmt, "{} at byte {}", self.message(), self.offset())
    }
}

impl std::error::Error for JsonParseError {}
