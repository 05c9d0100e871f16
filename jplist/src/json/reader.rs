/*!
 Contains logic to parse JSON text into a [`Value`] tree.

 The grammar follows RFC 8259, extended to tolerate `//` line comments and `/* */` block comments
 anywhere whitespace is allowed. Bytes after the root value are ignored.
*/

use std::{collections::BTreeMap, num::IntErrorKind};

use log::warn;

use crate::{error::json::JsonParseError, value::Value};

/// Arrays and objects may not nest deeper than this
pub const MAX_DEPTH: usize = 512;

/// The lexical units of a JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenType {
    End,
    Null,
    True,
    False,
    Number,
    String,
    ArrayBegin,
    ArrayEnd,
    ObjectBegin,
    ObjectEnd,
    ArraySeparator,
    MemberSeparator,
}

/// A token and the byte range it covers in the document
#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenType,
    start: usize,
    end: usize,
}

/// Contains logic and data used to parse a JSON document
#[derive(Debug)]
pub struct JsonReader<'a> {
    /// The document we want to parse
    doc: &'a [u8],
    /// The current index we are at in the document
    idx: usize,
    /// The failure from the most recent call to [`JsonReader::parse()`]
    error: Option<JsonParseError>,
}

impl<'a> JsonReader<'a> {
    pub fn new(doc: &'a [u8]) -> Self {
        Self {
            doc,
            idx: 0,
            error: None,
        }
    }

    /// Parse the document from the start
    ///
    /// On failure the error is also kept and can be retrieved with [`JsonReader::error()`].
    pub fn parse(&mut self) -> Result<Value, JsonParseError> {
        self.idx = 0;
        self.error = None;

        let result = self
            .read_token()
            .and_then(|token| self.read_value(token, 0));
        if let Err(why) = &result {
            warn!("Rejected JSON document: {why}");
            self.error = Some(why.clone());
        }
        result
    }

    /// The failure from the most recent parse, if it failed
    pub fn error(&self) -> Option<&JsonParseError> {
        self.error.as_ref()
    }

    /// Get the byte at a given index, if the index is within the document
    fn get_byte(&self, byte_idx: usize) -> Option<u8> {
        self.doc.get(byte_idx).copied()
    }

    fn get_current_byte(&self) -> Option<u8> {
        self.get_byte(self.idx)
    }

    /// Skip whitespace and comments until the next token
    fn skip_spaces(&mut self) -> Result<(), JsonParseError> {
        while let Some(byte) = self.get_current_byte() {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => self.idx += 1,
                b'/' => self.skip_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<(), JsonParseError> {
        let start = self.idx;
        match self.get_byte(start + 1) {
            Some(b'/') => {
                self.idx += 2;
                while let Some(byte) = self.get_current_byte() {
                    self.idx += 1;
                    if byte == b'\n' {
                        break;
                    }
                }
                Ok(())
            }
            Some(b'*') => {
                self.idx += 2;
                loop {
                    match self.get_current_byte() {
                        Some(b'*') if self.get_byte(self.idx + 1) == Some(b'/') => {
                            self.idx += 2;
                            return Ok(());
                        }
                        Some(_) => self.idx += 1,
                        None => return Err(JsonParseError::UnterminatedComment(start)),
                    }
                }
            }
            _ => Err(JsonParseError::InvalidToken(start)),
        }
    }

    /// Consume `pattern` if the document continues with it at the cursor
    fn match_bytes(&mut self, pattern: &[u8]) -> bool {
        match self.doc.get(self.idx..self.idx + pattern.len()) {
            Some(found) if found == pattern => {
                self.idx += pattern.len();
                true
            }
            _ => false,
        }
    }

    fn read_token(&mut self) -> Result<Token, JsonParseError> {
        self.skip_spaces()?;
        let start = self.idx;

        let kind = match self.get_current_byte() {
            None => TokenType::End,
            Some(byte) => {
                self.idx += 1;
                match byte {
                    b'{' => TokenType::ObjectBegin,
                    b'}' => TokenType::ObjectEnd,
                    b'[' => TokenType::ArrayBegin,
                    b']' => TokenType::ArrayEnd,
                    b',' => TokenType::ArraySeparator,
                    b':' => TokenType::MemberSeparator,
                    b'"' => {
                        self.read_string(start)?;
                        TokenType::String
                    }
                    b'-' | b'0'..=b'9' => {
                        self.read_number();
                        TokenType::Number
                    }
                    b'n' if self.match_bytes(b"ull") => TokenType::Null,
                    b't' if self.match_bytes(b"rue") => TokenType::True,
                    b'f' if self.match_bytes(b"alse") => TokenType::False,
                    _ => return Err(JsonParseError::InvalidToken(start)),
                }
            }
        };

        Ok(Token {
            kind,
            start,
            end: self.idx,
        })
    }

    /// Advance past the closing quote of a string whose opening quote is at `start`
    fn read_string(&mut self, start: usize) -> Result<(), JsonParseError> {
        while let Some(byte) = self.get_current_byte() {
            self.idx += 1;
            match byte {
                b'\\' => self.idx += 1,
                b'"' => return Ok(()),
                _ => {}
            }
        }
        Err(JsonParseError::UnterminatedString(start))
    }

    /// Advance past every byte that may be part of a number; validity is checked when decoding
    fn read_number(&mut self) {
        while let Some(b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-') = self.get_current_byte() {
            self.idx += 1;
        }
    }

    fn read_value(&mut self, token: Token, depth: usize) -> Result<Value, JsonParseError> {
        match token.kind {
            TokenType::ObjectBegin => self.read_object(token, depth + 1),
            TokenType::ArrayBegin => self.read_array(token, depth + 1),
            TokenType::Number => self.decode_number(token),
            TokenType::String => Ok(Value::String(self.decode_string(token)?)),
            TokenType::True => Ok(Value::Boolean(true)),
            TokenType::False => Ok(Value::Boolean(false)),
            TokenType::Null => Ok(Value::Null),
            TokenType::End => Err(JsonParseError::UnexpectedEnd(token.start)),
            _ => Err(JsonParseError::Expected(token.start, "a value")),
        }
    }

    fn read_object(&mut self, open: Token, depth: usize) -> Result<Value, JsonParseError> {
        if depth > MAX_DEPTH {
            return Err(JsonParseError::TooDeep(open.start));
        }
        let mut map = BTreeMap::new();

        let mut token = self.read_token()?;
        if token.kind == TokenType::ObjectEnd {
            return Ok(Value::Object(map));
        }

        loop {
            match token.kind {
                TokenType::String => {}
                TokenType::End => return Err(JsonParseError::UnexpectedEnd(token.start)),
                _ => return Err(JsonParseError::MissingKey(token.start)),
            }
            let key = self.decode_string(token)?;

            let separator = self.read_token()?;
            if separator.kind != TokenType::MemberSeparator {
                return Err(JsonParseError::Expected(separator.start, "':'"));
            }

            let value_token = self.read_token()?;
            let value = self.read_value(value_token, depth)?;
            map.insert(key, value);

            let next = self.read_token()?;
            match next.kind {
                TokenType::ObjectEnd => return Ok(Value::Object(map)),
                TokenType::ArraySeparator => token = self.read_token()?,
                _ => return Err(JsonParseError::Expected(next.start, "',' or '}'")),
            }
        }
    }

    fn read_array(&mut self, open: Token, depth: usize) -> Result<Value, JsonParseError> {
        if depth > MAX_DEPTH {
            return Err(JsonParseError::TooDeep(open.start));
        }
        let mut items = vec![];

        let mut token = self.read_token()?;
        if token.kind == TokenType::ArrayEnd {
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.read_value(token, depth)?);

            let next = self.read_token()?;
            match next.kind {
                TokenType::ArrayEnd => return Ok(Value::Array(items)),
                TokenType::ArraySeparator => token = self.read_token()?,
                _ => return Err(JsonParseError::Expected(next.start, "',' or ']'")),
            }
        }
    }

    /// Integers unless the text has a fraction, an exponent, or does not fit in 64 bits
    fn decode_number(&self, token: Token) -> Result<Value, JsonParseError> {
        let text = std::str::from_utf8(&self.doc[token.start..token.end])
            .map_err(|_| JsonParseError::InvalidNumber(token.start))?;
        let invalid = || JsonParseError::InvalidNumber(token.start);

        if text.contains(|c| matches!(c, '.' | 'e' | 'E')) {
            return text.parse::<f64>().map(Value::Float).map_err(|_| invalid());
        }
        match text.parse::<i64>() {
            Ok(number) => Ok(Value::Integer(number)),
            Err(why) => match why.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    text.parse::<f64>().map(Value::Float).map_err(|_| invalid())
                }
                _ => Err(invalid()),
            },
        }
    }

    /// Read 4 hex digits at `pos`
    fn decode_hex(&self, pos: usize) -> Result<u32, JsonParseError> {
        let digits = self
            .doc
            .get(pos..pos + 4)
            .ok_or(JsonParseError::InvalidUnicode(pos))?;
        digits.iter().try_fold(0u32, |acc, digit| {
            char::from(*digit)
                .to_digit(16)
                .map(|nibble| (acc << 4) | nibble)
                .ok_or(JsonParseError::InvalidUnicode(pos))
        })
    }

    /// Decode the text between the quotes of a string token, resolving escapes
    fn decode_string(&self, token: Token) -> Result<String, JsonParseError> {
        let end = token.end - 1;
        let mut decoded = Vec::with_capacity(end - token.start);
        let mut pos = token.start + 1;

        while pos < end {
            let byte = self.doc[pos];
            if byte != b'\\' {
                decoded.push(byte);
                pos += 1;
                continue;
            }

            let escape_start = pos;
            let escape = *self
                .doc
                .get(pos + 1)
                .ok_or(JsonParseError::InvalidEscape(escape_start))?;
            pos += 2;
            let unescaped = match escape {
                b'"' => '"',
                b'\\' => '\\',
                b'/' => '/',
                b'b' => '\u{8}',
                b'f' => '\u{c}',
                b'n' => '\n',
                b'r' => '\r',
                b't' => '\t',
                b'u' => {
                    let mut code_point = self.decode_hex(pos)?;
                    pos += 4;
                    if (0xD800..0xDC00).contains(&code_point) {
                        // High surrogate, the low half must follow as another escape
                        if self.doc.get(pos..pos + 2) != Some(b"\\u".as_slice()) {
                            return Err(JsonParseError::InvalidUnicode(escape_start));
                        }
                        let low = self.decode_hex(pos + 2)?;
                        if !(0xDC00..0xE000).contains(&low) {
                            return Err(JsonParseError::InvalidUnicode(escape_start));
                        }
                        pos += 6;
                        code_point = 0x10000 + ((code_point - 0xD800) << 10) + (low - 0xDC00);
                    }
                    char::from_u32(code_point)
                        .ok_or(JsonParseError::InvalidUnicode(escape_start))?
                }
                _ => return Err(JsonParseError::InvalidEscape(escape_start)),
            };
            let mut buffer = [0; 4];
            decoded.extend_from_slice(unescaped.encode_utf8(&mut buffer).as_bytes());
        }

        String::from_utf8(decoded).map_err(|_| JsonParseError::InvalidUtf8(token.start))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::json::JsonParseError,
        json::reader::{JsonReader, MAX_DEPTH},
        value::Value,
    };

    fn parse(doc: &str) -> Result<Value, JsonParseError> {
        JsonReader::new(doc.as_bytes()).parse()
    }

    #[test]
    fn can_parse_literals() {
        assert_eq!(parse("null").unwrap(), Value::Null);
        assert_eq!(parse("true").unwrap(), Value::Boolean(true));
        assert_eq!(parse(" false ").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn can_parse_numbers() {
        assert_eq!(parse("0").unwrap(), Value::Integer(0));
        assert_eq!(parse("-42").unwrap(), Value::Integer(-42));
        assert_eq!(parse("1.5").unwrap(), Value::Float(1.5));
        assert_eq!(parse("1e3").unwrap(), Value::Float(1000.0));
        assert_eq!(parse("-2.5E-1").unwrap(), Value::Float(-0.25));
        assert_eq!(
            parse("9223372036854775807").unwrap(),
            Value::Integer(i64::MAX)
        );
        assert_eq!(
            parse("-9223372036854775808").unwrap(),
            Value::Integer(i64::MIN)
        );
    }

    #[test]
    fn can_parse_overflow_as_float() {
        assert_eq!(
            parse("9223372036854775808").unwrap(),
            Value::Float(9223372036854775808.0)
        );
        assert!(parse("-99999999999999999999").unwrap().is_float());
    }

    #[test]
    fn cant_parse_bad_numbers() {
        assert_eq!(parse("-"), Err(JsonParseError::InvalidNumber(0)));
        assert_eq!(parse("[1-2]"), Err(JsonParseError::InvalidNumber(1)));
        assert_eq!(parse("1.2.3"), Err(JsonParseError::InvalidNumber(0)));
    }

    #[test]
    fn can_parse_escapes() {
        let value = parse(r#""a\"b\\c\/d\b\f\n\r\t""#).unwrap();
        assert_eq!(value, "a\"b\\c/d\u{8}\u{c}\n\r\t");
    }

    #[test]
    fn can_parse_unicode_escapes() {
        assert_eq!(parse(r#""\u00e9\u4e2d""#).unwrap(), "é中");
        assert_eq!(parse(r#""\ud83d\ude00""#).unwrap(), "😀");
        assert_eq!(parse(r#""\u0000""#).unwrap(), "\u{0}");
    }

    #[test]
    fn cant_parse_bad_unicode_escapes() {
        assert_eq!(parse(r#""\ud83d""#), Err(JsonParseError::InvalidUnicode(1)));
        assert_eq!(parse(r#""x\ude00""#), Err(JsonParseError::InvalidUnicode(2)));
        assert_eq!(parse(r#""\u12g4""#), Err(JsonParseError::InvalidUnicode(3)));
        assert_eq!(
            parse(r#""\ud83dA""#),
            Err(JsonParseError::InvalidUnicode(1))
        );
    }

    #[test]
    fn cant_parse_bad_escape() {
        assert_eq!(parse(r#""ab\q""#), Err(JsonParseError::InvalidEscape(3)));
    }

    #[test]
    fn cant_parse_unterminated_string() {
        assert_eq!(
            parse(r#"["abc"#),
            Err(JsonParseError::UnterminatedString(1))
        );
        assert_eq!(
            parse(r#""abc\""#),
            Err(JsonParseError::UnterminatedString(0))
        );
    }

    #[test]
    fn can_keep_utf8_text() {
        assert_eq!(parse("\"grüße 🌍\"").unwrap(), "grüße 🌍");
    }

    #[test]
    fn cant_parse_invalid_utf8() {
        let result = JsonReader::new(b"\"\xff\"").parse();
        assert_eq!(result, Err(JsonParseError::InvalidUtf8(0)));
    }

    #[test]
    fn can_parse_nested() {
        let value = parse(r#"{"a": [1, {"b": null}], "c": {}}"#).unwrap();
        assert_eq!(value["a"][0].as_i64(), 1);
        assert!(value["a"][1].has("b"));
        assert!(value["c"].is_object());
        assert!(value["c"].is_empty());
    }

    #[test]
    fn can_parse_duplicate_keys_last_wins() {
        let value = parse(r#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(value.len(), 1);
        assert_eq!(value["a"].as_i64(), 2);
    }

    #[test]
    fn can_skip_comments() {
        let doc = "// leading\n{ /* inline */ \"a\" : 1, // trailing\n \"b\": /**/ [ ] }";
        let value = parse(doc).unwrap();
        assert_eq!(value["a"].as_i64(), 1);
        assert!(value["b"].is_array());
    }

    #[test]
    fn cant_parse_unterminated_comment() {
        assert_eq!(
            parse("[1, /* never closed"),
            Err(JsonParseError::UnterminatedComment(4))
        );
        assert_eq!(parse("/x"), Err(JsonParseError::InvalidToken(0)));
    }

    #[test]
    fn can_ignore_trailing_bytes() {
        assert_eq!(parse("[1] trailing garbage").unwrap().len(), 1);
    }

    #[test]
    fn cant_parse_missing_value() {
        let mut reader = JsonReader::new(br#"{"a":}"#);
        let error = reader.parse().unwrap_err();
        assert_eq!(error.offset(), 5);
        assert!(!error.message().is_empty());
        assert_eq!(reader.error(), Some(&error));
    }

    #[test]
    fn cant_parse_missing_separator() {
        assert_eq!(
            parse("[1 2]"),
            Err(JsonParseError::Expected(3, "',' or ']'"))
        );
        assert_eq!(
            parse(r#"{"a":1 "b":2}"#),
            Err(JsonParseError::Expected(7, "',' or '}'"))
        );
        assert_eq!(
            parse(r#"{"a" 1}"#),
            Err(JsonParseError::Expected(5, "':'"))
        );
    }

    #[test]
    fn cant_parse_non_string_key() {
        assert_eq!(parse("{1:2}"), Err(JsonParseError::MissingKey(1)));
        assert_eq!(parse(r#"{"a":1,}"#), Err(JsonParseError::MissingKey(7)));
    }

    #[test]
    fn cant_parse_truncated() {
        assert_eq!(parse(""), Err(JsonParseError::UnexpectedEnd(0)));
        assert_eq!(parse("  "), Err(JsonParseError::UnexpectedEnd(2)));
        assert_eq!(parse("[1,"), Err(JsonParseError::UnexpectedEnd(3)));
        assert_eq!(parse("{"), Err(JsonParseError::UnexpectedEnd(1)));
    }

    #[test]
    fn cant_parse_invalid_literal() {
        assert_eq!(parse("nul"), Err(JsonParseError::InvalidToken(0)));
        assert_eq!(parse("[tru]"), Err(JsonParseError::InvalidToken(1)));
    }

    #[test]
    fn cant_parse_too_deep() {
        let doc = "[".repeat(MAX_DEPTH + 1);
        assert_eq!(parse(&doc), Err(JsonParseError::TooDeep(MAX_DEPTH)));

        let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn can_reset_error_between_parses() {
        let mut reader = JsonReader::new(b"[1]");
        assert!(reader.parse().is_ok());
        assert!(reader.error().is_none());
    }
}
