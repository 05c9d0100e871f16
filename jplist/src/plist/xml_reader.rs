/*!
 Contains logic to parse XML property lists into a [`Value`] tree.

 This is not a general purpose XML parser: it understands the element vocabulary of Apple's
 property list DTD and skips the XML declaration, the `DOCTYPE`, and comments between elements.
 The `<plist>` wrapper is optional; an empty `<plist>` element parses to [`Value::Null`].
*/

use std::collections::BTreeMap;

use base64::{prelude::BASE64_STANDARD, Engine};
use log::warn;

use crate::{error::plist::PlistParseError, util::dates, value::Value};

/// Containers may not nest deeper than this
pub const MAX_DEPTH: usize = 512;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How a tag relates to its element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    /// `<name>`
    Open,
    /// `</name>`
    Close,
    /// `<name/>`
    Empty,
}

/// A tag and the byte offset of its `<`
#[derive(Debug, Clone, Copy)]
struct Tag<'a> {
    name: &'a str,
    kind: TagKind,
    start: usize,
}

/// Replace the predefined XML entities and numeric character references in `text`
///
/// Entities that cannot be resolved are kept literally.
pub fn xml_unescape(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        output.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let resolved = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let replacement = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            replacement.map(|character| (character, semi))
        });

        match resolved {
            Some((character, semi)) => {
                output.push(character);
                rest = &rest[semi + 1..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

/// Contains logic and data used to parse an XML property list
#[derive(Debug)]
pub struct XmlPlistReader<'a> {
    /// The document we want to parse
    doc: &'a [u8],
    /// The current index we are at in the document
    idx: usize,
    /// The failure from the most recent call to [`XmlPlistReader::parse()`]
    error: Option<PlistParseError>,
}

impl<'a> XmlPlistReader<'a> {
    pub fn new(doc: &'a [u8]) -> Self {
        Self {
            doc,
            idx: 0,
            error: None,
        }
    }

    /// Parse the document from the start
    ///
    /// On failure the error is also kept and can be retrieved with [`XmlPlistReader::error()`].
    pub fn parse(&mut self) -> Result<Value, PlistParseError> {
        self.idx = 0;
        self.error = None;

        let result = self.parse_document();
        if let Err(why) = &result {
            warn!("Rejected XML plist: {why}");
            self.error = Some(why.clone());
        }
        result
    }

    /// The failure from the most recent parse, if it failed
    pub fn error(&self) -> Option<&PlistParseError> {
        self.error.as_ref()
    }

    fn parse_document(&mut self) -> Result<Value, PlistParseError> {
        if self.starts_with(UTF8_BOM) {
            self.idx = UTF8_BOM.len();
        }
        self.skip_misc()?;
        if self.idx >= self.doc.len() {
            return Err(PlistParseError::Empty);
        }

        let tag = self.next_tag()?;
        if tag.name != "plist" {
            return self.read_value(tag, 0);
        }
        match tag.kind {
            TagKind::Empty => Ok(Value::Null),
            TagKind::Close => Err(self.unexpected(tag)),
            TagKind::Open => {
                let inner = self.next_tag()?;
                if inner.name == "plist" && inner.kind == TagKind::Close {
                    return Ok(Value::Null);
                }
                let value = self.read_value(inner, 0)?;
                self.expect_close("plist")?;
                Ok(value)
            }
        }
    }

    fn get_byte(&self, byte_idx: usize) -> Option<u8> {
        self.doc.get(byte_idx).copied()
    }

    fn starts_with(&self, pattern: &[u8]) -> bool {
        self.doc[self.idx.min(self.doc.len())..].starts_with(pattern)
    }

    /// Move the cursor past the next occurrence of `terminator`
    fn skip_past(&mut self, terminator: &[u8]) -> Result<(), PlistParseError> {
        let start = self.idx;
        let found = self.doc[start..]
            .windows(terminator.len())
            .position(|window| window == terminator)
            .ok_or_else(|| {
                PlistParseError::InvalidXml(start, "unterminated markup declaration".to_string())
            })?;
        self.idx = start + found + terminator.len();
        Ok(())
    }

    /// Skip whitespace, comments, processing instructions, and `DOCTYPE` declarations
    fn skip_misc(&mut self) -> Result<(), PlistParseError> {
        while let Some(byte) = self.get_byte(self.idx) {
            if byte.is_ascii_whitespace() {
                self.idx += 1;
            } else if self.starts_with(b"<!--") {
                self.skip_past(b"-->")?;
            } else if self.starts_with(b"<?") {
                self.skip_past(b"?>")?;
            } else if self.starts_with(b"<!") {
                self.skip_past(b">")?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn end_of_document(&self) -> PlistParseError {
        PlistParseError::InvalidXml(self.doc.len(), "unexpected end of document".to_string())
    }

    fn unexpected(&self, tag: Tag) -> PlistParseError {
        let slash = if tag.kind == TagKind::Close { "/" } else { "" };
        PlistParseError::InvalidXml(tag.start, format!("unexpected tag <{slash}{}>", tag.name))
    }

    /// Read the next tag, skipping anything that is not an element
    fn next_tag(&mut self) -> Result<Tag<'a>, PlistParseError> {
        self.skip_misc()?;
        match self.get_byte(self.idx) {
            Some(b'<') => self.read_tag(),
            Some(_) => Err(PlistParseError::InvalidXml(
                self.idx,
                "unexpected text between elements".to_string(),
            )),
            None => Err(self.end_of_document()),
        }
    }

    /// Read a tag starting at the `<` under the cursor; attributes are skipped
    fn read_tag(&mut self) -> Result<Tag<'a>, PlistParseError> {
        let doc: &'a [u8] = self.doc;
        let start = self.idx;
        self.idx += 1;

        let closing = self.get_byte(self.idx) == Some(b'/');
        if closing {
            self.idx += 1;
        }

        let name_start = self.idx;
        while let Some(byte) = self.get_byte(self.idx) {
            if byte.is_ascii_whitespace() || byte == b'/' || byte == b'>' {
                break;
            }
            self.idx += 1;
        }
        let name = std::str::from_utf8(&doc[name_start..self.idx])
            .map_err(|_| PlistParseError::InvalidXml(name_start, "invalid tag name".to_string()))?;
        if name.is_empty() {
            return Err(PlistParseError::InvalidXml(start, "missing tag name".to_string()));
        }

        let mut quote = None;
        let mut self_closing = false;
        loop {
            let byte = self.get_byte(self.idx).ok_or_else(|| self.end_of_document())?;
            self.idx += 1;
            match (quote, byte) {
                (Some(open), _) if byte == open => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(byte),
                (None, b'>') => break,
                (None, b'/') => self_closing = true,
                (None, _) => self_closing = false,
            }
        }

        let kind = match (closing, self_closing) {
            (true, _) => TagKind::Close,
            (false, true) => TagKind::Empty,
            (false, false) => TagKind::Open,
        };
        Ok(Tag { name, kind, start })
    }

    /// Read the next tag and fail unless it closes `name`
    fn expect_close(&mut self, name: &str) -> Result<(), PlistParseError> {
        let tag = self.next_tag()?;
        if tag.kind == TagKind::Close && tag.name == name {
            return Ok(());
        }
        Err(PlistParseError::InvalidXml(
            tag.start,
            format!("expected </{name}>"),
        ))
    }

    /// Read the unescaped text content of a leaf element and its closing tag
    fn read_text(&mut self, tag: Tag) -> Result<String, PlistParseError> {
        if tag.kind == TagKind::Empty {
            return Ok(String::new());
        }

        let start = self.idx;
        let end = self.doc[start..]
            .iter()
            .position(|byte| *byte == b'<')
            .map(|found| start + found)
            .ok_or_else(|| self.end_of_document())?;
        let text = std::str::from_utf8(&self.doc[start..end])
            .map_err(|_| PlistParseError::InvalidXml(start, "invalid UTF-8 text".to_string()))?;
        let text = xml_unescape(text);

        self.idx = end;
        let close = self.read_tag()?;
        if close.kind != TagKind::Close || close.name != tag.name {
            return Err(PlistParseError::InvalidXml(
                close.start,
                format!("expected </{}>", tag.name),
            ));
        }
        Ok(text)
    }

    fn read_value(&mut self, tag: Tag<'a>, depth: usize) -> Result<Value, PlistParseError> {
        if depth > MAX_DEPTH {
            return Err(PlistParseError::TooDeep(MAX_DEPTH));
        }
        if tag.kind == TagKind::Close {
            return Err(self.unexpected(tag));
        }

        match tag.name {
            "dict" => self.read_dict(tag, depth),
            "array" => self.read_array(tag, depth),
            "string" => self.read_text(tag).map(Value::String),
            "integer" => {
                let text = self.read_text(tag)?;
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<u64>().ok().map(|number| number as i64))
                    .map(Value::Integer)
                    .ok_or(PlistParseError::InvalidValue(tag.start, "integer"))
            }
            "real" => {
                let text = self.read_text(tag)?;
                let number = match text.trim() {
                    "nan" => Some(f64::NAN),
                    "+infinity" | "infinity" => Some(f64::INFINITY),
                    "-infinity" => Some(f64::NEG_INFINITY),
                    other => other.parse::<f64>().ok(),
                };
                number
                    .map(Value::Float)
                    .ok_or(PlistParseError::InvalidValue(tag.start, "real"))
            }
            "true" | "false" => {
                if tag.kind == TagKind::Open {
                    self.expect_close(tag.name)?;
                }
                Ok(Value::Boolean(tag.name == "true"))
            }
            "date" => {
                let text = self.read_text(tag)?;
                dates::parse(&text)
                    .map(Value::Date)
                    .ok_or(PlistParseError::InvalidValue(tag.start, "date"))
            }
            "data" => {
                let text = self.read_text(tag)?;
                let encoded: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                BASE64_STANDARD
                    .decode(encoded)
                    .map(Value::Data)
                    .map_err(|why| PlistParseError::InvalidData(tag.start, why))
            }
            _ => Err(self.unexpected(tag)),
        }
    }

    fn read_dict(&mut self, tag: Tag<'a>, depth: usize) -> Result<Value, PlistParseError> {
        let mut object = BTreeMap::new();
        if tag.kind == TagKind::Empty {
            return Ok(Value::Object(object));
        }

        loop {
            let key_tag = self.next_tag()?;
            match (key_tag.name, key_tag.kind) {
                ("dict", TagKind::Close) => break,
                ("key", TagKind::Open | TagKind::Empty) => {
                    let key = self.read_text(key_tag)?;
                    let value_tag = self.next_tag()?;
                    let value = self.read_value(value_tag, depth + 1)?;
                    object.insert(key, value);
                }
                _ => {
                    return Err(PlistParseError::InvalidXml(
                        key_tag.start,
                        "expected <key> or </dict>".to_string(),
                    ))
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn read_array(&mut self, tag: Tag<'a>, depth: usize) -> Result<Value, PlistParseError> {
        let mut items = vec![];
        if tag.kind == TagKind::Empty {
            return Ok(Value::Array(items));
        }

        loop {
            let item_tag = self.next_tag()?;
            if item_tag.name == "array" && item_tag.kind == TagKind::Close {
                break;
            }
            items.push(self.read_value(item_tag, depth + 1)?);
        }
        Ok(Value::Array(items))
    }
}

#[cfg(test)]
mod tests {
    use crate::plist::xml_reader::{xml_unescape, XmlPlistReader};

    #[test]
    fn can_unescape_entities() {
        assert_eq!(xml_unescape("a &lt;b&gt; &amp; &quot;c&quot; &apos;d&apos;"), "a <b> & \"c\" 'd'");
    }

    #[test]
    fn can_unescape_character_references() {
        assert_eq!(xml_unescape("&#65;&#x42;&#X43;&#x1F600;"), "ABC\u{1F600}");
    }

    #[test]
    fn can_skip_byte_order_mark() {
        let value = XmlPlistReader::new(b"\xEF\xBB\xBF<plist><string>x</string></plist>")
            .parse()
            .unwrap();
        assert_eq!(value, "x");
    }

    #[test]
    fn can_keep_unknown_entities() {
        assert_eq!(xml_unescape("a & b"), "a & b");
        assert_eq!(xml_unescape("&nbsp;"), "&nbsp;");
        assert_eq!(xml_unescape("&#xD800;"), "&#xD800;");
        assert_eq!(xml_unescape("trailing &"), "trailing &");
    }
}
