/*!
 Contains logic to serialize a [`Value`] tree as JSON text.

 [`JsonWriter::fast_write()`] emits compact JSON with no whitespace. [`JsonWriter::style_write()`] emits an
 indented form; short arrays of scalars that fit within the right margin stay on one line.

 Dates and data have no JSON counterpart, so they are written as `"date:2001-01-01T00:00:00Z"` and
 `"data:<base64>"` strings.
*/

use std::fmt::Write;

use base64::{prelude::BASE64_STANDARD, Engine};

use crate::{
    util::dates::{self, DATE_STRING_PREFIX},
    value::{Value, DATA_STRING_PREFIX},
};

/// Arrays whose inline rendering would reach this column are split over several lines
const RIGHT_MARGIN: usize = 74;
const INDENT: &str = "   ";

/// Contains the state used to write indented JSON
#[derive(Debug, Default)]
pub struct JsonWriter {
    /// The document written so far
    document: String,
    /// The indentation for the current nesting level
    indent: String,
    /// While measuring an array, scalars are collected here instead of the document
    add_child_values: bool,
    child_values: Vec<String>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `document` with the compact JSON form of `value`
    pub fn fast_write(value: &Value, document: &mut String) {
        document.clear();
        Self::fast_write_value(value, document);
    }

    /// Append the compact JSON form of `value` to `document`
    pub fn fast_write_value(value: &Value, document: &mut String) {
        match value {
            Value::Array(items) => {
                document.push('[');
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        document.push(',');
                    }
                    Self::fast_write_value(item, document);
                }
                document.push(']');
            }
            Value::Object(map) => {
                document.push('{');
                for (idx, (key, item)) in map.iter().enumerate() {
                    if idx > 0 {
                        document.push(',');
                    }
                    write_string(key, document);
                    document.push(':');
                    Self::fast_write_value(item, document);
                }
                document.push('}');
            }
            scalar => write_scalar(scalar, document),
        }
    }

    /// Write `value` as indented JSON, returning the finished document
    pub fn style_write(&mut self, value: &Value) -> &str {
        self.document.clear();
        self.indent.clear();
        self.add_child_values = false;
        self.child_values.clear();

        self.write_value(value);
        self.document.push('\n');
        &self.document
    }

    fn push_value(&mut self, text: String) {
        if self.add_child_values {
            self.child_values.push(text);
        } else {
            self.document.push_str(&text);
        }
    }

    fn write_indent(&mut self) {
        match self.document.chars().last() {
            Some(' ') => return,
            Some('\n') | None => {}
            Some(_) => self.document.push('\n'),
        }
        self.document.push_str(&self.indent);
    }

    fn write_with_indent(&mut self, text: &str) {
        self.write_indent();
        self.document.push_str(text);
    }

    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Array(_) => self.write_array(value),
            Value::Object(map) if map.is_empty() => self.push_value("{}".to_string()),
            Value::Object(map) => {
                self.write_with_indent("{");
                self.indent.push_str(INDENT);
                for (idx, (key, item)) in map.iter().enumerate() {
                    let mut name = String::new();
                    write_string(key, &mut name);
                    self.write_with_indent(&name);
                    self.document.push_str(" : ");
                    self.write_value(item);
                    if idx + 1 < map.len() {
                        self.document.push(',');
                    }
                }
                self.indent.truncate(self.indent.len() - INDENT.len());
                self.write_with_indent("}");
            }
            scalar => {
                let mut text = String::new();
                write_scalar(scalar, &mut text);
                self.push_value(text);
            }
        }
    }

    fn write_array(&mut self, value: &Value) {
        let items = match value {
            Value::Array(items) => items,
            _ => return,
        };
        if items.is_empty() {
            self.push_value("[]".to_string());
            return;
        }

        if self.is_multiline_array(items) {
            self.write_with_indent("[");
            self.indent.push_str(INDENT);
            let child_values = std::mem::take(&mut self.child_values);
            for (idx, item) in items.iter().enumerate() {
                match child_values.get(idx) {
                    Some(text) => self.write_with_indent(text),
                    None => {
                        self.write_indent();
                        self.write_value(item);
                    }
                }
                if idx + 1 < items.len() {
                    self.document.push(',');
                }
            }
            self.indent.truncate(self.indent.len() - INDENT.len());
            self.write_with_indent("]");
        } else {
            let inline = self.child_values.join(", ");
            self.document.push_str("[ ");
            self.document.push_str(&inline);
            self.document.push_str(" ]");
        }
    }

    /// Decide whether an array needs one line per element, rendering its scalars into `child_values` as a side effect
    fn is_multiline_array(&mut self, items: &[Value]) -> bool {
        self.child_values.clear();
        let mut is_multiline = items.len() * 3 >= RIGHT_MARGIN
            || items
                .iter()
                .any(|item| item.value_type().is_container() && !item.is_empty());

        if !is_multiline {
            self.add_child_values = true;
            let mut line_length = 4 + (items.len() - 1) * 2;
            for item in items {
                self.write_value(item);
            }
            self.add_child_values = false;
            line_length += self.child_values.iter().map(String::len).sum::<usize>();
            is_multiline = line_length >= RIGHT_MARGIN;
        }
        is_multiline
    }
}

/// Append a non-container value
fn write_scalar(value: &Value, document: &mut String) {
    match value {
        Value::Null => document.push_str("null"),
        Value::Integer(number) => {
            let _ = write!(document, "{number}");
        }
        Value::Boolean(flag) => document.push_str(if *flag { "true" } else { "false" }),
        Value::Float(number) => write_float(*number, document),
        Value::String(text) => write_string(text, document),
        Value::Date(date) => {
            write_string(&format!("{DATE_STRING_PREFIX}{}", dates::format(date)), document)
        }
        Value::Data(bytes) => write_string(
            &format!("{DATA_STRING_PREFIX}{}", BASE64_STANDARD.encode(bytes)),
            document,
        ),
        Value::Array(_) | Value::Object(_) => JsonWriter::fast_write_value(value, document),
    }
}

/// Shortest text that reads back as the same float
///
/// Infinities are written as exponents too large for `f64`, which read back as infinite. NaN has
/// no JSON form and is written as `null`.
fn write_float(number: f64, document: &mut String) {
    if number.is_finite() {
        // `Debug` always keeps a fraction or an exponent, so the text re-reads as a float
        let _ = write!(document, "{number:?}");
    } else if number.is_nan() {
        document.push_str("null");
    } else if number.is_sign_positive() {
        document.push_str("1e999");
    } else {
        document.push_str("-1e999");
    }
}

/// Append `text` as a quoted JSON string
pub(crate) fn write_string(text: &str, document: &mut String) {
    document.reserve(text.len() + 2);
    document.push('"');
    for character in text.chars() {
        match character {
            '"' => document.push_str("\\\""),
            '\\' => document.push_str("\\\\"),
            '\u{8}' => document.push_str("\\b"),
            '\u{c}' => document.push_str("\\f"),
            '\n' => document.push_str("\\n"),
            '\r' => document.push_str("\\r"),
            '\t' => document.push_str("\\t"),
            control if u32::from(control) < 0x20 => {
                let _ = write!(document, "\\u{:04x}", u32::from(control));
            }
            other => document.push(other),
        }
    }
    document.push('"');
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{
        json::{reader::JsonReader, writer::JsonWriter},
        value::Value,
    };

    fn compact(value: &Value) -> String {
        let mut document = String::new();
        JsonWriter::fast_write(value, &mut document);
        document
    }

    #[test]
    fn can_write_scalars() {
        assert_eq!(compact(&Value::Null), "null");
        assert_eq!(compact(&Value::from(-12)), "-12");
        assert_eq!(compact(&Value::from(true)), "true");
        assert_eq!(compact(&Value::from(0.1)), "0.1");
        assert_eq!(compact(&Value::from("hi")), "\"hi\"");
    }

    #[test]
    fn can_write_floats_that_reread_as_floats() {
        assert_eq!(compact(&Value::from(1.0)), "1.0");
        assert_eq!(compact(&Value::from(1e300)), "1e300");
        assert_eq!(compact(&Value::from(f64::NAN)), "null");
        assert_eq!(compact(&Value::from(f64::INFINITY)), "1e999");
        assert_eq!(compact(&Value::from(f64::NEG_INFINITY)), "-1e999");

        for number in [
            1.0,
            -0.5,
            1e300,
            2.2250738585072014e-308,
            123456.789,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ] {
            let text = compact(&Value::from(number));
            let back = JsonReader::new(text.as_bytes()).parse().unwrap();
            assert_eq!(back, Value::Float(number));
        }
    }

    #[test]
    fn can_round_trip_overflowing_floats() {
        let value = JsonReader::new(b"[1e400, -1e400]").parse().unwrap();
        assert_eq!(
            value,
            Value::from(vec![Value::from(f64::INFINITY), Value::from(f64::NEG_INFINITY)])
        );

        let text = compact(&value);
        assert_eq!(text, "[1e999,-1e999]");
        assert_eq!(JsonReader::new(text.as_bytes()).parse().unwrap(), value);

        let styled = JsonWriter::new().style_write(&value).to_string();
        assert_eq!(JsonReader::new(styled.as_bytes()).parse().unwrap(), value);
    }

    #[test]
    fn can_escape_strings() {
        let value = Value::from("q\"b\\n\nt\tc\u{1}\u{1f}/é");
        assert_eq!(compact(&value), r#""q\"b\\n\nt\tc\u0001\u001f/é""#);
    }

    #[test]
    fn can_round_trip_special_characters() {
        let original = "quote\" backslash\\ controls\u{0}\u{7}\u{8}\u{c}\r\n\t end";
        let text = compact(&Value::from(original));
        let back = JsonReader::new(text.as_bytes()).parse().unwrap();
        assert_eq!(back.as_str().as_bytes(), original.as_bytes());
    }

    #[test]
    fn can_write_containers_compact() {
        let mut value = Value::default();
        value.set("z", vec![Value::from(1), Value::Null].into_iter().collect::<Value>());
        value.set("a", Value::default());
        assert_eq!(compact(&value), r#"{"a":null,"z":[1,null]}"#);

        let mut nested = Value::default();
        nested.at("outer").unwrap().set("inner", Value::with_type(crate::value::ValueType::Array));
        assert_eq!(compact(&nested), r#"{"outer":{"inner":[]}}"#);
    }

    #[test]
    fn can_append_without_clearing() {
        let mut document = String::from("x=");
        JsonWriter::fast_write_value(&Value::from(1), &mut document);
        assert_eq!(document, "x=1");
        JsonWriter::fast_write(&Value::from(2), &mut document);
        assert_eq!(document, "2");
    }

    #[test]
    fn can_write_dates_and_data_as_strings() {
        let date = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let value: Value = vec![Value::from(date), Value::data(vec![0, 1, 2])]
            .into_iter()
            .collect();
        assert_eq!(compact(&value), r#"["date:2001-01-01T00:00:00Z","data:AAEC"]"#);

        let back = JsonReader::new(compact(&value).as_bytes()).parse().unwrap();
        assert_eq!(back[0].as_date(), date);
        assert_eq!(back[1].as_data().as_ref(), &[0, 1, 2]);
    }

    #[test]
    fn can_style_write_scalar() {
        let mut writer = JsonWriter::new();
        assert_eq!(writer.style_write(&Value::from(5)), "5\n");
    }

    #[test]
    fn can_style_write_object() {
        let value = JsonReader::new(br#"{"b":{"c":"d"},"a":[1,2,3],"e":{},"f":[]}"#)
            .parse()
            .unwrap();
        let expected = "{\n   \"a\" : [ 1, 2, 3 ],\n   \"b\" : {\n      \"c\" : \"d\"\n   },\n   \"e\" : {},\n   \"f\" : []\n}\n";
        assert_eq!(JsonWriter::new().style_write(&value), expected);
    }

    #[test]
    fn can_style_write_nested_arrays_multiline() {
        let value = JsonReader::new(b"[[1],2]").parse().unwrap();
        let expected = "[\n   [ 1 ],\n   2\n]\n";
        assert_eq!(JsonWriter::new().style_write(&value), expected);
    }

    #[test]
    fn can_style_write_long_array_multiline() {
        let items: Value = (0..30).map(Value::from).collect();
        let styled = JsonWriter::new().style_write(&items).to_string();
        assert_eq!(styled.lines().count(), 32);
        assert!(styled.starts_with("[\n   0,\n   1,"));

        let wide: Value = (0..5).map(|_| Value::from("a".repeat(20))).collect();
        let styled = JsonWriter::new().style_write(&wide).to_string();
        assert_eq!(styled.lines().count(), 7);
    }

    #[test]
    fn can_reparse_styled_output() {
        let doc = br#"{"list":[{"a":1},[true,false,null],"x",1.5,[]],"obj":{"k":{"deep":[1,2]}},"s":"line\nbreak"}"#;
        let value = JsonReader::new(doc).parse().unwrap();
        let styled = JsonWriter::new().style_write(&value).to_string();
        let back = JsonReader::new(styled.as_bytes()).parse().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn can_reuse_writer() {
        let mut writer = JsonWriter::new();
        let first = writer.style_write(&Value::from(vec![Value::from(1)])).to_string();
        let second = writer.style_write(&Value::from(vec![Value::from(1)])).to_string();
        assert_eq!(first, second);
        assert_eq!(first, "[ 1 ]\n");
    }
}
