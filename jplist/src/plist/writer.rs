/*!
 Contains logic to serialize a [`Value`] tree as an XML property list.

 Output matches the layout of Apple's own tools: the XML declaration and `DOCTYPE`, a `<plist>` root,
 and one element per line indented with tabs.

 Property lists cannot hold null, so null values are skipped, along with their keys when inside a
 dictionary. A null root produces an empty `<plist>`. Strings in the `date:` and `data:` forms are
 written as `<date>` and `<data>` elements.
*/

use std::fmt::Write;

use base64::{prelude::BASE64_STANDARD, Engine};

use crate::{
    util::dates::{self, parse_date_string},
    value::{Value, DATA_STRING_PREFIX},
};

const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
    "<plist version=\"1.0\">\n",
);
const FOOTER: &str = "</plist>\n";
const INDENT: char = '\t';

/// Escape the characters that XML reserves in text content
///
/// Control characters other than tab, newline, and carriage return cannot appear literally in XML
/// text, so they are written as character references.
pub fn xml_escape(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\t' | '\n' | '\r' => output.push(character),
            control if control.is_ascii_control() && control != '\u{7f}' => {
                let _ = write!(output, "&#x{:X};", u32::from(control));
            }
            other => output.push(other),
        }
    }
    output
}

/// Writes XML property lists
#[derive(Debug)]
pub struct PlistWriter;

impl PlistWriter {
    /// Replace `document` with the XML property list form of `value`
    pub fn fast_write(value: &Value, document: &mut String) {
        document.clear();
        document.push_str(HEADER);
        Self::fast_write_value(value, 0, document);
        document.push_str(FOOTER);
    }

    /// Append the elements for `value` to `document`, indented `depth` levels
    pub fn fast_write_value(value: &Value, depth: usize, document: &mut String) {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                if items.iter().all(Value::is_null) {
                    write_element(depth, "<array/>", document);
                    return;
                }
                write_element(depth, "<array>", document);
                for item in items {
                    Self::fast_write_value(item, depth + 1, document);
                }
                write_element(depth, "</array>", document);
            }
            Value::Object(map) => {
                if map.values().all(Value::is_null) {
                    write_element(depth, "<dict/>", document);
                    return;
                }
                write_element(depth, "<dict>", document);
                for (key, item) in map.iter().filter(|(_, item)| !item.is_null()) {
                    write_element(
                        depth + 1,
                        &format!("<key>{}</key>", xml_escape(key)),
                        document,
                    );
                    Self::fast_write_value(item, depth + 1, document);
                }
                write_element(depth, "</dict>", document);
            }
            scalar => write_element(depth, &scalar_element(scalar), document),
        }
    }
}

/// Write one line holding `element` at the given depth
fn write_element(depth: usize, element: &str, document: &mut String) {
    document.extend(std::iter::repeat(INDENT).take(depth));
    document.push_str(element);
    document.push('\n');
}

/// The element for a value that has no children
fn scalar_element(value: &Value) -> String {
    match value {
        Value::Integer(number) => format!("<integer>{number}</integer>"),
        Value::Boolean(true) => "<true/>".to_string(),
        Value::Boolean(false) => "<false/>".to_string(),
        Value::Float(number) => format!("<real>{}</real>", format_real(*number)),
        Value::Date(date) => format!("<date>{}</date>", dates::format(date)),
        Value::Data(bytes) => format!("<data>{}</data>", BASE64_STANDARD.encode(bytes)),
        Value::String(text) => {
            if let Some(date) = parse_date_string(text) {
                return format!("<date>{}</date>", dates::format(&date));
            }
            let bytes = text
                .strip_prefix(DATA_STRING_PREFIX)
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok());
            match bytes {
                Some(bytes) => format!("<data>{}</data>", BASE64_STANDARD.encode(bytes)),
                None => format!("<string>{}</string>", xml_escape(text)),
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Text for a `<real>`, using Apple's spelling of the non-finite values
fn format_real(number: f64) -> String {
    if number.is_nan() {
        "nan".to_string()
    } else if number.is_infinite() {
        let sign = if number > 0.0 { "+" } else { "-" };
        format!("{sign}infinity")
    } else {
        let mut text = String::new();
        let _ = write!(text, "{number:?}");
        text
    }
}
