/*!
 Contains the dynamically-typed [`Value`] tree shared by every reader and writer in this crate.

 ## Overview

 A [`Value`] holds exactly one of nine kinds of data, described by [`ValueType`]. Containers own their
 children, so a tree never shares nodes and cloning always produces a deep copy.

 ## Access

 - Coercions like [`Value::as_i64()`] never fail: a mismatched kind yields that kind's empty value.
 - [`Value::get()`] and the `[]` operator are read-only and return [`NULL`] for anything missing.
 - [`Value::at()`] is the opt-in get-or-insert accessor that creates missing containers and entries.

 ```
 use jplist::value::Value;

 let mut root = Value::default();
 root.set("name", "jplist");
 root.set("tags", Value::from(vec![Value::from("plist")]));

 assert_eq!(root["name"].as_str(), "jplist");
 assert!(root["missing"].is_null());
 assert_eq!(root.len(), 2);
 ```
*/

pub mod convert;
pub mod index;
pub mod types;

use std::{borrow::Cow, collections::BTreeMap, fmt::Display, ops, str::FromStr};

use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};

use crate::{
    error::{json::JsonParseError, plist::PlistParseError},
    json::{reader::JsonReader, writer::JsonWriter},
    plist::{reader::PlistReader, writer::PlistWriter},
    util::dates::{self, DATE_STRING_PREFIX},
};

pub use index::ValueIndex;
pub use types::ValueType;

/// Returned by reference whenever a lookup has nothing else to return
pub static NULL: Value = Value::Null;

/// Returned by [`Value::as_data()`] for values that hold no bytes
pub static EMPTY_DATA: &[u8] = &[];

/// Prefix that marks a string value as base64-encoded binary data
pub const DATA_STRING_PREFIX: &str = "data:";

/// A node in a JSON or property list document
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Boolean(bool),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Keys are kept in sorted order
    Object(BTreeMap<String, Value>),
    Date(DateTime<Utc>),
    /// Opaque bytes, distinct from text
    Data(Vec<u8>),
}

impl Value {
    /// Create an empty value of the given kind
    pub fn with_type(kind: ValueType) -> Self {
        match kind {
            ValueType::Null => Value::Null,
            ValueType::Integer => Value::Integer(0),
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Float => Value::Float(0.0),
            ValueType::String => Value::String(String::new()),
            ValueType::Array => Value::Array(vec![]),
            ValueType::Object => Value::Object(BTreeMap::new()),
            ValueType::Date => Value::Date(DateTime::default()),
            ValueType::Data => Value::Data(vec![]),
        }
    }

    /// Create a [`Value::Data`] from some bytes
    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Data(bytes.into())
    }

    /// Create a [`Value::Date`] from a timestamp
    pub fn date(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Integer(_) => ValueType::Integer,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
            Value::Date(_) => ValueType::Date,
            Value::Data(_) => ValueType::Data,
        }
    }

    /// Element count for arrays and objects, byte length for strings and data, otherwise `0`
    pub fn len(&self) -> usize {
        match self {
            Value::String(text) => text.len(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::Data(bytes) => bytes.len(),
            Value::Null
            | Value::Integer(_)
            | Value::Boolean(_)
            | Value::Float(_)
            | Value::Date(_) => 0,
        }
    }

    /// `true` for null and for strings, data, and containers without content
    pub fn is_empty(&self) -> bool {
        match self.value_type() {
            ValueType::Null => true,
            kind if kind.is_scalar() => false,
            _ => self.len() == 0,
        }
    }

    /// Reset to [`Value::Null`], dropping any children
    pub fn clear(&mut self) {
        *self = Value::Null;
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Value::Data(_))
    }

    /// `true` for strings in the `date:2001-01-01T00:00:00Z` form
    pub fn is_date_string(&self) -> bool {
        match self {
            Value::String(text) => text.starts_with(DATE_STRING_PREFIX),
            _ => false,
        }
    }

    /// `true` for strings in the `data:<base64>` form
    pub fn is_data_string(&self) -> bool {
        match self {
            Value::String(text) => text.starts_with(DATA_STRING_PREFIX),
            _ => false,
        }
    }

    /// Integers, booleans, and floats convert between each other; anything else is `0`
    pub fn as_i64(&self) -> i64 {
        match self {
            Value::Integer(number) => *number,
            Value::Boolean(flag) => i64::from(*flag),
            Value::Float(number) => *number as i64,
            _ => 0,
        }
    }

    /// Same as [`Value::as_i64()`], truncated to 32 bits
    pub fn as_int(&self) -> i32 {
        self.as_i64() as i32
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Value::Integer(number) => *number != 0,
            Value::Boolean(flag) => *flag,
            Value::Float(number) => *number != 0.0,
            _ => false,
        }
    }

    pub fn as_float(&self) -> f64 {
        match self {
            Value::Integer(number) => *number as f64,
            Value::Boolean(flag) => f64::from(u8::from(*flag)),
            Value::Float(number) => *number,
            _ => 0.0,
        }
    }

    /// The text of a string value, otherwise the empty string
    pub fn as_str(&self) -> &str {
        match self {
            Value::String(text) => text,
            _ => "",
        }
    }

    pub fn as_string(&self) -> String {
        self.as_str().to_string()
    }

    /// The timestamp of a date or a date string, otherwise the Unix epoch
    pub fn as_date(&self) -> DateTime<Utc> {
        match self {
            Value::Date(date) => *date,
            Value::String(text) => dates::parse_date_string(text).unwrap_or_default(),
            _ => DateTime::default(),
        }
    }

    /// The bytes of data or a data string, otherwise [`EMPTY_DATA`]
    pub fn as_data(&self) -> Cow<'_, [u8]> {
        match self {
            Value::Data(bytes) => Cow::Borrowed(bytes),
            Value::String(text) => text
                .strip_prefix(DATA_STRING_PREFIX)
                .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
                .map_or(Cow::Borrowed(EMPTY_DATA), Cow::Owned),
            _ => Cow::Borrowed(EMPTY_DATA),
        }
    }

    /// Replace this value with a copy of some bytes
    pub fn assign_data(&mut self, bytes: &[u8]) {
        *self = Value::Data(bytes.to_vec());
    }

    pub fn assign_date(&mut self, date: DateTime<Utc>) {
        *self = Value::Date(date);
    }

    /// Replace this value with a `date:` string for the given timestamp
    pub fn assign_date_string(&mut self, date: DateTime<Utc>) {
        *self = Value::String(format!("{DATE_STRING_PREFIX}{}", dates::format(&date)));
    }

    /// Read-only lookup; returns [`NULL`] when the child does not exist
    pub fn get<I: ValueIndex>(&self, index: I) -> &Value {
        index.index_into(self).unwrap_or(&NULL)
    }

    /// Mutable lookup that never creates anything
    pub fn get_mut<I: ValueIndex>(&mut self, index: I) -> Option<&mut Value> {
        index.index_into_mut(self)
    }

    /// Get-or-insert lookup
    ///
    /// A null value becomes an array when indexed by position and an object
    /// when indexed by key. Missing object keys are inserted as null, and
    /// indexing past the end of an array pads it with nulls up to the
    /// requested position. Returns [`None`] without changing anything when the
    /// index kind does not match the container kind, or when the array cannot
    /// be grown to the requested position.
    pub fn at<I: ValueIndex>(&mut self, index: I) -> Option<&mut Value> {
        index.index_or_insert(self)
    }

    /// Assign a child through [`Value::at()`], returning `false` if the slot could not be created
    pub fn set<I: ValueIndex, V: Into<Value>>(&mut self, index: I, value: V) -> bool {
        match self.at(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// `true` if this is an object that contains `key`
    pub fn has(&self, key: &str) -> bool {
        match self {
            Value::Object(map) => map.contains_key(key),
            _ => false,
        }
    }

    /// The position of the first array element equal to `element`
    pub fn index_of<T: ?Sized>(&self, element: &T) -> Option<usize>
    where
        Value: PartialEq<T>,
    {
        match self {
            Value::Array(items) => items.iter().position(|item| item == element),
            _ => None,
        }
    }

    /// The keys of an object in sorted order, or [`None`] if this is not an object
    pub fn keys(&self) -> Option<Vec<&str>> {
        match self {
            Value::Object(map) => Some(map.keys().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Copy every entry of `other` into this object; entries from `other` replace existing keys
    pub fn join(&mut self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(map), Value::Object(incoming)) => {
                map.extend(
                    incoming
                        .iter()
                        .map(|(key, value)| (key.clone(), value.clone())),
                );
                true
            }
            _ => false,
        }
    }

    /// Add `other` as one new element at the end of this array, turning null into an array first
    pub fn append(&mut self, other: Value) -> bool {
        if self.is_null() {
            *self = Value::Array(vec![]);
        }
        match self {
            Value::Array(items) => {
                items.push(other);
                true
            }
            _ => false,
        }
    }

    /// Same as [`Value::append()`] for anything that converts into a [`Value`]
    pub fn push_back<V: Into<Value>>(&mut self, value: V) -> bool {
        self.append(value.into())
    }

    /// Remove an array element or object entry, shifting later array elements down
    pub fn remove<I: ValueIndex>(&mut self, index: I) -> Option<Value> {
        index.remove_from(self)
    }

    /// The last element of an array, otherwise [`NULL`]
    pub fn back(&self) -> &Value {
        match self {
            Value::Array(items) => items.last().unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// The first element of an array, otherwise [`NULL`]
    pub fn front(&self) -> &Value {
        match self {
            Value::Array(items) => items.first().unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Serialize as compact JSON
    pub fn to_json(&self) -> String {
        let mut document = String::new();
        JsonWriter::fast_write(self, &mut document);
        document
    }

    /// Serialize as indented, human-readable JSON
    pub fn to_styled_json(&self) -> String {
        JsonWriter::new().style_write(self).to_string()
    }

    /// Serialize as an XML property list
    pub fn to_plist(&self) -> String {
        let mut document = String::new();
        PlistWriter::fast_write(self, &mut document);
        document
    }

    /// Parse a JSON document
    pub fn from_json(document: impl AsRef<[u8]>) -> Result<Self, JsonParseError> {
        JsonReader::new(document.as_ref()).parse()
    }

    /// Parse an XML or binary property list, chosen by the document's signature
    pub fn from_plist(document: impl AsRef<[u8]>) -> Result<Self, PlistParseError> {
        PlistReader::new(document.as_ref()).parse()
    }

    /// Replace this value with a parsed JSON document; left unchanged on failure
    pub fn read(&mut self, document: impl AsRef<[u8]>) -> Result<(), JsonParseError> {
        *self = Value::from_json(document)?;
        Ok(())
    }

    /// Replace this value with a parsed property list; left unchanged on failure
    pub fn read_plist(&mut self, document: impl AsRef<[u8]>) -> Result<(), PlistParseError> {
        *self = Value::from_plist(document)?;
        Ok(())
    }
}

impl<I: ValueIndex> ops::Index<I> for Value {
    type Output = Value;

    fn index(&self, index: I) -> &Value {
        self.get(index)
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.write_str(&self.to_json())
    }
}

impl FromStr for Value {
    type Err = JsonParseError;

    fn from_str(document: &str) -> Result<Self, Self::Err> {
        Value::from_json(document)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use crate::value::{Value, ValueType, EMPTY_DATA, NULL};

    #[test]
    fn can_set_and_query_keys() {
        let mut value = Value::default();
        assert!(value.set("a", 1));
        assert!(value.set("b", 2));

        assert_eq!(value.len(), 2);
        assert!(value.has("a"));
        assert!(value.has("b"));
        assert!(!value.has("c"));
        assert_eq!(value.value_type(), ValueType::Object);
    }

    #[test]
    fn can_vivify_object_entry() {
        let mut value = Value::default();
        let slot = value.at("missing").unwrap();
        assert!(slot.is_null());
        assert!(value.has("missing"));
        assert_eq!(value.len(), 1);
    }

    #[test]
    fn can_vivify_and_pad_array() {
        let mut value = Value::default();
        *value.at(2).unwrap() = Value::from(7);

        assert!(value.is_array());
        assert_eq!(value.len(), 3);
        assert!(value[0].is_null());
        assert!(value[1].is_null());
        assert_eq!(value[2].as_i64(), 7);
    }

    #[test]
    fn can_extend_array_by_one() {
        let mut value = Value::from(vec![Value::from(1)]);
        assert!(value.set(1, "two"));
        assert_eq!(value.len(), 2);
        assert_eq!(value[1], "two");
    }

    #[test]
    fn cant_pad_past_available_memory() {
        let mut array = Value::from(vec![Value::from(1)]);
        assert!(array.at(usize::MAX).is_none());
        assert!(array.at(usize::MAX - 1).is_none());
        assert!(!array.set(usize::MAX / 2, true));
        assert_eq!(array, Value::from(vec![Value::from(1)]));

        let mut null = Value::Null;
        assert!(null.at(usize::MAX - 1).is_none());
        assert!(null.is_null());
    }

    #[test]
    fn cant_vivify_wrong_index_kind() {
        let mut value = Value::from(5);
        assert!(value.at("key").is_none());
        assert!(value.at(0).is_none());
        assert_eq!(value, Value::from(5));

        let mut array = Value::from(vec![Value::from(1)]);
        assert!(array.at("key").is_none());
        assert_eq!(array.len(), 1);

        let mut object = Value::with_type(ValueType::Object);
        assert!(object.at(0).is_none());
        assert!(object.is_empty());
    }

    #[test]
    fn can_read_without_mutation() {
        let value = Value::with_type(ValueType::Object);
        assert!(value["missing"].is_null());
        assert!(value.get(3).is_null());
        assert!(std::ptr::eq(value.get("missing"), &NULL));
        assert!(value.is_empty());

        let scalar = Value::from(true);
        assert!(scalar["key"].is_null());
        assert!(scalar[0].is_null());
    }

    #[test]
    fn can_get_mut_without_vivifying() {
        let mut value = Value::with_type(ValueType::Object);
        assert!(value.get_mut("missing").is_none());
        assert!(value.is_empty());

        value.set("present", 1);
        *value.get_mut("present").unwrap() = Value::from(2);
        assert_eq!(value["present"].as_i64(), 2);
    }

    #[test]
    fn can_coerce_mismatched_kinds() {
        let text = Value::from("hello");
        assert_eq!(text.as_i64(), 0);
        assert_eq!(text.as_int(), 0);
        assert!(!text.as_bool());
        assert_eq!(text.as_float(), 0.0);
        assert_eq!(text.as_date(), Utc.timestamp_opt(0, 0).unwrap());
        assert_eq!(text.as_data().as_ref(), EMPTY_DATA);

        let number = Value::from(42);
        assert_eq!(number.as_str(), "");
        assert_eq!(number.as_string(), "");
    }

    #[test]
    fn can_coerce_between_numbers() {
        assert_eq!(Value::from(2.9).as_i64(), 2);
        assert_eq!(Value::from(true).as_i64(), 1);
        assert_eq!(Value::from(3).as_float(), 3.0);
        assert!(Value::from(-1).as_bool());
        assert!(!Value::from(0.0).as_bool());
        assert_eq!(Value::from(i64::MAX).as_int(), -1);
    }

    #[test]
    fn can_report_sizes() {
        assert_eq!(Value::from("héllo").len(), 6);
        assert_eq!(Value::data(vec![1, 2, 3]).len(), 3);
        assert_eq!(Value::from(12).len(), 0);
        assert_eq!(Value::Null.len(), 0);
        assert!(Value::Null.is_empty());
        assert!(!Value::from(0).is_empty());
        assert!(Value::from("").is_empty());
    }

    #[test]
    fn can_change_type_on_assignment() {
        let mut value = Value::from(vec![Value::from(1), Value::from(2)]);
        assert!(value.is_array());
        value = Value::from("now a string");
        assert!(value.is_string());
        value.clear();
        assert!(value.is_null());
    }

    #[test]
    fn can_remove_array_element_in_order() {
        let mut value = Value::from(vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(value.remove(0), Some(Value::from(1)));
        assert_eq!(value, Value::from(vec![Value::from(2), Value::from(3)]));
        assert!(value.remove(5).is_none());
        assert!(value.remove("key").is_none());
        assert_eq!(value.len(), 2);
    }

    #[test]
    fn cant_remove_missing_key() {
        let mut value = Value::default();
        value.set("a", 1);
        value.set("b", "two");
        let before = value.clone();

        assert!(value.remove("missing-key").is_none());
        assert_eq!(value.len(), 2);
        assert_eq!(value, before);

        assert_eq!(value.remove("a"), Some(Value::from(1)));
        assert!(!value.has("a"));
        assert!(value.has("b"));
    }

    #[test]
    fn can_join_objects_incoming_wins() {
        let mut left = Value::default();
        left.set("shared", "left");
        left.set("only_left", 1);
        let mut right = Value::default();
        right.set("shared", "right");
        right.set("only_right", 2);

        assert!(left.join(&right));
        assert_eq!(left.len(), 3);
        assert_eq!(left["shared"], "right");
        assert_eq!(left["only_left"].as_i64(), 1);
        assert_eq!(left["only_right"].as_i64(), 2);
    }

    #[test]
    fn cant_join_non_objects() {
        let mut left = Value::default();
        left.set("a", 1);
        assert!(!left.join(&Value::from(vec![])));
        assert!(!Value::from(1).join(&left));
        assert!(!Value::Null.join(&left));
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn can_append_as_single_element() {
        let mut value = Value::default();
        let nested = Value::from(vec![Value::from(1), Value::from(2)]);
        assert!(value.append(nested.clone()));
        assert!(value.push_back("tail"));
        assert!(value.push_back(3.5));

        assert_eq!(value.len(), 3);
        assert_eq!(value.front(), &nested);
        assert_eq!(value.back(), &Value::from(3.5));
    }

    #[test]
    fn cant_append_to_scalar() {
        let mut value = Value::from("text");
        assert!(!value.append(Value::from(1)));
        assert!(!value.push_back(1));
        assert_eq!(value, "text");
    }

    #[test]
    fn can_get_sentinel_ends() {
        let empty = Value::with_type(ValueType::Array);
        assert!(empty.back().is_null());
        assert!(empty.front().is_null());
        assert!(Value::from(1).front().is_null());
    }

    #[test]
    fn can_find_index_of_element() {
        let value = Value::from(vec![Value::from("a"), Value::from(2), Value::from("c")]);
        assert_eq!(value.index_of("c"), Some(2));
        assert_eq!(value.index_of(&2i64), Some(1));
        assert_eq!(value.index_of("missing"), None);
        assert_eq!(Value::from("c").index_of("c"), None);
    }

    #[test]
    fn can_list_keys_in_order() {
        let mut value = Value::default();
        value.set("zeta", 1);
        value.set("alpha", 2);
        value.set("mid", 3);
        assert_eq!(value.keys(), Some(vec!["alpha", "mid", "zeta"]));
        assert!(Value::from(vec![]).keys().is_none());
    }

    #[test]
    fn can_deep_copy() {
        let mut original = Value::default();
        original.at("nested").unwrap().set("leaf", 1);
        let mut copy = original.clone();
        copy.at("nested").unwrap().set("leaf", 2);

        assert_eq!(original["nested"]["leaf"].as_i64(), 1);
        assert_eq!(copy["nested"]["leaf"].as_i64(), 2);
    }

    #[test]
    fn can_create_typed_empties() {
        assert_eq!(Value::with_type(ValueType::Object), Value::Object(BTreeMap::new()));
        assert_eq!(Value::with_type(ValueType::Data), Value::data(vec![]));
        assert_eq!(Value::with_type(ValueType::Integer).value_type(), ValueType::Integer);
    }

    #[test]
    fn can_use_date_and_data_strings() {
        let date = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let mut value = Value::default();
        value.assign_date_string(date);
        assert!(value.is_date_string());
        assert_eq!(value, "date:2021-06-01T12:00:00Z");
        assert_eq!(value.as_date(), date);

        let data = Value::from("data:AAEC");
        assert!(data.is_data_string());
        assert_eq!(data.as_data().as_ref(), &[0, 1, 2]);
        assert_eq!(Value::from("data:!!").as_data().as_ref(), EMPTY_DATA);
    }

    #[test]
    fn can_assign_native_date_and_data() {
        let date = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
        let mut value = Value::from(1);
        value.assign_date(date);
        assert!(value.is_date());
        assert_eq!(value.as_date(), date);

        value.assign_data(b"bytes");
        assert!(value.is_data());
        assert_eq!(value.as_data().as_ref(), b"bytes");
        assert!(!value.is_string());
    }

    #[test]
    fn can_parse_and_display() {
        let value: Value = r#"{"b":[1,2.5,"x"],"a":null}"#.parse().unwrap();
        assert_eq!(value.to_string(), r#"{"a":null,"b":[1,2.5,"x"]}"#);

        let mut target = Value::from(1);
        assert!(target.read("{").is_err());
        assert_eq!(target, Value::from(1));
        target.read("[true]").unwrap();
        assert_eq!(target[0], Value::from(true));
    }
}
