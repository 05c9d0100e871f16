/*!
 Errors that can happen when parsing property list data, in either the XML or the binary (`bplist00`) form.
*/

use std::{
    array::TryFromSliceError,
    fmt::{Display, Formatter, Result},
    str::Utf8Error,
};

use base64::DecodeError;

/// Errors that can happen when parsing property list data
#[derive(Debug, Clone)]
pub enum PlistParseError {
    /// Malformed XML markup at the given byte offset
    InvalidXml(usize, String),
    /// An XML element held text that does not match its type
    InvalidValue(usize, &'static str),
    /// A `<data>` element held invalid base64
    InvalidData(usize, DecodeError),
    /// The document is empty or holds no root element
    Empty,
    /// The binary document does not start with `bplist00`
    InvalidHeader,
    /// The binary document is shorter than its header and trailer
    TooShort(usize),
    /// A trailer field holds an unusable value
    InvalidTrailer(&'static str),
    /// A read at the first index would pass the end of a region of the second length
    OutOfBounds(usize, usize),
    /// An object reference that is not below the object count
    InvalidReference(u64, u64),
    /// An object that contains itself through its children
    ReferenceCycle(u64),
    /// An object marker byte that is not part of the format
    InvalidMarker(u8),
    /// An extended length at the given offset is malformed or does not fit in memory
    InvalidLength(usize),
    /// A dictionary key that does not resolve to a string
    InvalidKey(u64),
    /// A date at the given offset is not representable
    InvalidDate(usize),
    SliceError(TryFromSliceError),
    StringParseError(Utf8Error),
    /// A UTF-16 string at the given offset holds an unpaired surrogate
    InvalidUtf16(usize),
    /// Containers nested deeper than the reader allows
    TooDeep(usize),
    /// The document expands to more nodes than the reader allows
    TooManyObjects(usize),
    /// The document expands to more string and data bytes than the reader allows
    TooMuchData(usize),
}

impl Display for PlistParseError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            PlistParseError::InvalidXml(offset, why) => {
                write!(fmt, "Invalid plist markup at byte {offset}: {why}")
            }
            PlistParseError::InvalidValue(offset, kind) => {
                write!(fmt, "Invalid {kind} value at byte {offset}")
            }
            PlistParseError::InvalidData(offset, why) => {
                write!(fmt, "Invalid data at byte {offset}: {why}")
            }
            PlistParseError::Empty => write!(fmt, "Property list has no root value!"),
            PlistParseError::InvalidHeader => write!(fmt, "Invalid binary plist header!"),
            PlistParseError::TooShort(len) => {
                write!(fmt, "Binary plist of {len} bytes is too short!")
            }
            PlistParseError::InvalidTrailer(why) => write!(fmt, "Invalid binary plist trailer: {why}"),
            PlistParseError::OutOfBounds(idx, len) => {
                write!(fmt, "Index {idx:x} is outside of range {len:x}!")
            }
            PlistParseError::InvalidReference(reference, count) => {
                write!(fmt, "Object reference {reference} is outside of {count} objects!")
            }
            PlistParseError::ReferenceCycle(reference) => {
                write!(fmt, "Object reference {reference} refers to itself!")
            }
            PlistParseError::InvalidMarker(marker) => {
                write!(fmt, "Invalid object marker {marker:#04x}")
            }
            PlistParseError::InvalidLength(offset) => {
                write!(fmt, "Invalid object length at byte {offset:x}")
            }
            PlistParseError::InvalidKey(reference) => {
                write!(fmt, "Dictionary key at object reference {reference} is not a string")
            }
            PlistParseError::InvalidDate(offset) => write!(fmt, "Invalid date at byte {offset:x}"),
            PlistParseError::SliceError(why) => {
                write!(fmt, "Unable to slice source stream: {why}")
            }
            PlistParseError::StringParseError(why) => write!(fmt, "Failed to parse string: {why}"),
            PlistParseError::InvalidUtf16(offset) => {
                write!(fmt, "Invalid UTF-16 string at byte {offset:x}")
            }
            PlistParseError::TooDeep(depth) => {
                write!(fmt, "Containers nested deeper than {depth} levels")
            }
            PlistParseError::TooManyObjects(limit) => {
                write!(fmt, "Document expands to more than {limit} objects")
            }
            PlistParseError::TooMuchData(limit) => {
                write!(fmt, "Document expands to more than {limit} bytes of strings and data")
            }
        }
    }
}

impl std::error::Error for PlistParseError {}
