/*!
 Contains logic to decode binary (`bplist00`) property lists into a [`Value`] tree.

 A binary property list is a header, a run of packed objects, an offset table that locates each
 object, and a fixed trailer. Containers refer to their children by index into the offset table,
 so the document is a graph that is walked from the root object named in the trailer.

 Every offset, length, and reference comes from untrusted input and is validated against the
 document before it is used. Containers are decoded with an explicit stack rather than recursion, so
 the nesting limit is the only bound on depth.
*/

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::{
    error::plist::PlistParseError,
    plist::models::{ObjectKind, Trailer, BINARY_MAGIC, TRAILER_SIZE},
    util::dates::from_apple_seconds,
    value::Value,
};

/// Containers may not nest deeper than this
pub const MAX_DEPTH: usize = 512;
/// Default cap on the number of decoded nodes, including every repeat of a shared object
pub const MAX_OBJECTS: usize = 1 << 20;
/// Default cap on decoded string and data bytes, as a multiple of the document size
pub const MAX_PAYLOAD_RATIO: usize = 64;

/// Low nibble that signals the real length follows the marker as an integer object
const EXTENDED_LENGTH: u8 = 0x0F;
/// Key used when a unique identifier is represented as a dictionary
const UID_KEY: &str = "CF$UID";

/// Read a big-endian unsigned integer of up to 8 bytes
fn read_sized_uint(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// An object decoded from the document, or a container whose children still need decoding
enum Step {
    Done(Value),
    Open(Container),
}

/// A container being filled in as its children are decoded
struct Container {
    /// Object reference of the container itself
    reference: u64,
    /// Children left to decode; dictionaries alternate key and value references
    children: std::vec::IntoIter<u64>,
    /// The child most recently handed out by [`Container::next_child()`]
    last_child: u64,
    body: Body,
}

enum Body {
    Array(Vec<Value>),
    Dictionary {
        object: BTreeMap<String, Value>,
        /// A decoded key still waiting for its value
        key: Option<String>,
    },
}

impl Container {
    fn array(reference: u64, children: Vec<u64>) -> Self {
        let items = Vec::with_capacity(children.len());
        Self {
            reference,
            children: children.into_iter(),
            last_child: reference,
            body: Body::Array(items),
        }
    }

    fn dictionary(reference: u64, keys: &[u64], values: &[u64]) -> Self {
        let children: Vec<u64> = keys
            .iter()
            .zip(values)
            .flat_map(|(key, value)| [*key, *value])
            .collect();
        Self {
            reference,
            children: children.into_iter(),
            last_child: reference,
            body: Body::Dictionary {
                object: BTreeMap::new(),
                key: None,
            },
        }
    }

    fn next_child(&mut self) -> Option<u64> {
        let child = self.children.next()?;
        self.last_child = child;
        Some(child)
    }

    /// Store the decoded value of the last child handed out
    fn accept(&mut self, value: Value) -> Result<(), PlistParseError> {
        match &mut self.body {
            Body::Array(items) => items.push(value),
            Body::Dictionary { object, key } => match key.take() {
                Some(key) => {
                    object.insert(key, value);
                }
                None => match value {
                    Value::String(text) => *key = Some(text),
                    _ => return Err(PlistParseError::InvalidKey(self.last_child)),
                },
            },
        }
        Ok(())
    }

    fn finish(self) -> Value {
        match self.body {
            Body::Array(items) => Value::Array(items),
            Body::Dictionary { object, .. } => Value::Object(object),
        }
    }
}

/// Contains logic and data used to decode a binary property list
#[derive(Debug)]
pub struct BinaryPlistReader<'a> {
    /// The document we want to decode
    stream: &'a [u8],
    /// Byte offset of each object, indexed by object reference
    offsets: Vec<usize>,
    /// Width in bytes of object references in the current document
    ref_size: usize,
    /// References of the containers currently being decoded, used to detect cycles
    visiting: Vec<u64>,
    /// How many nodes have been decoded so far
    decoded: usize,
    /// The most nodes a single document may decode to
    object_limit: usize,
    /// How many string and data bytes have been decoded so far
    payload: usize,
    /// The most string and data bytes a single document may decode to
    payload_limit: usize,
    /// The failure from the most recent call to [`BinaryPlistReader::parse()`]
    error: Option<PlistParseError>,
}

impl<'a> BinaryPlistReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            offsets: vec![],
            ref_size: 0,
            visiting: vec![],
            decoded: 0,
            object_limit: MAX_OBJECTS,
            payload: 0,
            payload_limit: stream.len().saturating_mul(MAX_PAYLOAD_RATIO),
            error: None,
        }
    }

    /// Change the cap on decoded nodes from [`MAX_OBJECTS`]
    pub fn with_object_limit(mut self, object_limit: usize) -> Self {
        self.object_limit = object_limit;
        self
    }

    /// Change the cap on decoded string and data bytes from [`MAX_PAYLOAD_RATIO`] times the document size
    pub fn with_payload_limit(mut self, payload_limit: usize) -> Self {
        self.payload_limit = payload_limit;
        self
    }

    /// Decode the document
    ///
    /// On failure the error is also kept and can be retrieved with [`BinaryPlistReader::error()`].
    pub fn parse(&mut self) -> Result<Value, PlistParseError> {
        self.offsets.clear();
        self.visiting.clear();
        self.decoded = 0;
        self.payload = 0;
        self.error = None;

        let result = self.parse_document();
        if let Err(why) = &result {
            warn!("Rejected binary plist: {why}");
            self.error = Some(why.clone());
        }
        result
    }

    /// The failure from the most recent parse, if it failed
    pub fn error(&self) -> Option<&PlistParseError> {
        self.error.as_ref()
    }

    fn parse_document(&mut self) -> Result<Value, PlistParseError> {
        self.validate_header()?;
        let trailer = self.read_trailer()?;
        debug!(
            "Binary plist of {} bytes: {} objects, root {}, offset table at {:x} ({}-byte entries, {}-byte references)",
            self.stream.len(),
            trailer.num_objects,
            trailer.top_object,
            trailer.offset_table_offset,
            trailer.offset_size,
            trailer.ref_size
        );
        self.ref_size = usize::from(trailer.ref_size);
        self.read_offset_table(&trailer)?;
        self.read_tree(trailer.top_object)
    }

    fn validate_header(&self) -> Result<(), PlistParseError> {
        if self.stream.len() < BINARY_MAGIC.len() + TRAILER_SIZE {
            return Err(PlistParseError::TooShort(self.stream.len()));
        }
        if self.read_bytes(0, BINARY_MAGIC.len())? != BINARY_MAGIC {
            return Err(PlistParseError::InvalidHeader);
        }
        Ok(())
    }

    /// Offset of the trailer, which is also the end of the object and offset table region
    fn trailer_start(&self) -> usize {
        self.stream.len().saturating_sub(TRAILER_SIZE)
    }

    fn read_trailer(&self) -> Result<Trailer, PlistParseError> {
        let bytes: &[u8; TRAILER_SIZE] = self
            .read_bytes(self.trailer_start(), TRAILER_SIZE)?
            .try_into()
            .map_err(PlistParseError::SliceError)?;
        Trailer::from_bytes(bytes)
    }

    /// Build the table of object offsets, after checking the whole table fits before the trailer
    fn read_offset_table(&mut self, trailer: &Trailer) -> Result<(), PlistParseError> {
        let count = usize::try_from(trailer.num_objects)
            .map_err(|_| PlistParseError::InvalidTrailer("object count does not fit in memory"))?;
        let entry_size = usize::from(trailer.offset_size);
        let table_len = count
            .checked_mul(entry_size)
            .ok_or(PlistParseError::InvalidTrailer("offset table size overflows"))?;
        let table_start = usize::try_from(trailer.offset_table_offset)
            .map_err(|_| PlistParseError::OutOfBounds(usize::MAX, self.trailer_start()))?;
        if table_start < BINARY_MAGIC.len() {
            return Err(PlistParseError::InvalidTrailer("offset table overlaps the header"));
        }
        let table_end = table_start
            .checked_add(table_len)
            .ok_or(PlistParseError::OutOfBounds(table_start, self.trailer_start()))?;
        if table_end > self.trailer_start() {
            return Err(PlistParseError::OutOfBounds(table_end, self.trailer_start()));
        }

        let table = self.read_bytes(table_start, table_len)?;
        self.offsets = table
            .chunks_exact(entry_size)
            .map(|entry| {
                usize::try_from(read_sized_uint(entry))
                    .map_err(|_| PlistParseError::OutOfBounds(usize::MAX, self.stream.len()))
            })
            .collect::<Result<Vec<usize>, PlistParseError>>()?;
        Ok(())
    }

    /// Get a slice of the document, failing if any part of it lies outside the document
    fn read_bytes(&self, start: usize, len: usize) -> Result<&'a [u8], PlistParseError> {
        let stream: &'a [u8] = self.stream;
        let end = start
            .checked_add(len)
            .ok_or(PlistParseError::OutOfBounds(start, stream.len()))?;
        stream
            .get(start..end)
            .ok_or(PlistParseError::OutOfBounds(end, stream.len()))
    }

    fn get_byte(&self, byte_idx: usize) -> Result<u8, PlistParseError> {
        self.stream
            .get(byte_idx)
            .copied()
            .ok_or(PlistParseError::OutOfBounds(byte_idx, self.stream.len()))
    }

    fn object_offset(&self, reference: u64) -> Result<usize, PlistParseError> {
        usize::try_from(reference)
            .ok()
            .and_then(|idx| self.offsets.get(idx))
            .copied()
            .ok_or(PlistParseError::InvalidReference(
                reference,
                self.offsets.len() as u64,
            ))
    }

    /// Decode the object with the given reference and everything it contains
    fn read_tree(&mut self, root: u64) -> Result<Value, PlistParseError> {
        let mut current = match self.read_object(root, 0)? {
            Step::Done(value) => return Ok(value),
            Step::Open(container) => container,
        };
        self.visiting.push(current.reference);
        // Containers enclosing `current`, outermost first
        let mut ancestors: Vec<Container> = vec![];

        loop {
            match current.next_child() {
                Some(child) => match self.read_object(child, ancestors.len() + 1)? {
                    Step::Done(value) => current.accept(value)?,
                    Step::Open(container) => {
                        self.visiting.push(container.reference);
                        ancestors.push(std::mem::replace(&mut current, container));
                    }
                },
                None => {
                    self.visiting.pop();
                    match ancestors.pop() {
                        Some(parent) => {
                            let finished = std::mem::replace(&mut current, parent);
                            current.accept(finished.finish())?;
                        }
                        None => return Ok(current.finish()),
                    }
                }
            }
        }
    }

    /// Decode a single object, leaving the children of containers for [`BinaryPlistReader::read_tree()`]
    fn read_object(&mut self, reference: u64, depth: usize) -> Result<Step, PlistParseError> {
        if depth > MAX_DEPTH {
            return Err(PlistParseError::TooDeep(MAX_DEPTH));
        }
        if self.visiting.contains(&reference) {
            return Err(PlistParseError::ReferenceCycle(reference));
        }
        self.decoded += 1;
        if self.decoded > self.object_limit {
            return Err(PlistParseError::TooManyObjects(self.object_limit));
        }

        let offset = self.object_offset(reference)?;
        self.read_object_at(reference, offset)
    }

    /// Count `len` decoded string or data bytes against the payload limit
    fn charge_payload(&mut self, len: usize) -> Result<(), PlistParseError> {
        self.payload = self.payload.saturating_add(len);
        if self.payload > self.payload_limit {
            return Err(PlistParseError::TooMuchData(self.payload_limit));
        }
        Ok(())
    }

    fn read_object_at(&mut self, reference: u64, offset: usize) -> Result<Step, PlistParseError> {
        let marker = self.get_byte(offset)?;
        let info = marker & 0x0F;
        let kind = ObjectKind::from_marker(marker).ok_or(PlistParseError::InvalidMarker(marker))?;

        let value = match kind {
            ObjectKind::Singleton => match marker {
                0x00 | 0x0F => Value::Null,
                0x08 => Value::Boolean(false),
                0x09 => Value::Boolean(true),
                _ => return Err(PlistParseError::InvalidMarker(marker)),
            },
            ObjectKind::Integer => Value::Integer(self.read_int(offset)?),
            ObjectKind::Real => Value::Float(self.read_real(offset)?),
            ObjectKind::Date => {
                if marker != 0x33 {
                    return Err(PlistParseError::InvalidMarker(marker));
                }
                let seconds = self.read_real(offset)?;
                from_apple_seconds(seconds)
                    .map(Value::Date)
                    .ok_or(PlistParseError::InvalidDate(offset))?
            }
            ObjectKind::Data => {
                let (len, start) = self.read_length(offset, info)?;
                let bytes = self.read_bytes(start, len)?;
                self.charge_payload(len)?;
                Value::Data(bytes.to_vec())
            }
            ObjectKind::AsciiString => {
                let (len, start) = self.read_length(offset, info)?;
                let text = std::str::from_utf8(self.read_bytes(start, len)?)
                    .map_err(PlistParseError::StringParseError)?;
                self.charge_payload(len)?;
                Value::String(text.to_string())
            }
            ObjectKind::Utf16String => {
                let (units, start) = self.read_length(offset, info)?;
                let len = units
                    .checked_mul(2)
                    .ok_or(PlistParseError::InvalidLength(offset))?;
                let bytes = self.read_bytes(start, len)?;
                self.charge_payload(len)?;
                let code_units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                char::decode_utf16(code_units)
                    .collect::<Result<String, _>>()
                    .map(Value::String)
                    .map_err(|_| PlistParseError::InvalidUtf16(offset))?
            }
            ObjectKind::Uid => {
                let width = usize::from(info) + 1;
                if width > 8 {
                    return Err(PlistParseError::InvalidMarker(marker));
                }
                let uid = read_sized_uint(self.read_bytes(offset + 1, width)?);
                let mut object = BTreeMap::new();
                object.insert(UID_KEY.to_string(), Value::Integer(uid as i64));
                Value::Object(object)
            }
            ObjectKind::Array | ObjectKind::Set => {
                let (count, start) = self.read_length(offset, info)?;
                let references = self.read_references(offset, start, count)?;
                return Ok(Step::Open(Container::array(reference, references)));
            }
            ObjectKind::Dictionary => {
                let (count, start) = self.read_length(offset, info)?;
                let total = count
                    .checked_mul(2)
                    .ok_or(PlistParseError::InvalidLength(offset))?;
                let references = self.read_references(offset, start, total)?;
                let (keys, values) = references.split_at(count);
                return Ok(Step::Open(Container::dictionary(reference, keys, values)));
            }
        };
        Ok(Step::Done(value))
    }

    /// Read the length of a data, string, or container object
    ///
    /// Returns the length and the offset where the object's payload starts.
    fn read_length(&self, offset: usize, info: u8) -> Result<(usize, usize), PlistParseError> {
        if info != EXTENDED_LENGTH {
            return Ok((usize::from(info), offset + 1));
        }

        let int_marker = self.get_byte(offset + 1)?;
        if int_marker >> 4 != 0x1 || int_marker & 0x0F > 3 {
            return Err(PlistParseError::InvalidLength(offset));
        }
        let width = 1usize << (int_marker & 0x0F);
        let len = read_sized_uint(self.read_bytes(offset + 2, width)?);
        let len = usize::try_from(len).map_err(|_| PlistParseError::InvalidLength(offset))?;
        Ok((len, offset + 2 + width))
    }

    /// Read `count` object references starting at `start`
    ///
    /// The whole run is bounds checked before anything is allocated.
    fn read_references(
        &self,
        offset: usize,
        start: usize,
        count: usize,
    ) -> Result<Vec<u64>, PlistParseError> {
        let len = count
            .checked_mul(self.ref_size)
            .ok_or(PlistParseError::InvalidLength(offset))?;
        Ok(self
            .read_bytes(start, len)?
            .chunks_exact(self.ref_size)
            .map(read_sized_uint)
            .collect())
    }

    /// Read an integer object; 16-byte integers keep their low 8 bytes
    fn read_int(&self, offset: usize) -> Result<i64, PlistParseError> {
        let marker = self.get_byte(offset)?;
        let width = match marker & 0x0F {
            power @ 0..=4 => 1usize << power,
            _ => return Err(PlistParseError::InvalidMarker(marker)),
        };
        let bytes = self.read_bytes(offset + 1, width)?;
        Ok(read_sized_uint(&bytes[bytes.len().saturating_sub(8)..]) as i64)
    }

    /// Read a 4 or 8 byte floating point object
    fn read_real(&self, offset: usize) -> Result<f64, PlistParseError> {
        let marker = self.get_byte(offset)?;
        match marker & 0x0F {
            2 => Ok(f64::from(f32::from_be_bytes(
                self.read_bytes(offset + 1, 4)?
                    .try_into()
                    .map_err(PlistParseError::SliceError)?,
            ))),
            3 => Ok(f64::from_be_bytes(
                self.read_bytes(offset + 1, 8)?
                    .try_into()
                    .map_err(PlistParseError::SliceError)?,
            )),
            _ => Err(PlistParseError::InvalidMarker(marker)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::plist::binary_reader::read_sized_uint;

    #[test]
    fn can_read_sized_uint() {
        assert_eq!(read_sized_uint(&[]), 0);
        assert_eq!(read_sized_uint(&[0x2A]), 42);
        assert_eq!(read_sized_uint(&[0x01, 0x00]), 256);
        assert_eq!(read_sized_uint(&[0xFF; 8]), u64::MAX);
    }
}
