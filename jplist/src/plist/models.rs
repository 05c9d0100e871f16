/*!
 Data structures that describe the layout of a binary (`bplist00`) property list.
*/

use crate::error::plist::PlistParseError;

/// The literal every binary property list starts with
pub const BINARY_MAGIC: &[u8; 8] = b"bplist00";
/// Documents starting with this are dispatched to the binary reader
pub const BINARY_SIGNATURE: &[u8; 6] = b"bplist";
/// Size of the fixed footer at the end of a binary property list
pub const TRAILER_SIZE: usize = 32;

/// The fixed 32-byte footer of a binary property list
///
/// Layout: 6 unused bytes, a sort version, the offset table entry width, the object reference width,
/// then big-endian 64-bit object count, root object index, and offset table position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    pub sort_version: u8,
    /// Width in bytes of each offset table entry
    pub offset_size: u8,
    /// Width in bytes of each object reference inside arrays and dictionaries
    pub ref_size: u8,
    pub num_objects: u64,
    /// Index of the root object in the offset table
    pub top_object: u64,
    /// Byte position of the offset table within the document
    pub offset_table_offset: u64,
}

impl Trailer {
    /// Read and validate the trailer fields
    pub fn from_bytes(bytes: &[u8; TRAILER_SIZE]) -> Result<Self, PlistParseError> {
        let read_u64 = |start: usize| -> Result<u64, PlistParseError> {
            Ok(u64::from_be_bytes(
                bytes[start..start + 8]
                    .try_into()
                    .map_err(PlistParseError::SliceError)?,
            ))
        };

        let trailer = Self {
            sort_version: bytes[5],
            offset_size: bytes[6],
            ref_size: bytes[7],
            num_objects: read_u64(8)?,
            top_object: read_u64(16)?,
            offset_table_offset: read_u64(24)?,
        };

        if !(1..=8).contains(&trailer.offset_size) {
            return Err(PlistParseError::InvalidTrailer("offset size must be 1 to 8 bytes"));
        }
        if !(1..=8).contains(&trailer.ref_size) {
            return Err(PlistParseError::InvalidTrailer("reference size must be 1 to 8 bytes"));
        }
        if trailer.num_objects == 0 {
            return Err(PlistParseError::InvalidTrailer("no objects"));
        }
        if trailer.top_object >= trailer.num_objects {
            return Err(PlistParseError::InvalidReference(
                trailer.top_object,
                trailer.num_objects,
            ));
        }
        Ok(trailer)
    }
}

/// The kind of object selected by the high nibble of a marker byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Null, booleans, and fill bytes; the low nibble says which
    Singleton,
    Integer,
    Real,
    Date,
    Data,
    AsciiString,
    Utf16String,
    Uid,
    Array,
    Set,
    Dictionary,
}

impl ObjectKind {
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker >> 4 {
            0x0 => Some(Self::Singleton),
            0x1 => Some(Self::Integer),
            0x2 => Some(Self::Real),
            0x3 => Some(Self::Date),
            0x4 => Some(Self::Data),
            0x5 => Some(Self::AsciiString),
            0x6 => Some(Self::Utf16String),
            0x8 => Some(Self::Uid),
            0xA => Some(Self::Array),
            0xC => Some(Self::Set),
            0xD => Some(Self::Dictionary),
            _ => None,
        }
    }
}
