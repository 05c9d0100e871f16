/*!
 Entry point for parsing property lists in either serialization.
*/

use log::debug;

use crate::{
    error::plist::PlistParseError,
    plist::{
        binary_reader::BinaryPlistReader, models::BINARY_SIGNATURE, xml_reader::XmlPlistReader,
    },
    value::Value,
};

/// Parses a property list, picking the decoder from the document's signature
///
/// Documents starting with `bplist` are decoded as binary property lists; everything else is read as XML.
#[derive(Debug)]
pub struct PlistReader<'a> {
    /// The document we want to parse
    doc: &'a [u8],
    /// The failure from the most recent call to [`PlistReader::parse()`]
    error: Option<PlistParseError>,
}

impl<'a> PlistReader<'a> {
    pub fn new(doc: &'a [u8]) -> Self {
        Self { doc, error: None }
    }

    /// `true` if the document carries the binary property list signature
    pub fn is_binary(&self) -> bool {
        self.doc.starts_with(BINARY_SIGNATURE)
    }

    pub fn parse(&mut self) -> Result<Value, PlistParseError> {
        let result = if self.is_binary() {
            debug!("Decoding {} bytes as a binary plist", self.doc.len());
            BinaryPlistReader::new(self.doc).parse()
        } else {
            debug!("Decoding {} bytes as an XML plist", self.doc.len());
            XmlPlistReader::new(self.doc).parse()
        };
        self.error = result.as_ref().err().cloned();
        result
    }

    /// The failure from the most recent parse, if it failed
    pub fn error(&self) -> Option<&PlistParseError> {
        self.error.as_ref()
    }
}
