/*!
 Contains logic to read and write Apple property lists.

 ## Overview

 A property list stores the same tree of values as JSON, plus dates and raw data, in one of two forms:

 - XML text, following Apple's `PropertyList-1.0.dtd`
 - A compact binary container that starts with `bplist00`

 [`reader::PlistReader`] accepts both and picks the decoder from the document's signature.
 [`writer::PlistWriter`] only produces the XML form.

 ## Untrusted input

 Property lists often come from files we did not create, so the binary decoder validates every offset,
 length, and object reference against the document before using it. Truncated documents, reference cycles,
 and lengths that overflow all fail with a [`PlistParseError`](crate::error::plist::PlistParseError).
*/

pub mod binary_reader;
pub mod models;
pub mod reader;
pub mod writer;
pub mod xml_reader;

pub use writer::xml_escape;
pub use xml_reader::xml_unescape;
