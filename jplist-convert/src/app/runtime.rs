use std::{fmt::Display, fs, path::Path};

use jplist::{error::file::FileError, value::Value};

use crate::{
    app::{
        error::RuntimeError,
        options::{Options, OutputFormat},
    },
    exporters::{exporter::Exporter, json::Json, plist::Plist},
};

/// The kinds of document the converter can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Json,
    XmlPlist,
    BinaryPlist,
}

impl InputKind {
    /// Guess the kind of a document from its first bytes
    pub fn detect(document: &[u8]) -> Self {
        if document.starts_with(b"bplist") {
            return InputKind::BinaryPlist;
        }
        let first = document
            .iter()
            .position(|byte| !byte.is_ascii_whitespace())
            .map(|idx| &document[idx..])
            .unwrap_or_default();
        // Skip a UTF-8 byte order mark
        let first = first.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(first);
        if first.starts_with(b"<") {
            InputKind::XmlPlist
        } else {
            InputKind::Json
        }
    }
}

impl Display for InputKind {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::Json => write!(fmt, "JSON"),
            InputKind::XmlPlist => write!(fmt, "XML plist"),
            InputKind::BinaryPlist => write!(fmt, "binary plist"),
        }
    }
}

/// Parse a document of a given kind, attributing failures to `path`
pub fn parse_document(kind: InputKind, document: &[u8], path: &Path) -> Result<Value, FileError> {
    match kind {
        InputKind::Json => {
            Value::from_json(document).map_err(|why| FileError::Json(why, path.to_path_buf()))
        }
        InputKind::XmlPlist | InputKind::BinaryPlist => {
            Value::from_plist(document).map_err(|why| FileError::Plist(why, path.to_path_buf()))
        }
    }
}

/// Stores the application state
#[derive(Debug)]
pub struct Config {
    /// App configuration options
    pub options: Options,
}

impl Config {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Read and parse the input document
    pub fn read_input(&self) -> Result<(InputKind, Value), RuntimeError> {
        let path = &self.options.input;
        let document = fs::read(path).map_err(|why| FileError::Io(why, path.clone()))?;
        let kind = InputKind::detect(&document);
        let value = parse_document(kind, &document, path)?;
        Ok((kind, value))
    }

    /// Convert the input document to the requested format
    pub fn start(&self) -> Result<(), RuntimeError> {
        let (kind, value) = self.read_input()?;
        eprintln!(
            "Read {kind} from {}, converting to {}...",
            self.options.input.display(),
            self.options.format
        );

        match self.options.format {
            OutputFormat::Json | OutputFormat::Pretty => Json::new(self).export(&value)?,
            OutputFormat::Plist => Plist::new(self).export(&value)?,
        }

        if let Some(output) = &self.options.output {
            eprintln!("Wrote {}", output.display());
        }
        Ok(())
    }
}
