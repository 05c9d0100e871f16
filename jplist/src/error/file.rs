/*!
 Errors that can happen when reading or writing value trees through the filesystem.
*/

use std::{
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
    path::PathBuf,
};

use crate::error::{json::JsonParseError, plist::PlistParseError};

/// Errors that can happen when reading or writing documents on disk
#[derive(Debug)]
pub enum FileError {
    /// The file could not be opened, read, or written
    Io(IoError, PathBuf),
    /// The file was read but does not hold valid JSON
    Json(JsonParseError, PathBuf),
    /// The file was read but does not hold a valid property list
    Plist(PlistParseError, PathBuf),
}

impl Display for FileError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            FileError::Io(why, path) => write!(fmt, "{why}: {path:?}"),
            FileError::Json(why, path) => write!(fmt, "{why}: {path:?}"),
            FileError::Plist(why, path) => write!(fmt, "{why}: {path:?}"),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::Io(why, _) => Some(why),
            FileError::Json(why, _) => Some(why),
            FileError::Plist(why, _) => Some(why),
        }
    }
}
