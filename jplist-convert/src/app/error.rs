/*!
Errors that can happen during the application's runtime
*/

use std::{
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
};

use jplist::error::file::FileError;

/// Errors that can happen during the application's runtime
#[derive(Debug)]
pub enum RuntimeError {
    InvalidOptions(String),
    FileError(FileError),
    /// Writing the converted document to standard output failed
    OutputError(IoError),
}

impl Display for RuntimeError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            RuntimeError::InvalidOptions(why) => write!(fmt, "Invalid options!\n{why}"),
            RuntimeError::FileError(why) => write!(fmt, "{why}"),
            RuntimeError::OutputError(why) => write!(fmt, "Unable to write output: {why}"),
        }
    }
}

impl From<FileError> for RuntimeError {
    fn from(why: FileError) -> Self {
        RuntimeError::FileError(why)
    }
}
