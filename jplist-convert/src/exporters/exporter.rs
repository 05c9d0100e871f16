use std::{
    io::{stdout, Write},
    path::Path,
};

use jplist::{error::file::FileError, value::Value};

use crate::app::{error::RuntimeError, runtime::Config};

/// Defines behavior for writing a parsed tree in one output format
pub trait Exporter<'a> {
    /// Create a new exporter with a reference to the app configuration
    fn new(config: &'a Config) -> Self;
    /// The app configuration this exporter was created with
    fn config(&self) -> &Config;
    /// Serialize the tree to a string in this exporter's format
    fn render(&self, value: &Value) -> String;
    /// Serialize the tree directly to a file
    fn write_file(&self, value: &Value, path: &Path) -> Result<(), FileError>;

    /// Write the tree to the configured output file, or to standard output if there is none
    fn export(&self, value: &Value) -> Result<(), RuntimeError> {
        match &self.config().options.output {
            Some(path) => self.write_file(value, path).map_err(RuntimeError::from),
            None => {
                let mut document = self.render(value);
                if !document.ends_with('\n') {
                    document.push('\n');
                }
                stdout()
                    .lock()
                    .write_all(document.as_bytes())
                    .map_err(RuntimeError::OutputError)
            }
        }
    }
}
