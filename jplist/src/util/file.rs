/*!
 Helpers that read and write value trees on disk.

 The `*_path` variants take the path as a list of components, joined in order, so callers can
 build paths like `[bundle, "Contents", "Info.plist"]` without formatting strings.
*/

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    error::file::FileError,
    json::writer::JsonWriter,
    plist::{reader::PlistReader, writer::PlistWriter},
    value::Value,
};

fn read_bytes(path: &Path) -> Result<Vec<u8>, FileError> {
    let bytes = fs::read(path).map_err(|why| FileError::Io(why, path.to_path_buf()))?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn write_text(path: &Path, document: &str) -> Result<(), FileError> {
    fs::write(path, document).map_err(|why| FileError::Io(why, path.to_path_buf()))?;
    debug!("Wrote {} bytes to {}", document.len(), path.display());
    Ok(())
}

/// Read and parse a JSON file
pub fn read_file(path: impl AsRef<Path>) -> Result<Value, FileError> {
    let path = path.as_ref();
    Value::from_json(read_bytes(path)?).map_err(|why| FileError::Json(why, path.to_path_buf()))
}

/// Read and parse an XML or binary property list file
pub fn read_plist_file(path: impl AsRef<Path>) -> Result<Value, FileError> {
    let path = path.as_ref();
    PlistReader::new(&read_bytes(path)?)
        .parse()
        .map_err(|why| FileError::Plist(why, path.to_path_buf()))
}

/// Write `value` to a file as compact JSON
pub fn write_file(value: &Value, path: impl AsRef<Path>) -> Result<(), FileError> {
    let mut document = String::new();
    JsonWriter::fast_write(value, &mut document);
    write_text(path.as_ref(), &document)
}

/// Write `value` to a file as indented JSON
pub fn style_write_file(value: &Value, path: impl AsRef<Path>) -> Result<(), FileError> {
    write_text(path.as_ref(), JsonWriter::new().style_write(value))
}

/// Write `value` to a file as an XML property list
pub fn write_plist_file(value: &Value, path: impl AsRef<Path>) -> Result<(), FileError> {
    let mut document = String::new();
    PlistWriter::fast_write(value, &mut document);
    write_text(path.as_ref(), &document)
}

/// Join path components in order; an absolute component replaces everything before it
pub fn join_path<P: AsRef<Path>>(components: &[P]) -> PathBuf {
    components.iter().collect()
}

pub fn read_path<P: AsRef<Path>>(components: &[P]) -> Result<Value, FileError> {
    read_file(join_path(components))
}

pub fn read_plist_path<P: AsRef<Path>>(components: &[P]) -> Result<Value, FileError> {
    read_plist_file(join_path(components))
}

pub fn write_path<P: AsRef<Path>>(value: &Value, components: &[P]) -> Result<(), FileError> {
    write_file(value, join_path(components))
}

pub fn style_write_path<P: AsRef<Path>>(value: &Value, components: &[P]) -> Result<(), FileError> {
    style_write_file(value, join_path(components))
}

pub fn write_plist_path<P: AsRef<Path>>(value: &Value, components: &[P]) -> Result<(), FileError> {
    write_plist_file(value, join_path(components))
}
