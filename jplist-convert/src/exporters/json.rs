use std::path::Path;

use jplist::{
    error::file::FileError,
    json::writer::JsonWriter,
    util::file::{style_write_file, write_file},
    value::Value,
};

use crate::{
    app::{options::OutputFormat, runtime::Config},
    exporters::exporter::Exporter,
};

/// Writes compact or indented JSON, depending on the requested format
pub struct Json<'a> {
    config: &'a Config,
}

impl<'a> Json<'a> {
    fn styled(&self) -> bool {
        self.config.options.format == OutputFormat::Pretty
    }
}

impl<'a> Exporter<'a> for Json<'a> {
    fn new(config: &'a Config) -> Self {
        Json { config }
    }

    fn config(&self) -> &Config {
        self.config
    }

    fn render(&self, value: &Value) -> String {
        if self.styled() {
            return JsonWriter::new().style_write(value).to_string();
        }
        let mut document = String::new();
        JsonWriter::fast_write(value, &mut document);
        document
    }

    fn write_file(&self, value: &Value, path: &Path) -> Result<(), FileError> {
        if self.styled() {
            style_write_file(value, path)
        } else {
            write_file(value, path)
        }
    }
}
