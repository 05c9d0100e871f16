use std::path::Path;

use jplist::{
    error::file::FileError, plist::writer::PlistWriter, util::file::write_plist_file,
    value::Value,
};

use crate::{app::runtime::Config, exporters::exporter::Exporter};

/// Writes XML property lists
pub struct Plist<'a> {
    config: &'a Config,
}

impl<'a> Exporter<'a> for Plist<'a> {
    fn new(config: &'a Config) -> Self {
        Plist { config }
    }

    fn config(&self) -> &Config {
        self.config
    }

    fn render(&self, value: &Value) -> String {
        let mut document = String::new();
        PlistWriter::fast_write(value, &mut document);
        document
    }

    fn write_file(&self, value: &Value, path: &Path) -> Result<(), FileError> {
        write_plist_file(value, path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use jplist::value::Value;

    use crate::{
        app::{
            options::{Options, OutputFormat},
            runtime::Config,
        },
        exporters::{exporter::Exporter, plist::Plist},
    };

    #[test]
    fn can_render_plist() {
        let config = Config::new(Options {
            input: PathBuf::from("in.json"),
            output: None,
            format: OutputFormat::Plist,
        });
        let mut value = Value::Null;
        value.set("when", "date:2001-01-01T00:00:00Z");

        let document = Plist::new(&config).render(&value);
        assert!(document.starts_with("<?xml"));
        assert!(document.contains("<date>2001-01-01T00:00:00Z</date>"));
        assert!(document.ends_with("</plist>\n"));
    }
}
