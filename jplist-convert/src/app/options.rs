use std::{fmt::Display, path::PathBuf};

use clap::{crate_description, crate_name, crate_version, Arg, ArgMatches, Command};

use crate::app::error::RuntimeError;

// CLI Arg Names
pub const OPTION_INPUT: &str = "input";
pub const OPTION_OUTPUT: &str = "output";
pub const OPTION_FORMAT: &str = "format";

// Other CLI Text
pub const SUPPORTED_FORMATS: &str = "json, pretty, plist";
pub const ABOUT: &str = concat!(
    "Reads JSON, XML property lists, and binary property lists, ",
    "then writes the same tree as compact JSON, indented JSON, or an XML property list."
);

/// Represents the formats the converter can write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Compact JSON on a single line
    Json,
    /// Indented JSON
    Pretty,
    /// XML property list
    Plist,
}

impl OutputFormat {
    /// Create an instance of the enum given user input
    pub fn from_cli(format: &str) -> Option<Self> {
        match format.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "plist" => Some(Self::Plist),
            _ => None,
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(fmt, "json"),
            OutputFormat::Pretty => write!(fmt, "pretty"),
            OutputFormat::Plist => write!(fmt, "plist"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Options {
    /// Path to the document to convert
    pub input: PathBuf,
    /// Where to write the converted document; standard output if `None`
    pub output: Option<PathBuf>,
    /// The format to write
    pub format: OutputFormat,
}

impl Options {
    pub fn from_args(args: &ArgMatches) -> Result<Self, RuntimeError> {
        let input = args.get_one::<String>(OPTION_INPUT);
        let output = args.get_one::<String>(OPTION_OUTPUT);
        let format = args.get_one::<String>(OPTION_FORMAT);

        let input = match input {
            Some(path) => PathBuf::from(path),
            None => {
                return Err(RuntimeError::InvalidOptions(format!(
                    "Option --{OPTION_INPUT} is required"
                )))
            }
        };

        let format = match format {
            Some(format) => OutputFormat::from_cli(format).ok_or_else(|| {
                RuntimeError::InvalidOptions(format!(
                    "{format} is not a valid export type! Must be one of <{SUPPORTED_FORMATS}>"
                ))
            })?,
            None => OutputFormat::Pretty,
        };

        let output = output.map(PathBuf::from);
        if output.as_ref() == Some(&input) {
            return Err(RuntimeError::InvalidOptions(format!(
                "Option --{OPTION_OUTPUT} must not overwrite --{OPTION_INPUT}"
            )));
        }

        Ok(Options {
            input,
            output,
            format,
        })
    }
}

/// Build the command line parser
pub fn get_command() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .long_about(ABOUT)
        .arg_required_else_help(true)
        .arg(
            Arg::new(OPTION_INPUT)
                .short('i')
                .long(OPTION_INPUT)
                .help("Path to a JSON document or a property list in XML or binary form")
                .display_order(0)
                .value_name("path/to/document"),
        )
        .arg(
            Arg::new(OPTION_OUTPUT)
                .short('o')
                .long(OPTION_OUTPUT)
                .help("Where to write the converted document\nIf omitted, the document is written to standard output")
                .display_order(1)
                .value_name("path/to/output"),
        )
        .arg(
            Arg::new(OPTION_FORMAT)
                .short('f')
                .long(OPTION_FORMAT)
                .help("Specify the output format\nIf omitted, indented JSON is written")
                .display_order(2)
                .value_name(SUPPORTED_FORMATS),
        )
}

/// Parse arguments from the command line
pub fn from_command_line() -> ArgMatches {
    get_command().get_matches()
}

#[cfg(test)]
mod arg_tests {
    use std::path::PathBuf;

    use crate::app::{
        error::RuntimeError,
        options::{get_command, Options, OutputFormat},
    };

    fn parse(args: &[&str]) -> Result<Options, RuntimeError> {
        let matches = get_command()
            .try_get_matches_from(std::iter::once("jplist-convert").chain(args.iter().copied()))
            .unwrap();
        Options::from_args(&matches)
    }

    #[test]
    fn can_parse_output_formats() {
        assert_eq!(OutputFormat::from_cli("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_cli("PRETTY"), Some(OutputFormat::Pretty));
        assert_eq!(OutputFormat::from_cli("plist"), Some(OutputFormat::Plist));
        assert_eq!(OutputFormat::from_cli("yaml"), None);
    }

    #[test]
    fn can_build_default_options() {
        let options = parse(&["-i", "Info.plist"]).unwrap();
        assert_eq!(
            options,
            Options {
                input: PathBuf::from("Info.plist"),
                output: None,
                format: OutputFormat::Pretty,
            }
        );
    }

    #[test]
    fn can_build_full_options() {
        let options = parse(&["--input", "a.json", "--output", "b.plist", "--format", "plist"]).unwrap();
        assert_eq!(options.input, PathBuf::from("a.json"));
        assert_eq!(options.output, Some(PathBuf::from("b.plist")));
        assert_eq!(options.format, OutputFormat::Plist);
    }

    #[test]
    fn cant_build_without_input() {
        let options = parse(&["-f", "json"]);
        assert!(matches!(options, Err(RuntimeError::InvalidOptions(_))));
    }

    #[test]
    fn cant_build_bad_format() {
        let options = parse(&["-i", "a.json", "-f", "yaml"]);
        assert!(matches!(options, Err(RuntimeError::InvalidOptions(_))));
    }

    #[test]
    fn cant_build_overwriting_input() {
        let options = parse(&["-i", "a.json", "-o", "a.json"]);
        assert!(matches!(options, Err(RuntimeError::InvalidOptions(_))));
    }
}
