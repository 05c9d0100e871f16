#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod app;
mod exporters;

use std::process::ExitCode;

use app::{
    options::{from_command_line, Options},
    runtime::Config,
};

fn main() -> ExitCode {
    // Get args from command line
    let args = from_command_line();
    // Create application options
    let options = match Options::from_args(&args) {
        Ok(options) => options,
        Err(why) => {
            eprintln!("{why}");
            return ExitCode::from(2);
        }
    };

    match Config::new(options).start() {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            eprintln!("Unable to convert: {why}");
            ExitCode::FAILURE
        }
    }
}
