#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod json;
pub mod plist;
pub mod util;
pub mod value;

pub use value::{Value, ValueType};
