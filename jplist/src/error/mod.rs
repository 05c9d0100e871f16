/*!
 Errors that can happen when reading, writing, or converting value trees.
*/

pub mod file;
pub mod json;
pub mod plist;
