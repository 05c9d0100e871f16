/*!
 This module defines utilities shared by the codecs and the filesystem helpers.
*/

pub mod dates;
pub mod file;
