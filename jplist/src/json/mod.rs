/*!
 JSON text codec for [`Value`](crate::value::Value) trees.
*/

pub mod reader;
pub mod writer;
