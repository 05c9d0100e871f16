/*!
 Contains the data structure used to describe which kind of data a [`Value`](crate::value::Value) holds.
*/

use std::fmt::Display;

/// The kinds of data a [`Value`](crate::value::Value) can hold
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ValueType {
    #[default]
    Null,
    Integer,
    Boolean,
    Float,
    String,
    Array,
    Object,
    Date,
    Data,
}

impl ValueType {
    /// Returns `true` for the kinds that hold child values
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }

    /// Returns `true` for the kinds with no owned storage
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Null | Self::Integer | Self::Boolean | Self::Float | Self::Date
        )
    }
}

impl Display for ValueType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Null => write!(fmt, "null"),
            ValueType::Integer => write!(fmt, "integer"),
            ValueType::Boolean => write!(fmt, "boolean"),
            ValueType::Float => write!(fmt, "float"),
            ValueType::String => write!(fmt, "string"),
            ValueType::Array => write!(fmt, "array"),
            ValueType::Object => write!(fmt, "object"),
            ValueType::Date => write!(fmt, "date"),
            ValueType::Data => write!(fmt, "data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::value::types::ValueType;

    #[test]
    fn can_classify_containers() {
        assert!(ValueType::Array.is_container());
        assert!(ValueType::Object.is_container());
        assert!(!ValueType::String.is_container());
        assert!(!ValueType::Data.is_container());
    }

    #[test]
    fn can_classify_scalars() {
        assert!(ValueType::Date.is_scalar());
        assert!(!ValueType::String.is_scalar());
        assert!(!ValueType::Array.is_scalar());
    }

    #[test]
    fn can_display() {
        assert_eq!(ValueType::Object.to_string(), "object");
        assert_eq!(ValueType::default().to_string(), "null");
    }
}
