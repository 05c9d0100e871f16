/*!
 Contains the trait used to address a child of a [`Value`] by array position or object key.
*/

use std::collections::BTreeMap;

use crate::value::Value;

mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}

/// A position in an array or a key in an object
///
/// Implemented for [`usize`] (arrays) and [`str`]/[`String`] (objects). Using
/// a position on an object or a key on an array never matches anything.
pub trait ValueIndex: private::Sealed {
    #[doc(hidden)]
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value>;

    #[doc(hidden)]
    fn index_into_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value>;

    /// Get the child, creating the container and the child if they do not exist yet
    #[doc(hidden)]
    fn index_or_insert<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value>;

    #[doc(hidden)]
    fn remove_from(&self, value: &mut Value) -> Option<Value>;
}

impl ValueIndex for usize {
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match value {
            Value::Array(items) => items.get(*self),
            _ => None,
        }
    }

    fn index_into_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        match value {
            Value::Array(items) => items.get_mut(*self),
            _ => None,
        }
    }

    fn index_or_insert<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        if value.is_null() {
            let mut items = Vec::new();
            items.try_reserve(self.checked_add(1)?).ok()?;
            *value = Value::Array(items);
        }
        match value {
            Value::Array(items) => {
                // Pad with nulls so the requested slot exists
                if *self >= items.len() {
                    let len = self.checked_add(1)?;
                    items.try_reserve(len - items.len()).ok()?;
                    items.resize(len, Value::Null);
                }
                items.get_mut(*self)
            }
            _ => None,
        }
    }

    fn remove_from(&self, value: &mut Value) -> Option<Value> {
        match value {
            Value::Array(items) if *self < items.len() => Some(items.remove(*self)),
            _ => None,
        }
    }
}

impl ValueIndex for str {
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match value {
            Value::Object(map) => map.get(self),
            _ => None,
        }
    }

    fn index_into_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        match value {
            Value::Object(map) => map.get_mut(self),
            _ => None,
        }
    }

    fn index_or_insert<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        if value.is_null() {
            *value = Value::Object(BTreeMap::new());
        }
        match value {
            Value::Object(map) => Some(map.entry(self.to_string()).or_default()),
            _ => None,
        }
    }

    fn remove_from(&self, value: &mut Value) -> Option<Value> {
        match value {
            Value::Object(map) => map.remove(self),
            _ => None,
        }
    }
}

impl ValueIndex for String {
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.as_str().index_into(value)
    }

    fn index_into_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        self.as_str().index_into_mut(value)
    }

    fn index_or_insert<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        self.as_str().index_or_insert(value)
    }

    fn remove_from(&self, value: &mut Value) -> Option<Value> {
        self.as_str().remove_from(value)
    }
}

impl<T: ?Sized + ValueIndex> ValueIndex for &T {
    fn index_into<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        (**self).index_into(value)
    }

    fn index_into_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        (**self).index_into_mut(value)
    }

    fn index_or_insert<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        (**self).index_or_insert(value)
    }

    fn remove_from(&self, value: &mut Value) -> Option<Value> {
        (**self).remove_from(value)
    }
}
