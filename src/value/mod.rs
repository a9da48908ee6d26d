//! The reconstructible value model
//!
//! Every fragment a render unit produces is a [`Value`]. The set of variants
//! is closed: textual conversion, reconstruction and equality all match on it
//! exhaustively.

mod repr;
pub mod undefined;

use std::borrow::Cow;
use std::fmt;

pub use repr::{format_float, repr};
pub use undefined::{Operation, Undefined, UndefinedReason, UndefinedState};

use crate::render::RenderError;

/// A host value produced by rendering
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    Bytes(Vec<u8>),
    String(String),
    /// Ordered sequence, written `[a, b]`
    Sequence(Vec<Value>),
    /// Fixed-arity sequence, written `(a, b)` or as a bare `a, b`
    Tuple(Vec<Value>),
    /// Unresolved reference with deferred failure
    Undefined(Undefined),
}

/// Variant tag of a [`Value`], named the way error messages print them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Integer,
    Float,
    Boolean,
    Null,
    Bytes,
    String,
    Sequence,
    Tuple,
    Undefined,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Integer => "int",
            Kind::Float => "float",
            Kind::Boolean => "bool",
            Kind::Null => "none",
            Kind::Bytes => "bytes",
            Kind::String => "str",
            Kind::Sequence => "list",
            Kind::Tuple => "tuple",
            Kind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::Boolean(_) => Kind::Boolean,
            Value::Null => Kind::Null,
            Value::Bytes(_) => Kind::Bytes,
            Value::String(_) => Kind::String,
            Value::Sequence(_) => Kind::Sequence,
            Value::Tuple(_) => Kind::Tuple,
            Value::Undefined(_) => Kind::Undefined,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Definedness query; the only operation an undefined value permits
    pub fn is_defined(&self) -> bool {
        match self {
            Value::Undefined(u) => u.check(),
            _ => true,
        }
    }

    /// Quoted form used inside containers
    pub fn repr(&self) -> String {
        repr::repr(self)
    }

    /// Textual form used when joining fragments
    ///
    /// Strings are taken verbatim, everything else uses its repr. An
    /// undefined value cannot be stringified.
    pub fn to_text(&self) -> Result<Cow<'_, str>, RenderError> {
        match self {
            Value::String(s) => Ok(Cow::Borrowed(s)),
            Value::Undefined(u) => Err(u.fail(Operation::Stringify)),
            other => Ok(Cow::Owned(repr::repr(other))),
        }
    }

    /// Attribute access. None of the value kinds carry attributes, so a
    /// defined owner always yields a fresh undefined value.
    pub fn get_attr(&self, name: &str) -> Result<Value, RenderError> {
        match self {
            Value::Undefined(u) => Err(u.fail(Operation::Attribute(name.to_string()))),
            other => Ok(Value::Undefined(Undefined::no_attribute(
                other.kind(),
                name,
            ))),
        }
    }

    /// Subscript with Python index semantics (negative counts from the end)
    pub fn get_item(&self, index: &Value) -> Result<Value, RenderError> {
        if let Value::Undefined(u) = self {
            return Err(u.fail(Operation::Index));
        }
        let i = match index {
            Value::Undefined(u) => return Err(u.fail(Operation::Index)),
            Value::Integer(i) => *i,
            Value::Boolean(b) => *b as i64,
            other => {
                return Err(RenderError::invalid_operation(
                    "[]",
                    self.kind(),
                    Some(other.kind()),
                ))
            }
        };

        let found = match self {
            Value::Sequence(items) | Value::Tuple(items) => {
                resolve_index(i, items.len()).map(|at| items[at].clone())
            }
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                resolve_index(i, chars.len()).map(|at| Value::String(chars[at].to_string()))
            }
            Value::Bytes(b) => resolve_index(i, b.len()).map(|at| Value::Integer(b[at] as i64)),
            other => {
                return Err(RenderError::invalid_operation(
                    "[]",
                    other.kind(),
                    Some(index.kind()),
                ))
            }
        };

        Ok(found.unwrap_or_else(|| Value::Undefined(Undefined::no_item(self.kind(), i.to_string()))))
    }

    /// `+` over the kinds that support it
    pub fn add(&self, other: &Value) -> Result<Value, RenderError> {
        if let Value::Undefined(u) = self {
            return Err(u.fail(Operation::Arithmetic("+")));
        }
        if let Value::Undefined(u) = other {
            return Err(u.fail(Operation::Arithmetic("+")));
        }
        let mismatch = || RenderError::invalid_operation("+", self.kind(), Some(other.kind()));
        Ok(match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => {
                Value::Integer(a.checked_add(*b).ok_or_else(mismatch)?)
            }
            (Value::Integer(a), Value::Float(b)) => Value::Float(*a as f64 + b),
            (Value::Float(a), Value::Integer(b)) => Value::Float(a + *b as f64),
            (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (Value::String(a), Value::String(b)) => Value::String(format!("{}{}", a, b)),
            (Value::Bytes(a), Value::Bytes(b)) => Value::Bytes([a.as_slice(), b].concat()),
            (Value::Sequence(a), Value::Sequence(b)) => Value::Sequence([a.as_slice(), b].concat()),
            (Value::Tuple(a), Value::Tuple(b)) => Value::Tuple([a.as_slice(), b].concat()),
            _ => return Err(mismatch()),
        })
    }

    /// Equality as a template comparison (`==`); integers and floats compare
    /// numerically
    pub fn equals(&self, other: &Value) -> Result<bool, RenderError> {
        if let Value::Undefined(u) = self {
            return Err(u.fail(Operation::Compare));
        }
        if let Value::Undefined(u) = other {
            return Err(u.fail(Operation::Compare));
        }
        Ok(match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (a, b) => a == b,
        })
    }

    pub fn is_truthy(&self) -> Result<bool, RenderError> {
        Ok(match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Boolean(b) => *b,
            Value::Null => false,
            Value::Bytes(b) => !b.is_empty(),
            Value::String(s) => !s.is_empty(),
            Value::Sequence(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Undefined(u) => return Err(u.fail(Operation::Truth)),
        })
    }

    /// Elements visited by a loop over this value
    pub fn iterate(&self) -> Result<Vec<Value>, RenderError> {
        match self {
            Value::Sequence(items) | Value::Tuple(items) => Ok(items.clone()),
            Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
            Value::Bytes(b) => Ok(b.iter().map(|&b| Value::Integer(b as i64)).collect()),
            Value::Undefined(u) => Err(u.fail(Operation::Iterate)),
            other => Err(RenderError::invalid_operation("for", other.kind(), None)),
        }
    }
}

fn resolve_index(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let at = if i < 0 { len + i } else { i };
    (0..len).contains(&at).then_some(at as usize)
}

/// Plain-text form: strings print raw, everything else prints its repr.
/// Undefined values print as nothing.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Undefined(_) => Ok(()),
            other => f.write_str(&repr::repr(other)),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<Undefined> for Value {
    fn from(u: Undefined) -> Self {
        Value::Undefined(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_text_strings_verbatim() {
        assert_eq!(Value::from("'quoted'").to_text().unwrap(), "'quoted'");
        assert_eq!(Value::Boolean(true).to_text().unwrap(), "True");
        assert_eq!(Value::Null.to_text().unwrap(), "None");
        assert_eq!(
            Value::from(vec!["a", "b"]).to_text().unwrap(),
            "['a', 'b']"
        );
    }

    #[test]
    fn test_to_text_undefined_fails() {
        let v = Value::Undefined(Undefined::missing("name"));
        let err = v.to_text().unwrap_err();
        assert!(err.to_string().contains("'name' is undefined"));
    }

    #[test]
    fn test_add_sequences() {
        let a = Value::from(vec!["a", "b"]);
        let b = Value::from(vec!["c", "d"]);
        assert_eq!(a.add(&b).unwrap(), Value::from(vec!["a", "b", "c", "d"]));
    }

    #[test]
    fn test_add_mixed_numbers() {
        assert_eq!(
            Value::Integer(1).add(&Value::Float(0.5)).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn test_add_mismatch_is_invalid_operation() {
        let err = Value::Integer(1).add(&Value::from("x")).unwrap_err();
        assert!(matches!(err, RenderError::InvalidOperation { .. }));
    }

    #[test]
    fn test_add_undefined_fails() {
        let missing = Value::Undefined(Undefined::missing("missing"));
        let err = Value::Integer(3).add(&missing).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedUse { ref name, .. } if name == "missing"));
    }

    #[test]
    fn test_get_item_negative_index() {
        let v = Value::from(vec![1i64, 2, 3]);
        assert_eq!(v.get_item(&Value::Integer(-1)).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_get_item_out_of_range_is_undefined() {
        let v = Value::from(vec![1i64]);
        let item = v.get_item(&Value::Integer(5)).unwrap();
        assert!(!item.is_defined());
    }

    #[test]
    fn test_get_attr_on_undefined_fails() {
        let v = Value::Undefined(Undefined::missing("user"));
        let err = v.get_attr("name").unwrap_err();
        assert!(err.to_string().contains("'user' is undefined"));
    }

    #[test]
    fn test_int_float_equality() {
        assert!(Value::Integer(1).equals(&Value::Float(1.0)).unwrap());
        assert!(!Value::from("").equals(&Value::Null).unwrap());
    }
}
