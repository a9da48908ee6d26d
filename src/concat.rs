//! Fragment concatenation and literal reconstruction
//!
//! A render unit's fragments are reduced to one result in a single pass:
//!
//! 1. no fragments: `None`
//! 2. one fragment that is not a string: returned as is
//! 3. otherwise every fragment is stringified and joined in order
//! 4. the joined text is reparsed as a literal, falling back to the text
//!
//! Fragments are never reparsed one at a time. `"0.000"` followed by `7` has
//! to become `0.0007`, which only works on the joined characters.

use log::{debug, trace};

use crate::config::LiteralLimits;
use crate::parser::parse_literal;
use crate::render::RenderError;
use crate::value::Value;

/// Options for one concatenation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatOptions {
    pub limits: LiteralLimits,

    /// Return the joined text instead of the unquoted content when the
    /// reconstruction yields a string
    pub preserve_quoting: bool,
}

impl ConcatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: LiteralLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_preserve_quoting(mut self, preserve: bool) -> Self {
        self.preserve_quoting = preserve;
        self
    }
}

/// Reduce a fragment stream to a single value
///
/// Fails only when an undefined fragment has to be stringified.
pub fn native_concat<I>(fragments: I, options: &ConcatOptions) -> Result<Value, RenderError>
where
    I: IntoIterator<Item = Value>,
{
    let mut iter = fragments.into_iter();
    let Some(first) = iter.next() else {
        trace!("empty fragment stream");
        return Ok(Value::Null);
    };

    let raw = match iter.next() {
        None => match first {
            Value::String(s) => s,
            other => {
                trace!("single {} fragment passed through", other.kind());
                return Ok(other);
            }
        },
        Some(second) => join([first, second].into_iter().chain(iter))?,
    };

    Ok(reconstruct(raw, options))
}

/// Join a fragment stream as text, skipping reconstruction
pub fn concat_text<I>(fragments: I) -> Result<String, RenderError>
where
    I: IntoIterator<Item = Value>,
{
    join(fragments)
}

fn join<I>(fragments: I) -> Result<String, RenderError>
where
    I: IntoIterator<Item = Value>,
{
    let mut raw = String::new();
    for fragment in fragments {
        raw.push_str(&fragment.to_text()?);
    }
    Ok(raw)
}

/// Reparse joined text, keeping it as a string when it is not a literal
pub fn reconstruct(raw: String, options: &ConcatOptions) -> Value {
    match parse_literal(&raw, &options.limits) {
        Ok(Value::String(_)) if options.preserve_quoting => Value::String(raw),
        Ok(value) => value,
        Err(err) => {
            if err.is_resource_limit() {
                debug!("literal bound hit, keeping text: {}", err);
            } else {
                trace!("not a literal, keeping text: {}", err);
            }
            Value::String(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Undefined;
    use pretty_assertions::assert_eq;

    fn concat(fragments: Vec<Value>) -> Value {
        native_concat(fragments, &ConcatOptions::default()).unwrap()
    }

    #[test]
    fn test_empty_is_null() {
        assert_eq!(concat(vec![]), Value::Null);
    }

    #[test]
    fn test_single_value_passes_through() {
        let seq = Value::from(vec![1i64, 2]);
        assert_eq!(concat(vec![seq.clone()]), seq);
        assert_eq!(concat(vec![Value::Float(f64::INFINITY)]), Value::Float(f64::INFINITY));
    }

    #[test]
    fn test_single_undefined_passes_through() {
        let result = concat(vec![Value::Undefined(Undefined::missing("missing"))]);
        assert!(matches!(result, Value::Undefined(_)));
    }

    #[test]
    fn test_single_string_is_reconstructed() {
        assert_eq!(concat(vec![Value::from("'Jinja'")]), Value::from("Jinja"));
        assert_eq!(concat(vec![Value::from("42")]), Value::Integer(42));
    }

    #[test]
    fn test_joined_integers() {
        let fragments = (1..=4).map(Value::Integer).collect();
        assert_eq!(concat(fragments), Value::Integer(1234));
    }

    #[test]
    fn test_no_premature_coercion() {
        let fragments = vec![Value::from("0.000"), Value::Integer(7)];
        assert_eq!(concat(fragments), Value::Float(0.0007));
    }

    #[test]
    fn test_fallback_to_joined_text() {
        let fragments = vec![
            Value::from(vec!["a", "b"]),
            Value::from(" + "),
            Value::from(vec!["c", "d"]),
        ];
        assert_eq!(concat(fragments), Value::from("['a', 'b'] + ['c', 'd']"));
    }

    #[test]
    fn test_leading_space_falls_back() {
        let fragments = vec![Value::from(" "), Value::Boolean(true)];
        assert_eq!(concat(fragments), Value::from(" True"));
    }

    #[test]
    fn test_undefined_in_join_fails() {
        let fragments = vec![
            Value::from("a"),
            Value::Undefined(Undefined::missing("name")),
        ];
        let err = native_concat(fragments, &ConcatOptions::default()).unwrap_err();
        assert_eq!(err.undefined_name(), Some("name"));
    }

    #[test]
    fn test_fallback_is_idempotent() {
        let first = concat(vec![Value::from("not"), Value::from(" bad")]);
        assert_eq!(first, Value::from("not bad"));
        assert_eq!(concat(vec![first.clone()]), first);
    }

    #[test]
    fn test_preserve_quoting() {
        let options = ConcatOptions::new().with_preserve_quoting(true);
        let result = native_concat(vec![Value::from("'x'")], &options).unwrap();
        assert_eq!(result, Value::from("'x'"));
        let result = native_concat(vec![Value::from("[1]")], &options).unwrap();
        assert_eq!(result, Value::from(vec![1i64]));
    }

    #[test]
    fn test_resource_bound_falls_back() {
        let options = ConcatOptions::new().with_limits(LiteralLimits::new().with_max_depth(1));
        let result = native_concat(vec![Value::from("[["), Value::from("]]")], &options).unwrap();
        assert_eq!(result, Value::from("[[]]"));
    }

    #[test]
    fn test_concat_text_skips_reconstruction() {
        let text = concat_text(vec![Value::from("'a'"), Value::Integer(1)]).unwrap();
        assert_eq!(text, "'a'1");
        assert_eq!(concat_text(vec![Value::Integer(5)]).unwrap(), "5");
    }
}
