//! Variable bindings visible to a render unit

use std::collections::BTreeMap;

use super::RenderError;
use crate::value::{Undefined, Value};

/// How many nested unit invocations a single render may stack up
pub const MAX_NESTING: usize = 64;

/// Named values a render unit can look up
///
/// Looking up a name that is not bound yields an undefined value rather than
/// an error, so `missing is defined` and passthrough of `{{ missing }}` work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: BTreeMap<String, Value>,
    depth: usize,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Resolve a name, producing an undefined value when it is not bound
    pub fn lookup(&self, name: &str) -> Value {
        match self.vars.get(name) {
            Some(value) => value.clone(),
            None => Value::Undefined(Undefined::missing(name)),
        }
    }

    /// Number of unit invocations between this context and the top-level render
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Scope for invoking `unit` from within this one
    pub(crate) fn descend(&self, unit: &str) -> Result<Context, RenderError> {
        if self.depth >= MAX_NESTING {
            return Err(RenderError::RecursionLimit {
                name: unit.to_string(),
                limit: MAX_NESTING,
            });
        }
        Ok(Context {
            vars: self.vars.clone(),
            depth: self.depth + 1,
        })
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut ctx = Context::new();
        for (name, value) in iter {
            ctx.insert(name, value);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_bound_and_missing() {
        let ctx = Context::new().with("x", 3i64);
        assert_eq!(ctx.lookup("x"), Value::Integer(3));

        let Value::Undefined(u) = ctx.lookup("y") else {
            panic!("expected undefined");
        };
        assert_eq!(u.name(), "y");
    }

    #[test]
    fn test_from_iter() {
        let ctx: Context = [("a", 1i64), ("b", 2i64)].into_iter().collect();
        assert!(ctx.contains("a"));
        assert_eq!(ctx.get("b"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_descend_is_bounded() {
        let mut ctx = Context::new().with("x", true);
        for _ in 0..MAX_NESTING {
            ctx = ctx.descend("unit").unwrap();
        }
        assert_eq!(ctx.depth(), MAX_NESTING);
        assert_eq!(ctx.lookup("x"), Value::Boolean(true));
        assert!(matches!(
            ctx.descend("unit"),
            Err(RenderError::RecursionLimit { limit: MAX_NESTING, .. })
        ));
    }
}
