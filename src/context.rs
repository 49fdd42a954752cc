// ABOUTME: Rendering context managing the scope stack and loop metadata

use crate::value::Value;
use indexmap::IndexMap;

/// Key under which loop metadata is bound inside a loop body.
pub const FORLOOP: &str = "forloop";

/// The rendering context: an ordered stack of scopes.
///
/// The bottom scope is the user-supplied root. Assignments write the
/// innermost scope; lookups walk innermost to outermost. Loop iterations
/// push a fresh scope holding the loop variable and the `forloop` record,
/// and pop it when the iteration ends.
#[derive(Debug)]
pub struct Context {
    scopes: Vec<IndexMap<String, Value>>,
}

impl Context {
    /// Creates a context whose root scope is the user-supplied bindings
    pub fn new(root: IndexMap<String, Value>) -> Self {
        Context { scopes: vec![root] }
    }

    /// Pushes a fresh empty scope
    pub fn push_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Pops the innermost scope. The root scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Binds a name in the innermost scope, overwriting if present
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Looks a name up, walking scopes innermost to outermost
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

/// Builds the `forloop` record for one loop iteration.
///
/// `parentloop` is a snapshot of the enclosing loop's record taken when the
/// inner loop starts, not a live reference; `rindex` counts the iterations
/// remaining after the current one.
pub fn forloop_record(index: usize, length: usize, parentloop: &Value) -> Value {
    let mut record = IndexMap::new();
    record.insert("index".to_string(), Value::Int(index as i64));
    record.insert(
        "rindex".to_string(),
        Value::Int((length - index - 1) as i64),
    );
    record.insert("first".to_string(), Value::Bool(index == 0));
    record.insert("last".to_string(), Value::Bool(index + 1 == length));
    record.insert("length".to_string(), Value::Int(length as i64));
    record.insert("parentloop".to_string(), parentloop.clone());
    Value::Map(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut ctx = Context::new(IndexMap::new());
        ctx.define("x", Value::Int(42));

        assert_eq!(ctx.get("x"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_undefined_name() {
        let ctx = Context::new(IndexMap::new());
        assert!(ctx.get("undefined").is_none());
    }

    #[test]
    fn test_shadowing() {
        let mut ctx = Context::new(IndexMap::new());
        ctx.define("x", Value::Int(42));

        ctx.push_scope();
        ctx.define("x", Value::Int(100));

        // Inner scope shadows the outer binding
        assert_eq!(ctx.get("x"), Some(&Value::Int(100)));

        ctx.pop_scope();
        assert_eq!(ctx.get("x"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_outer_scope_lookup() {
        let mut ctx = Context::new(IndexMap::new());
        ctx.define("a", Value::Int(1));
        ctx.push_scope();
        ctx.define("b", Value::Int(2));
        ctx.push_scope();
        ctx.define("c", Value::Int(3));

        // All three levels are visible from the innermost scope
        assert_eq!(ctx.get("a"), Some(&Value::Int(1)));
        assert_eq!(ctx.get("b"), Some(&Value::Int(2)));
        assert_eq!(ctx.get("c"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_root_scope_is_never_popped() {
        let mut ctx = Context::new(IndexMap::new());
        ctx.define("x", Value::Int(1));
        ctx.pop_scope();
        assert_eq!(ctx.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_assignment_overwrites_in_place() {
        let mut ctx = Context::new(IndexMap::new());
        ctx.define("x", Value::Int(1));
        ctx.define("x", Value::String("two".into()));
        assert_eq!(ctx.get("x"), Some(&Value::String("two".into())));
    }

    #[test]
    fn test_forloop_record_fields() {
        let record = forloop_record(1, 3, &Value::Nil);
        match record {
            Value::Map(map) => {
                assert_eq!(map.get("index"), Some(&Value::Int(1)));
                assert_eq!(map.get("rindex"), Some(&Value::Int(1)));
                assert_eq!(map.get("first"), Some(&Value::Bool(false)));
                assert_eq!(map.get("last"), Some(&Value::Bool(false)));
                assert_eq!(map.get("length"), Some(&Value::Int(3)));
                assert_eq!(map.get("parentloop"), Some(&Value::Nil));
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_forloop_record_bounds() {
        let first = forloop_record(0, 2, &Value::Nil);
        let last = forloop_record(1, 2, &Value::Nil);
        match (first, last) {
            (Value::Map(f), Value::Map(l)) => {
                assert_eq!(f.get("first"), Some(&Value::Bool(true)));
                assert_eq!(f.get("last"), Some(&Value::Bool(false)));
                assert_eq!(l.get("first"), Some(&Value::Bool(false)));
                assert_eq!(l.get("last"), Some(&Value::Bool(true)));
            }
            _ => panic!("expected maps"),
        }
    }
}
