//! # Filter Registry and Default Filters
//!
//! Filters are pure functions invoked from templates via the pipe operator
//! (`{{ x | upcase }}`) or the equivalent call form (`{{ upcase(x) }}`).
//! The pipeline subject is always the first argument.
//!
//! The registry is a deterministic name-to-function table, fixed once it is
//! handed to a render. The default set is organized into three categories:
//!
//! - **[strings]** (9): upcase, downcase, capitalize, trim, replace, split,
//!   append, prepend, truncate
//! - **[numbers]** (8): abs, round, floor, ceil, plus, minus, times, modulo
//! - **[lists]** (9): size, first, last, join, reverse, sort, uniq,
//!   compact, default
//!
//! Each category module exposes a `register` function that installs its
//! filters; `FilterRegistry::with_defaults` installs all of them.

use crate::value::Value;
use std::collections::HashMap;

pub mod lists;
pub mod numbers;
pub mod strings;

/// A filter: takes the argument list (subject first), returns a value or a
/// failure detail. The renderer wraps failures as `FilterError`.
pub type Filter = fn(&[Value]) -> Result<Value, String>;

/// An immutable name-to-filter lookup table.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Filter>,
}

impl FilterRegistry {
    /// Creates an empty registry
    pub fn empty() -> Self {
        FilterRegistry {
            filters: HashMap::new(),
        }
    }

    /// Creates a registry holding the default filter set
    pub fn with_defaults() -> Self {
        let mut registry = FilterRegistry::empty();
        strings::register(&mut registry);
        numbers::register(&mut registry);
        lists::register(&mut registry);
        registry
    }

    /// Installs a filter under a name, replacing any previous entry.
    /// Registration happens at construction time, before the registry is
    /// shared with a render.
    pub fn register(&mut self, name: &str, filter: Filter) {
        self.filters.insert(name.to_string(), filter);
    }

    /// Deterministic name lookup
    pub fn get(&self, name: &str) -> Option<Filter> {
        self.filters.get(name).copied()
    }
}

// ===== Shared error message helpers for filter implementations =====

pub(crate) fn arity_error(name: &str, expected: &str, actual: usize) -> String {
    format!(
        "{}: expected {} argument{}, got {}",
        name,
        expected,
        if expected == "1" { "" } else { "s" },
        actual
    )
}

pub(crate) fn type_error(name: &str, expected: &str, actual: &Value, position: usize) -> String {
    format!(
        "{}: expected {}, got {} at argument {}",
        name,
        expected,
        actual.type_name(),
        position
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_registered() {
        let registry = FilterRegistry::with_defaults();
        for name in [
            "upcase", "downcase", "capitalize", "trim", "replace", "split", "append", "prepend",
            "truncate", "abs", "round", "floor", "ceil", "plus", "minus", "times", "modulo",
            "size", "first", "last", "join", "reverse", "sort", "uniq", "compact", "default",
        ] {
            assert!(registry.get(name).is_some(), "missing filter {}", name);
        }
    }

    #[test]
    fn test_unknown_name_misses() {
        let registry = FilterRegistry::with_defaults();
        assert!(registry.get("no_such_filter").is_none());
    }

    #[test]
    fn test_register_replaces() {
        fn always_one(_args: &[Value]) -> Result<Value, String> {
            Ok(Value::Int(1))
        }
        let mut registry = FilterRegistry::empty();
        registry.register("probe", always_one);
        let f = registry.get("probe").unwrap();
        assert_eq!(f(&[Value::Nil]), Ok(Value::Int(1)));
    }
}
