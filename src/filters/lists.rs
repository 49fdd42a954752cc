//! Collection filters: size, first, last, join, reverse, sort, uniq,
//! compact, default
//!
//! `size` and `first`/`last` also accept strings, where they operate on
//! grapheme clusters.

use super::{arity_error, type_error, FilterRegistry};
use crate::value::Value;
use std::cmp::Ordering;
use unicode_segmentation::UnicodeSegmentation;

/// Number of elements, entries or grapheme clusters. `nil` has size 0.
pub fn size(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("size", "1", args.len()));
    }
    let n = match &args[0] {
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        Value::String(s) => s.graphemes(true).count(),
        Value::Nil => 0,
        other => return Err(type_error("size", "list, map or string", other, 1)),
    };
    Ok(Value::Int(n as i64))
}

/// First element of a list or first grapheme of a string; nil when empty.
pub fn first(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("first", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) => Ok(items.first().cloned().unwrap_or(Value::Nil)),
        Value::String(s) => Ok(s
            .graphemes(true)
            .next()
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Nil)),
        other => Err(type_error("first", "list or string", other, 1)),
    }
}

/// Last element of a list or last grapheme of a string; nil when empty.
pub fn last(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("last", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) => Ok(items.last().cloned().unwrap_or(Value::Nil)),
        Value::String(s) => Ok(s
            .graphemes(true)
            .next_back()
            .map(|g| Value::String(g.to_string()))
            .unwrap_or(Value::Nil)),
        other => Err(type_error("last", "list or string", other, 1)),
    }
}

/// Join list elements into a string. The separator defaults to a single
/// space when omitted.
///
/// # Examples
///
/// ```text
/// {{ tags | join(", ") }} => a, b, c
/// ```
pub fn join(args: &[Value]) -> Result<Value, String> {
    if args.is_empty() || args.len() > 2 {
        return Err(arity_error("join", "1-2", args.len()));
    }
    let items = match &args[0] {
        Value::List(items) => items,
        other => return Err(type_error("join", "list", other, 1)),
    };
    let sep = match args.get(1) {
        None => " ",
        Some(Value::String(sep)) => sep,
        Some(other) => return Err(type_error("join", "string", other, 2)),
    };
    let joined = items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(sep);
    Ok(Value::String(joined))
}

/// Reverse a list.
pub fn reverse(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("reverse", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) => {
            let mut reversed = items.clone();
            reversed.reverse();
            Ok(Value::List(reversed))
        }
        other => Err(type_error("reverse", "list", other, 1)),
    }
}

/// Sort a homogeneous list of numbers or strings, ascending.
pub fn sort(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("sort", "1", args.len()));
    }
    let items = match &args[0] {
        Value::List(items) => items.clone(),
        other => return Err(type_error("sort", "list", other, 1)),
    };
    let all_numeric = items
        .iter()
        .all(|v| matches!(v, Value::Int(_) | Value::Float(_)));
    let all_strings = items.iter().all(|v| matches!(v, Value::String(_)));
    if !all_numeric && !all_strings {
        return Err("sort: list must be all numbers or all strings".to_string());
    }

    let mut sorted = items;
    if all_numeric {
        sorted.sort_by(|a, b| {
            numeric(a)
                .partial_cmp(&numeric(b))
                .unwrap_or(Ordering::Equal)
        });
    } else {
        sorted.sort_by(|a, b| match (a, b) {
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => Ordering::Equal,
        });
    }
    Ok(Value::List(sorted))
}

fn numeric(v: &Value) -> f64 {
    match v {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        _ => 0.0,
    }
}

/// Drop duplicate elements, keeping the first occurrence of each.
pub fn uniq(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("uniq", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) => {
            let mut seen: Vec<Value> = Vec::new();
            for item in items {
                if !seen.contains(item) {
                    seen.push(item.clone());
                }
            }
            Ok(Value::List(seen))
        }
        other => Err(type_error("uniq", "list", other, 1)),
    }
}

/// Drop nil elements from a list.
pub fn compact(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("compact", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) => Ok(Value::List(
            items.iter().filter(|v| **v != Value::Nil).cloned().collect(),
        )),
        other => Err(type_error("compact", "list", other, 1)),
    }
}

/// Substitute a fallback when the subject is falsy.
///
/// # Examples
///
/// ```text
/// {{ nickname | default("anonymous") }}
/// ```
pub fn default(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(arity_error("default", "2", args.len()));
    }
    if args[0].is_truthy() {
        Ok(args[0].clone())
    } else {
        Ok(args[1].clone())
    }
}

/// Register all collection filters
pub fn register(registry: &mut FilterRegistry) {
    registry.register("size", size);
    registry.register("first", first);
    registry.register("last", last);
    registry.register("join", join);
    registry.register("reverse", reverse);
    registry.register("sort", sort);
    registry.register("uniq", uniq);
    registry.register("compact", compact);
    registry.register("default", default);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[i64]) -> Value {
        Value::List(items.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_size() {
        assert_eq!(size(&[list(&[1, 2, 3])]), Ok(Value::Int(3)));
        assert_eq!(size(&[Value::String("héllo".into())]), Ok(Value::Int(5)));
        assert_eq!(size(&[Value::Nil]), Ok(Value::Int(0)));
    }

    #[test]
    fn test_first_last() {
        assert_eq!(first(&[list(&[1, 2])]), Ok(Value::Int(1)));
        assert_eq!(last(&[list(&[1, 2])]), Ok(Value::Int(2)));
        assert_eq!(first(&[Value::List(vec![])]), Ok(Value::Nil));
        assert_eq!(
            first(&[Value::String("ab".into())]),
            Ok(Value::String("a".into()))
        );
    }

    #[test]
    fn test_join() {
        let tags = Value::List(vec![
            Value::String("a".into()),
            Value::String("b".into()),
        ]);
        assert_eq!(
            join(&[tags.clone(), Value::String(", ".into())]),
            Ok(Value::String("a, b".into()))
        );
        assert_eq!(join(&[tags]), Ok(Value::String("a b".into())));
    }

    #[test]
    fn test_reverse_sort_uniq_compact() {
        assert_eq!(reverse(&[list(&[1, 2, 3])]), Ok(list(&[3, 2, 1])));
        assert_eq!(sort(&[list(&[3, 1, 2])]), Ok(list(&[1, 2, 3])));
        assert_eq!(uniq(&[list(&[1, 2, 1, 3, 2])]), Ok(list(&[1, 2, 3])));
        assert_eq!(
            compact(&[Value::List(vec![Value::Int(1), Value::Nil, Value::Int(2)])]),
            Ok(list(&[1, 2]))
        );
    }

    #[test]
    fn test_sort_rejects_mixed_kinds() {
        let mixed = Value::List(vec![Value::Int(1), Value::String("a".into())]);
        assert!(sort(&[mixed]).is_err());
    }

    #[test]
    fn test_default() {
        assert_eq!(
            default(&[Value::Nil, Value::String("anon".into())]),
            Ok(Value::String("anon".into()))
        );
        assert_eq!(
            default(&[Value::String("kim".into()), Value::String("anon".into())]),
            Ok(Value::String("kim".into()))
        );
    }
}
