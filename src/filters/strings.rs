//! String filters: upcase, downcase, capitalize, trim, replace, split,
//! append, prepend, truncate
//!
//! All of these expect a string subject and report a type failure
//! otherwise; coercion is the template author's job.

use super::{arity_error, type_error, FilterRegistry};
use crate::value::Value;
use unicode_segmentation::UnicodeSegmentation;

fn subject<'a>(name: &str, args: &'a [Value]) -> Result<&'a str, String> {
    match args.first() {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(type_error(name, "string", other, 1)),
        None => Err(arity_error(name, "at least 1", 0)),
    }
}

/// Uppercase the whole string.
///
/// # Examples
///
/// ```text
/// {{ "tea" | upcase }} => TEA
/// ```
pub fn upcase(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("upcase", "1", args.len()));
    }
    Ok(Value::String(subject("upcase", args)?.to_uppercase()))
}

/// Lowercase the whole string.
pub fn downcase(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("downcase", "1", args.len()));
    }
    Ok(Value::String(subject("downcase", args)?.to_lowercase()))
}

/// Uppercase the first character, leaving the rest unchanged.
///
/// # Examples
///
/// ```text
/// {{ "alice" | capitalize }} => Alice
/// ```
pub fn capitalize(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("capitalize", "1", args.len()));
    }
    let s = subject("capitalize", args)?;
    let mut chars = s.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(Value::String(capitalized))
}

/// Remove leading and trailing whitespace.
pub fn trim(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("trim", "1", args.len()));
    }
    Ok(Value::String(subject("trim", args)?.trim().to_string()))
}

/// Replace every occurrence of a substring.
///
/// # Examples
///
/// ```text
/// {{ "a-b-c" | replace("-", "+") }} => a+b+c
/// ```
pub fn replace(args: &[Value]) -> Result<Value, String> {
    if args.len() != 3 {
        return Err(arity_error("replace", "3", args.len()));
    }
    let s = subject("replace", args)?;
    let from = match &args[1] {
        Value::String(f) => f,
        other => return Err(type_error("replace", "string", other, 2)),
    };
    let to = match &args[2] {
        Value::String(t) => t,
        other => return Err(type_error("replace", "string", other, 3)),
    };
    Ok(Value::String(s.replace(from.as_str(), to)))
}

/// Split on a separator, producing a list of strings. An empty separator
/// splits into grapheme clusters.
pub fn split(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(arity_error("split", "2", args.len()));
    }
    let s = subject("split", args)?;
    let sep = match &args[1] {
        Value::String(sep) => sep,
        other => return Err(type_error("split", "string", other, 2)),
    };
    let parts: Vec<Value> = if sep.is_empty() {
        s.graphemes(true)
            .map(|g| Value::String(g.to_string()))
            .collect()
    } else {
        s.split(sep.as_str())
            .map(|p| Value::String(p.to_string()))
            .collect()
    };
    Ok(Value::List(parts))
}

/// Concatenate a suffix onto the subject.
pub fn append(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(arity_error("append", "2", args.len()));
    }
    let s = subject("append", args)?;
    match &args[1] {
        Value::String(suffix) => Ok(Value::String(format!("{}{}", s, suffix))),
        other => Err(type_error("append", "string", other, 2)),
    }
}

/// Concatenate a prefix in front of the subject.
pub fn prepend(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(arity_error("prepend", "2", args.len()));
    }
    let s = subject("prepend", args)?;
    match &args[1] {
        Value::String(prefix) => Ok(Value::String(format!("{}{}", prefix, s))),
        other => Err(type_error("prepend", "string", other, 2)),
    }
}

/// Shorten to at most `n` grapheme clusters, appending `...` when anything
/// was cut off.
pub fn truncate(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(arity_error("truncate", "2", args.len()));
    }
    let s = subject("truncate", args)?;
    let n = match &args[1] {
        Value::Int(n) if *n >= 0 => *n as usize,
        other => return Err(type_error("truncate", "non-negative integer", other, 2)),
    };
    let graphemes: Vec<&str> = s.graphemes(true).collect();
    if graphemes.len() <= n {
        return Ok(Value::String(s.to_string()));
    }
    let mut cut: String = graphemes[..n].concat();
    cut.push_str("...");
    Ok(Value::String(cut))
}

/// Register all string filters
pub fn register(registry: &mut FilterRegistry) {
    registry.register("upcase", upcase);
    registry.register("downcase", downcase);
    registry.register("capitalize", capitalize);
    registry.register("trim", trim);
    registry.register("replace", replace);
    registry.register("split", split);
    registry.register("append", append);
    registry.register("prepend", prepend);
    registry.register("truncate", truncate);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::String(text.into())
    }

    #[test]
    fn test_case_filters() {
        assert_eq!(upcase(&[s("tea")]), Ok(s("TEA")));
        assert_eq!(downcase(&[s("TeA")]), Ok(s("tea")));
        assert_eq!(capitalize(&[s("alice")]), Ok(s("Alice")));
        assert_eq!(capitalize(&[s("")]), Ok(s("")));
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim(&[s("  a b \n")]), Ok(s("a b")));
    }

    #[test]
    fn test_replace() {
        assert_eq!(replace(&[s("a-b-c"), s("-"), s("+")]), Ok(s("a+b+c")));
    }

    #[test]
    fn test_split() {
        assert_eq!(
            split(&[s("a,b"), s(",")]),
            Ok(Value::List(vec![s("a"), s("b")]))
        );
        assert_eq!(
            split(&[s("héllo"), s("")]).map(|v| match v {
                Value::List(items) => items.len(),
                _ => 0,
            }),
            Ok(5)
        );
    }

    #[test]
    fn test_append_prepend() {
        assert_eq!(append(&[s("a"), s("b")]), Ok(s("ab")));
        assert_eq!(prepend(&[s("a"), s("b")]), Ok(s("ba")));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(&[s("hello world"), Value::Int(5)]), Ok(s("hello...")));
        assert_eq!(truncate(&[s("hi"), Value::Int(5)]), Ok(s("hi")));
    }

    #[test]
    fn test_type_and_arity_failures() {
        assert!(upcase(&[Value::Int(1)]).is_err());
        assert!(upcase(&[s("a"), s("b")]).is_err());
        assert!(replace(&[s("a")]).is_err());
    }
}
