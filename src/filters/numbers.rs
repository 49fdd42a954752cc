//! Numeric filters: abs, round, floor, ceil, plus, minus, times, modulo
//!
//! Integer subjects stay integers wherever that is meaningful; `round`,
//! `floor` and `ceil` pass integers through untouched.

use super::{arity_error, type_error, FilterRegistry};
use crate::value::Value;

/// Absolute value, preserving the numeric kind.
pub fn abs(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("abs", "1", args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(n.saturating_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(type_error("abs", "number", other, 1)),
    }
}

/// Round to the nearest integer, or to a number of decimal places when a
/// second argument is given.
///
/// # Examples
///
/// ```text
/// {{ 2.7 | round }} => 3
/// {{ 2.718 | round(2) }} => 2.72
/// ```
pub fn round(args: &[Value]) -> Result<Value, String> {
    if args.is_empty() || args.len() > 2 {
        return Err(arity_error("round", "1-2", args.len()));
    }
    let places = match args.get(1) {
        None => None,
        Some(Value::Int(p)) if *p >= 0 => Some(*p as u32),
        Some(other) => return Err(type_error("round", "non-negative integer", other, 2)),
    };
    match (&args[0], places) {
        (Value::Int(n), _) => Ok(Value::Int(*n)),
        (Value::Float(f), None) => Ok(Value::Int(f.round() as i64)),
        (Value::Float(f), Some(p)) => {
            let factor = 10f64.powi(p as i32);
            Ok(Value::Float((f * factor).round() / factor))
        }
        (other, _) => Err(type_error("round", "number", other, 1)),
    }
}

/// Largest integer not above the subject.
pub fn floor(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("floor", "1", args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => Ok(Value::Int(f.floor() as i64)),
        other => Err(type_error("floor", "number", other, 1)),
    }
}

/// Smallest integer not below the subject.
pub fn ceil(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(arity_error("ceil", "1", args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => Ok(Value::Int(f.ceil() as i64)),
        other => Err(type_error("ceil", "number", other, 1)),
    }
}

fn numeric_pair(name: &str, args: &[Value]) -> Result<(Value, Value), String> {
    if args.len() != 2 {
        return Err(arity_error(name, "2", args.len()));
    }
    for (i, arg) in args.iter().enumerate() {
        if !matches!(arg, Value::Int(_) | Value::Float(_)) {
            return Err(type_error(name, "number", arg, i + 1));
        }
    }
    Ok((args[0].clone(), args[1].clone()))
}

/// Add two numbers; integer when both sides are integers.
pub fn plus(args: &[Value]) -> Result<Value, String> {
    match numeric_pair("plus", args)? {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
        (a, b) => Ok(Value::Float(as_f64(&a) + as_f64(&b))),
    }
}

/// Subtract the argument from the subject.
pub fn minus(args: &[Value]) -> Result<Value, String> {
    match numeric_pair("minus", args)? {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(b))),
        (a, b) => Ok(Value::Float(as_f64(&a) - as_f64(&b))),
    }
}

/// Multiply two numbers.
pub fn times(args: &[Value]) -> Result<Value, String> {
    match numeric_pair("times", args)? {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(b))),
        (a, b) => Ok(Value::Float(as_f64(&a) * as_f64(&b))),
    }
}

/// Integer remainder.
pub fn modulo(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(arity_error("modulo", "2", args.len()));
    }
    match (&args[0], &args[1]) {
        (Value::Int(_), Value::Int(0)) => Err("modulo: division by zero".to_string()),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
        (Value::Int(_), other) => Err(type_error("modulo", "integer", other, 2)),
        (other, _) => Err(type_error("modulo", "integer", other, 1)),
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        _ => 0.0,
    }
}

/// Register all numeric filters
pub fn register(registry: &mut FilterRegistry) {
    registry.register("abs", abs);
    registry.register("round", round);
    registry.register("floor", floor);
    registry.register("ceil", ceil);
    registry.register("plus", plus);
    registry.register("minus", minus);
    registry.register("times", times);
    registry.register("modulo", modulo);
}
