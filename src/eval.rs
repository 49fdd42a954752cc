// ABOUTME: Evaluator computing expression values against the rendering context

use crate::ast::{BinaryOp, Expr, LogicalOp, PathSegment};
use crate::config::RenderOptions;
use crate::context::Context;
use crate::error::RenderError;
use crate::filters::FilterRegistry;
use crate::value::Value;
use std::cmp::Ordering;

/// Evaluate one expression. Arguments evaluate strictly left-to-right;
/// `and`/`or` short-circuit and return booleans.
pub fn eval_expr(
    expr: &Expr,
    ctx: &Context,
    registry: &FilterRegistry,
    options: &RenderOptions,
) -> Result<Value, RenderError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Variable(segments) => resolve_path(segments, ctx, registry, options),
        Expr::Not(inner) => {
            let operand = eval_expr(inner, ctx, registry, options)?;
            Ok(Value::Bool(!operand.is_truthy()))
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = eval_expr(lhs, ctx, registry, options)?;
            let right = eval_expr(rhs, ctx, registry, options)?;
            eval_binary(*op, left, right)
        }
        Expr::Logical(op, lhs, rhs) => {
            let left = eval_expr(lhs, ctx, registry, options)?.is_truthy();
            match op {
                LogicalOp::And if !left => Ok(Value::Bool(false)),
                LogicalOp::Or if left => Ok(Value::Bool(true)),
                _ => {
                    let right = eval_expr(rhs, ctx, registry, options)?;
                    Ok(Value::Bool(right.is_truthy()))
                }
            }
        }
        Expr::Call { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, ctx, registry, options)?);
            }
            let filter = registry
                .get(name)
                .ok_or_else(|| RenderError::UnknownFilter(name.clone()))?;
            filter(&values).map_err(|detail| RenderError::filter_error(name, detail))
        }
    }
}

/// Resolve a variable path against the scope stack.
///
/// Lenient mode turns every miss into nil; strict mode raises
/// `UndefinedVariable` naming the path up to the missing step.
fn resolve_path(
    segments: &[PathSegment],
    ctx: &Context,
    registry: &FilterRegistry,
    options: &RenderOptions,
) -> Result<Value, RenderError> {
    let (head, rest) = match segments.split_first() {
        Some((PathSegment::Root(name), rest)) => (name, rest),
        _ => return Ok(Value::Nil),
    };

    let mut trail = head.clone();
    let mut current = match ctx.get(head) {
        Some(v) => v.clone(),
        None => return miss(options, &trail),
    };

    for segment in rest {
        match segment {
            PathSegment::Property(name) => {
                trail.push('.');
                trail.push_str(name);
                current = match &current {
                    Value::Map(map) => match map.get(name) {
                        Some(v) => v.clone(),
                        None => return miss(options, &trail),
                    },
                    _ => return miss(options, &trail),
                };
            }
            PathSegment::Index(index_expr) => {
                let index = eval_expr(index_expr, ctx, registry, options)?;
                trail.push_str(&format!("[{}]", index));
                current = match (&current, &index) {
                    (Value::List(items), Value::Int(n)) if *n >= 0 => {
                        match items.get(*n as usize) {
                            Some(v) => v.clone(),
                            None => return miss(options, &trail),
                        }
                    }
                    (Value::Map(map), Value::String(key)) => match map.get(key.as_str()) {
                        Some(v) => v.clone(),
                        None => return miss(options, &trail),
                    },
                    _ => return miss(options, &trail),
                };
            }
            PathSegment::Root(_) => unreachable!("Root only appears as the head of a path"),
        }
    }
    Ok(current)
}

fn miss(options: &RenderOptions, trail: &str) -> Result<Value, RenderError> {
    if options.strict_variables {
        Err(RenderError::UndefinedVariable(trail.to_string()))
    } else {
        Ok(Value::Nil)
    }
}

/// Dispatch a binary operator by operand variant pairing.
fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RenderError> {
    match op {
        BinaryOp::Add => add(lhs, rhs),
        BinaryOp::Sub | BinaryOp::Mul => arithmetic(op, lhs, rhs),
        BinaryOp::Div => divide(lhs, rhs),
        BinaryOp::Mod => modulo(lhs, rhs),
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Lt => ordering(lhs, rhs, "<", |o| o == Ordering::Less),
        BinaryOp::Le => ordering(lhs, rhs, "<=", |o| o != Ordering::Greater),
        BinaryOp::Gt => ordering(lhs, rhs, ">", |o| o == Ordering::Greater),
        BinaryOp::Ge => ordering(lhs, rhs, ">=", |o| o != Ordering::Less),
    }
}

/// `+` adds numbers, concatenates when either side is a string, and treats
/// nil as the empty string. The nil leniency is deliberate and applies to
/// `+` only.
fn add(lhs: Value, rhs: Value) -> Result<Value, RenderError> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::String(_), _) | (_, Value::String(_)) | (Value::Nil, _) | (_, Value::Nil) => {
            Ok(Value::String(format!("{}{}", lhs, rhs)))
        }
        _ => Err(RenderError::type_error(
            "+",
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, RenderError> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
            BinaryOp::Sub => a.wrapping_sub(*b),
            _ => a.wrapping_mul(*b),
        })),
        _ => match (numeric(&lhs), numeric(&rhs)) {
            (Some(a), Some(b)) => Ok(Value::Float(match op {
                BinaryOp::Sub => a - b,
                _ => a * b,
            })),
            _ => Err(RenderError::type_error(
                op.symbol(),
                lhs.type_name(),
                rhs.type_name(),
            )),
        },
    }
}

/// `/` always produces a float
fn divide(lhs: Value, rhs: Value) -> Result<Value, RenderError> {
    match (numeric(&lhs), numeric(&rhs)) {
        (Some(_), Some(b)) if b == 0.0 => Err(RenderError::DivisionByZero),
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(RenderError::type_error(
            "/",
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

/// `%` is defined on integers only
fn modulo(lhs: Value, rhs: Value) -> Result<Value, RenderError> {
    match (&lhs, &rhs) {
        (Value::Int(_), Value::Int(0)) => Err(RenderError::ModuloByZero),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
        _ => Err(RenderError::type_error(
            "%",
            lhs.type_name(),
            rhs.type_name(),
        )),
    }
}

/// Ordering comparisons: number-number and string-string only
fn ordering(
    lhs: Value,
    rhs: Value,
    symbol: &'static str,
    test: fn(Ordering) -> bool,
) -> Result<Value, RenderError> {
    let ord = match (&lhs, &rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (numeric(&lhs), numeric(&rhs)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(RenderError::type_error(
                    symbol,
                    lhs.type_name(),
                    rhs.type_name(),
                ))
            }
        },
    };
    // NaN comparisons are false
    Ok(Value::Bool(ord.is_some_and(test)))
}

fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}
