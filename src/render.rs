// ABOUTME: Renderer walking the structured AST and producing output

use crate::ast::{Expr, Node, TagKind};
use crate::config::RenderOptions;
use crate::context::{forloop_record, Context, FORLOOP};
use crate::error::RenderError;
use crate::eval::eval_expr;
use crate::filters::FilterRegistry;
use crate::value::Value;
use indexmap::IndexMap;
use unicode_segmentation::UnicodeSegmentation;

/// The result of a render.
///
/// `Typed` is produced only when `preserve_types` is set and the template
/// is exactly one top-level interpolation; every other template shape
/// renders to `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    Typed(Value),
}

impl Output {
    /// Collapse into a string, formatting a typed value the same way an
    /// interpolation would
    pub fn into_string(self) -> String {
        match self {
            Output::Text(s) => s,
            Output::Typed(v) => v.to_string(),
        }
    }
}

/// The fixed surroundings of one render: the filter registry, the caller's
/// options, and the iteration counter shared by every loop. Threaded
/// through the walk alongside the context.
struct RenderEnv<'a> {
    registry: &'a FilterRegistry,
    options: &'a RenderOptions,
    iterations: usize,
}

/// Render a compiled template against a root context.
pub fn render(
    nodes: &[Node],
    registry: &FilterRegistry,
    root: IndexMap<String, Value>,
    options: &RenderOptions,
) -> Result<Output, RenderError> {
    let mut ctx = Context::new(root);

    if options.preserve_types {
        if let [Node::Interpolation { expr, .. }] = nodes {
            let value = eval_expr(expr, &ctx, registry, options)?;
            return Ok(Output::Typed(value));
        }
    }

    let mut out = String::new();
    let mut env = RenderEnv {
        registry,
        options,
        iterations: 0,
    };
    render_nodes(nodes, &mut ctx, &mut env, &mut out)?;
    Ok(Output::Text(out))
}

fn render_nodes(
    nodes: &[Node],
    ctx: &mut Context,
    env: &mut RenderEnv<'_>,
    out: &mut String,
) -> Result<(), RenderError> {
    for node in nodes {
        match node {
            Node::Text(s) => out.push_str(s),
            Node::Comment => {}
            Node::Interpolation { expr, .. } => {
                let value = eval_expr(expr, ctx, env.registry, env.options)?;
                out.push_str(&value.to_string());
            }
            Node::Tag {
                kind: TagKind::Assign(name, expr),
                ..
            } => {
                let value = eval_expr(expr, ctx, env.registry, env.options)?;
                ctx.define(name.as_str(), value);
            }
            // Control tags are folded away by structuring
            Node::Tag { .. } => {}
            Node::Conditional { branches, otherwise } => {
                let mut taken = false;
                for (cond, body) in branches {
                    if eval_expr(cond, ctx, env.registry, env.options)?.is_truthy() {
                        render_nodes(body, ctx, env, out)?;
                        taken = true;
                        break;
                    }
                }
                if !taken {
                    if let Some(body) = otherwise {
                        render_nodes(body, ctx, env, out)?;
                    }
                }
            }
            Node::Loop {
                var,
                collection,
                body,
            } => {
                render_loop(var, collection, body, ctx, env, out)?;
            }
        }
    }
    Ok(())
}

fn render_loop(
    var: &str,
    collection: &Expr,
    body: &[Node],
    ctx: &mut Context,
    env: &mut RenderEnv<'_>,
    out: &mut String,
) -> Result<(), RenderError> {
    let value = eval_expr(collection, ctx, env.registry, env.options)?;
    let items: Vec<Value> = match value {
        Value::List(items) => items,
        // Maps iterate as [key, value] pairs in insertion order
        Value::Map(map) => map
            .into_iter()
            .map(|(k, v)| Value::List(vec![Value::String(k), v]))
            .collect(),
        // Strings iterate grapheme clusters
        Value::String(s) => s
            .graphemes(true)
            .map(|g| Value::String(g.to_string()))
            .collect(),
        Value::Nil => Vec::new(),
        other => return Err(RenderError::NotIterable(other.type_name())),
    };

    let length = items.len();
    // Snapshot of the enclosing loop's record, not a live reference
    let parent = ctx.get(FORLOOP).cloned().unwrap_or(Value::Nil);

    for (index, item) in items.into_iter().enumerate() {
        env.iterations += 1;
        if env.iterations > env.options.max_loop_iterations {
            return Err(RenderError::LoopLimitExceeded(
                env.options.max_loop_iterations,
            ));
        }
        ctx.push_scope();
        ctx.define(var, item);
        ctx.define(FORLOOP, forloop_record(index, length, &parent));
        let result = render_nodes(body, ctx, env, out);
        ctx.pop_scope();
        result?;
    }
    Ok(())
}
