// ABOUTME: Whitespace-trim pass and block structuring over the flat node list

use crate::ast::{Expr, Node, PathSegment, TagKind};
use crate::error::SyntaxError;

/// Apply whitespace-trim markers to the flat node list, in place.
///
/// For every delimiter-bearing node, `trim.left` right-trims the
/// immediately preceding text node and `trim.right` left-trims the
/// immediately following one. Only adjacent text is affected; any run of
/// spaces, tabs and newlines is removed. Text nodes emptied by trimming are
/// dropped, which makes the pass idempotent.
pub fn apply_trim(nodes: &mut Vec<Node>) {
    for i in 0..nodes.len() {
        let trim = match &nodes[i] {
            Node::Interpolation { trim, .. } => *trim,
            Node::Tag { trim, .. } => *trim,
            _ => continue,
        };
        if trim.left && i > 0 {
            if let Node::Text(s) = &mut nodes[i - 1] {
                let kept = s.trim_end_matches([' ', '\t', '\r', '\n']).len();
                s.truncate(kept);
            }
        }
        if trim.right && i + 1 < nodes.len() {
            if let Node::Text(s) = &mut nodes[i + 1] {
                *s = s.trim_start_matches([' ', '\t', '\r', '\n']).to_string();
            }
        }
    }
    nodes.retain(|n| !matches!(n, Node::Text(s) if s.is_empty()));
}

/// A block under construction. For a conditional, `cond` holds the
/// condition of the branch currently accumulating; it becomes `None` once
/// the `else` branch opens.
enum Frame {
    Conditional {
        branches: Vec<(Expr, Vec<Node>)>,
        cond: Option<Expr>,
    },
    Loop {
        var: String,
        collection: Expr,
    },
}

impl Frame {
    fn construct(&self) -> &'static str {
        match self {
            Frame::Conditional { .. } => "if",
            Frame::Loop { .. } => "for",
        }
    }
}

/// Fold the flat node list into structured `Conditional` and `Loop` nodes.
///
/// Linear scan with an explicit frame stack. Mismatched or missing closers
/// and stray `elsif`/`else`/`endif`/`endfor` tags are syntax errors naming
/// the construct involved.
pub fn structure(nodes: Vec<Node>) -> Result<Vec<Node>, SyntaxError> {
    let mut stack: Vec<(Frame, Vec<Node>)> = Vec::new();
    let mut base: Vec<Node> = Vec::new();

    for node in nodes {
        let (kind, trim) = match node {
            Node::Tag { kind, trim } => (kind, trim),
            other => {
                push_current(&mut stack, &mut base, other);
                continue;
            }
        };
        match kind {
            TagKind::If(cond) => {
                stack.push((
                    Frame::Conditional {
                        branches: Vec::new(),
                        cond: Some(cond),
                    },
                    Vec::new(),
                ));
            }
            TagKind::Elsif(new_cond) => match stack.last_mut() {
                Some((Frame::Conditional { branches, cond }, body)) if cond.is_some() => {
                    if let Some(finished) = cond.take() {
                        branches.push((finished, std::mem::take(body)));
                    }
                    *cond = Some(new_cond);
                }
                _ => {
                    return Err(SyntaxError::StrayTag {
                        tag: "elsif",
                        expected: "if",
                    })
                }
            },
            TagKind::Else => match stack.last_mut() {
                Some((Frame::Conditional { branches, cond }, body)) if cond.is_some() => {
                    if let Some(finished) = cond.take() {
                        branches.push((finished, std::mem::take(body)));
                    }
                }
                _ => {
                    return Err(SyntaxError::StrayTag {
                        tag: "else",
                        expected: "if",
                    })
                }
            },
            TagKind::EndIf => match stack.pop() {
                Some((Frame::Conditional { mut branches, cond }, body)) => {
                    let otherwise = match cond {
                        Some(finished) => {
                            branches.push((finished, body));
                            None
                        }
                        None => Some(body),
                    };
                    push_current(&mut stack, &mut base, Node::Conditional { branches, otherwise });
                }
                _ => {
                    return Err(SyntaxError::StrayTag {
                        tag: "endif",
                        expected: "if",
                    })
                }
            },
            TagKind::For(var, collection) => {
                stack.push((Frame::Loop { var, collection }, Vec::new()));
            }
            TagKind::EndFor => match stack.pop() {
                Some((Frame::Loop { var, collection }, body)) => {
                    push_current(&mut stack, &mut base, Node::Loop { var, collection, body });
                }
                _ => {
                    return Err(SyntaxError::StrayTag {
                        tag: "endfor",
                        expected: "for",
                    })
                }
            },
            assign @ TagKind::Assign(..) => {
                push_current(&mut stack, &mut base, Node::Tag { kind: assign, trim });
            }
        }
    }

    if let Some((frame, _)) = stack.last() {
        return Err(SyntaxError::UnclosedBlock {
            construct: frame.construct(),
        });
    }
    Ok(base)
}

fn push_current(stack: &mut [(Frame, Vec<Node>)], base: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some((_, body)) => body.push(node),
        None => base.push(node),
    }
}

/// Verify that block nesting and expression nesting stay within the
/// configured depth limit.
pub fn check_depth(nodes: &[Node], limit: usize) -> Result<(), SyntaxError> {
    check_nodes(nodes, 0, limit)
}

fn check_nodes(nodes: &[Node], depth: usize, limit: usize) -> Result<(), SyntaxError> {
    for node in nodes {
        match node {
            Node::Conditional { branches, otherwise } => {
                if depth + 1 > limit {
                    return Err(SyntaxError::DepthExceeded { limit });
                }
                for (cond, body) in branches {
                    check_expr(cond, 1, limit)?;
                    check_nodes(body, depth + 1, limit)?;
                }
                if let Some(body) = otherwise {
                    check_nodes(body, depth + 1, limit)?;
                }
            }
            Node::Loop { collection, body, .. } => {
                if depth + 1 > limit {
                    return Err(SyntaxError::DepthExceeded { limit });
                }
                check_expr(collection, 1, limit)?;
                check_nodes(body, depth + 1, limit)?;
            }
            Node::Interpolation { expr, .. } => check_expr(expr, 1, limit)?,
            Node::Tag { kind: TagKind::Assign(_, expr), .. } => check_expr(expr, 1, limit)?,
            _ => {}
        }
    }
    Ok(())
}

fn check_expr(expr: &Expr, depth: usize, limit: usize) -> Result<(), SyntaxError> {
    if depth > limit {
        return Err(SyntaxError::DepthExceeded { limit });
    }
    match expr {
        Expr::Literal(_) => Ok(()),
        Expr::Variable(segments) => {
            for segment in segments {
                if let PathSegment::Index(inner) = segment {
                    check_expr(inner, depth + 1, limit)?;
                }
            }
            Ok(())
        }
        Expr::Binary(_, lhs, rhs) | Expr::Logical(_, lhs, rhs) => {
            check_expr(lhs, depth + 1, limit)?;
            check_expr(rhs, depth + 1, limit)
        }
        Expr::Not(inner) => check_expr(inner, depth + 1, limit),
        Expr::Call { args, .. } => {
            for arg in args {
                check_expr(arg, depth + 1, limit)?;
            }
            Ok(())
        }
    }
}
