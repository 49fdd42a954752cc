// ABOUTME: Parser for template source using nom combinators
//
// Two layers live here. The lexical/expression layer is a set of nom
// parsers implementing the precedence grammar (or > and > equality >
// relational > pipe > additive > multiplicative > unary > primary). The
// template layer scans the source for `{{ }}`, `{% %}` and `{# #}`
// delimiters and produces the flat node list consumed by the block
// structurer.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, one_of},
    combinator::{opt, recognize, value},
    IResult, Parser,
};

use crate::ast::{BinaryOp, Expr, LogicalOp, Node, PathSegment, TagKind, Trim};
use crate::error::SyntaxError;
use crate::value::Value;

type PResult<'a, T> = IResult<&'a str, T>;

/// Words that cannot head a variable path. Keywords are recognised only at
/// word boundaries: the lexer always takes the longest identifier first, so
/// `true_flag` is an identifier, not `true` + `_flag`.
const RESERVED: [&str; 15] = [
    "true", "false", "nil", "null", "and", "or", "not", "in", "if", "elsif", "else", "endif",
    "for", "endfor", "assign",
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn offset_of(source: &str, rest: &str) -> usize {
    source.len() - rest.len()
}

// ============================================================================
// Lexical primitives
// ============================================================================

/// Skip spaces, tabs and newlines inside an expression
fn ws(input: &str) -> PResult<'_, &str> {
    take_while(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n')(input)
}

/// An identifier, optionally `$`-prefixed (workflow identifiers)
fn identifier(input: &str) -> PResult<'_, &str> {
    recognize((
        opt(char('$')),
        take_while1(is_ident_start),
        take_while(is_ident_continue),
    ))
    .parse(input)
}

/// An identifier with no `$` prefix: property names and filter names
fn bare_identifier(input: &str) -> PResult<'_, &str> {
    recognize((take_while1(is_ident_start), take_while(is_ident_continue)))
        .parse(input)
}

/// Match a keyword at a word boundary, so `or` does not match inside `order`
fn word<'a>(kw: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = tag(kw)(input)?;
        if rest.chars().next().is_some_and(is_ident_continue) {
            Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Tag,
            )))
        } else {
            Ok((rest, matched))
        }
    }
}

/// Parse a number literal: optional leading `-`, integer part with no
/// leading zeros, optional fraction, optional exponent. A decimal point or
/// exponent makes it a float, otherwise it is an integer.
fn number(input: &str) -> PResult<'_, Expr> {
    let (rest, literal) = recognize((
        opt(char('-')),
        alt((
            recognize((one_of("123456789"), take_while(|c: char| c.is_ascii_digit()))),
            tag("0"),
        )),
        opt(recognize((
            char('.'),
            take_while1(|c: char| c.is_ascii_digit()),
        ))),
        opt(recognize((
            one_of("eE"),
            opt(one_of("+-")),
            take_while1(|c: char| c.is_ascii_digit()),
        ))),
    ))
    .parse(input)?;

    let parsed = if literal.contains(['.', 'e', 'E']) {
        literal.parse::<f64>().ok().map(Value::Float)
    } else {
        literal.parse::<i64>().ok().map(Value::Int)
    };
    match parsed {
        Some(v) => Ok((rest, Expr::Literal(v))),
        None => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// Parse a string literal, double- or single-quoted, processing escapes.
///
/// `\uXXXX` takes exactly 4 hex digits and is emitted as UTF-8. An
/// unterminated literal is a hard failure so alternatives do not mask it.
fn string_literal(input: &str) -> PResult<'_, Value> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c)) if c == '"' || c == '\'' => c,
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Char,
            )))
        }
    };

    let mut out = String::new();
    while let Some((idx, c)) = chars.next() {
        if c == quote {
            return Ok((&input[idx + c.len_utf8()..], Value::String(out)));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some((_, esc)) = chars.next() else { break };
        match esc {
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let mut code = 0u32;
                for _ in 0..4 {
                    match chars.next() {
                        Some((_, h)) if h.is_ascii_hexdigit() => {
                            code = code * 16 + h.to_digit(16).unwrap_or(0);
                        }
                        _ => {
                            return Err(nom::Err::Failure(nom::error::Error::new(
                                input,
                                nom::error::ErrorKind::Escaped,
                            )))
                        }
                    }
                }
                match char::from_u32(code) {
                    Some(ch) => out.push(ch),
                    None => {
                        return Err(nom::Err::Failure(nom::error::Error::new(
                            input,
                            nom::error::ErrorKind::Escaped,
                        )))
                    }
                }
            }
            _ => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Escaped,
                )))
            }
        }
    }

    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        nom::error::ErrorKind::TakeUntil,
    )))
}

// ============================================================================
// Expression parser
// ============================================================================

/// Entry point: the lowest-precedence level
fn expression(input: &str) -> PResult<'_, Expr> {
    or_expr(input)
}

fn or_expr(input: &str) -> PResult<'_, Expr> {
    logical_level(input, and_expr, "or", LogicalOp::Or)
}

fn and_expr(input: &str) -> PResult<'_, Expr> {
    logical_level(input, equality_expr, "and", LogicalOp::And)
}

fn equality_expr(input: &str) -> PResult<'_, Expr> {
    binary_level(input, relational_expr, eq_op)
}

fn relational_expr(input: &str) -> PResult<'_, Expr> {
    binary_level(input, pipe_expr, rel_op)
}

fn additive_expr(input: &str) -> PResult<'_, Expr> {
    binary_level(input, mult_expr, add_op)
}

fn mult_expr(input: &str) -> PResult<'_, Expr> {
    binary_level(input, unary_expr, mul_op)
}

fn eq_op(input: &str) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Eq, tag("==")),
        value(BinaryOp::Ne, tag("!=")),
    ))
    .parse(input)
}

fn rel_op(input: &str) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Ge, tag(">=")),
        value(BinaryOp::Le, tag("<=")),
        value(BinaryOp::Gt, char('>')),
        value(BinaryOp::Lt, char('<')),
    ))
    .parse(input)
}

fn add_op(input: &str) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
    ))
    .parse(input)
}

fn mul_op(input: &str) -> PResult<'_, BinaryOp> {
    alt((
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
        value(BinaryOp::Mod, char('%')),
    ))
    .parse(input)
}

/// One precedence level: parse a seed with `next`, then fold `(op, rhs)`
/// pairs into a left-leaning tree. A matched operator whose right-hand side
/// fails is left unconsumed, so a trailing `-%}` trim marker is never eaten
/// as a minus.
fn binary_level<'a>(
    input: &'a str,
    next: fn(&'a str) -> PResult<'a, Expr>,
    op: fn(&'a str) -> PResult<'a, BinaryOp>,
) -> PResult<'a, Expr> {
    let (mut rest, mut expr) = next(input)?;
    loop {
        let (after_ws, _) = ws(rest)?;
        let Ok((after_op, op_kind)) = op(after_ws) else {
            break;
        };
        let (after_op, _) = ws(after_op)?;
        match next(after_op) {
            Ok((r, rhs)) => {
                expr = Expr::Binary(op_kind, Box::new(expr), Box::new(rhs));
                rest = r;
            }
            Err(e @ nom::Err::Failure(_)) => return Err(e),
            Err(_) => break,
        }
    }
    Ok((rest, expr))
}

/// Like `binary_level` but for the word operators `and` / `or`
fn logical_level<'a>(
    input: &'a str,
    next: fn(&'a str) -> PResult<'a, Expr>,
    kw: &'static str,
    op: LogicalOp,
) -> PResult<'a, Expr> {
    let (mut rest, mut expr) = next(input)?;
    loop {
        let (after_ws, _) = ws(rest)?;
        let Ok((after_op, _)) = word(kw)(after_ws) else {
            break;
        };
        let (after_op, _) = ws(after_op)?;
        match next(after_op) {
            Ok((r, rhs)) => {
                expr = Expr::Logical(op, Box::new(expr), Box::new(rhs));
                rest = r;
            }
            Err(e @ nom::Err::Failure(_)) => return Err(e),
            Err(_) => break,
        }
    }
    Ok((rest, expr))
}

/// The filter pipeline level. `x | f(a, b)` lowers to `Call("f", [x, a, b])`
/// and chains lower left-to-right.
fn pipe_expr(input: &str) -> PResult<'_, Expr> {
    let (mut rest, mut expr) = additive_expr(input)?;
    loop {
        let (after_ws, _) = ws(rest)?;
        let Ok((r, _)) = char::<_, nom::error::Error<&str>>('|')(after_ws) else {
            break;
        };
        let (r, _) = ws(r)?;
        let (r, name) = match bare_identifier(r) {
            Ok(v) => v,
            Err(e @ nom::Err::Failure(_)) => return Err(e),
            Err(_) => break,
        };
        let mut args = vec![expr];
        let (r, extra) = match char::<_, nom::error::Error<&str>>('(')(r) {
            Ok((r, _)) => call_args(r)?,
            Err(_) => (r, Vec::new()),
        };
        args.extend(extra);
        expr = Expr::Call {
            name: name.to_string(),
            args,
        };
        rest = r;
    }
    Ok((rest, expr))
}

fn unary_expr(input: &str) -> PResult<'_, Expr> {
    if let Ok((r, _)) = word("not")(input) {
        let (r, _) = ws(r)?;
        let (r, operand) = unary_expr(r)?;
        return Ok((r, Expr::Not(Box::new(operand))));
    }
    primary(input)
}

fn primary(input: &str) -> PResult<'_, Expr> {
    match input.chars().next() {
        Some('"') | Some('\'') => {
            let (rest, v) = string_literal(input)?;
            Ok((rest, Expr::Literal(v)))
        }
        Some('(') => {
            let (r, _) = char('(')(input)?;
            let (r, _) = ws(r)?;
            let (r, inner) = expression(r)?;
            let (r, _) = ws(r)?;
            let (r, _) = char(')')(r)?;
            Ok((r, inner))
        }
        Some(c) if c.is_ascii_digit() || c == '-' => number(input),
        _ => ident_expr(input),
    }
}

/// Identifier-headed primary: a literal keyword, the function-call form
/// `f(args)`, or a variable path.
fn ident_expr(input: &str) -> PResult<'_, Expr> {
    let (rest, name) = identifier(input)?;
    match name {
        "true" => return Ok((rest, Expr::Literal(Value::Bool(true)))),
        "false" => return Ok((rest, Expr::Literal(Value::Bool(false)))),
        "nil" | "null" => return Ok((rest, Expr::Literal(Value::Nil))),
        _ => {}
    }
    if RESERVED.contains(&name) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    if let Ok((r, _)) = char::<_, nom::error::Error<&str>>('(')(rest) {
        let (r, args) = call_args(r)?;
        return Ok((
            r,
            Expr::Call {
                name: name.to_string(),
                args,
            },
        ));
    }
    path_segments(rest, name)
}

/// Trailing `.name` and `[expr]` steps of a variable path
fn path_segments<'a>(mut rest: &'a str, head: &str) -> PResult<'a, Expr> {
    let mut segments = vec![PathSegment::Root(head.to_string())];
    loop {
        if let Ok((r, _)) = char::<_, nom::error::Error<&str>>('.')(rest) {
            let (r, name) = bare_identifier(r)?;
            segments.push(PathSegment::Property(name.to_string()));
            rest = r;
        } else if let Ok((r, _)) = char::<_, nom::error::Error<&str>>('[')(rest) {
            let (r, _) = ws(r)?;
            let (r, index) = expression(r)?;
            let (r, _) = ws(r)?;
            let (r, _) = char(']')(r)?;
            segments.push(PathSegment::Index(index));
            rest = r;
        } else {
            return Ok((rest, Expr::Variable(segments)));
        }
    }
}

/// Comma-separated arguments after an opening paren, consuming the `)`
fn call_args(input: &str) -> PResult<'_, Vec<Expr>> {
    let (mut rest, _) = ws(input)?;
    let mut args = Vec::new();
    if let Ok((r, _)) = char::<_, nom::error::Error<&str>>(')')(rest) {
        return Ok((r, args));
    }
    loop {
        let (r, arg) = expression(rest)?;
        args.push(arg);
        let (r, _) = ws(r)?;
        if let Ok((r, _)) = char::<_, nom::error::Error<&str>>(',')(r) {
            let (r, _) = ws(r)?;
            rest = r;
            continue;
        }
        let (r, _) = char(')')(r)?;
        return Ok((r, args));
    }
}

// ============================================================================
// Template parser
// ============================================================================

/// Parse template source into the flat node list.
///
/// Text runs are produced greedily up to the next delimiter; trim markers
/// are recorded on the nodes but applied later, by the trim pass.
pub fn parse_template(source: &str) -> Result<Vec<Node>, SyntaxError> {
    let mut nodes = Vec::new();
    let mut rest = source;
    while let Some(pos) = next_delimiter(rest) {
        if pos > 0 {
            nodes.push(Node::Text(rest[..pos].to_string()));
        }
        rest = &rest[pos..];
        rest = if rest.starts_with("{{") {
            parse_interpolation(source, rest, &mut nodes)?
        } else if rest.starts_with("{%") {
            parse_tag(source, rest, &mut nodes)?
        } else {
            parse_comment(source, rest, &mut nodes)?
        };
    }
    if !rest.is_empty() {
        nodes.push(Node::Text(rest.to_string()));
    }
    Ok(nodes)
}

/// Byte position of the earliest `{{`, `{%` or `{#`
fn next_delimiter(input: &str) -> Option<usize> {
    [input.find("{{"), input.find("{%"), input.find("{#")]
        .into_iter()
        .flatten()
        .min()
}

fn skip_ws(input: &str) -> &str {
    input.trim_start_matches([' ', '\t', '\r', '\n'])
}

fn parse_interpolation<'a>(
    source: &'a str,
    rest: &'a str,
    nodes: &mut Vec<Node>,
) -> Result<&'a str, SyntaxError> {
    let open_offset = offset_of(source, rest);
    let mut trim = Trim::default();
    let mut r = &rest[2..];
    if let Some(stripped) = r.strip_prefix('-') {
        trim.left = true;
        r = stripped;
    }
    let r = skip_ws(r);
    let (r, expr) = expression(r).map_err(|e| err_to_syntax(source, e))?;
    let r = skip_ws(r);
    let r = close_delimiter(source, r, "}}", &mut trim, open_offset, "{{")?;
    nodes.push(Node::Interpolation { expr, trim });
    Ok(r)
}

fn parse_tag<'a>(
    source: &'a str,
    rest: &'a str,
    nodes: &mut Vec<Node>,
) -> Result<&'a str, SyntaxError> {
    let open_offset = offset_of(source, rest);
    let mut trim = Trim::default();
    let mut r = &rest[2..];
    if let Some(stripped) = r.strip_prefix('-') {
        trim.left = true;
        r = stripped;
    }
    let r = skip_ws(r);
    let (r, kw) = identifier(r)
        .map_err(|_| SyntaxError::unexpected(offset_of(source, r), "expected a tag keyword"))?;

    let (r, kind) = match kw {
        "if" => {
            let (r, cond) = tag_expression(source, r)?;
            (r, TagKind::If(cond))
        }
        "elsif" => {
            let (r, cond) = tag_expression(source, r)?;
            (r, TagKind::Elsif(cond))
        }
        "else" => (r, TagKind::Else),
        "endif" => (r, TagKind::EndIf),
        "endfor" => (r, TagKind::EndFor),
        "for" => {
            let r = skip_ws(r);
            let (r, name) = identifier(r).map_err(|_| {
                SyntaxError::unexpected(offset_of(source, r), "expected a loop variable")
            })?;
            let r = skip_ws(r);
            let (r, in_kw) = identifier(r).map_err(|_| {
                SyntaxError::unexpected(offset_of(source, r), "expected `in`")
            })?;
            if in_kw != "in" {
                return Err(SyntaxError::unexpected(
                    offset_of(source, r) - in_kw.len(),
                    "expected `in`",
                ));
            }
            let (r, collection) = tag_expression(source, r)?;
            (r, TagKind::For(name.to_string(), collection))
        }
        "assign" => {
            let r = skip_ws(r);
            let (r, name) = identifier(r).map_err(|_| {
                SyntaxError::unexpected(offset_of(source, r), "expected a variable name")
            })?;
            let r = skip_ws(r);
            let r = r.strip_prefix('=').ok_or_else(|| {
                SyntaxError::unexpected(offset_of(source, r), "expected `=`")
            })?;
            let (r, expr) = tag_expression(source, r)?;
            (r, TagKind::Assign(name.to_string(), expr))
        }
        other => {
            return Err(SyntaxError::unexpected(
                offset_of(source, r) - other.len(),
                format!("unknown tag `{}`", other),
            ))
        }
    };

    let r = skip_ws(r);
    let r = close_delimiter(source, r, "%}", &mut trim, open_offset, "{%")?;
    nodes.push(Node::Tag { kind, trim });
    Ok(r)
}

fn tag_expression<'a>(source: &'a str, rest: &'a str) -> Result<(&'a str, Expr), SyntaxError> {
    let r = skip_ws(rest);
    let (r, expr) = expression(r).map_err(|e| err_to_syntax(source, e))?;
    Ok((r, expr))
}

fn close_delimiter<'a>(
    source: &'a str,
    rest: &'a str,
    closer: &'static str,
    trim: &mut Trim,
    open_offset: usize,
    opened: &'static str,
) -> Result<&'a str, SyntaxError> {
    if let Some(r) = rest.strip_prefix('-').and_then(|r| r.strip_prefix(closer)) {
        trim.right = true;
        Ok(r)
    } else if let Some(r) = rest.strip_prefix(closer) {
        Ok(r)
    } else if rest.is_empty() {
        Err(SyntaxError::UnclosedDelimiter {
            opened,
            expected: closer,
            offset: open_offset,
        })
    } else {
        Err(SyntaxError::unexpected(
            offset_of(source, rest),
            format!("expected `{}`", closer),
        ))
    }
}

fn parse_comment<'a>(
    source: &'a str,
    rest: &'a str,
    nodes: &mut Vec<Node>,
) -> Result<&'a str, SyntaxError> {
    let open_offset = offset_of(source, rest);
    let body = &rest[2..];
    match body.find("#}") {
        Some(end) => {
            nodes.push(Node::Comment);
            Ok(&body[end + 2..])
        }
        None => Err(SyntaxError::UnclosedDelimiter {
            opened: "{#",
            expected: "#}",
            offset: open_offset,
        }),
    }
}

fn err_to_syntax(source: &str, err: nom::Err<nom::error::Error<&str>>) -> SyntaxError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = offset_of(source, e.input);
            match e.code {
                nom::error::ErrorKind::TakeUntil => SyntaxError::UnterminatedString { offset },
                nom::error::ErrorKind::Escaped => {
                    SyntaxError::unexpected(offset, "invalid escape sequence in string literal")
                }
                _ => SyntaxError::unexpected(offset, "malformed expression"),
            }
        }
        nom::Err::Incomplete(_) => {
            SyntaxError::unexpected(source.len(), "unexpected end of input")
        }
    }
}
