// ABOUTME: Error types for template compilation and rendering failures

use thiserror::Error;

/// Errors raised while compiling a template: lexing, expression parsing,
/// template parsing and block structuring.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    /// Generic parse failure with a byte offset into the source
    #[error("syntax error at offset {offset}: {message}")]
    Unexpected { offset: usize, message: String },

    #[error("unterminated string literal at offset {offset}")]
    UnterminatedString { offset: usize },

    /// An interpolation, tag or comment was opened but its closing
    /// delimiter never appeared
    #[error("missing `{expected}` for `{opened}` at offset {offset}")]
    UnclosedDelimiter {
        opened: &'static str,
        expected: &'static str,
        offset: usize,
    },

    /// An `if` or `for` block was never closed
    #[error("unclosed `{construct}` block")]
    UnclosedBlock { construct: &'static str },

    /// `elsif`, `else`, `endif` or `endfor` appeared outside its owning
    /// construct
    #[error("`{tag}` without a matching `{expected}`")]
    StrayTag {
        tag: &'static str,
        expected: &'static str,
    },

    #[error("nesting exceeds the configured depth limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("template source is {size} bytes, the configured limit is {limit}")]
    SourceTooLarge { size: usize, limit: usize },
}

impl SyntaxError {
    /// Create a generic parse failure at a byte offset
    pub fn unexpected(offset: usize, message: impl Into<String>) -> Self {
        SyntaxError::Unexpected {
            offset,
            message: message.into(),
        }
    }
}

/// Errors raised while rendering a compiled template.
///
/// The first error aborts the render; the caller never receives partial
/// output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Raised only in strict mode; lenient mode substitutes nil
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    /// Unsupported operand kinds for an operator
    #[error("`{op}` is not supported between {lhs} and {rhs}")]
    TypeError {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    /// `for` over a non-iterable, non-nil value
    #[error("cannot iterate over a {0} value")]
    NotIterable(&'static str),

    #[error("unknown filter `{0}`")]
    UnknownFilter(String),

    /// Wraps a failure reported by the filter itself
    #[error("filter `{name}` failed: {detail}")]
    FilterError { name: String, detail: String },

    #[error("render exceeded the loop iteration limit of {0}")]
    LoopLimitExceeded(usize),
}

impl RenderError {
    /// Create a type error naming the operator and both operand kinds
    pub fn type_error(op: &'static str, lhs: &'static str, rhs: &'static str) -> Self {
        RenderError::TypeError { op, lhs, rhs }
    }

    /// Wrap a filter's own failure with the filter name
    pub fn filter_error(name: &str, detail: impl Into<String>) -> Self {
        RenderError::FilterError {
            name: name.to_string(),
            detail: detail.into(),
        }
    }
}
