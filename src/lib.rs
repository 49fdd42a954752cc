// ABOUTME: Library root wiring the compile and render pipeline together

//! A Liquid-style template engine core.
//!
//! Templates mix literal text with interpolations (`{{ ... }}`), control
//! tags (`{% ... %}`) and comments (`{# ... #}`). Compilation is a strict
//! left-to-right pipeline: parse to a flat node list, apply whitespace
//! trimming, fold control tags into structured blocks. Rendering walks the
//! structured tree against a caller-supplied context and a filter registry.
//!
//! ```
//! use stencil::{compile, render, CompileOptions, FilterRegistry, RenderOptions, Value};
//! use indexmap::IndexMap;
//!
//! let nodes = compile("Hello {{ user.name | capitalize }}!", &CompileOptions::default()).unwrap();
//! let mut user = IndexMap::new();
//! user.insert("name".to_string(), Value::String("alice".into()));
//! let mut root = IndexMap::new();
//! root.insert("user".to_string(), Value::Map(user));
//!
//! let registry = FilterRegistry::with_defaults();
//! let output = render(&nodes, &registry, root, &RenderOptions::default()).unwrap();
//! assert_eq!(output.into_string(), "Hello Alice!");
//! ```

pub mod ast;
pub mod blocks;
pub mod config;
pub mod context;
pub mod error;
pub mod eval;
pub mod filters;
pub mod parser;
pub mod render;
pub mod value;

pub use config::{CompileOptions, RenderOptions};
pub use error::{RenderError, SyntaxError};
pub use filters::{Filter, FilterRegistry};
pub use render::{render, Output};
pub use value::Value;

use ast::Node;

/// Compile template source into a structured AST.
///
/// The result has whitespace trimming applied and control tags folded into
/// conditional and loop blocks. Empty input compiles to an empty node list.
pub fn compile(source: &str, options: &CompileOptions) -> Result<Vec<Node>, SyntaxError> {
    if source.len() > options.max_source_size {
        return Err(SyntaxError::SourceTooLarge {
            size: source.len(),
            limit: options.max_source_size,
        });
    }
    let mut nodes = parser::parse_template(source)?;
    blocks::apply_trim(&mut nodes);
    let nodes = blocks::structure(nodes)?;
    blocks::check_depth(&nodes, options.max_depth)?;
    Ok(nodes)
}
