// ABOUTME: Configuration options and default resource limits
// This module holds the option structs threaded through compile and render.

/// Default maximum template source size accepted by `compile`, in bytes.
pub const DEFAULT_MAX_SOURCE_SIZE: usize = 256 * 1024;

/// Default maximum nesting depth for blocks and expressions.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default ceiling on total loop iterations across a single render.
pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 100_000;

/// Options for `compile`.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Maximum accepted source size in bytes
    pub max_source_size: usize,
    /// Maximum nesting depth for blocks and expressions
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_source_size: DEFAULT_MAX_SOURCE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Options for `render`.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// When true and the template is exactly one top-level interpolation,
    /// return the raw value instead of a formatted string
    pub preserve_types: bool,
    /// When true, undefined variables and property/index misses raise
    /// `UndefinedVariable`; when false they resolve to nil
    pub strict_variables: bool,
    /// Ceiling on total loop iterations, shared across all loops in one
    /// render
    pub max_loop_iterations: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preserve_types: false,
            strict_variables: false,
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
        }
    }
}
