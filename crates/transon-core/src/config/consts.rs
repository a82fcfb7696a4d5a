//! Defaults and limits used across the engine

/// Key that marks a JSON map as a rule
pub const DEFAULT_MARKER: &str = "$";

/// Maximum nesting of `include` evaluations before failing with a recursion error
pub const DEFAULT_MAX_DEPTH: usize = 64;


/// Largest accepted `max_depth`
pub const MAX_DEPTH_LIMIT: usize = 1024;
