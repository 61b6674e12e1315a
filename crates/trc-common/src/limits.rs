//! Centralized limits and thresholds for the compiler.
//!
//! Solver recursion limits live in `trc_solver::recursion::RecursionProfile`;
//! the constants here cover the parser, binder and checker.

/// Maximum nesting depth for the recursive-descent parser.
///
/// Deeply nested expressions (`((((((...))))))`, long `a.b.c.d...` chains
/// inside nested blocks) report a syntax error instead of overflowing the stack.
pub const MAX_PARSER_DEPTH: u32 = 400;

/// Maximum depth for expression type checking.
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Maximum nesting of alias-to-alias resolution before the binder gives up.
///
/// Cycles are detected exactly by the visited set; this bounds pathological
/// but acyclic chains.
pub const MAX_ALIAS_CHAIN_DEPTH: u32 = 100;

/// Maximum superclass chain length walked during method lookup and subtyping.
pub const MAX_CLASS_CHAIN_DEPTH: u32 = 64;

/// Default maximum number of errors reported per file.
pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Default coalescing window for watch mode, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;
