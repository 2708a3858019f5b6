//! # Error Types
//!
//! Domain-specific error types for presence-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  presence-core errors (this file)                                      │
//! │  └── CoreError        - Color parse failures                           │
//! │                                                                         │
//! │  presence-sync errors (separate crate)                                 │
//! │  └── SyncError        - Config, Graph, actuator failures               │
//! │                                                                         │
//! │  Flow: CoreError → SyncError → logged by the worker loop               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (the offending string, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// The mapping function itself is total and never returns these; they
/// surface only when parsing operator-supplied values (palette entries,
/// custom colors).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A color string could not be parsed.
    ///
    /// ## When This Occurs
    /// - A `[colors]` palette entry is not `#RRGGBB` / `RRGGBB`
    /// - A custom color sent over the HTTP surface is malformed
    #[error("Invalid color '{0}': expected #RRGGBB hex")]
    InvalidColor(String),
}
