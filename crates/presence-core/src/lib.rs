//! # presence-core: Pure Domain Logic for Presence Light
//!
//! This crate is the **heart** of Presence Light. It contains the domain
//! types and the presence-to-color mapping as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Presence Light Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/worker (Host)                           │   │
//! │  │      Alexa adapter ──► status surface ──► graceful shutdown     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  presence-sync (Engine)                         │   │
//! │  │     Graph client ──► worker loop ──► light actuators            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ presence-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   color   │  │   error   │                  │   │
//! │  │   │ Presence  │  │    Rgb    │  │ CoreError │                  │   │
//! │  │   │ Snapshot  │  │  Palette  │  │           │                  │   │
//! │  │   │ LightMode │  │  mapping  │  │           │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Availability, PresenceSnapshot, UserSnapshot, LightMode)
//! - [`color`] - Rgb color value, Palette, presence → color mapping
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Network, file system access is FORBIDDEN here
//! 3. **Total Mapping**: presence → color never fails, unknown input hits the fallback
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod color;
pub mod error;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use presence_core::Rgb` instead of
// `use presence_core::color::Rgb`

pub use color::{map_presence_to_color, Palette, Rgb};
pub use error::CoreError;
pub use types::{Availability, LightMode, PresenceSnapshot, UserSnapshot};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default color pinned by the voice-skill "Custom" intent.
///
/// ## Why a constant?
/// The voice path has no color slot; it always pins plain white and the
/// user adjusts from the GUI afterwards. Kept here so the engine and the
/// HTTP adapter agree on the value.
pub const DEFAULT_CUSTOM_COLOR: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
