//! # Domain Types
//!
//! Core domain types used throughout Presence Light.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ PresenceSnapshot │   │   UserSnapshot   │   │    LightMode     │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  availability    │   │  display_name    │   │  Automatic       │    │
//! │  │  activity        │   │  photo (dataURI) │   │  Custom          │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! │                                                                         │
//! │  ┌──────────────────┐                                                   │
//! │  │   Availability   │  Parsed, closed view of the raw Graph string.     │
//! │  │  ──────────────  │  Parsing is TOTAL: anything unrecognized maps     │
//! │  │  Available, Busy │  to PresenceUnknown, never an error.              │
//! │  │  Away, Offline.. │                                                   │
//! │  └──────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Raw Strings vs Parsed Enum
//! `PresenceSnapshot` keeps the availability/activity values exactly as the
//! remote source sent them - snapshots are compared structurally between
//! poll cycles, and a lossy parse would make distinct remote states compare
//! equal. The parsed [`Availability`] view exists only for color mapping.

use serde::{Deserialize, Serialize};

// =============================================================================
// Availability
// =============================================================================

/// The closed set of presence availability values the color mapping
/// understands.
///
/// Mirrors the Microsoft Graph `presence.availability` vocabulary. The
/// `PresenceUnknown` variant doubles as the total-parse fallback for any
/// string outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    AvailableIdle,
    Busy,
    BusyIdle,
    DoNotDisturb,
    BeRightBack,
    Away,
    Offline,
    PresenceUnknown,
}

impl Availability {
    /// Parses a raw availability (or activity) string.
    ///
    /// Total over all inputs: unrecognized values become
    /// [`Availability::PresenceUnknown`]. Matching is case-insensitive
    /// because backend payloads have been observed with inconsistent
    /// casing.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "available" => Availability::Available,
            "availableidle" => Availability::AvailableIdle,
            "busy" | "inacall" | "inaconferencecall" | "inameeting" => Availability::Busy,
            "busyidle" => Availability::BusyIdle,
            "donotdisturb" | "presenting" | "urgentinterruptionsonly" => {
                Availability::DoNotDisturb
            }
            "berightback" => Availability::BeRightBack,
            "away" | "inactive" => Availability::Away,
            "offline" | "offwork" | "outofoffice" => Availability::Offline,
            _ => Availability::PresenceUnknown,
        }
    }

    /// Returns true if the value is the unknown/fallback variant.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Availability::PresenceUnknown)
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Availability::Available => "Available",
            Availability::AvailableIdle => "AvailableIdle",
            Availability::Busy => "Busy",
            Availability::BusyIdle => "BusyIdle",
            Availability::DoNotDisturb => "DoNotDisturb",
            Availability::BeRightBack => "BeRightBack",
            Availability::Away => "Away",
            Availability::Offline => "Offline",
            Availability::PresenceUnknown => "PresenceUnknown",
        };
        write!(f, "{}", s)
    }
}

// =============================================================================
// Presence Snapshot
// =============================================================================

/// One observation of the user's remote presence.
///
/// Immutable once created. Compared structurally between poll cycles to
/// decide whether an actuator update is needed, so the raw strings are
/// preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    /// Raw availability value (e.g. "Available", "Busy", "Away").
    pub availability: String,

    /// Raw activity value (e.g. "InAMeeting", "Presenting").
    pub activity: String,
}

impl PresenceSnapshot {
    /// Creates a snapshot from raw remote values.
    pub fn new(availability: impl Into<String>, activity: impl Into<String>) -> Self {
        PresenceSnapshot {
            availability: availability.into(),
            activity: activity.into(),
        }
    }

    /// The parsed availability view used by color mapping.
    pub fn parsed_availability(&self) -> Availability {
        Availability::parse(&self.availability)
    }
}

// =============================================================================
// User Snapshot
// =============================================================================

/// Profile information fetched once per authentication session.
///
/// Not re-polled in the hot loop; the display surface reads it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// The user's display name.
    pub display_name: String,

    /// Profile photo as a `data:image/gif;base64,...` URI, if available.
    pub photo: Option<String>,
}

impl UserSnapshot {
    /// Creates a snapshot with no photo attached yet.
    pub fn new(display_name: impl Into<String>) -> Self {
        UserSnapshot {
            display_name: display_name.into(),
            photo: None,
        }
    }
}

// =============================================================================
// Light Mode
// =============================================================================

/// Whether the physical light follows presence automatically or a
/// manually pinned color.
///
/// ## Mode Arbitration
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  AUTOMATIC (default)                │  CUSTOM                           │
/// │  ───────────────────                │  ──────                           │
/// │  • Hot loop fetches presence        │  • Hot loop idles (no fetches)    │
/// │  • Color = map(availability)        │  • Color = pinned custom color    │
/// │  • Updates every poll interval      │  • Applied once, on demand        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightMode {
    /// Follow the remote presence source.
    #[default]
    Automatic,

    /// Hold an operator-pinned color; automatic sync is suspended.
    Custom,
}

impl std::fmt::Display for LightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LightMode::Automatic => write!(f, "automatic"),
            LightMode::Custom => write!(f, "custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_parse_known_values() {
        assert_eq!(Availability::parse("Available"), Availability::Available);
        assert_eq!(Availability::parse("Busy"), Availability::Busy);
        assert_eq!(Availability::parse("DoNotDisturb"), Availability::DoNotDisturb);
        assert_eq!(Availability::parse("BeRightBack"), Availability::BeRightBack);
        assert_eq!(Availability::parse("Away"), Availability::Away);
        assert_eq!(Availability::parse("Offline"), Availability::Offline);
    }

    #[test]
    fn test_availability_parse_is_case_insensitive() {
        assert_eq!(Availability::parse("available"), Availability::Available);
        assert_eq!(Availability::parse("BUSY"), Availability::Busy);
        assert_eq!(Availability::parse(" doNotDisturb "), Availability::DoNotDisturb);
    }

    #[test]
    fn test_availability_parse_activity_aliases() {
        assert_eq!(Availability::parse("Presenting"), Availability::DoNotDisturb);
        assert_eq!(Availability::parse("InAMeeting"), Availability::Busy);
        assert_eq!(Availability::parse("OutOfOffice"), Availability::Offline);
        assert_eq!(Availability::parse("Inactive"), Availability::Away);
    }

    #[test]
    fn test_availability_parse_is_total() {
        assert_eq!(Availability::parse(""), Availability::PresenceUnknown);
        assert_eq!(Availability::parse("garbage"), Availability::PresenceUnknown);
        assert_eq!(Availability::parse("❄"), Availability::PresenceUnknown);
        assert!(Availability::parse("???").is_unknown());
    }

    #[test]
    fn test_presence_snapshot_structural_equality() {
        let a = PresenceSnapshot::new("Available", "Available");
        let b = PresenceSnapshot::new("Available", "Available");
        let c = PresenceSnapshot::new("Available", "InAMeeting");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_light_mode_default_is_automatic() {
        assert_eq!(LightMode::default(), LightMode::Automatic);
    }
}
