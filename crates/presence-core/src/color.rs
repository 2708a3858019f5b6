//! # Color Module
//!
//! Provides the `Rgb` color value, the configurable `Palette`, and the
//! presence → color mapping.
//!
//! ## Why a Total Mapping?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE UNKNOWN-STATUS PROBLEM                                             │
//! │                                                                         │
//! │  The remote presence vocabulary grows over time ("PresenceUnknown",     │
//! │  new activity values, tenant-specific states). If the mapping threw     │
//! │  on anything it didn't recognize, a vocabulary change upstream would    │
//! │  take the whole light offline.                                          │
//! │                                                                         │
//! │  OUR SOLUTION: map(anything) always yields a color                      │
//! │    known availability  → palette entry                                  │
//! │    unknown availability → try the activity string instead               │
//! │    both unknown        → palette.fallback                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use presence_core::color::{map_presence_to_color, Palette, Rgb};
//!
//! let palette = Palette::default();
//!
//! // Known availability → its palette entry
//! assert_eq!(map_presence_to_color("Available", None, &palette), palette.available);
//!
//! // Unknown availability, recognizable activity → mapped via the activity
//! assert_eq!(
//!     map_presence_to_color("??", Some("Presenting"), &palette),
//!     palette.do_not_disturb
//! );
//!
//! // Nothing recognizable → fallback, never an error
//! assert_eq!(map_presence_to_color("??", None, &palette), palette.fallback);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Availability;

// =============================================================================
// Rgb Color Value
// =============================================================================

/// An 8-bit-per-channel RGB color.
///
/// ## Design Decisions
/// - **Single wire format**: every backend starts from the same Rgb value
///   and converts to its own transport encoding (HSB for the bridge, hex
///   for the cloud API and webhook)
/// - **Copy**: three bytes, passed by value everywhere
/// - **Serde as hex string**: palette entries in the config file read as
///   `available = "#00cc00"`, not as nested r/g/b tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Creates a color from channel values.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parses `#RRGGBB` or `RRGGBB` hex notation.
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidColor(hex.to_string()));
        }

        // Slicing is safe: all-ASCII verified above.
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| CoreError::InvalidColor(hex.to_string()))
        };

        Ok(Rgb {
            r: parse(0..2)?,
            g: parse(2..4)?,
            b: parse(4..6)?,
        })
    }

    /// Formats as lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Converts to the Hue bridge HSB encoding.
    ///
    /// Returns `(hue, saturation, brightness)` where hue is 0–65535 and
    /// saturation/brightness are 0–254, the ranges the bridge `state`
    /// endpoint accepts.
    pub fn to_hsb(&self) -> (u16, u8, u8) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue_deg = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta).rem_euclid(6.0))
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        let hue = ((hue_deg / 360.0) * 65535.0).round() as u16;
        let sat = (saturation * 254.0).round() as u8;
        let bri = (max * 254.0).round() as u8;
        (hue, sat, bri)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

// Serialize/Deserialize through the hex representation so the palette in
// config.toml stays human-editable.
impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Palette
// =============================================================================

/// The configurable availability → color palette.
///
/// Lives in the `[colors]` table of the config file. Every field is
/// serde-defaulted, so a missing table (or a partially filled one) yields
/// the stock palette for the absent entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Available / AvailableIdle.
    #[serde(default = "default_available")]
    pub available: Rgb,

    /// Busy / BusyIdle and call/meeting activities.
    #[serde(default = "default_busy")]
    pub busy: Rgb,

    /// DoNotDisturb / Presenting / UrgentInterruptionsOnly.
    #[serde(default = "default_do_not_disturb")]
    pub do_not_disturb: Rgb,

    /// Away / BeRightBack / Inactive.
    #[serde(default = "default_away")]
    pub away: Rgb,

    /// Offline / OffWork / OutOfOffice.
    #[serde(default = "default_offline")]
    pub offline: Rgb,

    /// Anything the mapping cannot interpret.
    #[serde(default = "default_fallback")]
    pub fallback: Rgb,
}

fn default_available() -> Rgb {
    Rgb::new(0x00, 0xcc, 0x00)
}

fn default_busy() -> Rgb {
    Rgb::new(0xff, 0x00, 0x00)
}

fn default_do_not_disturb() -> Rgb {
    Rgb::new(0xb2, 0x00, 0x00)
}

fn default_away() -> Rgb {
    Rgb::new(0xff, 0xff, 0x00)
}

fn default_offline() -> Rgb {
    Rgb::new(0xff, 0xff, 0xff)
}

fn default_fallback() -> Rgb {
    Rgb::new(0xff, 0xff, 0xff)
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            available: default_available(),
            busy: default_busy(),
            do_not_disturb: default_do_not_disturb(),
            away: default_away(),
            offline: default_offline(),
            fallback: default_fallback(),
        }
    }
}

impl Palette {
    /// Returns the palette entry for a parsed availability.
    pub fn color_for(&self, availability: Availability) -> Rgb {
        match availability {
            Availability::Available | Availability::AvailableIdle => self.available,
            Availability::Busy | Availability::BusyIdle => self.busy,
            Availability::DoNotDisturb => self.do_not_disturb,
            Availability::Away | Availability::BeRightBack => self.away,
            Availability::Offline => self.offline,
            Availability::PresenceUnknown => self.fallback,
        }
    }
}

// =============================================================================
// Presence → Color Mapping
// =============================================================================

/// Maps a raw availability (and optional activity) to a target color.
///
/// Deterministic and total: this function never fails. Resolution order:
/// 1. availability parses to a known value → its palette entry
/// 2. otherwise, a recognizable activity string → mapped via the activity
/// 3. otherwise → `palette.fallback`
pub fn map_presence_to_color(availability: &str, activity: Option<&str>, palette: &Palette) -> Rgb {
    let parsed = Availability::parse(availability);
    if !parsed.is_unknown() {
        return palette.color_for(parsed);
    }

    if let Some(activity) = activity {
        let via_activity = Availability::parse(activity);
        if !via_activity.is_unknown() {
            return palette.color_for(via_activity);
        }
    }

    palette.fallback
}
