//! Progressive reveal: how much observers learn about a damaged ship.

use alloc::format;
use alloc::string::String;

use crate::ship::Ship;

/// Disclosure level for a hit ship, from least to most revealing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum RevealLevel {
    Hidden,
    SizeHint,
    Critical,
    Full,
}

/// Thresholds controlling the reveal level of an unsunk ship.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct RevealPolicy {
    /// Damaged segments after which the ship's length is disclosed.
    pub size_hint_after_hits: usize,
    /// Integrity at or below which the ship's class is disclosed.
    pub critical_integrity: f64,
}

impl Default for RevealPolicy {
    fn default() -> Self {
        Self {
            size_hint_after_hits: 2,
            critical_integrity: 0.34,
        }
    }
}

impl RevealPolicy {
    /// Disclose nothing until a ship sinks.
    pub fn silent() -> Self {
        Self {
            size_hint_after_hits: usize::MAX,
            critical_integrity: -1.0,
        }
    }

    pub fn level_for(&self, ship: &Ship) -> RevealLevel {
        if ship.is_sunk() {
            RevealLevel::Full
        } else if ship.integrity() <= self.critical_integrity {
            RevealLevel::Critical
        } else if ship.hits_taken() >= self.size_hint_after_hits {
            RevealLevel::SizeHint
        } else {
            RevealLevel::Hidden
        }
    }
}

/// Observer-facing message for a hit on `ship` owned by `owner`.
pub fn hit_message(level: RevealLevel, ship: &Ship, owner: &str) -> String {
    match level {
        RevealLevel::Hidden => String::from("Hit!"),
        RevealLevel::SizeHint => format!("Hit a {}-cell ship", ship.len()),
        RevealLevel::Critical => format!("{} critically damaged", ship.class()),
        RevealLevel::Full => format!("{}'s {} sunk", owner, ship.class()),
    }
}
