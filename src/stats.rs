//! Per-player combat statistics and the end-of-game summary.

use alloc::string::String;

use crate::player::PlayerId;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerStats {
    pub shots: u32,
    pub hits: u32,
    pub misses: u32,
    pub ships_sunk: u32,
    pub damage_dealt: f64,
    pub score: u64,
}

impl PlayerStats {
    /// Hits as a percentage of shots; zero before the first shot.
    pub fn accuracy(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            self.hits as f64 / self.shots as f64 * 100.0
        }
    }

    /// Add `points × multiplier`, rounded to the nearest whole point.
    pub(crate) fn award(&mut self, points: u64, multiplier: f64) {
        let scaled = libm::round(points as f64 * multiplier.max(0.0));
        self.score += scaled as u64;
    }
}

/// Exported statistics for one player, computed on demand.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub alliance: Option<String>,
    pub defeated: bool,
    pub shots: u32,
    pub hits: u32,
    pub misses: u32,
    pub ships_sunk: u32,
    pub damage_dealt: f64,
    pub accuracy: f64,
    pub score: u64,
}

impl PlayerSummary {
    pub fn new(id: PlayerId, name: &str, alliance: Option<&str>, defeated: bool, stats: &PlayerStats) -> Self {
        PlayerSummary {
            id,
            name: String::from(name),
            alliance: alliance.map(String::from),
            defeated,
            shots: stats.shots,
            hits: stats.hits,
            misses: stats.misses,
            ships_sunk: stats.ships_sunk,
            damage_dealt: stats.damage_dealt,
            accuracy: stats.accuracy(),
            score: stats.score,
        }
    }
}
