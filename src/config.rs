//! Era rules, game modes, scoring and the standard fleet.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::time::Duration;

use crate::common::GameError;
use crate::reveal::RevealPolicy;
use crate::ship::ShipSpec;

pub const DEFAULT_BOARD_SIZE: usize = 10;

/// Attempts per ship before random placement gives up.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 100;

/// Standard five-ship fleet.
pub fn default_fleet() -> Vec<ShipSpec> {
    alloc::vec![
        ShipSpec::new("Carrier", 5),
        ShipSpec::new("Battleship", 4),
        ShipSpec::new("Cruiser", 3),
        ShipSpec::new("Submarine", 3),
        ShipSpec::new("Destroyer", 2),
    ]
}

/// Shape of a match; fixes how many players may join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameMode {
    /// One-on-one.
    Classic,
    /// Free-for-all, up to four players.
    Skirmish,
    /// Team play, up to eight players.
    Alliance,
}

impl GameMode {
    pub fn player_cap(&self) -> usize {
        match self {
            GameMode::Classic => 2,
            GameMode::Skirmish => 4,
            GameMode::Alliance => 8,
        }
    }
}

/// Score awarded by the combat engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoringRules {
    /// Points per damaged occupant.
    pub hit: u64,
    /// Points per ship sunk.
    pub sink: u64,
    /// Multiplier on sink points when a human sinks an easy AI's ship.
    pub weak_opponent_multiplier: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            hit: 10,
            sink: 50,
            weak_opponent_multiplier: 0.5,
        }
    }
}

/// Era rules as supplied by the host. Every field is optional here; the
/// required ones are checked by [`EraRules::from_config`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct EraRulesConfig {
    pub name: Option<String>,
    pub turn_required: Option<bool>,
    pub continue_on_hit: Option<bool>,
    pub continue_on_miss: Option<bool>,
    pub base_damage: Option<f64>,
    pub capture_chance: Option<f64>,
    pub max_turn_secs: Option<u32>,
    pub scoring: Option<ScoringRules>,
    pub reveal: Option<RevealPolicy>,
}

/// Validated era rules.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct EraRules {
    pub name: String,
    pub turn_required: bool,
    pub continue_on_hit: bool,
    pub continue_on_miss: bool,
    pub base_damage: f64,
    /// Probability in [0, 1] that a sunk ship is captured by the firer.
    pub capture_chance: f64,
    /// Informational limit for human turns; not enforced by the engine.
    pub max_turn_secs: Option<u32>,
    pub scoring: ScoringRules,
    pub reveal: RevealPolicy,
}

impl EraRules {
    pub fn from_config(cfg: EraRulesConfig) -> Result<Self, GameError> {
        let turn_required = cfg
            .turn_required
            .ok_or(GameError::MissingRule("turn_required"))?;
        let continue_on_hit = cfg
            .continue_on_hit
            .ok_or(GameError::MissingRule("continue_on_hit"))?;
        let continue_on_miss = cfg
            .continue_on_miss
            .ok_or(GameError::MissingRule("continue_on_miss"))?;

        let base_damage = cfg.base_damage.unwrap_or(1.0);
        if base_damage.is_nan() || base_damage < 0.0 {
            return Err(GameError::Config("base_damage must be non-negative".to_string()));
        }
        let capture_chance = cfg.capture_chance.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&capture_chance) {
            return Err(GameError::Config("capture_chance must be within [0, 1]".to_string()));
        }

        Ok(EraRules {
            name: cfg.name.unwrap_or_else(|| "custom".to_string()),
            turn_required,
            continue_on_hit,
            continue_on_miss,
            base_damage,
            capture_chance,
            max_turn_secs: cfg.max_turn_secs,
            scoring: cfg.scoring.unwrap_or_default(),
            reveal: cfg.reveal.unwrap_or_default(),
        })
    }

    /// Parse and validate a JSON rules document.
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let cfg: EraRulesConfig =
            serde_json::from_str(json).map_err(|e| GameError::Config(e.to_string()))?;
        Self::from_config(cfg)
    }

    /// Alternate turns; a hit earns another shot.
    pub fn classic() -> Self {
        Self::preset("classic", true, false, 0.0)
    }

    /// Strict alternation, one shot per turn.
    pub fn salvo() -> Self {
        Self::preset("salvo", false, false, 0.0)
    }

    /// Hits earn another shot and sunk ships may be captured.
    pub fn modern() -> Self {
        Self::preset("modern", true, false, 0.25)
    }

    fn preset(name: &str, continue_on_hit: bool, continue_on_miss: bool, capture: f64) -> Self {
        EraRules {
            name: name.to_string(),
            turn_required: true,
            continue_on_hit,
            continue_on_miss,
            base_damage: 1.0,
            capture_chance: capture,
            max_turn_secs: Some(60),
            scoring: ScoringRules::default(),
            reveal: RevealPolicy::default(),
        }
    }

    /// Whether the player who just fired keeps the turn.
    pub fn turn_continues(&self, hit: bool, miss: bool) -> bool {
        self.turn_required && ((hit && self.continue_on_hit) || (miss && self.continue_on_miss))
    }

    pub fn max_turn_duration(&self) -> Option<Duration> {
        self.max_turn_secs.map(|s| Duration::from_secs(s as u64))
    }
}

impl From<&EraRules> for EraRulesConfig {
    fn from(rules: &EraRules) -> Self {
        EraRulesConfig {
            name: Some(rules.name.clone()),
            turn_required: Some(rules.turn_required),
            continue_on_hit: Some(rules.continue_on_hit),
            continue_on_miss: Some(rules.continue_on_miss),
            base_damage: Some(rules.base_damage),
            capture_chance: Some(rules.capture_chance),
            max_turn_secs: rules.max_turn_secs,
            scoring: Some(rules.scoring),
            reveal: Some(rules.reveal),
        }
    }
}

/// Presentation delays inserted around a queued AI move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub before_resolve: Duration,
    pub after_resolve: Duration,
}

impl Pacing {
    pub fn headless() -> Self {
        Self {
            before_resolve: Duration::ZERO,
            after_resolve: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            before_resolve: Duration::from_millis(600),
            after_resolve: Duration::from_millis(900),
        }
    }
}
