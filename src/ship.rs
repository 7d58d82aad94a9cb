//! Ship definitions and per-cell health tracking.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::reveal::{RevealLevel, RevealPolicy};

/// Identifier of a ship, unique within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipId(pub u32);

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Fleet composition entry: class name, length, and defense multiplier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ShipSpec {
    pub class: String,
    pub length: usize,
    pub defense: f64,
}

impl ShipSpec {
    pub fn new(class: &str, length: usize) -> Self {
        Self {
            class: String::from(class),
            length,
            defense: 1.0,
        }
    }

    /// Scale incoming damage by `defense` (1.0 = unarmoured).
    pub fn with_defense(mut self, defense: f64) -> Self {
        self.defense = defense;
        self
    }
}

/// What a single application of damage did to a ship.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    /// Health actually removed from the cell.
    pub dealt: f64,
    /// The cell is now at zero health.
    pub cell_destroyed: bool,
    /// This damage turned a floating ship into a sunk one.
    pub newly_sunk: bool,
}

#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    id: ShipId,
    class: String,
    health: Vec<f64>,
    placed: bool,
    defense: f64,
}

impl Ship {
    pub fn new(id: ShipId, class: &str, length: usize) -> Self {
        Ship {
            id,
            class: String::from(class),
            health: alloc::vec![1.0; length],
            placed: false,
            defense: 1.0,
        }
    }

    pub fn from_spec(id: ShipId, spec: &ShipSpec) -> Self {
        let mut ship = Ship::new(id, &spec.class, spec.length);
        ship.defense = sanitize_multiplier(spec.defense);
        ship
    }

    pub fn id(&self) -> ShipId {
        self.id
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn len(&self) -> usize {
        self.health.len()
    }

    pub fn is_empty(&self) -> bool {
        self.health.is_empty()
    }

    pub fn defense(&self) -> f64 {
        self.defense
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub(crate) fn set_placed(&mut self, placed: bool) {
        self.placed = placed;
    }

    pub fn health(&self) -> &[f64] {
        &self.health
    }

    /// Health of one segment; `None` for an unknown slot.
    pub fn cell_health(&self, slot: usize) -> Option<f64> {
        self.health.get(slot).copied()
    }

    /// A ship is sunk once every segment is at zero.
    pub fn is_sunk(&self) -> bool {
        self.health.iter().all(|&h| h <= 0.0)
    }

    /// Number of segments that have taken any damage.
    pub fn hits_taken(&self) -> usize {
        self.health.iter().filter(|&&h| h < 1.0).count()
    }

    /// Mean remaining health across segments, in [0, 1].
    pub fn integrity(&self) -> f64 {
        if self.health.is_empty() {
            return 0.0;
        }
        self.health.iter().sum::<f64>() / self.health.len() as f64
    }

    /// Remove up to `amount` health from `slot`. Negative or NaN amounts are
    /// treated as zero so a modifier can never heal a ship.
    pub fn apply_damage(&mut self, slot: usize, amount: f64) -> DamageReport {
        let was_sunk = self.is_sunk();
        let amount = if amount.is_nan() { 0.0 } else { amount.max(0.0) };
        let Some(cell) = self.health.get_mut(slot) else {
            return DamageReport {
                dealt: 0.0,
                cell_destroyed: false,
                newly_sunk: false,
            };
        };
        let before = *cell;
        *cell = (before - amount).max(0.0);
        let dealt = before - *cell;
        let cell_destroyed = *cell <= 0.0;
        DamageReport {
            dealt,
            cell_destroyed,
            newly_sunk: !was_sunk && self.is_sunk(),
        }
    }

    /// Restore every segment to full health (capture and rematch reset).
    pub fn repair(&mut self) {
        for h in self.health.iter_mut() {
            *h = 1.0;
        }
    }

    pub fn reveal_level(&self, policy: &RevealPolicy) -> RevealLevel {
        policy.level_for(self)
    }
}

fn sanitize_multiplier(v: f64) -> f64 {
    if v.is_nan() {
        1.0
    } else {
        v.max(0.0)
    }
}

impl fmt::Debug for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ship {{ id: {}, class: \"{}\", health: {:?}, placed: {}, defense: {} }}",
            self.id.0, self.class, self.health, self.placed, self.defense,
        )
    }
}
