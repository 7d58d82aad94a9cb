//! Typed notifications raised while a game runs.

use alloc::string::String;
use alloc::vec::Vec;

use crate::combat::ShipSunk;
use crate::common::Outcome;
use crate::coord::Coord;
use crate::player::PlayerId;
use crate::stats::PlayerSummary;

/// Final state of a finished game.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameOver {
    /// `None` on mutual annihilation.
    pub winner: Option<PlayerId>,
    pub turns: u32,
    pub summary: Vec<PlayerSummary>,
}

/// A targeting defect: a shot classified `all-destroyed` or `invalid`, or a
/// controller proposal that was not a legal target (`invalid`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub player: PlayerId,
    pub coord: Coord,
    pub outcome: Outcome,
    pub reason: String,
}

/// Receives game events synchronously, while the shot that caused them is
/// being resolved.
pub trait GameObserver {
    fn on_ship_sunk(&mut self, _event: &ShipSunk) {}

    fn on_game_over(&mut self, _event: &GameOver) {}

    fn on_diagnostic(&mut self, _event: &Diagnostic) {}
}
