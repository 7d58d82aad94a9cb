use alloc::collections::VecDeque;
use alloc::vec::Vec;

use rand::rngs::SmallRng;

use super::Controller;
use crate::coord::Coord;

/// Moves are submitted by the host through `Game::process_player_action`.
pub struct HumanController;

impl Controller for HumanController {
    fn select_target(
        &mut self,
        _rng: &mut SmallRng,
        _legal: &[Coord],
        _rows: usize,
        _cols: usize,
    ) -> Option<Coord> {
        None
    }

    fn is_automated(&self) -> bool {
        false
    }
}

/// Plays a fixed sequence of coordinates, skipping any that are no longer
/// legal. Useful for replays and deterministic tests.
pub struct ScriptedController {
    script: VecDeque<Coord>,
    original: Vec<Coord>,
}

impl ScriptedController {
    pub fn new(script: Vec<Coord>) -> Self {
        Self {
            script: script.iter().copied().collect(),
            original: script,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Controller for ScriptedController {
    fn select_target(
        &mut self,
        _rng: &mut SmallRng,
        legal: &[Coord],
        _rows: usize,
        _cols: usize,
    ) -> Option<Coord> {
        while let Some(next) = self.script.pop_front() {
            if legal.contains(&next) {
                return Some(next);
            }
        }
        None
    }

    fn reset(&mut self) {
        self.script = self.original.iter().copied().collect();
    }

    fn is_automated(&self) -> bool {
        true
    }
}
