use rand::rngs::SmallRng;

use super::Controller;
use crate::combat::ShotResult;
use crate::common::TargetingDefect;
use crate::coord::Coord;
use crate::targeting::{Strategy, TargetingMachine};

/// Computer opponent driven by the targeting state machine.
pub struct AiController {
    machine: TargetingMachine,
}

impl AiController {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            machine: TargetingMachine::new(strategy),
        }
    }

    pub fn from_machine(machine: TargetingMachine) -> Self {
        Self { machine }
    }

    pub fn machine(&self) -> &TargetingMachine {
        &self.machine
    }
}

impl Controller for AiController {
    fn select_target(
        &mut self,
        rng: &mut SmallRng,
        legal: &[Coord],
        rows: usize,
        cols: usize,
    ) -> Option<Coord> {
        self.machine.select_target(rng, legal, rows, cols)
    }

    fn observe_result(&mut self, coord: Coord, result: &ShotResult) -> Result<(), TargetingDefect> {
        self.machine.observe_result(coord, result)
    }

    fn prepare(&mut self, enemy_lengths: &[usize]) {
        self.machine.set_enemy_lengths(enemy_lengths);
    }

    fn reset(&mut self) {
        self.machine.reset();
    }

    fn is_automated(&self) -> bool {
        true
    }
}
