//! Players and the controller trait that decides their moves.
//!
//! A [`Player`] owns its fleet, the placement index of its own ships and the
//! set of coordinates it must never target again. The move itself comes from
//! a [`Controller`]:
//! - `AiController`: targeting state machine
//! - `HumanController`: waits for the host to submit a move
//! - `ScriptedController`: replays a fixed list of coordinates

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use rand::rngs::SmallRng;
use rand::Rng;

use crate::board::Board;
use crate::combat::ShotResult;
use crate::common::{PlacementError, TargetingDefect};
use crate::config::MAX_PLACEMENT_ATTEMPTS;
use crate::coord::Coord;
use crate::fleet::Fleet;
use crate::ship::{Orientation, ShipId};
use crate::stats::PlayerStats;
use crate::targeting::{Strategy, TargetingMachine};

pub mod ai;
pub mod human;

pub use ai::AiController;
pub use human::{HumanController, ScriptedController};

/// Identifier of a player, assigned when the player joins a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Human,
    Ai(Difficulty),
}

/// Which ship, and which of its segments, sits on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub ship: ShipId,
    pub slot: usize,
    pub orientation: Orientation,
}

/// Decides where a player fires.
pub trait Controller: Send {
    /// Pick one coordinate from `legal`, or `None` when the move must come
    /// from outside (a human at the keyboard).
    fn select_target(
        &mut self,
        rng: &mut SmallRng,
        legal: &[Coord],
        rows: usize,
        cols: usize,
    ) -> Option<Coord>;

    /// Learn from the result of this player's own shot.
    fn observe_result(&mut self, coord: Coord, result: &ShotResult) -> Result<(), TargetingDefect> {
        if result.outcome.is_defect() {
            return Err(TargetingDefect {
                coord,
                outcome: result.outcome,
            });
        }
        Ok(())
    }

    /// Told the lengths of every hostile ship once the match starts.
    fn prepare(&mut self, _enemy_lengths: &[usize]) {}

    /// Forget everything learned during the previous game.
    fn reset(&mut self) {}

    /// `true` when the controller moves without host input.
    fn is_automated(&self) -> bool;
}

pub struct Player {
    id: PlayerId,
    name: String,
    role: Role,
    pub(crate) fleet: Fleet,
    placements: BTreeMap<Coord, Placement>,
    forbidden: BTreeSet<Coord>,
    pub(crate) stats: PlayerStats,
    attack_boost: f64,
    defense_boost: f64,
    pub(crate) controller: Box<dyn Controller>,
}

impl Player {
    pub fn with_controller(name: &str, role: Role, controller: Box<dyn Controller>) -> Self {
        let id = PlayerId(0);
        Player {
            id,
            name: String::from(name),
            role,
            fleet: Fleet::new(id),
            placements: BTreeMap::new(),
            forbidden: BTreeSet::new(),
            stats: PlayerStats::default(),
            attack_boost: 0.0,
            defense_boost: 0.0,
            controller,
        }
    }

    /// A player whose moves are submitted by the host.
    pub fn human(name: &str) -> Self {
        Self::with_controller(name, Role::Human, Box::new(HumanController))
    }

    /// A computer opponent using `strategy` for its search phase.
    pub fn ai(name: &str, difficulty: Difficulty, strategy: Strategy) -> Self {
        Self::with_controller(
            name,
            Role::Ai(difficulty),
            Box::new(AiController::new(strategy)),
        )
    }

    /// A computer opponent driven by a pre-configured targeting machine.
    pub fn ai_with(name: &str, difficulty: Difficulty, machine: TargetingMachine) -> Self {
        Self::with_controller(
            name,
            Role::Ai(difficulty),
            Box::new(AiController::from_machine(machine)),
        )
    }

    /// Set damage modifiers: outgoing damage is scaled by `1 + attack`,
    /// incoming by `1 - defense`.
    pub fn with_boosts(mut self, attack: f64, defense: f64) -> Self {
        self.attack_boost = if attack.is_nan() { 0.0 } else { attack };
        self.defense_boost = if defense.is_nan() { 0.0 } else { defense };
        self
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub(crate) fn assign(&mut self, id: PlayerId, fleet: Fleet) {
        self.id = id;
        self.fleet = fleet;
        self.placements.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_human(&self) -> bool {
        self.role == Role::Human
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn attack_boost(&self) -> f64 {
        self.attack_boost
    }

    pub fn defense_boost(&self) -> f64 {
        self.defense_boost
    }

    pub fn is_defeated(&self) -> bool {
        self.fleet.is_defeated()
    }

    pub fn is_automated(&self) -> bool {
        self.controller.is_automated()
    }

    /// Ship segment of this player at `c`, if any.
    pub fn occupant(&self, c: Coord) -> Option<&Placement> {
        self.placements.get(&c)
    }

    pub fn placements(&self) -> impl Iterator<Item = (&Coord, &Placement)> {
        self.placements.iter()
    }

    /// Cells covered by `ship`, ordered by segment.
    pub fn cells_of(&self, ship: ShipId) -> Vec<Coord> {
        let mut cells: Vec<(usize, Coord)> = self
            .placements
            .iter()
            .filter(|(_, p)| p.ship == ship)
            .map(|(c, p)| (p.slot, *c))
            .collect();
        cells.sort();
        cells.into_iter().map(|(_, c)| c).collect()
    }

    pub fn is_forbidden(&self, c: Coord) -> bool {
        self.forbidden.contains(&c)
    }

    pub fn forbidden(&self) -> &BTreeSet<Coord> {
        &self.forbidden
    }

    pub(crate) fn forbid(&mut self, c: Coord) {
        self.forbidden.insert(c);
    }

    pub(crate) fn allow(&mut self, c: Coord) {
        self.forbidden.remove(&c);
    }

    /// Every in-bounds cell this player may still fire at, row-major.
    pub fn legal_targets(&self, board: &Board) -> Vec<Coord> {
        board.cells().filter(|c| !self.forbidden.contains(c)).collect()
    }

    /// Put `ship` on the board at `origin`. The cells must be in bounds, on
    /// water and free of this player's other ships; other players' ships may
    /// share cells.
    pub fn place_ship(
        &mut self,
        board: &Board,
        ship: ShipId,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<(), PlacementError> {
        let len = {
            let s = self.fleet.ship(ship).ok_or(PlacementError::UnknownShip(ship))?;
            if s.is_placed() {
                return Err(PlacementError::AlreadyPlaced);
            }
            s.len()
        };
        let cells = self.check_layout(board, origin, orientation, len)?;
        for (slot, c) in cells.into_iter().enumerate() {
            self.placements.insert(
                c,
                Placement {
                    ship,
                    slot,
                    orientation,
                },
            );
        }
        if let Some(s) = self.fleet.ship_mut(ship) {
            s.set_placed(true);
        }
        Ok(())
    }

    fn check_layout(
        &self,
        board: &Board,
        origin: Coord,
        orientation: Orientation,
        len: usize,
    ) -> Result<Vec<Coord>, PlacementError> {
        let cells = board
            .layout(origin, orientation, len)
            .ok_or(PlacementError::OutOfBounds)?;
        board.can_place(&cells)?;
        if cells.iter().any(|c| self.placements.contains_key(c)) {
            return Err(PlacementError::Overlaps);
        }
        Ok(cells)
    }

    /// Find a random legal origin and orientation for `ship`.
    pub fn random_placement(
        &self,
        rng: &mut SmallRng,
        board: &Board,
        ship: ShipId,
    ) -> Result<(Coord, Orientation), PlacementError> {
        let len = self
            .fleet
            .ship(ship)
            .ok_or(PlacementError::UnknownShip(ship))?
            .len();
        if len == 0 || board.rows() == 0 || board.cols() == 0 {
            return Err(PlacementError::UnableToPlaceShip {
                ship,
                attempts: 0,
            });
        }
        let mut attempts = 0;
        while attempts < MAX_PLACEMENT_ATTEMPTS {
            attempts += 1;
            let orient = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let origin = Coord::new(
                rng.random_range(0..board.rows()),
                rng.random_range(0..board.cols()),
            );
            if self.check_layout(board, origin, orient, len).is_ok() {
                return Ok((origin, orient));
            }
        }
        Err(PlacementError::UnableToPlaceShip { ship, attempts })
    }

    /// Randomly place every ship not yet on the board.
    pub fn auto_place(&mut self, rng: &mut SmallRng, board: &Board) -> Result<(), PlacementError> {
        let unplaced: Vec<ShipId> = self
            .fleet
            .ships()
            .iter()
            .filter(|s| !s.is_placed())
            .map(|s| s.id())
            .collect();
        for id in unplaced {
            let (origin, orient) = self.random_placement(rng, board, id)?;
            self.place_ship(board, id, origin, orient)?;
        }
        Ok(())
    }

    /// Take `ship` off the board again.
    pub(crate) fn unplace(&mut self, ship: ShipId) {
        self.placements.retain(|_, p| p.ship != ship);
        if let Some(s) = self.fleet.ship_mut(ship) {
            s.set_placed(false);
        }
    }

    /// Move the placement cells of `ship` to `receiver` (capture).
    pub(crate) fn hand_over_cells(&mut self, ship: ShipId, receiver: &mut Player) -> Vec<Coord> {
        let cells = self.cells_of(ship);
        for c in &cells {
            if let Some(p) = self.placements.remove(c) {
                receiver.placements.insert(*c, p);
            }
        }
        cells
    }

    /// Clear per-game state: placements, forbidden cells, statistics and
    /// controller memory. Ships are repaired and taken off the board.
    pub(crate) fn reset_for_rematch(&mut self) {
        self.placements.clear();
        self.forbidden.clear();
        self.stats = PlayerStats::default();
        self.fleet.reset();
        self.controller.reset();
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("fleet", &self.fleet)
            .field("placements", &self.placements.len())
            .field("forbidden", &self.forbidden.len())
            .field("stats", &self.stats)
            .finish()
    }
}
