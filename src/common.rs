//! Common types: shot outcomes and the error enums shared by every module.

use alloc::string::String;
use core::fmt;

use crate::coord::Coord;
use crate::game::GamePhase;
use crate::player::PlayerId;
use crate::ship::ShipId;

/// Classification of a single shot at a single coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "kebab-case"))]
pub enum Outcome {
    /// At least one live occupant was damaged and not every occupant ship sank.
    Hit,
    /// Every ship occupying the coordinate is now sunk.
    Destroyed,
    /// Nothing hostile occupies the coordinate.
    Miss,
    /// Hostile occupants exist but every one was already destroyed there.
    AllDestroyed,
    /// Coordinate is off the board, or was not a legal target for the firer.
    Invalid,
}

impl Outcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Outcome::Hit | Outcome::Destroyed)
    }

    /// Outcomes that only happen when the legal-target filter was bypassed.
    pub fn is_defect(&self) -> bool {
        matches!(self, Outcome::AllDestroyed | Outcome::Invalid)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Hit => "hit",
            Outcome::Destroyed => "destroyed",
            Outcome::Miss => "miss",
            Outcome::AllDestroyed => "all-destroyed",
            Outcome::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

/// Errors raised while laying ships on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Ship would extend past the board edge.
    OutOfBounds,
    /// Ship would cover a land cell.
    Land,
    /// Ship overlaps another ship of the same fleet.
    Overlaps,
    /// Ship already sits on the board.
    AlreadyPlaced,
    /// No ship with that id in the fleet.
    UnknownShip(ShipId),
    /// Random placement gave up after the configured number of attempts.
    UnableToPlaceShip { ship: ShipId, attempts: usize },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::OutOfBounds => write!(f, "Ship placement is out of bounds"),
            PlacementError::Land => write!(f, "Ship placement covers land"),
            PlacementError::Overlaps => write!(f, "Ship placement overlaps with another ship"),
            PlacementError::AlreadyPlaced => write!(f, "Ship is already placed on the board"),
            PlacementError::UnknownShip(id) => write!(f, "Ship {} not found in fleet", id.0),
            PlacementError::UnableToPlaceShip { ship, attempts } => {
                write!(f, "Unable to place ship {} after {} attempts", ship.0, attempts)
            }
        }
    }
}

/// Errors surfaced to the host by game setup and the action entrypoint.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// A required era rule was not supplied.
    MissingRule(&'static str),
    /// Era rules were supplied but could not be parsed or are out of range.
    Config(String),
    UnknownAlliance(String),
    DuplicateAlliance(String),
    PlayerCapExceeded { cap: usize },
    NotEnoughPlayers { have: usize },
    UnknownPlayer(PlayerId),
    /// A player was registered without any ships.
    EmptyFleet(PlayerId),
    /// A human fleet still has ships off the board at game start.
    UnplacedFleet(PlayerId),
    NoBoard,
    WrongPhase { expected: GamePhase, actual: GamePhase },
    OutOfBounds(Coord),
    Placement(PlacementError),
}

impl From<PlacementError> for GameError {
    fn from(err: PlacementError) -> Self {
        GameError::Placement(err)
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::MissingRule(rule) => write!(f, "Era rules are missing required rule '{}'", rule),
            GameError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            GameError::UnknownAlliance(name) => write!(f, "Alliance '{}' does not exist", name),
            GameError::DuplicateAlliance(name) => write!(f, "Alliance '{}' already exists", name),
            GameError::PlayerCapExceeded { cap } => write!(f, "Player cap of {} reached", cap),
            GameError::NotEnoughPlayers { have } => {
                write!(f, "At least 2 players are required, have {}", have)
            }
            GameError::UnknownPlayer(id) => write!(f, "Player {} is not in this game", id.0),
            GameError::EmptyFleet(id) => write!(f, "Player {} has no ships", id.0),
            GameError::UnplacedFleet(id) => write!(f, "Player {} has unplaced ships", id.0),
            GameError::NoBoard => write!(f, "No board has been set"),
            GameError::WrongPhase { expected, actual } => {
                write!(f, "Game is in phase {:?}, expected {:?}", actual, expected)
            }
            GameError::OutOfBounds(c) => write!(f, "Coordinate ({}, {}) is out of range", c.row, c.col),
            GameError::Placement(e) => write!(f, "Placement error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GameError {}

#[cfg(feature = "std")]
impl std::error::Error for PlacementError {}

/// A controller observed an outcome that a correct legal-target filter can
/// never produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetingDefect {
    pub coord: Coord,
    pub outcome: Outcome,
}

impl fmt::Display for TargetingDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "targeting defect: {} at {}", self.outcome, self.coord)
    }
}
