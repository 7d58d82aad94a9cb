//! Commonly used types for setting up and running a match.

pub use crate::{
    Board, Coord, Difficulty, EraRules, EraRulesConfig, Game, GameError, GameMode, GameObserver,
    GamePhase, Outcome, Player, PlayerAction, PlayerId, ShipSpec, ShotResult, Strategy,
};

#[cfg(feature = "std")]
pub use crate::orchestrator::{ActionQueue, HeadlessPacer, Pacer, QueuedAction, TokioPacer};
