//! Match lifecycle and turn order.
//!
//! `Game` owns the board, the players and their alliances. Every shot goes
//! through [`Game::process_player_action`] (host-submitted) or
//! [`Game::play_ai_turn`] (controller-selected); both end in the same
//! resolve / observe / end-check / advance sequence.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::alliance::Alliances;
use crate::board::{Board, Marking};
use crate::combat::{resolve_shot, Battlefield, ShotResult};
use crate::common::{GameError, Outcome};
use crate::config::{default_fleet, EraRules, EraRulesConfig, GameMode};
use crate::coord::Coord;
use crate::events::{Diagnostic, GameObserver, GameOver};
use crate::fleet::Fleet;
use crate::player::{Player, PlayerId};
use crate::ship::{Orientation, ShipId, ShipSpec};
use crate::stats::PlayerSummary;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "lowercase"))]
pub enum GamePhase {
    Setup,
    Placement,
    Playing,
    Finished,
}

/// Moves a host may submit for the current player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(tag = "action", rename_all = "lowercase"))]
pub enum PlayerAction {
    Attack { row: usize, col: usize },
}

/// One resolved shot together with who fired it and where.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Shot {
    pub player: PlayerId,
    pub coord: Coord,
    pub result: ShotResult,
}

/// Result of checking whether a match is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCheck {
    Continue,
    /// At most one side has ships afloat. `winner` is `None` when nobody does.
    Over { winner: Option<PlayerId> },
}

/// Decide whether the match is over.
///
/// A side is an alliance, or a lone player outside every alliance. The match
/// ends once at most one side still has a member afloat; the winner is that
/// side's first member still afloat, in join order.
pub fn evaluate_end(players: &[Player], alliances: &Alliances) -> EndCheck {
    let afloat = |id: &PlayerId| {
        players
            .iter()
            .any(|p| p.id() == *id && !p.is_defeated())
    };

    let mut sides: Vec<PlayerId> = alliances
        .iter()
        .filter_map(|a| a.members.iter().copied().find(|m| afloat(m)))
        .collect();
    sides.extend(
        players
            .iter()
            .filter(|p| alliances.alliance_of(p.id()).is_none() && !p.is_defeated())
            .map(Player::id),
    );

    match sides.len() {
        0 => EndCheck::Over { winner: None },
        1 => EndCheck::Over {
            winner: sides.first().copied(),
        },
        _ => EndCheck::Continue,
    }
}

pub struct Game {
    rules: EraRules,
    mode: GameMode,
    phase: GamePhase,
    board: Option<Board>,
    players: Vec<Player>,
    compositions: Vec<Vec<ShipSpec>>,
    alliances: Alliances,
    current: usize,
    turn: u32,
    winner: Option<PlayerId>,
    rng: SmallRng,
    next_ship_id: u32,
    observers: Vec<Box<dyn GameObserver + Send>>,
    diagnostics: Vec<Diagnostic>,
}

impl Game {
    /// Create a game from host-supplied era rules. Fails when a required
    /// rule is absent.
    pub fn new(rules: EraRulesConfig, mode: GameMode) -> Result<Self, GameError> {
        Ok(Self::with_rules(EraRules::from_config(rules)?, mode))
    }

    pub fn with_rules(rules: EraRules, mode: GameMode) -> Self {
        Game {
            rules,
            mode,
            phase: GamePhase::Setup,
            board: None,
            players: Vec::new(),
            compositions: Vec::new(),
            alliances: Alliances::new(),
            current: 0,
            turn: 0,
            winner: None,
            rng: default_rng(),
            next_ship_id: 0,
            observers: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Replace the random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn rules(&self) -> &EraRules {
        &self.rules
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn alliances(&self) -> &Alliances {
        &self.alliances
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Player whose turn it is; `None` outside of play.
    pub fn current_player(&self) -> Option<&Player> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        self.players.get(self.current)
    }

    pub fn add_observer(&mut self, observer: Box<dyn GameObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn create_alliance(&mut self, name: &str) -> Result<(), GameError> {
        self.expect_setup()?;
        self.alliances.create(name)
    }

    /// Register `player` in `alliance` with the standard fleet.
    pub fn add_player(&mut self, player: Player, alliance: &str) -> Result<PlayerId, GameError> {
        self.add_player_with_fleet(player, alliance, &default_fleet())
    }

    pub fn add_player_with_fleet(
        &mut self,
        mut player: Player,
        alliance: &str,
        ships: &[ShipSpec],
    ) -> Result<PlayerId, GameError> {
        self.expect_setup()?;
        let cap = self.mode.player_cap();
        if self.players.len() >= cap {
            return Err(GameError::PlayerCapExceeded { cap });
        }
        if self.alliances.get(alliance).is_none() {
            return Err(GameError::UnknownAlliance(String::from(alliance)));
        }
        let id = PlayerId(self.players.len() as u32 + 1);
        if ships.is_empty() {
            return Err(GameError::EmptyFleet(id));
        }

        let fleet = Fleet::from_specs(id, ships, &mut self.next_ship_id);
        player.assign(id, fleet);
        self.alliances.join(alliance, id)?;
        info!("{} joined alliance {} as player {}", player.name(), alliance, id.0);
        self.players.push(player);
        self.compositions.push(ships.to_vec());
        Ok(id)
    }

    /// Attach the shared board. Ships already placed on a previous board are
    /// taken off again.
    pub fn set_board(&mut self, board: Board) -> Result<(), GameError> {
        self.expect_setup()?;
        for p in self.players.iter_mut() {
            let placed: Vec<ShipId> = p
                .fleet()
                .ships()
                .iter()
                .filter(|s| s.is_placed())
                .map(|s| s.id())
                .collect();
            for ship in placed {
                p.unplace(ship);
            }
        }
        debug!("board set: {}x{}", board.rows(), board.cols());
        self.board = Some(board);
        self.phase = GamePhase::Placement;
        Ok(())
    }

    /// Manually place one of `player`'s ships.
    pub fn place_ship(
        &mut self,
        player: PlayerId,
        ship: ShipId,
        origin: Coord,
        orientation: Orientation,
    ) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Placement)?;
        let board = self.board.as_ref().ok_or(GameError::NoBoard)?;
        let idx = self.index_of(player)?;
        self.players[idx].place_ship(board, ship, origin, orientation)?;
        Ok(())
    }

    /// Validate the roster, auto-place automated fleets and begin play.
    ///
    /// On any error the game stays in `Placement` and automated fleets are
    /// left exactly as they were.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.phase == GamePhase::Setup || self.board.is_none() {
            return Err(GameError::NoBoard);
        }
        self.expect_phase(GamePhase::Placement)?;
        if self.players.len() < 2 {
            return Err(GameError::NotEnoughPlayers {
                have: self.players.len(),
            });
        }
        for p in &self.players {
            if p.fleet().is_empty() {
                return Err(GameError::EmptyFleet(p.id()));
            }
            if !p.is_automated() && !p.fleet().all_placed() {
                return Err(GameError::UnplacedFleet(p.id()));
            }
        }

        let board = self.board.as_ref().ok_or(GameError::NoBoard)?;
        let mut placed: Vec<(usize, ShipId)> = Vec::new();
        let mut failure = None;
        'players: for (idx, p) in self.players.iter_mut().enumerate() {
            if !p.is_automated() {
                continue;
            }
            let pending: Vec<ShipId> = p
                .fleet()
                .ships()
                .iter()
                .filter(|s| !s.is_placed())
                .map(|s| s.id())
                .collect();
            for ship in pending {
                let attempt = p
                    .random_placement(&mut self.rng, board, ship)
                    .and_then(|(origin, orient)| p.place_ship(board, ship, origin, orient));
                match attempt {
                    Ok(()) => placed.push((idx, ship)),
                    Err(e) => {
                        warn!("could not place ships for {}: {}", p.name(), e);
                        failure = Some(e);
                        break 'players;
                    }
                }
            }
        }
        if let Some(err) = failure {
            for (idx, ship) in placed {
                self.players[idx].unplace(ship);
            }
            return Err(err.into());
        }

        for idx in 0..self.players.len() {
            let lengths = self.enemy_lengths(idx);
            self.players[idx].controller.prepare(&lengths);
        }
        self.current = 0;
        self.turn = 1;
        self.winner = None;
        self.phase = GamePhase::Playing;
        info!(
            "game started: {} players, {} alliances, era {}",
            self.players.len(),
            self.alliances.len(),
            self.rules.name
        );
        Ok(())
    }

    /// Resolve a host-submitted move for the current player.
    pub fn process_player_action(&mut self, action: PlayerAction) -> Result<ShotResult, GameError> {
        self.expect_phase(GamePhase::Playing)?;
        let PlayerAction::Attack { row, col } = action;
        let at = Coord::new(row, col);
        let board = self.board.as_ref().ok_or(GameError::NoBoard)?;
        if !board.in_bounds(at) {
            return Err(GameError::OutOfBounds(at));
        }
        Ok(self.fire(self.current, at))
    }

    /// Let the current player's controller pick and fire a shot.
    ///
    /// Returns `Ok(None)` when the controller waits for host input or has no
    /// legal target left. A proposal outside the legal targets is recorded as
    /// a diagnostic and replaced by a random legal target.
    pub fn play_ai_turn(&mut self) -> Result<Option<Shot>, GameError> {
        self.expect_phase(GamePhase::Playing)?;
        let board = self.board.as_ref().ok_or(GameError::NoBoard)?;
        let idx = self.current;
        let player = &mut self.players[idx];
        if !player.is_automated() {
            return Ok(None);
        }
        let legal = player.legal_targets(board);
        let (rows, cols) = (board.rows(), board.cols());
        let Some(mut at) = player
            .controller
            .select_target(&mut self.rng, &legal, rows, cols)
        else {
            debug!("{} has no target to fire at", player.name());
            return Ok(None);
        };
        let id = player.id();

        if !legal.contains(&at) {
            self.record_diagnostic(Diagnostic {
                player: id,
                coord: at,
                outcome: Outcome::Invalid,
                reason: format!("controller proposed {}, which is not a legal target", at),
            });
            let Some(&fallback) = legal.choose(&mut self.rng) else {
                return Ok(None);
            };
            at = fallback;
        }
        let result = self.fire(idx, at);
        Ok(Some(Shot {
            player: id,
            coord: at,
            result,
        }))
    }

    /// Per-player statistics, computed now.
    pub fn summary(&self) -> Vec<PlayerSummary> {
        self.players
            .iter()
            .map(|p| {
                let alliance = self.alliances.alliance_of(p.id()).map(|a| a.name.as_str());
                PlayerSummary::new(p.id(), p.name(), alliance, p.is_defeated(), p.stats())
            })
            .collect()
    }

    /// Return to placement with fresh fleets, keeping players, alliances,
    /// the board terrain and observers.
    pub fn reset(&mut self) {
        self.next_ship_id = 0;
        for (p, specs) in self.players.iter_mut().zip(self.compositions.iter()) {
            p.reset_for_rematch();
            let fleet = Fleet::from_specs(p.id(), specs, &mut self.next_ship_id);
            p.assign(p.id(), fleet);
        }
        if let Some(board) = self.board.as_mut() {
            board.clear_markings();
        }
        let registered: Vec<PlayerId> = self.players.iter().map(Player::id).collect();
        self.alliances.remove_ownerless(&registered);
        self.current = 0;
        self.turn = 0;
        self.winner = None;
        self.diagnostics.clear();
        self.phase = if self.board.is_some() {
            GamePhase::Placement
        } else {
            GamePhase::Setup
        };
        info!("game reset");
    }

    fn fire(&mut self, idx: usize, at: Coord) -> ShotResult {
        let result = match self.board.as_ref() {
            Some(board) => {
                let mut field = Battlefield {
                    board,
                    players: &mut self.players,
                    alliances: &self.alliances,
                    rules: &self.rules,
                };
                resolve_shot(&mut field, idx, at, &mut self.rng)
            }
            None => return ShotResult::empty(Outcome::Invalid),
        };
        let shooter = self.players[idx].id();

        if let Err(defect) = self.players[idx].controller.observe_result(at, &result) {
            self.record_diagnostic(Diagnostic {
                player: shooter,
                coord: at,
                outcome: defect.outcome,
                reason: format!("{}", defect),
            });
        }

        if let Some(board) = self.board.as_mut() {
            let marking = match result.outcome {
                Outcome::Miss => Some(Marking::Miss),
                Outcome::Hit | Outcome::Destroyed if !result.cell_fully_destroyed => Some(Marking::Hit),
                Outcome::Hit | Outcome::Destroyed | Outcome::AllDestroyed => Some(Marking::Destroyed),
                Outcome::Invalid => None,
            };
            if let Some(marking) = marking {
                board.mark(at, marking);
            }
        }

        match evaluate_end(&self.players, &self.alliances) {
            EndCheck::Over { winner } => self.finish(winner),
            EndCheck::Continue => {
                for sunk in &result.sunk {
                    for o in self.observers.iter_mut() {
                        o.on_ship_sunk(sunk);
                    }
                }
                let hit = result.outcome.is_hit();
                let miss = result.outcome == Outcome::Miss;
                if !self.rules.turn_continues(hit, miss) {
                    self.advance_turn();
                }
            }
        }
        result
    }

    fn record_diagnostic(&mut self, diagnostic: Diagnostic) {
        warn!("player {}: {}", diagnostic.player.0, diagnostic.reason);
        for o in self.observers.iter_mut() {
            o.on_diagnostic(&diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    fn finish(&mut self, winner: Option<PlayerId>) {
        self.phase = GamePhase::Finished;
        self.winner = winner;
        match winner.and_then(|id| self.player(id)) {
            Some(p) => info!("game over after {} turns: {} wins", self.turn, p.name()),
            None => info!("game over after {} turns: no survivors", self.turn),
        }

        let event = GameOver {
            winner,
            turns: self.turn,
            summary: self.summary(),
        };
        let registered: Vec<PlayerId> = self.players.iter().map(Player::id).collect();
        let dissolved = self.alliances.remove_ownerless(&registered);
        if dissolved > 0 {
            debug!("dissolved {} ownerless alliances", dissolved);
        }
        for o in self.observers.iter_mut() {
            o.on_game_over(&event);
        }
    }

    fn advance_turn(&mut self) {
        let n = self.players.len();
        for step in 1..=n {
            let next = (self.current + step) % n;
            if !self.players[next].is_defeated() {
                self.current = next;
                break;
            }
        }
        self.turn += 1;
        debug!("turn {}: {}", self.turn, self.players[self.current].name());
    }

    /// Hull lengths of every ship `players[idx]` may fire upon.
    fn enemy_lengths(&self, idx: usize) -> Vec<usize> {
        let me = self.players[idx].id();
        self.players
            .iter()
            .filter(|p| p.id() != me && !self.alliances.are_allied(me, p.id()))
            .flat_map(|p| p.fleet().lengths_afloat())
            .collect()
    }

    fn index_of(&self, id: PlayerId) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.id() == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    fn expect_setup(&self) -> Result<(), GameError> {
        match self.phase {
            GamePhase::Setup | GamePhase::Placement => Ok(()),
            actual => Err(GameError::WrongPhase {
                expected: GamePhase::Setup,
                actual,
            }),
        }
    }

    fn expect_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }
}

#[cfg(feature = "std")]
fn default_rng() -> SmallRng {
    let mut seed_rng = rand::rng();
    SmallRng::from_rng(&mut seed_rng)
}

#[cfg(not(feature = "std"))]
fn default_rng() -> SmallRng {
    SmallRng::seed_from_u64(0x5eed)
}
