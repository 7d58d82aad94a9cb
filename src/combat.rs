//! Combat resolution: one shot, one coordinate, every hostile fleet at once.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{info, warn};
use rand::rngs::SmallRng;
use rand::Rng;

use crate::alliance::Alliances;
use crate::board::Board;
use crate::common::Outcome;
use crate::config::EraRules;
use crate::coord::Coord;
use crate::player::{Difficulty, Player, PlayerId, Role};
use crate::reveal::{hit_message, RevealLevel};
use crate::ship::ShipId;

/// Damage done to one ship by a shot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "camelCase"))]
pub struct ShipImpact {
    pub ship_id: ShipId,
    pub owner_id: PlayerId,
    pub damage: f64,
    pub ship_sunk: bool,
    pub reveal_level: RevealLevel,
}

/// A ship that went down on this shot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "camelCase"))]
pub struct ShipSunk {
    pub ship_id: ShipId,
    pub class: String,
    pub length: usize,
    pub owner_id: PlayerId,
    pub firer_id: PlayerId,
    /// The ship changed hands and was repaired instead of staying sunk.
    pub captured: bool,
}

/// Structured result of one resolved shot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "camelCase"))]
pub struct ShotResult {
    pub outcome: Outcome,
    pub ships: Vec<ShipImpact>,
    pub cell_fully_destroyed: bool,
    pub messages: Vec<String>,
    pub sunk: Vec<ShipSunk>,
}

impl ShotResult {
    pub(crate) fn empty(outcome: Outcome) -> Self {
        ShotResult {
            outcome,
            ships: Vec::new(),
            cell_fully_destroyed: false,
            messages: Vec::new(),
            sunk: Vec::new(),
        }
    }
}

/// Everything a shot is resolved against.
pub struct Battlefield<'a> {
    pub board: &'a Board,
    pub players: &'a mut [Player],
    pub alliances: &'a Alliances,
    pub rules: &'a EraRules,
}

struct Occupant {
    player: usize,
    ship: ShipId,
    slot: usize,
    live: bool,
}

/// Resolve a shot by `players[firer]` at `at`.
///
/// Allied fleets are ignored. Occupants whose segment at `at` is already at
/// zero health are never damaged again; if nothing live remains there the
/// shot is classified `AllDestroyed` and only the firer's forbidden set
/// changes.
pub fn resolve_shot(field: &mut Battlefield<'_>, firer: usize, at: Coord, rng: &mut SmallRng) -> ShotResult {
    let Some(firer_id) = field.players.get(firer).map(Player::id) else {
        warn!("shot by unknown player index {}", firer);
        return ShotResult::empty(Outcome::Invalid);
    };
    if !field.board.in_bounds(at) {
        warn!("player {} fired out of bounds at ({}, {})", firer_id.0, at.row, at.col);
        return ShotResult::empty(Outcome::Invalid);
    }

    let occupants = scan_occupants(field, firer, firer_id, at);

    if occupants.is_empty() {
        let shooter = &mut field.players[firer];
        shooter.stats.shots += 1;
        shooter.stats.misses += 1;
        shooter.forbid(at);
        info!("{} fires at {}: miss", shooter.name(), at);
        let mut result = ShotResult::empty(Outcome::Miss);
        result.messages.push(format!("{} missed at {}", shooter.name(), at));
        return result;
    }

    if occupants.iter().all(|o| !o.live) {
        let shooter = &mut field.players[firer];
        shooter.stats.shots += 1;
        shooter.forbid(at);
        warn!(
            "{} fired at {} where every occupant is already destroyed",
            shooter.name(),
            at
        );
        let mut result = ShotResult::empty(Outcome::AllDestroyed);
        result.cell_fully_destroyed = true;
        return result;
    }

    let attack_boost = field.players[firer].attack_boost();
    let firer_human = field.players[firer].is_human();
    let base = field.rules.base_damage;

    let mut result = ShotResult::empty(Outcome::Hit);
    let mut total_damage = 0.0;
    let mut sinks: Vec<(usize, bool)> = Vec::new();

    for occ in occupants.iter().filter(|o| o.live) {
        let victim = &mut field.players[occ.player];
        let owner_id = victim.id();
        let owner_name = String::from(victim.name());
        let weak_victim = victim.role() == Role::Ai(Difficulty::Easy);
        let defense_boost = victim.defense_boost();
        let Some(ship) = victim.fleet.ship_mut(occ.ship) else {
            continue;
        };

        let damage = base * (1.0 + attack_boost) * (1.0 - defense_boost) * ship.defense();
        let report = ship.apply_damage(occ.slot, damage.max(0.0));
        let reveal = ship.reveal_level(&field.rules.reveal);
        total_damage += report.dealt;
        result.messages.push(hit_message(reveal, ship, &owner_name));
        result.ships.push(ShipImpact {
            ship_id: ship.id(),
            owner_id,
            damage: report.dealt,
            ship_sunk: ship.is_sunk(),
            reveal_level: reveal,
        });
        if report.newly_sunk {
            info!("{}'s {} sunk at {}", owner_name, ship.class(), at);
            result.sunk.push(ShipSunk {
                ship_id: ship.id(),
                class: String::from(ship.class()),
                length: ship.len(),
                owner_id,
                firer_id,
                captured: false,
            });
            sinks.push((occ.player, weak_victim));
        }
    }

    let players = &*field.players;
    let every_ship_sunk = occupants.iter().all(|o| {
        players[o.player]
            .fleet()
            .ship(o.ship)
            .map(|s| s.is_sunk())
            .unwrap_or(true)
    });
    result.cell_fully_destroyed = occupants.iter().all(|o| {
        players[o.player]
            .fleet()
            .ship(o.ship)
            .and_then(|s| s.cell_health(o.slot))
            .map(|h| h <= 0.0)
            .unwrap_or(true)
    });
    result.outcome = if every_ship_sunk {
        Outcome::Destroyed
    } else {
        Outcome::Hit
    };

    let scoring = field.rules.scoring;
    let shooter = &mut field.players[firer];
    shooter.stats.shots += 1;
    shooter.stats.hits += 1;
    shooter.stats.damage_dealt += total_damage;
    for _ in &result.ships {
        shooter.stats.award(scoring.hit, 1.0);
    }
    for &(_, weak_victim) in &sinks {
        shooter.stats.ships_sunk += 1;
        let multiplier = if firer_human && weak_victim {
            scoring.weak_opponent_multiplier
        } else {
            1.0
        };
        shooter.stats.award(scoring.sink, multiplier);
    }
    if result.cell_fully_destroyed {
        shooter.forbid(at);
    }
    info!("{} fires at {}: {}", shooter.name(), at, result.outcome);

    if field.rules.capture_chance > 0.0 {
        for (entry, &(victim, _)) in result.sunk.iter_mut().zip(sinks.iter()) {
            if rng.random_bool(field.rules.capture_chance.min(1.0))
                && try_capture(field.players, victim, firer, entry.ship_id)
            {
                entry.captured = true;
                let firer_name = field.players[firer].name();
                info!("{} captured the {}", firer_name, entry.class);
                result
                    .messages
                    .push(format!("{} captured the {}", firer_name, entry.class));
            }
        }
    }

    result
}

fn scan_occupants(field: &Battlefield<'_>, firer: usize, firer_id: PlayerId, at: Coord) -> Vec<Occupant> {
    field
        .players
        .iter()
        .enumerate()
        .filter(|(i, p)| *i != firer && !field.alliances.are_allied(firer_id, p.id()))
        .filter_map(|(i, p)| {
            let placement = p.occupant(at)?;
            let health = p.fleet().ship(placement.ship)?.cell_health(placement.slot)?;
            Some(Occupant {
                player: i,
                ship: placement.ship,
                slot: placement.slot,
                live: health > 0.0,
            })
        })
        .collect()
}

/// Move a freshly sunk ship from `victim` to `captor`, fully repaired.
/// Refused when either fleet is defeated or the captor already has a ship
/// on one of the wreck's cells.
fn try_capture(players: &mut [Player], victim: usize, captor: usize, ship: ShipId) -> bool {
    if victim == captor || players[victim].is_defeated() || players[captor].is_defeated() {
        return false;
    }
    let cells = players[victim].cells_of(ship);
    if cells.iter().any(|c| players[captor].occupant(*c).is_some()) {
        return false;
    }

    let (donor, receiver) = pair_mut(players, victim, captor);
    let Some(mut prize) = donor.fleet.take_ship(ship) else {
        return false;
    };
    prize.repair();
    if let Err(prize) = receiver.fleet.add_ship(prize) {
        donor.fleet.restore(prize);
        return false;
    }
    donor.hand_over_cells(ship, receiver);

    for p in players.iter_mut() {
        for c in &cells {
            p.allow(*c);
        }
    }
    true
}

fn pair_mut(players: &mut [Player], a: usize, b: usize) -> (&mut Player, &mut Player) {
    if a < b {
        let (lo, hi) = players.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = players.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}
