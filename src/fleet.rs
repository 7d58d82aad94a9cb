//! A player's collection of ships and aggregate defeat queries.

use alloc::vec::Vec;

use crate::player::PlayerId;
use crate::ship::{Ship, ShipId, ShipSpec};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Fleet {
    owner: PlayerId,
    ships: Vec<Ship>,
}

impl Fleet {
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            ships: Vec::new(),
        }
    }

    /// Build a fleet from a composition, assigning ids from `next_id` upward.
    /// `next_id` is left pointing past the last id used.
    pub fn from_specs(owner: PlayerId, specs: &[ShipSpec], next_id: &mut u32) -> Self {
        let ships = specs
            .iter()
            .map(|spec| {
                let id = ShipId(*next_id);
                *next_id += 1;
                Ship::from_spec(id, spec)
            })
            .collect();
        Self { owner, ships }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id() == id)
    }

    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.id() == id)
    }

    /// A fleet with no ships, or only sunk ships, is defeated.
    pub fn is_defeated(&self) -> bool {
        self.ships.iter().all(Ship::is_sunk)
    }

    /// Add a ship. A defeated fleet refuses and hands the ship back, so a
    /// capture can never revive it.
    pub fn add_ship(&mut self, ship: Ship) -> Result<(), Ship> {
        if self.is_defeated() {
            return Err(ship);
        }
        self.ships.push(ship);
        Ok(())
    }

    /// Remove a ship, e.g. when it changes hands.
    pub fn take_ship(&mut self, id: ShipId) -> Option<Ship> {
        let idx = self.ships.iter().position(|s| s.id() == id)?;
        Some(self.ships.remove(idx))
    }

    /// Put back a ship removed by [`Fleet::take_ship`], bypassing the
    /// defeat check.
    pub(crate) fn restore(&mut self, ship: Ship) {
        self.ships.push(ship);
    }

    pub fn afloat(&self) -> impl Iterator<Item = &Ship> {
        self.ships.iter().filter(|s| !s.is_sunk())
    }

    /// Lengths of ships still afloat.
    pub fn lengths_afloat(&self) -> Vec<usize> {
        self.afloat().map(Ship::len).collect()
    }

    /// Sum of segment health over the whole fleet.
    pub fn remaining_health(&self) -> f64 {
        self.ships.iter().map(|s| s.health().iter().sum::<f64>()).sum()
    }

    pub fn all_placed(&self) -> bool {
        self.ships.iter().all(Ship::is_placed)
    }

    pub(crate) fn reset(&mut self) {
        for ship in self.ships.iter_mut() {
            ship.repair();
            ship.set_placed(false);
        }
    }
}
