//! Named groups of players that cannot fire on each other.

use alloc::string::String;
use alloc::vec::Vec;

use crate::common::GameError;
use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Alliance {
    pub name: String,
    pub members: Vec<PlayerId>,
}

/// Alliances of a match, in creation order.
#[derive(Debug, Clone, Default)]
pub struct Alliances {
    list: Vec<Alliance>,
}

impl Alliances {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn create(&mut self, name: &str) -> Result<(), GameError> {
        if self.get(name).is_some() {
            return Err(GameError::DuplicateAlliance(String::from(name)));
        }
        self.list.push(Alliance {
            name: String::from(name),
            members: Vec::new(),
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Alliance> {
        self.list.iter().find(|a| a.name == name)
    }

    pub fn join(&mut self, name: &str, player: PlayerId) -> Result<(), GameError> {
        let alliance = self
            .list
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| GameError::UnknownAlliance(String::from(name)))?;
        if !alliance.members.contains(&player) {
            alliance.members.push(player);
        }
        Ok(())
    }

    pub fn alliance_of(&self, player: PlayerId) -> Option<&Alliance> {
        self.list.iter().find(|a| a.members.contains(&player))
    }

    /// Two distinct players sharing an alliance are immune to each other.
    pub fn are_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        a != b
            && self
                .alliance_of(a)
                .map(|al| al.members.contains(&b))
                .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alliance> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Drop alliances with no member in `owned`; returns how many went away.
    pub fn remove_ownerless(&mut self, owned: &[PlayerId]) -> usize {
        let before = self.list.len();
        self.list
            .retain(|a| a.members.iter().any(|m| owned.contains(m)));
        before - self.list.len()
    }
}
