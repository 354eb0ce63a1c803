//! The canonical, mutable universe and its commit step

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, Tick};
use crate::universe::generation::InitialUniverse;
use crate::universe::global::GlobalData;
use crate::universe::hierarchy;
use crate::universe::history::{UniverseHistory, UniverseSlice};
use crate::universe::player::PlayerData;

/// Current players and global data plus every committed slice
///
/// `players` is the working copy the pipeline mutates during a tick;
/// `history` only changes through [`commit`](Self::commit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseState {
    pub time: Tick,
    pub players: BTreeMap<PlayerId, PlayerData>,
    pub global: GlobalData,
    pub history: UniverseHistory,
}

impl UniverseState {
    /// Stamp generated players with the starting time and commit them as
    /// the first slice
    pub fn from_initial(initial: InitialUniverse) -> Self {
        let InitialUniverse {
            mut players,
            global,
            history,
        } = initial;
        let time = history.latest_time().map_or(0, |t| t + 1);
        for player in players.values_mut() {
            player.set_time(time);
        }

        let mut state = Self {
            time,
            players,
            global,
            history,
        };
        state.push_slice();
        state
    }

    /// Remove dead players, advance time and append the new slice
    ///
    /// Returns the ids removed this tick.
    pub fn commit(&mut self) -> Vec<PlayerId> {
        let removed = hierarchy::remove_dead(&mut self.players);
        self.time += 1;
        for player in self.players.values_mut() {
            player.set_time(self.time);
        }
        self.push_slice();
        removed
    }

    fn push_slice(&mut self) {
        let slice = UniverseSlice {
            time: self.time,
            players: self.players.clone(),
            global: self.global.clone(),
        };
        let appended = self.history.append(slice);
        debug_assert!(appended.is_ok(), "slice {} out of order", self.time);
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerData> {
        self.players.get(&id)
    }
}
