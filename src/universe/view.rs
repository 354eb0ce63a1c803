//! A single observer's light-delayed view of the universe

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, Tick};
use crate::universe::player::PlayerData;

/// Everything one player can currently see
///
/// `own` is always up to date. Every other entry is the latest image
/// whose light has reached the observer, possibly many ticks stale.
/// Players never seen have no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub observer_id: PlayerId,
    /// Universe time the view was resolved at
    pub time: Tick,
    pub own: PlayerData,
    pub others: BTreeMap<PlayerId, PlayerData>,
}

impl AgentView {
    /// A view holding only the observer itself
    pub fn solitary(own: PlayerData, time: Tick) -> Self {
        Self {
            observer_id: own.id,
            time,
            own,
            others: BTreeMap::new(),
        }
    }

    /// Record of `id` as the observer sees it (its own record for itself)
    pub fn get(&self, id: PlayerId) -> Option<&PlayerData> {
        if id == self.observer_id {
            Some(&self.own)
        } else {
            self.others.get(&id)
        }
    }

    pub fn is_visible(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn visible_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.others.keys().copied()
    }

    /// Universe time of the image of `id` the observer holds
    pub fn seen_time(&self, id: PlayerId) -> Option<Tick> {
        self.get(id).map(|p| p.int4d.t)
    }

    /// How many ticks old the image of `id` is
    pub fn staleness(&self, id: PlayerId) -> Option<Tick> {
        self.seen_time(id).map(|t| self.time - t)
    }

    /// Precise distance from the observer to the image of `id`
    pub fn distance_to(&self, id: PlayerId) -> Option<f64> {
        let other = self.get(id)?;
        Some((other.double4d.spatial() - self.own.double4d.spatial()).mag())
    }

    /// The observer's direct leader, if visible
    pub fn leader(&self) -> Option<&PlayerData> {
        self.own.direct_leader_id.and_then(|id| self.others.get(&id))
    }

    /// Direct subordinates of the observer that are visible
    pub fn subordinates(&self) -> impl Iterator<Item = &PlayerData> + '_ {
        self.own
            .direct_subordinate_ids
            .iter()
            .filter_map(|id| self.others.get(id))
    }
}
