//! Append-only universe history
//!
//! One slice per completed tick, contiguous in time. Slices are never
//! touched after they are appended.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, Tick};
use crate::universe::global::GlobalData;
use crate::universe::player::PlayerData;

/// The whole universe at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSlice {
    pub time: Tick,
    pub players: BTreeMap<PlayerId, PlayerData>,
    pub global: GlobalData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseHistory {
    slices: Vec<UniverseSlice>,
}

impl UniverseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next slice
    ///
    /// Returns the slice back if its time does not directly follow the
    /// latest slice.
    pub fn append(&mut self, slice: UniverseSlice) -> Result<(), UniverseSlice> {
        if let Some(latest) = self.latest_time() {
            if slice.time != latest + 1 {
                return Err(slice);
            }
        }
        self.slices.push(slice);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn earliest_time(&self) -> Option<Tick> {
        self.slices.first().map(|s| s.time)
    }

    pub fn latest_time(&self) -> Option<Tick> {
        self.slices.last().map(|s| s.time)
    }

    pub fn latest(&self) -> Option<&UniverseSlice> {
        self.slices.last()
    }

    pub fn slice_at(&self, time: Tick) -> Option<&UniverseSlice> {
        let first = self.earliest_time()?;
        if time < first {
            return None;
        }
        self.slices.get((time - first) as usize)
    }

    /// Recorded state of `id` at `time`, if it existed then
    pub fn record_of(&self, id: PlayerId, time: Tick) -> Option<&PlayerData> {
        self.slice_at(time)?.players.get(&id)
    }

    /// Slices from `from` to `to` inclusive, newest first
    pub fn newest_first(&self, from: Tick, to: Tick) -> impl Iterator<Item = &UniverseSlice> {
        self.slices
            .iter()
            .rev()
            .skip_while(move |s| s.time > to)
            .take_while(move |s| s.time >= from)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UniverseSlice> {
        self.slices.iter()
    }
}
