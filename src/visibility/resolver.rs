//! Light-delayed view resolution
//!
//! For an observer at universe time `now`, a target's image from slice
//! `s` is visible when `s <= now - int_delay(observer, target at s)` and
//! `s` lies inside the look-back window of `t_dim` slices. The newest
//! such image wins. Images are remembered per (observer, target) pair
//! and never replaced by an older one, so a target that leaves range
//! stays frozen on the last image received. A target coming back into
//! range is tracked again as soon as a newer image qualifies.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::UniverseSettings;
use crate::core::types::{PlayerId, Tick};
use crate::universe::history::UniverseHistory;
use crate::universe::view::AgentView;
use crate::visibility::light::int_delay;

/// Time of the newest image one observer holds of each target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSeen {
    entries: BTreeMap<PlayerId, Tick>,
}

impl LastSeen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: PlayerId) -> Option<Tick> {
        self.entries.get(&target).copied()
    }

    /// Record an image time; older times never replace newer ones
    pub fn observe(&mut self, target: PlayerId, time: Tick) {
        let entry = self.entries.entry(target).or_insert(time);
        if time > *entry {
            *entry = time;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, Tick)> + '_ {
        self.entries.iter().map(|(id, t)| (*id, *t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The image times a resolved view holds
    pub fn from_view(view: &AgentView) -> Self {
        Self {
            entries: view.others.iter().map(|(id, p)| (*id, p.int4d.t)).collect(),
        }
    }
}

/// Compute one observer's view at the latest history slice
///
/// Pure: identical inputs give an identical view. Returns `None` when the
/// observer is not present in the latest slice.
pub fn resolve_view(
    observer_id: PlayerId,
    history: &UniverseHistory,
    last_seen: &LastSeen,
    settings: &UniverseSettings,
) -> Option<AgentView> {
    let latest = history.latest()?;
    let now = latest.time;
    let own = latest.players.get(&observer_id)?;
    let origin = own.int4d.to_int3d();
    let window_start = now - settings.t_dim + 1;

    let mut newest: BTreeMap<PlayerId, Tick> = BTreeMap::new();

    for slice in history.newest_first(window_start, now) {
        for (id, record) in &slice.players {
            if *id == observer_id || newest.contains_key(id) {
                continue;
            }
            if last_seen.get(*id).is_some_and(|seen| seen >= slice.time) {
                continue;
            }
            let delay = int_delay(origin, record.int4d.to_int3d(), settings.speed_of_light);
            if slice.time <= now - delay {
                newest.insert(*id, slice.time);
            }
        }
    }

    // Frozen images: known targets with no newer light this tick
    for (id, seen) in last_seen.iter() {
        if id != observer_id {
            newest.entry(id).or_insert(seen);
        }
    }

    let others = newest
        .into_iter()
        .filter_map(|(id, time)| history.record_of(id, time).map(|p| (id, p.clone())))
        .collect();

    Some(AgentView {
        observer_id,
        time: now,
        own: own.clone(),
        others,
    })
}

/// Keeps per-observer memory between ticks and resolves every view
#[derive(Debug, Clone, Default)]
pub struct VisibilityResolver {
    memory: AHashMap<PlayerId, LastSeen>,
}

impl VisibilityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume with memory taken from [`snapshot`](Self::snapshot)
    pub fn from_snapshot(snapshot: BTreeMap<PlayerId, LastSeen>) -> Self {
        Self {
            memory: snapshot.into_iter().collect(),
        }
    }

    /// Memory in id order, suitable for checkpoints
    pub fn snapshot(&self) -> BTreeMap<PlayerId, LastSeen> {
        self.memory
            .iter()
            .map(|(id, seen)| (*id, seen.clone()))
            .collect()
    }

    pub fn last_seen(&self, observer: PlayerId) -> Option<&LastSeen> {
        self.memory.get(&observer)
    }

    /// Resolve a view for every player in the latest slice
    ///
    /// Memory of observers no longer present is dropped.
    pub fn resolve_all(
        &mut self,
        history: &UniverseHistory,
        settings: &UniverseSettings,
    ) -> BTreeMap<PlayerId, AgentView> {
        let Some(latest) = history.latest() else {
            self.memory.clear();
            return BTreeMap::new();
        };

        let empty = LastSeen::new();
        let mut views = BTreeMap::new();

        for &observer in latest.players.keys() {
            let previous = self.memory.get(&observer).unwrap_or(&empty);
            if let Some(view) = resolve_view(observer, history, previous, settings) {
                views.insert(observer, view);
            }
        }

        self.memory = views
            .iter()
            .map(|(id, view)| (*id, LastSeen::from_view(view)))
            .collect();

        views
    }
}
