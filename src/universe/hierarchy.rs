//! Hierarchy operations for player leader/subordinate relationships
//!
//! Provides queries for traversing the player hierarchy tree.
//! All players form a forest (collection of trees) where each tree
//! is rooted at a top leader.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::types::PlayerId;
use crate::universe::player::PlayerData;

/// Leaders of `id`, direct leader first, top leader last
///
/// Stops at a missing record or a cycle.
pub fn leader_chain(id: PlayerId, players: &BTreeMap<PlayerId, PlayerData>) -> Vec<PlayerId> {
    let mut chain = Vec::new();
    let mut current = players.get(&id).and_then(|p| p.direct_leader_id);

    while let Some(leader) = current {
        if leader == id || chain.contains(&leader) {
            break;
        }
        chain.push(leader);
        current = players.get(&leader).and_then(|p| p.direct_leader_id);
    }

    chain
}

/// Top of the tree `id` belongs to (itself if it has no leader)
pub fn top_leader(id: PlayerId, players: &BTreeMap<PlayerId, PlayerData>) -> PlayerId {
    leader_chain(id, players).last().copied().unwrap_or(id)
}

/// Is `leader` anywhere above `subordinate`?
pub fn is_leader_of(
    leader: PlayerId,
    subordinate: PlayerId,
    players: &BTreeMap<PlayerId, PlayerData>,
) -> bool {
    leader_chain(subordinate, players).contains(&leader)
}

/// Standing to command `target`: being it, or leading it
pub fn is_self_or_leader(
    issuer: PlayerId,
    target: PlayerId,
    players: &BTreeMap<PlayerId, PlayerData>,
) -> bool {
    issuer == target || is_leader_of(issuer, target, players)
}

/// Every player below `id`, direct or indirect
pub fn all_subordinates(
    id: PlayerId,
    players: &BTreeMap<PlayerId, PlayerData>,
) -> BTreeSet<PlayerId> {
    let mut result = BTreeSet::new();
    let mut stack: Vec<PlayerId> = players
        .get(&id)
        .map(|p| p.direct_subordinate_ids.iter().copied().collect())
        .unwrap_or_default();

    while let Some(sub) = stack.pop() {
        if sub == id || !result.insert(sub) {
            continue;
        }
        if let Some(p) = players.get(&sub) {
            stack.extend(p.direct_subordinate_ids.iter().copied());
        }
    }

    result
}

/// Remove dead players and reattach their subordinates
///
/// A survivor whose leader died is attached to the nearest living
/// ancestor. Subordinate sets are rebuilt from leader links afterwards.
/// Returns the removed ids in ascending order.
pub fn remove_dead(players: &mut BTreeMap<PlayerId, PlayerData>) -> Vec<PlayerId> {
    let dead: Vec<PlayerId> = players
        .values()
        .filter(|p| !p.alive)
        .map(|p| p.id)
        .collect();

    if dead.is_empty() {
        return dead;
    }

    let new_leaders: BTreeMap<PlayerId, Option<PlayerId>> = players
        .values()
        .filter(|p| p.alive)
        .map(|p| {
            let living = leader_chain(p.id, players)
                .into_iter()
                .find(|l| players.get(l).is_some_and(|lp| lp.alive));
            (p.id, living)
        })
        .collect();

    for id in &dead {
        players.remove(id);
    }

    for (id, leader) in &new_leaders {
        if let Some(p) = players.get_mut(id) {
            p.direct_leader_id = *leader;
            p.direct_subordinate_ids.clear();
        }
    }

    for (id, leader) in new_leaders {
        if let Some(p) = leader.and_then(|l| players.get_mut(&l)) {
            p.direct_subordinate_ids.insert(id);
        }
    }

    dead
}
