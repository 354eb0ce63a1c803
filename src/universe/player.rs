//! Player records and their payload components

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{Double4D, Int4D, PlayerId, Tick, Velocity};

/// Who issues commands for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerType {
    /// Planned by the decision engine every tick
    Ai,
    /// Commands arrive from the host (REPL, network, test)
    Human,
}

/// Fuel rest mass split over four pools
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FuelRestMassData {
    pub storage: f64,
    pub movement: f64,
    pub production: f64,
    pub trade: f64,
}

impl FuelRestMassData {
    pub fn total(&self) -> f64 {
        self.storage + self.movement + self.production + self.trade
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsData {
    pub rest_mass: f64,
    pub fuel: FuelRestMassData,
}

impl Default for PhysicsData {
    fn default() -> Self {
        Self {
            rest_mass: 1.0,
            fuel: FuelRestMassData::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScienceData {
    pub knowledge: f64,
}

/// Memory the decision engine keeps between episodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AiData {
    /// Target id -> universe time a command was last sent to it
    pub recent_contacts: BTreeMap<PlayerId, Tick>,
}

impl AiData {
    /// Was `target` contacted within `window` ticks before `now`?
    pub fn contacted_within(&self, target: PlayerId, now: Tick, window: Tick) -> bool {
        self.recent_contacts
            .get(&target)
            .is_some_and(|&sent| now - sent < window)
    }
}

/// A player: coordinate, motion, hierarchy links and payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub id: PlayerId,
    pub name: String,
    pub player_type: PlayerType,

    // Spacetime
    pub int4d: Int4D,
    pub double4d: Double4D,
    pub velocity: Velocity,

    // Hierarchy
    pub direct_leader_id: Option<PlayerId>, // None = top leader
    pub direct_subordinate_ids: BTreeSet<PlayerId>,

    // Time bookkeeping
    /// Accumulated proper time
    pub proper_time: f64,
    /// Proper time not yet consumed by a dilation turn
    pub dilation_residue: f64,

    // Payload
    pub physics: PhysicsData,
    pub science: ScienceData,
    pub ai_data: AiData,

    /// Cleared by a dissolve command; dead players are removed at commit
    pub alive: bool,
}

impl PlayerData {
    /// A stationary, leaderless player sitting at the center of `int4d`
    pub fn new(id: PlayerId, player_type: PlayerType, int4d: Int4D) -> Self {
        Self {
            id,
            name: format!("Player {}", id.0),
            player_type,
            int4d,
            double4d: int4d.to_center_double4d(),
            velocity: Velocity::zero(),
            direct_leader_id: None,
            direct_subordinate_ids: BTreeSet::new(),
            proper_time: 0.0,
            dilation_residue: 0.0,
            physics: PhysicsData::default(),
            science: ScienceData::default(),
            ai_data: AiData::default(),
            alive: true,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.player_type == PlayerType::Ai
    }

    pub fn is_top_leader(&self) -> bool {
        self.direct_leader_id.is_none()
    }

    /// Move to a new precise position, keeping the cube coordinate in sync
    pub fn set_position(&mut self, double4d: Double4D) {
        self.double4d = double4d;
        self.int4d = double4d.to_int4d();
    }

    /// Stamp both coordinates with universe time `t`
    pub fn set_time(&mut self, t: Tick) {
        self.double4d.t = t as f64;
        self.int4d.t = t;
    }
}
