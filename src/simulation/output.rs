//! Simulation output and serialization

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::pipeline::TickReport;
use crate::core::types::{PlayerId, Tick};
use crate::simulation::driver::StepDriver;
use crate::universe::global::GlobalData;
use crate::universe::player::PlayerData;

/// Complete output of a batch run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub final_universe: UniverseSnapshot,
    pub statistics: SimulationStats,
}

/// Serializable snapshot of the final universe
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    pub time: Tick,
    pub players: BTreeMap<PlayerId, PlayerData>,
    pub global: GlobalData,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub ticks_simulated: usize,
    pub simulation_time_ms: u64,
    pub commands_planned: usize,
    pub commands_applied: usize,
    pub commands_dropped: usize,
    pub mechanism_commands: usize,
    pub players_at_start: usize,
    pub players_at_end: usize,
    pub players_spawned: usize,
    pub players_removed: usize,
    pub top_leaders_at_end: usize,
}

impl SimulationOutput {
    pub fn new(
        driver: &StepDriver,
        players_at_start: usize,
        reports: &[TickReport],
        elapsed: Duration,
    ) -> Self {
        let mut statistics = SimulationStats {
            ticks_simulated: reports.len(),
            simulation_time_ms: elapsed.as_millis() as u64,
            players_at_start,
            players_at_end: driver.players().len(),
            top_leaders_at_end: driver.players().values().filter(|p| p.is_top_leader()).count(),
            ..Default::default()
        };
        for report in reports {
            statistics.commands_planned += report.planned;
            statistics.commands_applied += report.applied;
            statistics.commands_dropped += report.dropped_count();
            statistics.mechanism_commands += report.mechanism_commands;
            statistics.players_spawned += report.spawned.len();
            statistics.players_removed += report.removed.len();
        }

        Self {
            final_universe: UniverseSnapshot {
                time: driver.time(),
                players: driver.players().clone(),
                global: driver.global().clone(),
            },
            statistics,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        let s = &self.statistics;
        format!(
            "Simulated {} ticks in {}ms\n{} commands applied, {} dropped, {} from mechanisms\n{} players remain ({} spawned, {} removed, {} top leaders), shared knowledge {:.2}",
            s.ticks_simulated,
            s.simulation_time_ms,
            s.commands_applied,
            s.commands_dropped,
            s.mechanism_commands,
            s.players_at_end,
            s.players_spawned,
            s.players_removed,
            s.top_leaders_at_end,
            self.final_universe.global.shared_knowledge,
        )
    }
}
