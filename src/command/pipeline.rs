//! One tick of command processing
//!
//! Stages run in a fixed order: Collect, Validate, Apply, Mechanize,
//! Commit. Commands are processed in issuer id order, then list order.
//! Mechanism follow-ups pass through Validate and Apply once, after
//! every player has been mechanized, and are never mechanized again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::effects::{self, ApplyContext};
use crate::command::types::{Command, CommandOrigin, DroppedCommand, RejectReason};
use crate::core::config::UniverseSettings;
use crate::core::ids::IdAllocator;
use crate::core::rng::{agent_rng, Stream};
use crate::core::types::{PlayerId, Tick};
use crate::mechanism::{MechanismCollection, MechanismContext};
use crate::universe::state::UniverseState;
use crate::universe::view::AgentView;
use crate::visibility::light::dilation_factor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Collect,
    Validate,
    Apply,
    Mechanize,
    Commit,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Universe time the tick started at
    pub time: Tick,
    /// Commands submitted by humans and the decision engine
    pub planned: usize,
    /// Commands that passed validation and were applied
    pub applied: usize,
    pub dropped: Vec<DroppedCommand>,
    /// Follow-up commands issued by mechanisms
    pub mechanism_commands: usize,
    /// Players that had a dilated turn
    pub dilation_turns: usize,
    pub spawned: Vec<PlayerId>,
    pub removed: Vec<PlayerId>,
}

impl TickReport {
    fn new(time: Tick) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Validates, applies and mechanizes one tick against the canonical state
pub struct CommandPipeline<'a> {
    settings: &'a UniverseSettings,
    mechanisms: &'a MechanismCollection,
    ids: &'a IdAllocator,
}

impl<'a> CommandPipeline<'a> {
    pub fn new(
        settings: &'a UniverseSettings,
        mechanisms: &'a MechanismCollection,
        ids: &'a IdAllocator,
    ) -> Self {
        Self {
            settings,
            mechanisms,
            ids,
        }
    }

    /// Run every stage for one tick and commit the resulting slice
    ///
    /// `views` are the views resolved at the end of the previous tick.
    pub fn run_tick(
        &self,
        state: &mut UniverseState,
        views: &BTreeMap<PlayerId, AgentView>,
        commands: BTreeMap<PlayerId, Vec<Command>>,
    ) -> TickReport {
        let mut report = TickReport::new(state.time);

        // Collect: newborns this tick are not mechanized until the next one
        let present_at_start: Vec<PlayerId> = state.players.keys().copied().collect();
        report.planned = commands.values().map(Vec::len).sum();

        for (key, list) in commands {
            for command in list {
                self.process(state, key, command, CommandOrigin::Planned, &mut report);
            }
        }

        let follow_ups = self.mechanize(state, views, &present_at_start, &mut report);
        report.mechanism_commands = follow_ups.len();
        if !follow_ups.is_empty() {
            tracing::debug!(
                "t={}: {} mechanism follow-up commands",
                report.time,
                follow_ups.len()
            );
        }
        for command in follow_ups {
            let key = command.from_id;
            self.process(state, key, command, CommandOrigin::Mechanism, &mut report);
        }

        report.removed = state.commit();
        report
    }

    /// Validate one command and, if it passes, apply it
    fn process(
        &self,
        state: &mut UniverseState,
        key: PlayerId,
        command: Command,
        origin: CommandOrigin,
        report: &mut TickReport,
    ) {
        if let Err(reason) = self.validate(state, key, &command) {
            tracing::debug!(
                "Dropped {:?} from {} to {}: {}",
                command.kind(),
                command.from_id,
                command.to_id,
                reason
            );
            report.dropped.push(DroppedCommand {
                command,
                reason,
                origin,
            });
            return;
        }

        if let Some(issuer) = state.players.get_mut(&command.from_id) {
            effects::execute_send(&command.payload, issuer);
        }

        let mut ctx = ApplyContext {
            settings: self.settings,
            ids: self.ids,
            global: &mut state.global,
            time: state.time,
        };
        let outcome = effects::apply(&command, &mut state.players, &mut ctx);
        if let Some(child) = outcome.spawned {
            report.spawned.push(child);
        }
        report.applied += 1;
    }

    /// Every check, in order; nothing is mutated here
    pub fn validate(
        &self,
        state: &UniverseState,
        key: PlayerId,
        command: &Command,
    ) -> Result<(), RejectReason> {
        if command.from_id != key {
            return Err(RejectReason::IssuerMismatch {
                key,
                from: command.from_id,
            });
        }

        effects::check_payload(&command.payload)?;

        let target = state
            .players
            .get(&command.to_id)
            .ok_or(RejectReason::UnknownTarget(command.to_id))?;
        if !target.alive {
            return Err(RejectReason::TargetDead(command.to_id));
        }

        let issuer = state
            .players
            .get(&command.from_id)
            .ok_or(RejectReason::UnknownIssuer(command.from_id))?;
        if !issuer.alive {
            return Err(RejectReason::IssuerDead(command.from_id));
        }

        effects::authorize(command, &state.players)?;
        effects::check_send(&command.payload, issuer, self.settings)
    }

    /// Regular mechanisms for every live player, then dilated ones on turns
    fn mechanize(
        &self,
        state: &mut UniverseState,
        views: &BTreeMap<PlayerId, AgentView>,
        present_at_start: &[PlayerId],
        report: &mut TickReport,
    ) -> Vec<Command> {
        let UniverseState {
            players,
            global,
            time,
            ..
        } = state;
        let time = *time;
        let mut follow_ups = Vec::new();

        for id in present_at_start {
            let Some(player) = players.get_mut(id).filter(|p| p.alive) else {
                continue;
            };
            let solitary;
            let view = match views.get(id) {
                Some(view) => view,
                None => {
                    solitary = AgentView::solitary(player.clone(), time);
                    &solitary
                }
            };
            let mut rng = agent_rng(self.settings.seed, Stream::Mechanism, time, *id);
            let mut ctx = MechanismContext {
                player,
                view,
                settings: self.settings,
                global,
                rng: &mut rng,
            };

            for mechanism in &self.mechanisms.regular {
                follow_ups.extend(mechanism.process(&mut ctx));
            }

            let factor = dilation_factor(ctx.player.velocity, self.settings.speed_of_light);
            ctx.player.proper_time += factor;
            ctx.player.dilation_residue += factor;
            if ctx.player.dilation_residue >= 1.0 {
                ctx.player.dilation_residue -= 1.0;
                report.dilation_turns += 1;
                for mechanism in &self.mechanisms.dilated {
                    follow_ups.extend(mechanism.process(&mut ctx));
                }
            }
        }

        follow_ups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::types::CommandPayload;
    use crate::core::types::{Int4D, Velocity};
    use crate::universe::generation::InitialUniverse;
    use crate::universe::player::{PlayerData, PlayerType};

    /// 0 leads 1 and 2, all one cube apart
    fn state() -> UniverseState {
        let mut players = BTreeMap::new();
        for id in 0..3u64 {
            let pid = PlayerId(id);
            let mut p = PlayerData::new(pid, PlayerType::Ai, Int4D::new(0, id as i64, 0, 0));
            p.physics.fuel.storage = 1000.0;
            p.physics.fuel.trade = 10.0;
            if id > 0 {
                p.direct_leader_id = Some(PlayerId(0));
            }
            players.insert(pid, p);
        }
        for id in 1..3u64 {
            players
                .get_mut(&PlayerId(0))
                .unwrap()
                .direct_subordinate_ids
                .insert(PlayerId(id));
        }
        UniverseState::from_initial(InitialUniverse::new(players))
    }

    fn run(
        state: &mut UniverseState,
        mechanisms: &MechanismCollection,
        commands: BTreeMap<PlayerId, Vec<Command>>,
    ) -> TickReport {
        let settings = UniverseSettings::default();
        let ids = IdAllocator::after(state.players.keys());
        CommandPipeline::new(&settings, mechanisms, &ids).run_tick(state, &BTreeMap::new(), commands)
    }

    #[test]
    fn test_unknown_target_dropped_and_nothing_changes() {
        let mut state = state();
        let before = state.players.clone();
        let commands = BTreeMap::from([(
            PlayerId(1),
            vec![Command::send_fuel(PlayerId(1), PlayerId(42), 0, 5.0)],
        )]);

        let report = run(&mut state, &MechanismCollection::empty(), commands);

        assert_eq!(report.applied, 0);
        assert_eq!(report.dropped[0].reason, RejectReason::UnknownTarget(PlayerId(42)));
        for (id, p) in &before {
            let mut after = state.players[id].clone();
            after.set_time(0);
            after.proper_time = p.proper_time;
            after.dilation_residue = p.dilation_residue;
            assert_eq!(&after, p);
        }
    }

    #[test]
    fn test_issuer_must_match_key() {
        let mut state = state();
        let commands = BTreeMap::from([(
            PlayerId(2),
            vec![Command::send_fuel(PlayerId(1), PlayerId(0), 0, 5.0)],
        )]);
        let report = run(&mut state, &MechanismCollection::empty(), commands);
        assert!(matches!(
            report.dropped[0].reason,
            RejectReason::IssuerMismatch { .. }
        ));
    }

    #[test]
    fn test_issuer_pays_on_send() {
        let mut state = state();
        let commands = BTreeMap::from([(
            PlayerId(1),
            vec![
                Command::send_fuel(PlayerId(1), PlayerId(0), 0, 6.0),
                // Only 4 left in trade
                Command::send_fuel(PlayerId(1), PlayerId(0), 0, 6.0),
            ],
        )]);
        let report = run(&mut state, &MechanismCollection::empty(), commands);

        assert_eq!(report.applied, 1);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(state.players[&PlayerId(1)].physics.fuel.trade, 4.0);
        assert_eq!(state.players[&PlayerId(0)].physics.fuel.storage, 1006.0);
    }

    #[test]
    fn test_dissolve_removes_at_commit_and_reattaches() {
        let mut state = state();
        // Give 1 a subordinate of its own
        state.players.get_mut(&PlayerId(2)).unwrap().direct_leader_id = Some(PlayerId(1));
        state
            .players
            .get_mut(&PlayerId(0))
            .unwrap()
            .direct_subordinate_ids
            .remove(&PlayerId(2));
        state
            .players
            .get_mut(&PlayerId(1))
            .unwrap()
            .direct_subordinate_ids
            .insert(PlayerId(2));

        let commands = BTreeMap::from([(PlayerId(0), vec![Command::dissolve(PlayerId(0), PlayerId(1), 0)])]);
        let report = run(&mut state, &MechanismCollection::empty(), commands);

        assert_eq!(report.removed, vec![PlayerId(1)]);
        assert!(!state.players.contains_key(&PlayerId(1)));
        assert_eq!(state.players[&PlayerId(2)].direct_leader_id, Some(PlayerId(0)));
        assert!(state.players[&PlayerId(0)].direct_subordinate_ids.contains(&PlayerId(2)));
    }

    #[test]
    fn test_commands_to_dead_target_dropped() {
        let mut state = state();
        let commands = BTreeMap::from([
            (PlayerId(0), vec![Command::dissolve(PlayerId(0), PlayerId(2), 0)]),
            (PlayerId(1), vec![Command::send_fuel(PlayerId(1), PlayerId(2), 0, 1.0)]),
        ]);
        let report = run(&mut state, &MechanismCollection::empty(), commands);
        assert_eq!(report.applied, 1);
        assert_eq!(report.dropped[0].reason, RejectReason::TargetDead(PlayerId(2)));
    }

    #[test]
    fn test_commands_from_dead_issuer_dropped() {
        let mut state = state();
        let commands = BTreeMap::from([
            (PlayerId(0), vec![Command::dissolve(PlayerId(0), PlayerId(1), 0)]),
            (PlayerId(1), vec![Command::send_fuel(PlayerId(1), PlayerId(0), 0, 5.0)]),
        ]);
        let report = run(&mut state, &MechanismCollection::empty(), commands);

        assert_eq!(report.applied, 1);
        assert_eq!(report.dropped[0].reason, RejectReason::IssuerDead(PlayerId(1)));
        assert_eq!(state.players[&PlayerId(0)].physics.fuel.storage, 1000.0);
    }

    #[test]
    fn test_dead_players_are_not_mechanized() {
        let mut state = state();
        let commands = BTreeMap::from([(PlayerId(0), vec![Command::dissolve(PlayerId(0), PlayerId(1), 0)])]);
        let report = run(&mut state, &MechanismCollection::standard(), commands);

        // Only 2 still pays tribute
        assert_eq!(report.mechanism_commands, 1);
        assert_eq!(report.applied, 2);
        assert!(report.dropped.is_empty());
        assert_eq!(report.dilation_turns, 2);
    }

    #[test]
    fn test_report_survives_deep_copy() {
        let mut state = state();
        let commands = BTreeMap::from([(
            PlayerId(1),
            vec![Command::send_fuel(PlayerId(1), PlayerId(0), 0, 50.0)],
        )]);
        let report = run(&mut state, &MechanismCollection::empty(), commands);

        assert_eq!(
            report.dropped[0].reason,
            RejectReason::InsufficientResources {
                pool: "trade fuel".to_string(),
                needed: 50.0,
                available: 10.0,
            }
        );
        assert_eq!(crate::core::codec::deep_copy(&report).unwrap(), report);
    }

    #[test]
    fn test_tribute_follow_ups_applied_once() {
        let mut state = state();
        let report = run(&mut state, &MechanismCollection::standard(), BTreeMap::new());

        assert_eq!(report.planned, 0);
        assert_eq!(report.mechanism_commands, 2);
        assert_eq!(report.applied, 2);
        assert!(report
            .dropped
            .iter()
            .all(|d| d.origin == CommandOrigin::Mechanism));
    }

    #[test]
    fn test_stationary_players_get_a_dilated_turn_every_tick() {
        let mut state = state();
        let report = run(&mut state, &MechanismCollection::empty(), BTreeMap::new());
        assert_eq!(report.dilation_turns, 3);
        for p in state.players.values() {
            assert_eq!(p.proper_time, 1.0);
            assert_eq!(p.dilation_residue, 0.0);
        }
    }

    #[test]
    fn test_fast_players_skip_dilated_turns() {
        let mut state = state();
        for p in state.players.values_mut() {
            p.velocity = Velocity::new(0.6, 0.0, 0.0);
        }
        // sqrt(1 - 0.36) = 0.8 of proper time per tick
        let mechanisms = MechanismCollection::empty();
        let turns: Vec<usize> = (0..4)
            .map(|_| run(&mut state, &mechanisms, BTreeMap::new()).dilation_turns)
            .collect();
        assert_eq!(turns, vec![0, 3, 3, 3]);
    }

    #[test]
    fn test_spawned_player_joins_at_commit() {
        let mut state = state();
        let commands = BTreeMap::from([(
            PlayerId(0),
            vec![Command::new(
                PlayerId(0),
                PlayerId(0),
                0,
                CommandPayload::SpawnSubordinate { fuel: 50.0 },
            )],
        )]);
        let report = run(&mut state, &MechanismCollection::standard(), commands);

        assert_eq!(report.spawned, vec![PlayerId(3)]);
        let child = &state.players[&PlayerId(3)];
        assert_eq!(child.int4d.t, 1);
        // Not mechanized in its birth tick
        assert_eq!(child.proper_time, 0.0);
        assert!(state.history.record_of(PlayerId(3), 1).is_some());
    }
}
