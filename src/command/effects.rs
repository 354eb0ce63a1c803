//! Per-kind dispatch table: payload checks, authorization, issuer-side
//! send effects and target-side application
//!
//! Every check runs before any mutation, so a command rejected here
//! leaves the universe untouched.

use std::collections::BTreeMap;

use crate::command::types::{Command, CommandKind, CommandPayload, RejectReason};
use crate::core::config::UniverseSettings;
use crate::core::ids::IdAllocator;
use crate::core::types::{PlayerId, Tick};
use crate::universe::global::GlobalData;
use crate::universe::hierarchy;
use crate::universe::player::{PlayerData, PlayerType};

/// Mutable context handed to [`apply`]
pub struct ApplyContext<'a> {
    pub settings: &'a UniverseSettings,
    pub ids: &'a IdAllocator,
    pub global: &'a mut GlobalData,
    /// Universe time of the tick being processed
    pub time: Tick,
}

/// What applying a command produced besides the mutation itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    pub spawned: Option<PlayerId>,
}

fn check_amount(name: &str, value: f64) -> Result<(), RejectReason> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RejectReason::InvalidPayload(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

/// Shape checks that need no universe state
pub fn check_payload(payload: &CommandPayload) -> Result<(), RejectReason> {
    match payload {
        CommandPayload::ChangeVelocity { target_velocity } => {
            let v = target_velocity;
            if v.x.is_finite() && v.y.is_finite() && v.z.is_finite() {
                Ok(())
            } else {
                Err(RejectReason::InvalidPayload(format!(
                    "target velocity is not finite: {v:?}"
                )))
            }
        }
        CommandPayload::SendFuel { amount } => check_amount("amount", *amount),
        CommandPayload::SpawnSubordinate { fuel } => check_amount("fuel", *fuel),
        CommandPayload::PublishKnowledge { amount } => check_amount("amount", *amount),
        CommandPayload::Dissolve
        | CommandPayload::DeclareIndependence
        | CommandPayload::RecordContacts { .. } => Ok(()),
    }
}

/// Does the issuer have standing to send this command to its target?
pub fn authorize(
    command: &Command,
    players: &BTreeMap<PlayerId, PlayerData>,
) -> Result<(), RejectReason> {
    let from = command.from_id;
    let to = command.to_id;
    let allowed = match command.kind() {
        CommandKind::SendFuel => true,
        CommandKind::ChangeVelocity | CommandKind::Dissolve => {
            hierarchy::is_self_or_leader(from, to, players)
        }
        CommandKind::SpawnSubordinate
        | CommandKind::RecordContacts
        | CommandKind::PublishKnowledge => from == to,
        CommandKind::DeclareIndependence => players
            .get(&from)
            .is_some_and(|issuer| issuer.direct_leader_id == Some(to)),
    };

    if allowed {
        Ok(())
    } else {
        Err(RejectReason::Unauthorized {
            kind: command.kind(),
            from,
            to,
        })
    }
}

fn require(pool: &str, needed: f64, available: f64) -> Result<(), RejectReason> {
    if available >= needed {
        Ok(())
    } else {
        Err(RejectReason::InsufficientResources {
            pool: pool.to_string(),
            needed,
            available,
        })
    }
}

/// Issuer-side resource check, run before [`execute_send`]
pub fn check_send(
    payload: &CommandPayload,
    issuer: &PlayerData,
    settings: &UniverseSettings,
) -> Result<(), RejectReason> {
    match payload {
        CommandPayload::SendFuel { amount } => {
            require("trade fuel", *amount, issuer.physics.fuel.trade)
        }
        CommandPayload::SpawnSubordinate { fuel } => require(
            "storage fuel",
            fuel + settings.constants.spawn_fuel_cost,
            issuer.physics.fuel.storage,
        ),
        CommandPayload::PublishKnowledge { amount } => {
            require("knowledge", *amount, issuer.science.knowledge)
        }
        _ => Ok(()),
    }
}

/// Charge the issuer for sending; only called after [`check_send`] passed
pub fn execute_send(payload: &CommandPayload, issuer: &mut PlayerData) {
    match payload {
        CommandPayload::SendFuel { amount } => issuer.physics.fuel.trade -= amount,
        CommandPayload::PublishKnowledge { amount } => issuer.science.knowledge -= amount,
        CommandPayload::DeclareIndependence => issuer.direct_leader_id = None,
        _ => {}
    }
}

/// Mutate the target record (or global data) for a validated command
///
/// Domain shortfalls on the target side never fail: they become partial
/// effects, such as a velocity change cut short by a thin movement pool.
pub fn apply(
    command: &Command,
    players: &mut BTreeMap<PlayerId, PlayerData>,
    ctx: &mut ApplyContext<'_>,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    if command.kind().is_global() {
        if let CommandPayload::PublishKnowledge { amount } = &command.payload {
            ctx.global.publish(*amount);
        }
        return outcome;
    }

    let Some(target) = players.get_mut(&command.to_id) else {
        return outcome;
    };

    match &command.payload {
        CommandPayload::ChangeVelocity { target_velocity } => {
            let desired = target_velocity.clamp_mag(ctx.settings.max_speed());
            let delta = desired - target.velocity;
            let cost = delta.mag() * ctx.settings.constants.velocity_change_fuel_cost;
            let fuel = &mut target.physics.fuel;
            if cost <= fuel.movement {
                fuel.movement -= cost;
                target.velocity = desired;
            } else {
                let fraction = fuel.movement / cost;
                fuel.movement = 0.0;
                target.velocity = target.velocity + delta * fraction;
            }
        }
        CommandPayload::SendFuel { amount } => {
            target.physics.fuel.storage += amount;
        }
        CommandPayload::SpawnSubordinate { fuel } => {
            let child_id = ctx.ids.allocate();
            target.physics.fuel.storage -= fuel + ctx.settings.constants.spawn_fuel_cost;
            target.direct_subordinate_ids.insert(child_id);

            let mut child = PlayerData::new(child_id, PlayerType::Ai, target.int4d);
            child.name = format!("{} {}", target.name, target.direct_subordinate_ids.len());
            child.set_position(target.double4d);
            child.velocity = target.velocity;
            child.direct_leader_id = Some(target.id);
            child.physics.fuel.storage = *fuel;
            players.insert(child_id, child);
            outcome.spawned = Some(child_id);
        }
        CommandPayload::Dissolve => {
            target.alive = false;
        }
        CommandPayload::DeclareIndependence => {
            target.direct_subordinate_ids.remove(&command.from_id);
        }
        CommandPayload::RecordContacts { targets } => {
            let contacts = &mut target.ai_data.recent_contacts;
            for contacted in targets {
                contacts.insert(*contacted, ctx.time);
            }
            let window = ctx.settings.constants.recent_contact_window;
            contacts.retain(|_, sent| ctx.time - *sent < window);
        }
        CommandPayload::PublishKnowledge { .. } => {}
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Int4D, Velocity};

    fn player(id: u64) -> PlayerData {
        let mut p = PlayerData::new(PlayerId(id), PlayerType::Ai, Int4D::default());
        p.physics.fuel.storage = 1000.0;
        p.physics.fuel.movement = 100.0;
        p.physics.fuel.trade = 50.0;
        p
    }

    /// 0 leads 1
    fn pair() -> BTreeMap<PlayerId, PlayerData> {
        let mut leader = player(0);
        let mut sub = player(1);
        sub.direct_leader_id = Some(PlayerId(0));
        leader.direct_subordinate_ids.insert(PlayerId(1));
        BTreeMap::from([(PlayerId(0), leader), (PlayerId(1), sub)])
    }

    fn run_apply(
        command: &Command,
        players: &mut BTreeMap<PlayerId, PlayerData>,
        settings: &UniverseSettings,
        global: &mut GlobalData,
    ) -> ApplyOutcome {
        let ids = IdAllocator::after(players.keys());
        let mut ctx = ApplyContext {
            settings,
            ids: &ids,
            global,
            time: 3,
        };
        apply(command, players, &mut ctx)
    }

    #[test]
    fn test_leader_may_steer_subordinate_but_not_reverse() {
        let players = pair();
        let down = Command::change_velocity(PlayerId(0), PlayerId(1), 0, Velocity::zero());
        let up = Command::change_velocity(PlayerId(1), PlayerId(0), 0, Velocity::zero());
        assert_eq!(authorize(&down, &players), Ok(()));
        assert!(matches!(
            authorize(&up, &players),
            Err(RejectReason::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_independence_only_from_direct_leader() {
        let players = pair();
        let ok = Command::new(PlayerId(1), PlayerId(0), 0, CommandPayload::DeclareIndependence);
        let wrong = Command::new(PlayerId(0), PlayerId(1), 0, CommandPayload::DeclareIndependence);
        assert_eq!(authorize(&ok, &players), Ok(()));
        assert!(authorize(&wrong, &players).is_err());
    }

    #[test]
    fn test_send_fuel_checked_against_trade_pool() {
        let settings = UniverseSettings::default();
        let issuer = player(0);
        let too_much = CommandPayload::SendFuel { amount: 60.0 };
        assert!(matches!(
            check_send(&too_much, &issuer, &settings),
            Err(RejectReason::InsufficientResources { .. })
        ));
        assert_eq!(
            check_send(&CommandPayload::SendFuel { amount: 50.0 }, &issuer, &settings),
            Ok(())
        );
    }

    #[test]
    fn test_negative_and_nan_amounts_rejected() {
        assert!(check_payload(&CommandPayload::SendFuel { amount: -1.0 }).is_err());
        assert!(check_payload(&CommandPayload::PublishKnowledge { amount: f64::NAN }).is_err());
        assert!(check_payload(&CommandPayload::ChangeVelocity {
            target_velocity: Velocity::new(f64::INFINITY, 0.0, 0.0)
        })
        .is_err());
        assert!(check_payload(&CommandPayload::Dissolve).is_ok());
    }

    #[test]
    fn test_send_fuel_moves_trade_to_storage() {
        let settings = UniverseSettings::default();
        let mut global = GlobalData::default();
        let mut players = pair();
        let command = Command::send_fuel(PlayerId(1), PlayerId(0), 0, 20.0);

        if let Some(issuer) = players.get_mut(&PlayerId(1)) {
            execute_send(&command.payload, issuer);
        }
        run_apply(&command, &mut players, &settings, &mut global);

        assert_eq!(players[&PlayerId(1)].physics.fuel.trade, 30.0);
        assert_eq!(players[&PlayerId(0)].physics.fuel.storage, 1020.0);
    }

    #[test]
    fn test_velocity_change_is_clamped_and_paid() {
        let settings = UniverseSettings::default();
        let mut global = GlobalData::default();
        let mut players = pair();
        let command = Command::change_velocity(PlayerId(0), PlayerId(0), 0, Velocity::new(5.0, 0.0, 0.0));
        run_apply(&command, &mut players, &settings, &mut global);

        let p = &players[&PlayerId(0)];
        assert!((p.velocity.x - settings.max_speed()).abs() < 1e-12);
        let expected_cost = settings.max_speed() * settings.constants.velocity_change_fuel_cost;
        assert!((p.physics.fuel.movement - (100.0 - expected_cost)).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_change_partial_when_fuel_short() {
        let settings = UniverseSettings::default();
        let mut global = GlobalData::default();
        let mut players = pair();
        if let Some(p) = players.get_mut(&PlayerId(0)) {
            p.physics.fuel.movement = 2.0;
        }
        // Full change costs 0.8 * 10 = 8, only a quarter is affordable
        let command = Command::change_velocity(PlayerId(0), PlayerId(0), 0, Velocity::new(0.8, 0.0, 0.0));
        run_apply(&command, &mut players, &settings, &mut global);

        let p = &players[&PlayerId(0)];
        assert!((p.velocity.x - 0.2).abs() < 1e-12);
        assert_eq!(p.physics.fuel.movement, 0.0);
    }

    #[test]
    fn test_spawn_links_new_subordinate() {
        let settings = UniverseSettings::default();
        let mut global = GlobalData::default();
        let mut players = pair();
        let command = Command::new(
            PlayerId(1),
            PlayerId(1),
            0,
            CommandPayload::SpawnSubordinate { fuel: 200.0 },
        );
        let outcome = run_apply(&command, &mut players, &settings, &mut global);

        let child_id = outcome.spawned.unwrap();
        assert_eq!(child_id, PlayerId(2));
        let child = &players[&child_id];
        assert_eq!(child.direct_leader_id, Some(PlayerId(1)));
        assert_eq!(child.physics.fuel.storage, 200.0);
        assert!(players[&PlayerId(1)].direct_subordinate_ids.contains(&child_id));
        assert_eq!(
            players[&PlayerId(1)].physics.fuel.storage,
            1000.0 - 200.0 - settings.constants.spawn_fuel_cost
        );
    }

    #[test]
    fn test_record_contacts_prunes_old_entries() {
        let settings = UniverseSettings::default();
        let mut global = GlobalData::default();
        let mut players = pair();
        if let Some(p) = players.get_mut(&PlayerId(0)) {
            p.ai_data.recent_contacts.insert(PlayerId(7), -10);
        }
        let command = Command::new(
            PlayerId(0),
            PlayerId(0),
            3,
            CommandPayload::RecordContacts {
                targets: vec![PlayerId(1)],
            },
        );
        run_apply(&command, &mut players, &settings, &mut global);

        let contacts = &players[&PlayerId(0)].ai_data.recent_contacts;
        assert_eq!(contacts.get(&PlayerId(1)), Some(&3));
        assert!(!contacts.contains_key(&PlayerId(7)));
    }

    #[test]
    fn test_publish_touches_only_global() {
        let settings = UniverseSettings::default();
        let mut global = GlobalData::default();
        let mut players = pair();
        let before = players.clone();
        let command = Command::new(
            PlayerId(0),
            PlayerId(0),
            0,
            CommandPayload::PublishKnowledge { amount: 4.0 },
        );
        run_apply(&command, &mut players, &settings, &mut global);

        assert_eq!(players, before);
        assert_eq!(global.shared_knowledge, 4.0);
        assert_eq!(global.publication_count, 1);
    }
}
