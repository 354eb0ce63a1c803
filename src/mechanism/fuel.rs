//! Fuel pool balancing, tribute and production

use crate::command::types::Command;
use crate::mechanism::{Mechanism, MechanismContext};

/// Redistribute total fuel so each working pool holds its target ratio
///
/// Whatever the ratios leave over goes to storage. Total fuel is
/// unchanged.
pub struct FuelBalanceMechanism;

impl Mechanism for FuelBalanceMechanism {
    fn name(&self) -> &'static str {
        "fuel_balance"
    }

    fn process(&self, ctx: &mut MechanismContext<'_>) -> Vec<Command> {
        let constants = &ctx.settings.constants;
        let fuel = &mut ctx.player.physics.fuel;
        let total = fuel.total();

        fuel.movement = total * constants.movement_target_ratio;
        fuel.production = total * constants.production_target_ratio;
        fuel.trade = total * constants.trade_target_ratio;
        fuel.storage = total - fuel.movement - fuel.production - fuel.trade;
        Vec::new()
    }
}

/// Subordinates send a share of their trade pool to their direct leader
pub struct TributeMechanism;

impl Mechanism for TributeMechanism {
    fn name(&self) -> &'static str {
        "tribute"
    }

    fn process(&self, ctx: &mut MechanismContext<'_>) -> Vec<Command> {
        let Some(leader) = ctx.player.direct_leader_id else {
            return Vec::new();
        };
        let amount = ctx.player.physics.fuel.trade * ctx.settings.constants.tribute_fraction;
        if amount <= 0.0 {
            return Vec::new();
        }
        vec![Command::send_fuel(ctx.player.id, leader, ctx.view.time, amount)]
    }
}

/// Dilated: each turn of proper time produces fuel into storage
pub struct FuelProductionMechanism;

impl Mechanism for FuelProductionMechanism {
    fn name(&self) -> &'static str {
        "fuel_production"
    }

    fn process(&self, ctx: &mut MechanismContext<'_>) -> Vec<Command> {
        ctx.player.physics.fuel.storage += ctx.settings.constants.fuel_production_rate;
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::types::CommandPayload;
    use crate::core::config::UniverseSettings;
    use crate::core::types::PlayerId;
    use crate::mechanism::test_support::{lone_player, run_on};
    use crate::universe::global::GlobalData;
    use crate::universe::player::FuelRestMassData;

    #[test]
    fn test_balance_keeps_total() {
        let settings = UniverseSettings::default();
        let mut p = lone_player();
        p.physics.fuel = FuelRestMassData {
            storage: 1000.0,
            movement: 0.0,
            production: 0.0,
            trade: 0.0,
        };
        run_on(&FuelBalanceMechanism, &mut p, &settings, &GlobalData::default());

        let fuel = &p.physics.fuel;
        assert!((fuel.total() - 1000.0).abs() < 1e-9);
        assert!((fuel.movement - 100.0).abs() < 1e-9);
        assert!((fuel.trade - 100.0).abs() < 1e-9);
        assert!((fuel.storage - 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_ratios_sweep_into_storage() {
        let mut settings = UniverseSettings::default();
        settings.constants.movement_target_ratio = 0.0;
        settings.constants.production_target_ratio = 0.0;
        settings.constants.trade_target_ratio = 0.0;
        let mut p = lone_player();
        p.physics.fuel = FuelRestMassData {
            storage: 1e6,
            movement: 1.0,
            production: 1.0,
            trade: 0.0,
        };
        run_on(&FuelBalanceMechanism, &mut p, &settings, &GlobalData::default());

        assert_eq!(p.physics.fuel.movement, 0.0);
        assert_eq!(p.physics.fuel.storage, 1e6 + 2.0);
    }

    #[test]
    fn test_tribute_only_with_leader() {
        let settings = UniverseSettings::default();
        let mut p = lone_player();
        p.physics.fuel.trade = 50.0;
        assert!(run_on(&TributeMechanism, &mut p, &settings, &GlobalData::default()).is_empty());

        p.direct_leader_id = Some(PlayerId(9));
        let commands = run_on(&TributeMechanism, &mut p, &settings, &GlobalData::default());
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].to_id, PlayerId(9));
        assert_eq!(commands[0].payload, CommandPayload::SendFuel { amount: 5.0 });
        // The mechanism only asks; the trade pool is charged on send
        assert_eq!(p.physics.fuel.trade, 50.0);
    }

    #[test]
    fn test_production_adds_to_storage() {
        let settings = UniverseSettings::default();
        let mut p = lone_player();
        run_on(&FuelProductionMechanism, &mut p, &settings, &GlobalData::default());
        assert_eq!(p.physics.fuel.storage, settings.constants.fuel_production_rate);
    }
}
