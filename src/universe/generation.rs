//! Universe generation
//!
//! Generators produce the first player set; the kernel does not care how
//! positions, velocities or payload values were chosen.

use std::collections::BTreeMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GenerateSettings;
use crate::core::error::{KernelError, Result};
use crate::core::types::{Double3D, Double4D, Int4D, PlayerId};
use crate::universe::global::GlobalData;
use crate::universe::history::UniverseHistory;
use crate::universe::player::{FuelRestMassData, PlayerData, PlayerType};

/// Output of a generator: players at `t = 0` and an empty history
#[derive(Debug, Clone)]
pub struct InitialUniverse {
    pub players: BTreeMap<PlayerId, PlayerData>,
    pub global: GlobalData,
    pub history: UniverseHistory,
}

impl InitialUniverse {
    pub fn new(players: BTreeMap<PlayerId, PlayerData>) -> Self {
        Self {
            players,
            global: GlobalData::default(),
            history: UniverseHistory::new(),
        }
    }
}

pub trait UniverseGenerator: Send + Sync {
    fn generate(&self, settings: &GenerateSettings, rng: &mut ChaCha8Rng) -> Result<InitialUniverse>;
}

/// Get a generator by name
pub fn from_name(name: &str) -> Result<Box<dyn UniverseGenerator>> {
    match name {
        "random" => Ok(Box::new(RandomGenerator)),
        "minimal" => Ok(Box::new(MinimalGenerator)),
        _ => Err(KernelError::UnknownCollection {
            kind: "generator",
            name: name.to_string(),
        }),
    }
}

fn player_type_for(index: usize, settings: &GenerateSettings) -> PlayerType {
    if index < settings.num_human_players {
        PlayerType::Human
    } else {
        PlayerType::Ai
    }
}

/// Leaders scattered through the universe, each with a few subordinates
pub struct RandomGenerator;

impl UniverseGenerator for RandomGenerator {
    fn generate(&self, settings: &GenerateSettings, rng: &mut ChaCha8Rng) -> Result<InitialUniverse> {
        settings.validate()?;
        let universe = &settings.universe;

        let num_leaders = (settings.num_players / 4).max(1);
        let max_initial_speed = universe.max_speed() * 0.3;
        let mut players = BTreeMap::new();

        for index in 0..settings.num_players {
            let id = PlayerId(index as u64);
            let position = Double4D::new(
                0.0,
                rng.gen_range(0.0..universe.x_dim as f64),
                rng.gen_range(0.0..universe.y_dim as f64),
                rng.gen_range(0.0..universe.z_dim as f64),
            );

            let mut player = PlayerData::new(id, player_type_for(index, settings), Int4D::default());
            player.set_position(position);

            let direction = Double3D::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            )
            .normalize();
            player.velocity = direction * rng.gen_range(0.0..=max_initial_speed);

            player.physics.rest_mass = rng.gen_range(1.0..10.0);
            player.physics.fuel.storage = settings.initial_fuel;
            player.science.knowledge = rng.gen_range(0.0..10.0);

            players.insert(id, player);
        }

        // Players beyond the first `num_leaders` serve a leader round-robin
        for index in num_leaders..settings.num_players {
            let sub = PlayerId(index as u64);
            let leader = PlayerId((index % num_leaders) as u64);
            if let Some(p) = players.get_mut(&sub) {
                p.direct_leader_id = Some(leader);
            }
            if let Some(l) = players.get_mut(&leader) {
                l.direct_subordinate_ids.insert(sub);
            }
        }

        Ok(InitialUniverse::new(players))
    }
}

/// Two stationary players one cube apart with fixed fuel
///
/// Each holds `initial_fuel` in storage and one unit in each of the
/// movement and production pools.
pub struct MinimalGenerator;

impl UniverseGenerator for MinimalGenerator {
    fn generate(&self, settings: &GenerateSettings, _rng: &mut ChaCha8Rng) -> Result<InitialUniverse> {
        settings.validate()?;

        let mut players = BTreeMap::new();
        for (index, x) in [(0usize, 0i64), (1, 1)] {
            let id = PlayerId(index as u64);
            let mut player =
                PlayerData::new(id, player_type_for(index, settings), Int4D::new(0, x, 0, 0));
            player.physics.fuel = FuelRestMassData {
                storage: settings.initial_fuel,
                movement: 1.0,
                production: 1.0,
                trade: 0.0,
            };
            players.insert(id, player);
        }

        Ok(InitialUniverse::new(players))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigError;
    use crate::core::rng::generation_rng;

    #[test]
    fn test_random_generator_is_deterministic() {
        let settings = GenerateSettings::default();
        let a = RandomGenerator.generate(&settings, &mut generation_rng(7)).unwrap();
        let b = RandomGenerator.generate(&settings, &mut generation_rng(7)).unwrap();
        assert_eq!(a.players, b.players);
        assert_eq!(a.players.len(), settings.num_players);
        assert!(a.history.is_empty());
    }

    #[test]
    fn test_random_generator_respects_bounds_and_speed() {
        let settings = GenerateSettings::default();
        let universe = RandomGenerator.generate(&settings, &mut generation_rng(1)).unwrap();
        for p in universe.players.values() {
            assert!(p.int4d.x >= 0 && p.int4d.x < settings.universe.x_dim);
            assert!(p.int4d.y >= 0 && p.int4d.y < settings.universe.y_dim);
            assert!(p.int4d.z >= 0 && p.int4d.z < settings.universe.z_dim);
            assert!(p.velocity.mag() < settings.universe.speed_of_light);
            assert_eq!(p.int4d.t, 0);
        }
    }

    #[test]
    fn test_random_generator_links_hierarchy() {
        let settings = GenerateSettings::default();
        let universe = RandomGenerator.generate(&settings, &mut generation_rng(1)).unwrap();
        for p in universe.players.values() {
            if let Some(leader) = p.direct_leader_id {
                assert!(universe.players[&leader].direct_subordinate_ids.contains(&p.id));
            }
        }
        let leaders = universe.players.values().filter(|p| p.is_top_leader()).count();
        assert_eq!(leaders, settings.num_players / 4);
    }

    #[test]
    fn test_human_players_come_first() {
        let mut settings = GenerateSettings::default();
        settings.num_human_players = 2;
        let universe = RandomGenerator.generate(&settings, &mut generation_rng(1)).unwrap();
        assert_eq!(universe.players[&PlayerId(0)].player_type, PlayerType::Human);
        assert_eq!(universe.players[&PlayerId(1)].player_type, PlayerType::Human);
        assert_eq!(universe.players[&PlayerId(2)].player_type, PlayerType::Ai);
    }

    #[test]
    fn test_minimal_generator_layout() {
        let settings = GenerateSettings::default();
        let universe = MinimalGenerator.generate(&settings, &mut generation_rng(0)).unwrap();
        assert_eq!(universe.players.len(), 2);
        let p0 = &universe.players[&PlayerId(0)];
        assert_eq!(p0.int4d, Int4D::new(0, 0, 0, 0));
        assert_eq!(p0.physics.fuel.storage, 1e6);
        assert_eq!(p0.physics.fuel.movement, 1.0);
        assert_eq!(universe.players[&PlayerId(1)].int4d.x, 1);
    }

    #[test]
    fn test_invalid_settings_rejected_before_generation() {
        let mut settings = GenerateSettings::default();
        settings.universe.speed_of_light = 0.0;
        let result = RandomGenerator.generate(&settings, &mut generation_rng(0));
        assert!(matches!(
            result,
            Err(KernelError::Config(ConfigError::NonPositiveSpeedOfLight(_)))
        ));
    }

    #[test]
    fn test_unknown_generator_name() {
        assert!(from_name("random").is_ok());
        assert!(matches!(
            from_name("spiral"),
            Err(KernelError::UnknownCollection { .. })
        ));
    }
}
