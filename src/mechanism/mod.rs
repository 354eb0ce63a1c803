//! Mechanisms: deterministic per-tick transitions run after commands
//!
//! Regular mechanisms run once per universe tick. Dilated mechanisms run
//! once per whole unit of proper time, so fast movers get fewer turns.
//! A mechanism mutates only the player it is handed and may return
//! follow-up commands, which the pipeline validates like any other.

pub mod fuel;
pub mod movement;
pub mod science;

use rand_chacha::ChaCha8Rng;

use crate::command::types::Command;
use crate::core::config::UniverseSettings;
use crate::core::error::{KernelError, Result};
use crate::universe::global::GlobalData;
use crate::universe::player::PlayerData;
use crate::universe::view::AgentView;

pub use fuel::{FuelBalanceMechanism, FuelProductionMechanism, TributeMechanism};
pub use movement::MovementMechanism;
pub use science::{KnowledgeDiffusionMechanism, ResearchMechanism};

/// Everything a mechanism may read, plus the one record it may change
pub struct MechanismContext<'a> {
    pub player: &'a mut PlayerData,
    /// The player's view as of the start of the tick
    pub view: &'a AgentView,
    pub settings: &'a UniverseSettings,
    pub global: &'a GlobalData,
    pub rng: &'a mut ChaCha8Rng,
}

pub trait Mechanism: Send + Sync {
    fn name(&self) -> &'static str;

    /// Advance one turn, returning follow-up commands
    fn process(&self, ctx: &mut MechanismContext<'_>) -> Vec<Command>;
}

/// Ordered mechanism lists, run in list order for each player
#[derive(Default)]
pub struct MechanismCollection {
    pub regular: Vec<Box<dyn Mechanism>>,
    pub dilated: Vec<Box<dyn Mechanism>>,
}

impl MechanismCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self {
            regular: vec![
                Box::new(MovementMechanism),
                Box::new(FuelBalanceMechanism),
                Box::new(TributeMechanism),
                Box::new(KnowledgeDiffusionMechanism),
            ],
            dilated: vec![Box::new(FuelProductionMechanism), Box::new(ResearchMechanism)],
        }
    }

    pub fn names(&self) -> (Vec<&'static str>, Vec<&'static str>) {
        (
            self.regular.iter().map(|m| m.name()).collect(),
            self.dilated.iter().map(|m| m.name()).collect(),
        )
    }
}

impl std::fmt::Debug for MechanismCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (regular, dilated) = self.names();
        f.debug_struct("MechanismCollection")
            .field("regular", &regular)
            .field("dilated", &dilated)
            .finish()
    }
}

/// Get a mechanism collection by name
pub fn from_name(name: &str) -> Result<MechanismCollection> {
    match name {
        "default" => Ok(MechanismCollection::standard()),
        "empty" => Ok(MechanismCollection::empty()),
        _ => Err(KernelError::UnknownCollection {
            kind: "mechanism",
            name: name.to_string(),
        }),
    }
}
