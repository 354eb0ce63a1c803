//! Decision engine for AI-controlled players
//!
//! An AI turns one agent's view into a command list. It sees nothing but
//! the view, the settings and a random source seeded from
//! `(seed, tick, agent)`, so plans do not depend on thread scheduling.

pub mod considerations;
pub mod default_ai;
pub mod node;
pub mod plan;

use rand_chacha::ChaCha8Rng;

use crate::command::types::Command;
use crate::core::config::UniverseSettings;
use crate::core::error::{KernelError, Result};
use crate::universe::view::AgentView;

pub use node::{
    Behavior, Consideration, DualUtilityData, DualUtilityOption, DualUtilityReasoner, Node,
};
pub use plan::PlanState;

pub trait PlayerAi: Send + Sync {
    fn name(&self) -> &'static str;

    /// Plan one episode for the observer of `view`
    fn compute(&self, view: &AgentView, settings: &UniverseSettings, rng: ChaCha8Rng)
        -> Vec<Command>;
}

/// Issues nothing
pub struct NoOpAi;

impl PlayerAi for NoOpAi {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compute(&self, _view: &AgentView, _settings: &UniverseSettings, _rng: ChaCha8Rng) -> Vec<Command> {
        Vec::new()
    }
}

/// Evaluates a utility tree once per episode
pub struct UtilityAi {
    root: Node,
}

impl UtilityAi {
    pub fn new(root: Node) -> Self {
        Self { root }
    }
}

impl Default for UtilityAi {
    fn default() -> Self {
        Self::new(default_ai::default_tree())
    }
}

impl PlayerAi for UtilityAi {
    fn name(&self) -> &'static str {
        "default"
    }

    fn compute(&self, view: &AgentView, settings: &UniverseSettings, rng: ChaCha8Rng) -> Vec<Command> {
        let mut plan = PlanState::new(view, settings, rng);
        self.root.update_plan(&mut plan);
        plan.into_commands()
    }
}

/// Get an AI by name
pub fn from_name(name: &str) -> Result<Box<dyn PlayerAi>> {
    match name {
        "default" => Ok(Box::new(UtilityAi::default())),
        "none" => Ok(Box::new(NoOpAi)),
        _ => Err(KernelError::UnknownCollection {
            kind: "ai",
            name: name.to_string(),
        }),
    }
}
