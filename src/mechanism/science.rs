//! Research and knowledge diffusion

use crate::command::types::Command;
use crate::mechanism::{Mechanism, MechanismContext};

/// Dilated: each turn of proper time adds research
pub struct ResearchMechanism;

impl Mechanism for ResearchMechanism {
    fn name(&self) -> &'static str {
        "research"
    }

    fn process(&self, ctx: &mut MechanismContext<'_>) -> Vec<Command> {
        ctx.player.science.knowledge += ctx.settings.constants.research_rate;
        Vec::new()
    }
}

/// Players behind the shared pool close part of the gap every tick
pub struct KnowledgeDiffusionMechanism;

impl Mechanism for KnowledgeDiffusionMechanism {
    fn name(&self) -> &'static str {
        "knowledge_diffusion"
    }

    fn process(&self, ctx: &mut MechanismContext<'_>) -> Vec<Command> {
        let gap = ctx.global.shared_knowledge - ctx.player.science.knowledge;
        if gap > 0.0 {
            ctx.player.science.knowledge += gap * ctx.settings.constants.knowledge_diffusion_rate;
        }
        Vec::new()
    }
}
