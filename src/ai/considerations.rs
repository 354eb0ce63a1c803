//! Considerations used by the default tree
//!
//! Gate-style considerations return [`DualUtilityData::veto`] when their
//! condition fails and a neutral or scored contribution otherwise.

use crate::ai::node::{Consideration, DualUtilityData};
use crate::ai::plan::PlanState;
use crate::core::types::PlayerId;

fn gate(pass: bool) -> DualUtilityData {
    if pass {
        DualUtilityData::neutral()
    } else {
        DualUtilityData::veto()
    }
}

/// Grows with how far `value` exceeds `threshold`; vetoes below it
///
/// Utility contribution at the threshold is 1.
fn above(value: f64, threshold: f64, rank: i32) -> DualUtilityData {
    if threshold > 0.0 && value > threshold {
        DualUtilityData::new(rank, 1.0, value / threshold - 1.0)
    } else {
        DualUtilityData::veto()
    }
}

/// The target is visible (an unreachable target makes the option unavailable)
pub struct TargetVisible(pub PlayerId);

impl Consideration for TargetVisible {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        gate(plan.view.is_visible(self.0))
    }
}

/// The target was not contacted this episode or within the contact window
pub struct NotContactedRecently(pub PlayerId);

impl Consideration for NotContactedRecently {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        gate(!plan.is_command_sent_recently(self.0))
    }
}

pub struct TradeFuelAbove {
    pub threshold: f64,
    pub rank: i32,
}

impl Consideration for TradeFuelAbove {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        above(plan.own.physics.fuel.trade, self.threshold, self.rank)
    }
}

pub struct StorageAbove {
    pub threshold: f64,
    pub rank: i32,
}

impl Consideration for StorageAbove {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        above(plan.own.physics.fuel.storage, self.threshold, self.rank)
    }
}

pub struct KnowledgeAbove {
    pub threshold: f64,
    pub rank: i32,
}

impl Consideration for KnowledgeAbove {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        above(plan.own.science.knowledge, self.threshold, self.rank)
    }
}

/// The visible image of the target is farther away than `distance`
pub struct DistanceAbove {
    pub target: PlayerId,
    pub distance: f64,
    pub rank: i32,
}

impl Consideration for DistanceAbove {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        match plan.view.distance_to(self.target) {
            Some(d) => above(d, self.distance, self.rank),
            None => DualUtilityData::veto(),
        }
    }
}

/// The last image of the target shows storage under `threshold`
///
/// Scores higher the emptier the target looks.
pub struct TargetStarving {
    pub target: PlayerId,
    pub threshold: f64,
    pub rank: i32,
}

impl Consideration for TargetStarving {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        match plan.view.get(self.target) {
            Some(p) if p.physics.fuel.storage < self.threshold => DualUtilityData::new(
                self.rank,
                1.0,
                1.0 - p.physics.fuel.storage / self.threshold,
            ),
            _ => DualUtilityData::veto(),
        }
    }
}

pub struct SubordinateCountBelow(pub usize);

impl Consideration for SubordinateCountBelow {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        gate(plan.own.direct_subordinate_ids.len() < self.0)
    }
}

/// Moving faster than `min_speed`; adds `bonus` when it is
pub struct IsMoving {
    pub min_speed: f64,
    pub bonus: f64,
}

impl Consideration for IsMoving {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        if plan.own.velocity.mag() > self.min_speed {
            DualUtilityData::new(0, 1.0, self.bonus)
        } else {
            DualUtilityData::veto()
        }
    }
}

pub struct IsTopLeader;

impl Consideration for IsTopLeader {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData {
        gate(plan.own.is_top_leader())
    }
}
