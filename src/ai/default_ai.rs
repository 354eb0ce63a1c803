//! The default decision tree
//!
//! Sequence of four dual-utility reasoners (fuel, movement, expansion,
//! science) followed by a node that records who was contacted.

use crate::ai::considerations::{
    DistanceAbove, IsMoving, IsTopLeader, KnowledgeAbove, NotContactedRecently, StorageAbove,
    SubordinateCountBelow, TargetStarving, TargetVisible, TradeFuelAbove,
};
use crate::ai::node::{Behavior, DualUtilityOption, DualUtilityReasoner, Node};
use crate::ai::plan::PlanState;
use crate::command::types::CommandPayload;
use crate::core::types::{PlayerId, Velocity};

// === FUEL ===
/// Trade fuel a subordinate keeps before sending extra to its leader
const LEADER_SHARE_THRESHOLD: f64 = 100.0;
/// Share of the trade pool sent in one fuel command
const SEND_FRACTION: f64 = 0.5;
/// Storage below which a subordinate's image counts as starving
const STARVING_STORAGE: f64 = 1000.0;

// === MOVEMENT ===
/// Distance to the leader's image beyond which a subordinate follows
const FOLLOW_DISTANCE: f64 = 2.0;
/// Following speed as a fraction of the speed cap
const FOLLOW_SPEED_FRACTION: f64 = 0.5;
const MIN_SPEED: f64 = 1e-6;
/// Preference for braking over drifting
const STOP_BONUS: f64 = 0.5;

// === EXPANSION ===
const SPAWN_STORAGE_THRESHOLD: f64 = 1e5;
/// Share of storage handed to a new subordinate
const SPAWN_GIFT_FRACTION: f64 = 0.1;

// === SCIENCE ===
const PUBLISH_KNOWLEDGE_THRESHOLD: f64 = 20.0;
const PUBLISH_FRACTION: f64 = 0.5;

/// Build the default tree
pub fn default_tree() -> Node {
    Node::Sequence(vec![
        Node::dual_utility(FuelReasoner),
        Node::dual_utility(MovementReasoner),
        Node::dual_utility(ExpansionReasoner),
        Node::dual_utility(ScienceReasoner),
        Node::leaf(RecordRecentlySentCommand),
    ])
}

// ============================================================================
// Reasoners
// ============================================================================

pub struct FuelReasoner;

impl DualUtilityReasoner for FuelReasoner {
    fn options(&self, plan: &PlanState<'_>) -> Vec<DualUtilityOption> {
        let mut options = Vec::new();

        if let Some(leader) = plan.own.direct_leader_id {
            options.push(
                DualUtilityOption::new(
                    "send_fuel_to_leader",
                    Node::leaf(SendFuel {
                        target: leader,
                        fraction: SEND_FRACTION,
                    }),
                )
                .with(TargetVisible(leader))
                .with(NotContactedRecently(leader))
                .with(TradeFuelAbove {
                    threshold: LEADER_SHARE_THRESHOLD,
                    rank: 1,
                }),
            );
        }

        for sub in plan.view.subordinates() {
            options.push(
                DualUtilityOption::new(
                    format!("supply_{}", sub.id),
                    Node::leaf(SendFuel {
                        target: sub.id,
                        fraction: SEND_FRACTION,
                    }),
                )
                .with(NotContactedRecently(sub.id))
                .with(TargetStarving {
                    target: sub.id,
                    threshold: STARVING_STORAGE,
                    rank: 2,
                }),
            );
        }

        options
    }
}

pub struct MovementReasoner;

impl DualUtilityReasoner for MovementReasoner {
    fn options(&self, plan: &PlanState<'_>) -> Vec<DualUtilityOption> {
        let mut options = vec![DualUtilityOption::new("stop", Node::leaf(Stop))
            .with(IsTopLeader)
            .with(IsMoving {
                min_speed: MIN_SPEED,
                bonus: STOP_BONUS,
            })];

        if let Some(leader) = plan.own.direct_leader_id {
            options.push(
                DualUtilityOption::new(
                    "follow_leader",
                    Node::leaf(SteerTowards {
                        target: leader,
                        speed_fraction: FOLLOW_SPEED_FRACTION,
                    }),
                )
                .with(TargetVisible(leader))
                .with(DistanceAbove {
                    target: leader,
                    distance: FOLLOW_DISTANCE,
                    rank: 1,
                }),
            );
        }

        options
    }
}

pub struct ExpansionReasoner;

impl DualUtilityReasoner for ExpansionReasoner {
    fn options(&self, plan: &PlanState<'_>) -> Vec<DualUtilityOption> {
        vec![DualUtilityOption::new(
            "spawn_subordinate",
            Node::leaf(SpawnSubordinate {
                fraction: SPAWN_GIFT_FRACTION,
            }),
        )
        .with(StorageAbove {
            threshold: SPAWN_STORAGE_THRESHOLD,
            rank: 0,
        })
        .with(SubordinateCountBelow(
            plan.settings.constants.max_direct_subordinates,
        ))]
    }
}

pub struct ScienceReasoner;

impl DualUtilityReasoner for ScienceReasoner {
    fn options(&self, _plan: &PlanState<'_>) -> Vec<DualUtilityOption> {
        vec![DualUtilityOption::new(
            "publish_knowledge",
            Node::leaf(PublishKnowledge {
                fraction: PUBLISH_FRACTION,
            }),
        )
        .with(KnowledgeAbove {
            threshold: PUBLISH_KNOWLEDGE_THRESHOLD,
            rank: 0,
        })]
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// Send a share of the trade pool
pub struct SendFuel {
    pub target: PlayerId,
    pub fraction: f64,
}

impl Behavior for SendFuel {
    fn update_plan(&self, plan: &mut PlanState<'_>) {
        let amount = plan.own.physics.fuel.trade * self.fraction;
        if amount > 0.0 {
            plan.add_command(self.target, CommandPayload::SendFuel { amount });
        }
    }
}

/// Head for the target's last seen position
pub struct SteerTowards {
    pub target: PlayerId,
    pub speed_fraction: f64,
}

impl Behavior for SteerTowards {
    fn update_plan(&self, plan: &mut PlanState<'_>) {
        let Some(target) = plan.view.get(self.target) else {
            return;
        };
        let direction = (target.double4d.spatial() - plan.own.double4d.spatial()).normalize();
        let target_velocity = direction * (plan.settings.max_speed() * self.speed_fraction);
        plan.add_command(plan.id(), CommandPayload::ChangeVelocity { target_velocity });
    }
}

pub struct Stop;

impl Behavior for Stop {
    fn update_plan(&self, plan: &mut PlanState<'_>) {
        plan.add_command(
            plan.id(),
            CommandPayload::ChangeVelocity {
                target_velocity: Velocity::zero(),
            },
        );
    }
}

pub struct SpawnSubordinate {
    pub fraction: f64,
}

impl Behavior for SpawnSubordinate {
    fn update_plan(&self, plan: &mut PlanState<'_>) {
        let fuel = plan.own.physics.fuel.storage * self.fraction;
        plan.add_command(plan.id(), CommandPayload::SpawnSubordinate { fuel });
    }
}

pub struct PublishKnowledge {
    pub fraction: f64,
}

impl Behavior for PublishKnowledge {
    fn update_plan(&self, plan: &mut PlanState<'_>) {
        let amount = plan.own.science.knowledge * self.fraction;
        plan.add_command(plan.id(), CommandPayload::PublishKnowledge { amount });
    }
}

/// Remember every target contacted this episode
pub struct RecordRecentlySentCommand;

impl Behavior for RecordRecentlySentCommand {
    fn update_plan(&self, plan: &mut PlanState<'_>) {
        let targets: Vec<PlayerId> = plan.contacted().collect();
        if !targets.is_empty() {
            plan.add_command(plan.id(), CommandPayload::RecordContacts { targets });
        }
    }
}
