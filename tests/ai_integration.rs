//! Integration tests for the utility decision engine

use std::collections::BTreeMap;

use lightcone::ai::node::PlainValue;
use lightcone::ai::{Behavior, DualUtilityOption, Node, PlanState};
use lightcone::command::CommandPayload;
use lightcone::core::config::{GenerateSettings, UniverseSettings};
use lightcone::core::rng::{agent_rng, Stream};
use lightcone::core::types::{Int4D, PlayerId};
use lightcone::simulation::StepDriver;
use lightcone::universe::{AgentView, PlayerData, PlayerType};
use proptest::prelude::*;

/// Publishes `amount` so the chosen option shows up in the plan
struct Marker(f64);

impl Behavior for Marker {
    fn update_plan(&self, plan: &mut PlanState<'_>) {
        plan.add_command(plan.id(), CommandPayload::PublishKnowledge { amount: self.0 });
    }
}

struct TwoOptions {
    low: (f64, f64),
    high_multiplier: f64,
}

impl lightcone::ai::DualUtilityReasoner for TwoOptions {
    fn options(&self, _plan: &PlanState<'_>) -> Vec<DualUtilityOption> {
        vec![
            DualUtilityOption::new("low_rank", Node::leaf(Marker(1.0)))
                .with(PlainValue::new(1, self.low.0, self.low.1)),
            DualUtilityOption::new("high_rank", Node::leaf(Marker(5.0)))
                .with(PlainValue::new(5, self.high_multiplier, 0.0)),
        ]
    }
}

fn chosen_amounts(tree: &Node, seed: u64) -> Vec<f64> {
    let mut own = PlayerData::new(PlayerId(0), PlayerType::Ai, Int4D::default());
    own.science.knowledge = 10.0;
    let view = AgentView::solitary(own, 0);
    let settings = UniverseSettings::default();
    let mut plan = PlanState::new(&view, &settings, agent_rng(seed, Stream::Planning, 0, PlayerId(0)));
    tree.update_plan(&mut plan);
    plan.into_commands()
        .into_iter()
        .filter_map(|c| match c.payload {
            CommandPayload::PublishKnowledge { amount } => Some(amount),
            _ => None,
        })
        .collect()
}

proptest! {
    /// A viable higher-rank option wins whatever the lower rank scores
    #[test]
    fn rank_preempts_score(
        low_multiplier in 0.0f64..1e6,
        low_bonus in 0.0f64..1e6,
        high_multiplier in 1e-6f64..1.0,
        seed in any::<u64>(),
    ) {
        let tree = Node::dual_utility(TwoOptions {
            low: (low_multiplier, low_bonus),
            high_multiplier,
        });
        prop_assert_eq!(chosen_amounts(&tree, seed), vec![5.0]);
    }
}

#[test]
fn test_no_op_ai_leaves_universe_untouched() {
    let mut settings = GenerateSettings::default();
    settings.universe.ai = "none".to_string();
    settings.universe.mechanism_collection = "empty".to_string();
    let mut driver = StepDriver::generate(&settings).unwrap();
    let initial = driver.players().clone();

    for _ in 0..10 {
        let report = driver.advance_tick(BTreeMap::new());
        assert_eq!(report.planned, 0);
        assert_eq!(report.applied, 0);
        assert_eq!(report.mechanism_commands, 0);
    }

    assert_eq!(driver.time(), 10);
    for (id, before) in &initial {
        let mut after = driver.player(*id).unwrap().clone();
        assert_eq!(after.int4d.t, 10);
        after.set_time(before.int4d.t);
        after.proper_time = before.proper_time;
        after.dilation_residue = before.dilation_residue;
        assert_eq!(&after, before);
    }
}

#[test]
fn test_default_ai_acts_in_random_universe() {
    let mut driver = StepDriver::generate(&GenerateSettings::default()).unwrap();
    let reports = driver.run(10);
    let planned: usize = reports.iter().map(|r| r.planned).sum();
    assert!(planned > 0);
    assert!(reports.iter().any(|r| !r.spawned.is_empty()));
    // Generated leaders start at the cap; spawning never exceeds it
    let cap = driver.settings().constants.max_direct_subordinates;
    for p in driver.players().values() {
        assert!(p.direct_subordinate_ids.len() <= cap);
    }
}
