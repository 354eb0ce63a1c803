//! Utility decision tree
//!
//! A tree is evaluated depth-first, left to right, once per planning
//! episode. Sequences run every child. Dual-utility reasoners pick at
//! most one option:
//!
//! 1. every consideration of an option yields `(rank, multiplier, bonus)`
//! 2. utility = product of multipliers + sum of bonuses; options with
//!    utility <= 0 are discarded
//! 3. only options at the highest rank among the rest compete
//! 4. the highest utility wins; ties are drawn with the plan's rng
//!
//! A do-nothing option (rank 0, utility 1) is always added, so a
//! reasoner never fails to choose.

use ordered_float::OrderedFloat;
use rand::Rng;

use crate::ai::plan::PlanState;

/// Terminal node: appends zero or more commands to the plan
pub trait Behavior: Send + Sync {
    fn update_plan(&self, plan: &mut PlanState<'_>);
}

/// Builds the options of a dual-utility reasoner from the current plan
pub trait DualUtilityReasoner: Send + Sync {
    fn options(&self, plan: &PlanState<'_>) -> Vec<DualUtilityOption>;
}

/// Scores one aspect of an option
pub trait Consideration: Send + Sync {
    fn evaluate(&self, plan: &PlanState<'_>) -> DualUtilityData;
}

/// One consideration's contribution to an option score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualUtilityData {
    pub rank: i32,
    pub multiplier: f64,
    pub bonus: f64,
}

impl DualUtilityData {
    pub fn new(rank: i32, multiplier: f64, bonus: f64) -> Self {
        Self {
            rank,
            multiplier,
            bonus,
        }
    }

    /// No effect on the option's score
    pub fn neutral() -> Self {
        Self::new(0, 1.0, 0.0)
    }

    /// Makes the option non-viable whatever else contributes
    pub fn veto() -> Self {
        Self::new(0, 0.0, f64::NEG_INFINITY)
    }
}

/// Folded score of one option
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionScore {
    pub rank: i32,
    pub utility: f64,
}

impl OptionScore {
    pub fn fold(data: impl IntoIterator<Item = DualUtilityData>) -> Self {
        let mut rank = 0;
        let mut product = 1.0;
        let mut bonus = 0.0;
        for d in data {
            rank = rank.max(d.rank);
            product *= d.multiplier;
            bonus += d.bonus;
        }
        Self {
            rank,
            utility: product + bonus,
        }
    }

    pub fn is_viable(&self) -> bool {
        self.utility > 0.0
    }
}

/// A tree node
pub enum Node {
    Leaf(Box<dyn Behavior>),
    Sequence(Vec<Node>),
    DualUtility(Box<dyn DualUtilityReasoner>),
}

impl Node {
    pub fn leaf(behavior: impl Behavior + 'static) -> Self {
        Node::Leaf(Box::new(behavior))
    }

    pub fn dual_utility(reasoner: impl DualUtilityReasoner + 'static) -> Self {
        Node::DualUtility(Box::new(reasoner))
    }

    pub fn update_plan(&self, plan: &mut PlanState<'_>) {
        match self {
            Node::Leaf(behavior) => behavior.update_plan(plan),
            Node::Sequence(children) => {
                for child in children {
                    child.update_plan(plan);
                }
            }
            Node::DualUtility(reasoner) => {
                let mut options = reasoner.options(plan);
                options.push(DualUtilityOption::do_nothing());
                if let Some(index) = select_option(&options, plan) {
                    tracing::trace!(
                        "{} at t={} chose {}",
                        plan.id(),
                        plan.time(),
                        options[index].name
                    );
                    options[index].node.update_plan(plan);
                }
            }
        }
    }
}

/// A mutually exclusive choice inside a dual-utility reasoner
pub struct DualUtilityOption {
    pub name: String,
    pub considerations: Vec<Box<dyn Consideration>>,
    pub node: Node,
}

impl DualUtilityOption {
    pub fn new(name: impl Into<String>, node: Node) -> Self {
        Self {
            name: name.into(),
            considerations: Vec::new(),
            node,
        }
    }

    pub fn with(mut self, consideration: impl Consideration + 'static) -> Self {
        self.considerations.push(Box::new(consideration));
        self
    }

    /// Rank 0, utility 1, no commands
    pub fn do_nothing() -> Self {
        Self::new("do_nothing", Node::leaf(DoNothing)).with(PlainValue::new(0, 1.0, 0.0))
    }

    pub fn score(&self, plan: &PlanState<'_>) -> OptionScore {
        OptionScore::fold(self.considerations.iter().map(|c| c.evaluate(plan)))
    }
}

/// Index of the winning option, `None` only if nothing is viable
pub fn select_option(options: &[DualUtilityOption], plan: &mut PlanState<'_>) -> Option<usize> {
    let scores: Vec<(usize, OptionScore)> = options
        .iter()
        .enumerate()
        .map(|(i, option)| (i, option.score(plan)))
        .filter(|(_, score)| score.is_viable())
        .collect();

    let top_rank = scores.iter().map(|(_, s)| s.rank).max()?;
    let best = scores
        .iter()
        .filter(|(_, s)| s.rank == top_rank)
        .map(|(_, s)| OrderedFloat(s.utility))
        .max()?;
    let tied: Vec<usize> = scores
        .iter()
        .filter(|(_, s)| s.rank == top_rank && OrderedFloat(s.utility) == best)
        .map(|(i, _)| *i)
        .collect();

    match tied.len() {
        0 => None,
        1 => Some(tied[0]),
        n => Some(tied[plan.rng.gen_range(0..n)]),
    }
}

/// Leaf that issues nothing
pub struct DoNothing;

impl Behavior for DoNothing {
    fn update_plan(&self, _plan: &mut PlanState<'_>) {}
}

/// Consideration with a fixed contribution
#[derive(Debug, Clone, Copy)]
pub struct PlainValue(pub DualUtilityData);

impl PlainValue {
    pub fn new(rank: i32, multiplier: f64, bonus: f64) -> Self {
        Self(DualUtilityData::new(rank, multiplier, bonus))
    }
}

impl Consideration for PlainValue {
    fn evaluate(&self, _plan: &PlanState<'_>) -> DualUtilityData {
        self.0
    }
}
