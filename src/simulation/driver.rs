//! Step driver: plan, commit, resolve, once per tick
//!
//! Each call to [`StepDriver::advance_tick`] runs
//! Idle -> Planning -> Committing -> Idle. Planning is the only parallel
//! phase: every AI agent plans against its own immutable view on the
//! driver's rayon pool, and plans are merged back in id order.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{self, PlayerAi};
use crate::command::pipeline::{CommandPipeline, TickReport};
use crate::command::types::Command;
use crate::core::codec;
use crate::core::config::{GenerateSettings, UniverseSettings};
use crate::core::error::Result;
use crate::core::ids::IdAllocator;
use crate::core::rng::{agent_rng, generation_rng, Stream};
use crate::core::types::{PlayerId, Tick};
use crate::mechanism::{self, MechanismCollection};
use crate::universe::generation::{self, InitialUniverse, UniverseGenerator};
use crate::universe::global::GlobalData;
use crate::universe::history::UniverseHistory;
use crate::universe::player::PlayerData;
use crate::universe::state::UniverseState;
use crate::universe::view::AgentView;
use crate::visibility::resolver::{LastSeen, VisibilityResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPhase {
    Idle,
    Planning,
    Committing,
}

/// Everything needed to resume a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub settings: UniverseSettings,
    pub state: UniverseState,
    pub last_seen: BTreeMap<PlayerId, LastSeen>,
    pub next_id: PlayerId,
}

#[derive(Serialize)]
struct CheckpointRef<'a> {
    settings: &'a UniverseSettings,
    state: &'a UniverseState,
    last_seen: BTreeMap<PlayerId, LastSeen>,
    next_id: PlayerId,
}

pub struct StepDriver {
    settings: UniverseSettings,
    state: UniverseState,
    views: BTreeMap<PlayerId, AgentView>,
    resolver: VisibilityResolver,
    ids: IdAllocator,
    ai: Box<dyn PlayerAi>,
    mechanisms: MechanismCollection,
    pool: rayon::ThreadPool,
    phase: StepPhase,
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("planner-{i}"))
        .build()?)
}

impl StepDriver {
    /// Commit the initial universe as the first slice and resolve views
    pub fn new(
        settings: UniverseSettings,
        initial: InitialUniverse,
        ai: Box<dyn PlayerAi>,
        mechanisms: MechanismCollection,
    ) -> Result<Self> {
        settings.validate()?;
        let state = UniverseState::from_initial(initial);
        let ids = IdAllocator::after(state.history.iter().flat_map(|s| s.players.keys()));
        Self::assemble(settings, state, VisibilityResolver::new(), ids, ai, mechanisms)
    }

    /// Generate a universe with the named generator, AI and mechanisms
    pub fn generate(settings: &GenerateSettings) -> Result<Self> {
        let generator = generation::from_name(&settings.generate_method)?;
        Self::generate_with(settings, generator.as_ref())
    }

    /// Generate with a caller-supplied generator
    pub fn generate_with(
        settings: &GenerateSettings,
        generator: &dyn UniverseGenerator,
    ) -> Result<Self> {
        settings.validate()?;
        let universe = &settings.universe;
        let initial = generator.generate(settings, &mut generation_rng(universe.seed))?;
        let ai = ai::from_name(&universe.ai)?;
        let mechanisms = mechanism::from_name(&universe.mechanism_collection)?;
        Self::new(universe.clone(), initial, ai, mechanisms)
    }

    /// Resume from a checkpoint
    pub fn restore(
        checkpoint: Checkpoint,
        ai: Box<dyn PlayerAi>,
        mechanisms: MechanismCollection,
    ) -> Result<Self> {
        checkpoint.settings.validate()?;
        let resolver = VisibilityResolver::from_snapshot(checkpoint.last_seen);
        let ids = IdAllocator::starting_at(checkpoint.next_id.0);
        Self::assemble(
            checkpoint.settings,
            checkpoint.state,
            resolver,
            ids,
            ai,
            mechanisms,
        )
    }

    fn assemble(
        settings: UniverseSettings,
        state: UniverseState,
        mut resolver: VisibilityResolver,
        ids: IdAllocator,
        ai: Box<dyn PlayerAi>,
        mechanisms: MechanismCollection,
    ) -> Result<Self> {
        let pool = build_pool(settings.planning_threads)?;
        let views = resolver.resolve_all(&state.history, &settings);

        tracing::info!(
            "Universe '{}' at t={}: {} players, ai={}, mechanisms={:?}",
            settings.universe_name,
            state.time,
            state.players.len(),
            ai.name(),
            mechanisms,
        );

        Ok(Self {
            settings,
            state,
            views,
            resolver,
            ids,
            ai,
            mechanisms,
            pool,
            phase: StepPhase::Idle,
        })
    }

    /// Plan every AI agent, run the pipeline, resolve the new views
    ///
    /// `human_commands` are appended after any planned commands of the
    /// same issuer.
    pub fn advance_tick(&mut self, human_commands: BTreeMap<PlayerId, Vec<Command>>) -> TickReport {
        self.phase = StepPhase::Planning;
        let mut commands = self.plan();
        for (id, list) in human_commands {
            commands.entry(id).or_default().extend(list);
        }

        self.phase = StepPhase::Committing;
        let pipeline = CommandPipeline::new(&self.settings, &self.mechanisms, &self.ids);
        let report = pipeline.run_tick(&mut self.state, &self.views, commands);
        self.views = self.resolver.resolve_all(&self.state.history, &self.settings);
        self.phase = StepPhase::Idle;

        tracing::info!(
            "t={} -> {}: {} players, {} planned, {} applied, {} dropped, {} spawned, {} removed",
            report.time,
            self.state.time,
            self.state.players.len(),
            report.planned,
            report.applied,
            report.dropped_count(),
            report.spawned.len(),
            report.removed.len(),
        );
        report
    }

    /// Advance `ticks` times with no human commands
    pub fn run(&mut self, ticks: usize) -> Vec<TickReport> {
        (0..ticks).map(|_| self.advance_tick(BTreeMap::new())).collect()
    }

    /// Plans of every AI agent for the current tick, keyed by agent
    ///
    /// Agents that plan nothing have no entry.
    pub fn plan(&self) -> BTreeMap<PlayerId, Vec<Command>> {
        let time = self.state.time;
        let seed = self.settings.seed;
        let planners: Vec<&AgentView> = self.views.values().filter(|v| v.own.is_ai()).collect();

        let planned: Vec<(PlayerId, Vec<Command>)> = self.pool.install(|| {
            planners
                .par_iter()
                .map(|view| {
                    let rng = agent_rng(seed, Stream::Planning, time, view.observer_id);
                    let commands = self.ai.compute(view, &self.settings, rng);
                    tracing::trace!(
                        "{} planned {} commands at t={}",
                        view.observer_id,
                        commands.len(),
                        time
                    );
                    (view.observer_id, commands)
                })
                .collect()
        });

        planned
            .into_iter()
            .filter(|(_, commands)| !commands.is_empty())
            .collect()
    }

    /// Isolated copy of the full simulation state
    pub fn checkpoint(&self) -> Result<Checkpoint> {
        let snapshot = CheckpointRef {
            settings: &self.settings,
            state: &self.state,
            last_seen: self.resolver.snapshot(),
            next_id: self.ids.peek(),
        };
        codec::decode(&codec::encode(&snapshot)?)
    }

    /// Isolated copy of one agent's current view
    pub fn export_view(&self, id: PlayerId) -> Result<Option<AgentView>> {
        self.views.get(&id).map(codec::deep_copy).transpose()
    }

    pub fn time(&self) -> Tick {
        self.state.time
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    pub fn settings(&self) -> &UniverseSettings {
        &self.settings
    }

    pub fn players(&self) -> &BTreeMap<PlayerId, PlayerData> {
        &self.state.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerData> {
        self.state.player(id)
    }

    pub fn global(&self) -> &GlobalData {
        &self.state.global
    }

    pub fn history(&self) -> &UniverseHistory {
        &self.state.history
    }

    pub fn view(&self, id: PlayerId) -> Option<&AgentView> {
        self.views.get(&id)
    }

    pub fn views(&self) -> &BTreeMap<PlayerId, AgentView> {
        &self.views
    }
}
