//! Planning state for one episode of one agent

use std::collections::BTreeSet;

use rand_chacha::ChaCha8Rng;

use crate::command::effects;
use crate::command::types::{Command, CommandPayload};
use crate::core::config::UniverseSettings;
use crate::core::types::{PlayerId, Tick};
use crate::universe::player::PlayerData;
use crate::universe::view::AgentView;

/// Commands being assembled during one planning episode
///
/// `own` starts as a copy of the observer's record; issuer-side send
/// effects are charged to it as commands are added, so later nodes see
/// the fuel already spent by earlier ones.
pub struct PlanState<'a> {
    pub view: &'a AgentView,
    pub settings: &'a UniverseSettings,
    pub own: PlayerData,
    pub rng: ChaCha8Rng,
    commands: Vec<Command>,
    contacted: BTreeSet<PlayerId>,
}

impl<'a> PlanState<'a> {
    pub fn new(view: &'a AgentView, settings: &'a UniverseSettings, rng: ChaCha8Rng) -> Self {
        Self {
            view,
            settings,
            own: view.own.clone(),
            rng,
            commands: Vec::new(),
            contacted: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.own.id
    }

    pub fn time(&self) -> Tick {
        self.view.time
    }

    /// Queue a command from this agent
    ///
    /// Returns `false`, queueing nothing, when the payload is malformed
    /// or the agent cannot afford to send it.
    pub fn add_command(&mut self, to_id: PlayerId, payload: CommandPayload) -> bool {
        if effects::check_payload(&payload).is_err()
            || effects::check_send(&payload, &self.own, self.settings).is_err()
        {
            return false;
        }
        effects::execute_send(&payload, &mut self.own);

        if to_id != self.own.id {
            self.contacted.insert(to_id);
        }
        self.commands
            .push(Command::new(self.own.id, to_id, self.time(), payload));
        true
    }

    /// Was `target` contacted this episode or within the contact window?
    pub fn is_command_sent_recently(&self, target: PlayerId) -> bool {
        self.contacted.contains(&target)
            || self.own.ai_data.contacted_within(
                target,
                self.time(),
                self.settings.constants.recent_contact_window,
            )
    }

    /// Targets contacted so far this episode, in id order
    pub fn contacted(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.contacted.iter().copied()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}
