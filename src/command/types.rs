//! Command, payload and rejection types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{PlayerId, Tick, Velocity};

/// Tag identifying a command variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandKind {
    ChangeVelocity,
    SendFuel,
    SpawnSubordinate,
    Dissolve,
    DeclareIndependence,
    RecordContacts,
    PublishKnowledge,
}

impl CommandKind {
    /// Global-scope commands mutate universe-wide data instead of `to_id`
    pub fn is_global(&self) -> bool {
        matches!(self, CommandKind::PublishKnowledge)
    }
}

/// What a command does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CommandPayload {
    /// Steer the target toward a new velocity, paid from its movement fuel
    ChangeVelocity { target_velocity: Velocity },
    /// Move fuel from the issuer's trade pool into the target's storage
    SendFuel { amount: f64 },
    /// Split off a new subordinate carrying `fuel` in storage
    SpawnSubordinate { fuel: f64 },
    /// Mark the target dead
    Dissolve,
    /// Leave the target, which must be the issuer's direct leader
    DeclareIndependence,
    /// Remember that the listed players were just contacted
    RecordContacts { targets: Vec<PlayerId> },
    /// Move knowledge from the issuer into the shared pool
    PublishKnowledge { amount: f64 },
}

impl CommandPayload {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandPayload::ChangeVelocity { .. } => CommandKind::ChangeVelocity,
            CommandPayload::SendFuel { .. } => CommandKind::SendFuel,
            CommandPayload::SpawnSubordinate { .. } => CommandKind::SpawnSubordinate,
            CommandPayload::Dissolve => CommandKind::Dissolve,
            CommandPayload::DeclareIndependence => CommandKind::DeclareIndependence,
            CommandPayload::RecordContacts { .. } => CommandKind::RecordContacts,
            CommandPayload::PublishKnowledge { .. } => CommandKind::PublishKnowledge,
        }
    }
}

/// A command from one player to another (or to itself)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub from_id: PlayerId,
    pub to_id: PlayerId,
    /// Universe time the command was issued at
    pub issued_at: Tick,
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(from_id: PlayerId, to_id: PlayerId, issued_at: Tick, payload: CommandPayload) -> Self {
        Self {
            from_id,
            to_id,
            issued_at,
            payload,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.payload.kind()
    }

    /// Convenience: steer `to_id`
    pub fn change_velocity(from: PlayerId, to: PlayerId, at: Tick, target_velocity: Velocity) -> Self {
        Self::new(from, to, at, CommandPayload::ChangeVelocity { target_velocity })
    }

    /// Convenience: send fuel
    pub fn send_fuel(from: PlayerId, to: PlayerId, at: Tick, amount: f64) -> Self {
        Self::new(from, to, at, CommandPayload::SendFuel { amount })
    }

    /// Convenience: dissolve a player
    pub fn dissolve(from: PlayerId, to: PlayerId, at: Tick) -> Self {
        Self::new(from, to, at, CommandPayload::Dissolve)
    }
}

/// Why a command was dropped
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("target {0} does not exist")]
    UnknownTarget(PlayerId),

    #[error("target {0} is dead")]
    TargetDead(PlayerId),

    #[error("issuer {0} does not exist")]
    UnknownIssuer(PlayerId),

    #[error("issuer {0} is dead")]
    IssuerDead(PlayerId),

    #[error("command from {from} submitted under {key}")]
    IssuerMismatch { key: PlayerId, from: PlayerId },

    #[error("{from} has no standing to send {kind:?} to {to}")]
    Unauthorized {
        kind: CommandKind,
        from: PlayerId,
        to: PlayerId,
    },

    #[error("insufficient {pool}: needs {needed}, has {available}")]
    InsufficientResources {
        pool: String,
        needed: f64,
        available: f64,
    },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Where a command entered the pipeline from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOrigin {
    /// Human intake or the decision engine
    Planned,
    /// Follow-up issued by a mechanism
    Mechanism,
}

/// A command that failed validation, kept for the tick report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedCommand {
    pub command: Command,
    pub reason: RejectReason,
    pub origin: CommandOrigin,
}
