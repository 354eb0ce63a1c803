//! Command pipeline
//!
//! Commands are typed, serializable instructions from one player to
//! another. Each tick they are validated against the canonical state,
//! applied one at a time, followed by the mechanism chain, and the
//! result is committed as a new history slice:
//! Collect -> Validate -> Apply -> Mechanize -> Commit

pub mod effects;
pub mod pipeline;
pub mod types;

pub use pipeline::{CommandPipeline, PipelineStage, TickReport};
pub use types::{Command, CommandKind, CommandOrigin, CommandPayload, DroppedCommand, RejectReason};
