//! Step driver and batch output

pub mod driver;
pub mod output;

pub use driver::{Checkpoint, StepDriver, StepPhase};
pub use output::SimulationOutput;
