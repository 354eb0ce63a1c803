//! Lightcone - multi-agent simulation in a light-delayed 4D spacetime

pub mod ai;
pub mod command;
pub mod core;
pub mod mechanism;
pub mod simulation;
pub mod universe;
pub mod visibility;
