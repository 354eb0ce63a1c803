//! Spacetime visibility: light delay, dilation and per-observer views

pub mod light;
pub mod resolver;

pub use light::{dilation_factor, gamma, int_delay};
pub use resolver::{resolve_view, LastSeen, VisibilityResolver};
