//! Universe state: players, history, views and generation

pub mod generation;
pub mod global;
pub mod hierarchy;
pub mod history;
pub mod player;
pub mod state;
pub mod view;

pub use generation::{InitialUniverse, UniverseGenerator};
pub use global::GlobalData;
pub use history::{UniverseHistory, UniverseSlice};
pub use player::{PlayerData, PlayerType};
pub use state::UniverseState;
pub use view::AgentView;
