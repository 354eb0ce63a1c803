pub mod codec;
pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod types;
