//! Structural encode/decode helpers
//!
//! Every persisted or transmitted kernel entity derives serde traits.
//! A deep copy through JSON guarantees the copy shares nothing with the
//! original, which is how checkpoints and exported views are isolated
//! from canonical state.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::error::Result;

pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn decode<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    Ok(serde_json::from_str(encoded)?)
}

/// Copy a value by encoding then decoding it
pub fn deep_copy<T: Serialize + DeserializeOwned>(value: &T) -> Result<T> {
    decode(&encode(value)?)
}
