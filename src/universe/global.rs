//! Universe-wide data, mutated only by global-scope commands

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalData {
    /// Knowledge published by players, readable by everyone
    pub shared_knowledge: f64,
    /// Number of publications applied so far
    pub publication_count: u64,
}

impl GlobalData {
    pub fn publish(&mut self, amount: f64) {
        self.shared_knowledge += amount;
        self.publication_count += 1;
    }
}
