//! Player id allocation
//!
//! One allocator exists per simulation instance. The mutex is the only
//! lock on the hot path; the critical section is increment-and-read.

use std::sync::Mutex;

use crate::core::types::PlayerId;

#[derive(Debug)]
pub struct IdAllocator {
    next: Mutex<u64>,
}

impl IdAllocator {
    /// Allocator whose first id is `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Mutex::new(first),
        }
    }

    /// Allocator continuing after the largest id already in use
    pub fn after<'a>(ids: impl IntoIterator<Item = &'a PlayerId>) -> Self {
        let next = ids.into_iter().map(|id| id.0 + 1).max().unwrap_or(0);
        Self::starting_at(next)
    }

    /// Generate a new unique PlayerId
    pub fn allocate(&self) -> PlayerId {
        // A poisoned lock still holds a valid counter
        let mut next = self.next.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = PlayerId(*next);
        *next += 1;
        id
    }

    /// The id the next call to [`allocate`](Self::allocate) will return
    pub fn peek(&self) -> PlayerId {
        let next = self.next.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        PlayerId(*next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::starting_at(0)
    }
}
