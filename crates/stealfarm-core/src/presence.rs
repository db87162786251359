//! Which players are connected right now.
//!
//! Notices for an online player go out immediately; anything raised while
//! a player is away waits in the store until their next join.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use stealfarm_types::PlayerId;

/// Set of online players.
#[derive(Debug, Default)]
pub struct Presence {
    online: Mutex<HashSet<PlayerId>>,
}

impl Presence {
    /// Nobody online.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `player` online. Returns `false` if they already were.
    pub fn join(&self, player: PlayerId) -> bool {
        self.online
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player)
    }

    /// Mark `player` offline. Returns `false` if they were not online.
    pub fn leave(&self, player: PlayerId) -> bool {
        self.online
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player)
    }

    /// `true` while `player` is connected.
    pub fn is_online(&self, player: PlayerId) -> bool {
        self.online
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&player)
    }
}
