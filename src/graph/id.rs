//! Actor identity.
//!
//! `ActorId` is a `u32` newtype handed out monotonically by the actor system.
//! Ids are never reused, so a stale id cannot alias a newer actor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Opaque, stable handle of an actor instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl ActorId {
    pub const INVALID: ActorId = ActorId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "ActorId(INVALID)")
        } else {
            write!(f, "ActorId({})", self.0)
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Hands out fresh ids.
#[derive(Debug, Default)]
pub struct ActorIdAllocator {
    next: AtomicU32,
}

impl ActorIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `first`.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// A fresh id, or `None` once every valid id has been handed out.
    pub fn next_id(&self) -> Option<ActorId> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                n.checked_add(1).filter(|_| ActorId(n).is_valid())
            })
            .ok()
            .map(ActorId)
    }
}
