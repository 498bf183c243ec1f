//! # Identity Allocator
//!
//! Assigns display names to newly connected guests. Names are cosmetic only:
//! collisions are possible and harmless, participants are keyed by id.

use lib_core::dto::Participant;
use rand::Rng;

/// Prefix for guest display names.
pub const GUEST_PREFIX: &str = "Guest";

/// Default exclusive upper bound for the numeric suffix.
pub const DEFAULT_GUEST_RANGE: u32 = 1000;

#[derive(Debug, Clone)]
pub struct IdentityAllocator {
    prefix: String,
    range: u32,
}

impl IdentityAllocator {
    pub fn new(prefix: impl Into<String>, range: u32) -> Self {
        Self {
            prefix: prefix.into(),
            range: range.max(1),
        }
    }

    /// Produce a display name: prefix followed by a random number in `0..range`.
    pub fn allocate(&self) -> String {
        let suffix = rand::thread_rng().gen_range(0..self.range);
        format!("{}{}", self.prefix, suffix)
    }

    /// Produce a fresh human participant with an allocated display name.
    pub fn allocate_participant(&self) -> Participant {
        Participant::human(self.allocate())
    }
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new(GUEST_PREFIX, DEFAULT_GUEST_RANGE)
    }
}
