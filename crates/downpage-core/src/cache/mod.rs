//! In-memory response cache with time-to-live expiry.
//!
//! Entries are keyed by the fully resolved request URL and expire after a
//! fixed TTL. Time comes from a [`Clock`] so expiry can be driven by hand in
//! tests. A periodic housekeeping task sweeps expired entries.

mod clock;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{spawn_housekeeping, CacheEntry, CacheStats, TtlCache};
