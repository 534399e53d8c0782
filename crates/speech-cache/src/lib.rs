//! Disk-backed cache of synthesized speech
//!
//! Identical synthesis requests are served from previously generated audio.
//! Entries whose file vanished are dropped and regenerated, and the least
//! recently used audio is evicted once the cache grows past its byte budget.

mod cache;
mod error;
mod inflight;
pub mod normalize;
pub mod response;
mod types;

pub use cache::{cache_key, CacheManager};
pub use error::{Result, SynthesizerError};
pub use normalize::{normalize, NormalizedRequest};
pub use types::{CacheConfig, CacheOutcome, CacheStats, CacheStatus};
