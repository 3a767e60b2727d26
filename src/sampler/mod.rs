//! Host telemetry sampling
//!
//! A [`Sampler`] produces one [`Snapshot`] per call. Sampling never fails as a
//! whole: a reading that cannot be taken degrades to a zero or fallback value
//! and the rest of the snapshot is still delivered.

pub mod network;
pub mod system;

use async_trait::async_trait;

use crate::Snapshot;

pub use system::SystemSampler;

#[async_trait]
pub trait Sampler: Send {
    /// Take one snapshot of the host.
    async fn sample(&mut self) -> Snapshot;
}
