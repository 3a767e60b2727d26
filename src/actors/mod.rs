//! Actor-based broadcast pipeline
//!
//! Each actor runs as an independent async task communicating via Tokio channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌──────────────────┐  tick   ┌─────────┐   snapshot   ┌────────────────┐
//!   │  SamplingDriver  │ ──────► │ Sampler │ ───────────► │ AlertEvaluator │
//!   └────────┬─────────┘         └─────────┘              └───────┬────────┘
//!            │  snapshot + alerts                                 │
//!            ▼                                                    │
//!   ┌──────────────────┐ ◄────────────────────────────────────────┘
//!   │    HubActor      │  serialize once
//!   └────────┬─────────┘
//!            │ try_send (bounded queue per subscriber)
//!     ┌──────┼──────────────┐
//!     ▼      ▼              ▼
//!   ws-1   ws-2    ...    ws-N
//! ```
//!
//! ## Actor Types
//!
//! - **HubActor**: Fans each published snapshot out to every registered subscriber
//! - **SamplingDriver**: Samples on a fixed interval, evaluates alerts and publishes
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: The hub has an mpsc command channel for publish and shutdown
//! 2. **Request/Response**: oneshot channels report the outcome of a publish
//! 3. **Fan-out**: bounded per-subscriber queues, a subscriber that cannot keep up is dropped

pub mod driver;
pub mod hub;
pub mod messages;
