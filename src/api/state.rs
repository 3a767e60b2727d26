//! API shared state

use std::time::Duration;

use crate::actors::hub::HubHandle;
use crate::alerts::AlertEvaluator;

/// Shared state passed to all API handlers
///
/// Built once at startup from the same evaluator and hub the sampling driver
/// uses, so handlers and the driver always see one alerting state.
#[derive(Clone)]
pub struct ApiState {
    /// Alert evaluator for history and threshold configuration
    pub alerts: AlertEvaluator,

    /// Broadcast hub for WebSocket subscribers and the latest snapshot
    pub hub: HubHandle,

    /// Timeout for a single WebSocket write
    pub write_timeout: Duration,
}

impl ApiState {
    pub fn new(alerts: AlertEvaluator, hub: HubHandle, write_timeout: Duration) -> Self {
        Self {
            alerts,
            hub,
            write_timeout,
        }
    }
}
