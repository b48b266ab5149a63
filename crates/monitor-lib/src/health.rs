//! Component health behind `/healthz` and `/readyz`
//!
//! The collection loop reports every collector and store outcome here. One
//! failure degrades a component; [`UNHEALTHY_AFTER_FAILURES`] failures in a
//! row, or a failure the component cannot come back from, mark it unhealthy.
//! An unhealthy component turns `/healthz` into a 503 and takes the monitor
//! out of readiness until a later success clears it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

/// Consecutive failures after which a degraded component becomes unhealthy
pub const UNHEALTHY_AFTER_FAILURES: u32 = 3;

/// Component names for health tracking
pub mod components {
    pub const COLLECTOR: &str = "collector";
    pub const METRIC_STORE: &str = "metric_store";
    pub const BASELINE_STORE: &str = "baseline_store";

    /// Every component the monitor registers at startup
    pub const ALL: [&str; 3] = [COLLECTOR, METRIC_STORE, BASELINE_STORE];
}

/// Severity-ordered status: `Healthy < Degraded < Unhealthy`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Recent operations failed but the monitor still serves requests
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    /// Text of the last failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub consecutive_failures: u32,
    pub last_check_timestamp: i64,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            consecutive_failures: 0,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Health after `failures` failed operations in a row
    fn failing(message: String, failures: u32) -> Self {
        let status = if failures >= UNHEALTHY_AFTER_FAILURES {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Degraded
        };

        Self {
            status,
            message: Some(message),
            consecutive_failures: failures,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status among `components`, healthy when there are none
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|h| h.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReadinessResponse {
    fn not_ready(reason: impl Into<String>) -> Self {
        Self {
            ready: false,
            reason: Some(reason.into()),
        }
    }
}

/// Shared, cloneable view of component health
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    /// Register every monitor component as healthy
    pub async fn register_all(&self) {
        let mut registered = self.components.write().await;
        for name in components::ALL {
            registered.insert(name.to_string(), ComponentHealth::healthy());
        }
    }

    /// Record the outcome of an operation against `name`.
    ///
    /// Success clears the failure count. Each failure degrades the component
    /// and the [`UNHEALTHY_AFTER_FAILURES`]th one in a row marks it unhealthy.
    pub async fn report<T, E: std::fmt::Display>(&self, name: &str, outcome: &Result<T, E>) {
        let mut registered = self.components.write().await;
        let health = match outcome {
            Ok(_) => ComponentHealth::healthy(),
            Err(e) => {
                let failures = registered
                    .get(name)
                    .map_or(0, |h| h.consecutive_failures)
                    .saturating_add(1);
                if failures == UNHEALTHY_AFTER_FAILURES {
                    warn!(
                        component = %name,
                        failures = failures,
                        error = %e,
                        "Component unhealthy after repeated failures"
                    );
                }
                ComponentHealth::failing(e.to_string(), failures)
            }
        };
        registered.insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        let mut registered = self.components.write().await;
        registered.insert(name.to_string(), ComponentHealth::healthy());
    }

    /// Mark `name` unhealthy at once, for failures retries cannot fix
    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        let mut registered = self.components.write().await;
        let failures = registered
            .get(name)
            .map_or(0, |h| h.consecutive_failures)
            .saturating_add(1)
            .max(UNHEALTHY_AFTER_FAILURES);
        registered.insert(
            name.to_string(),
            ComponentHealth::failing(message.into(), failures),
        );
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Ready once startup finished and no component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        if !*self.ready.read().await {
            return ReadinessResponse::not_ready("Monitor not yet initialized");
        }

        let registered = self.components.read().await;
        let mut unhealthy: Vec<&str> = registered
            .iter()
            .filter(|(_, h)| h.status == ComponentStatus::Unhealthy)
            .map(|(name, _)| name.as_str())
            .collect();

        if unhealthy.is_empty() {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        } else {
            unhealthy.sort_unstable();
            ReadinessResponse::not_ready(format!("Unhealthy: {}", unhealthy.join(", ")))
        }
    }
}
