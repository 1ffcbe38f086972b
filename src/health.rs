//! Health Monitor
//!
//! Three probes of increasing strictness over the store adapter:
//! - liveness: store ping only
//! - readiness: ping plus at least one employee record present
//! - detailed: ping latency and record/set counts per component
//!
//! Report types serialize directly into the HTTP response bodies.

use std::time::Instant;

use serde::Serialize;

use crate::store::keys::{EMPLOYEE_KEY_PATTERN, SKILL_KEY_PATTERN};
use crate::store::{Store, StoreError};

/// Readiness probe result.
#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    #[serde(skip)]
    pub ready: bool,
    pub employees_available: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Store connectivity component of the detailed report.
#[derive(Debug, Clone, Serialize)]
pub struct StoreComponent {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Key-count component of the detailed report.
#[derive(Debug, Clone, Serialize)]
pub struct CountComponent {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CountComponent {
    fn from_result(result: Result<usize, StoreError>) -> Self {
        match result {
            Ok(count) => Self {
                status: "ok",
                count: Some(count),
                error: None,
            },
            Err(e) => Self {
                status: "error",
                count: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Detailed diagnostic report.
///
/// `healthy` tracks the store ping alone; a count-retrieval failure is
/// reported in its component without flipping the overall status.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealth {
    #[serde(skip)]
    pub healthy: bool,
    pub store: StoreComponent,
    pub employees: CountComponent,
    pub skill_sets: CountComponent,
}

/// Computes health probes against the store.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    store: Store,
}

impl HealthMonitor {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Liveness: healthy iff the store answers a ping. No data requirement.
    pub async fn liveness(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    /// Readiness: the store answers a ping AND at least one employee
    /// record exists.
    pub async fn readiness(&self) -> Readiness {
        if let Err(e) = self.store.ping().await {
            return Readiness {
                ready: false,
                employees_available: 0,
                reason: Some(e.to_string()),
            };
        }

        match self.store.scan_keys(EMPLOYEE_KEY_PATTERN).await {
            Ok(keys) if keys.is_empty() => Readiness {
                ready: false,
                employees_available: 0,
                reason: Some("no employee records loaded".to_string()),
            },
            Ok(keys) => Readiness {
                ready: true,
                employees_available: keys.len(),
                reason: None,
            },
            Err(e) => Readiness {
                ready: false,
                employees_available: 0,
                reason: Some(e.to_string()),
            },
        }
    }

    /// Detailed diagnostics: ping round-trip latency plus employee-record
    /// and skill-set key counts.
    pub async fn detailed(&self) -> DetailedHealth {
        let start = Instant::now();
        let ping = self.store.ping().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let store = match ping {
            Ok(()) => StoreComponent {
                status: "connected",
                response_time_ms: Some(elapsed_ms),
                error: None,
            },
            Err(ref e) => StoreComponent {
                status: "disconnected",
                response_time_ms: None,
                error: Some(e.to_string()),
            },
        };

        let employees = CountComponent::from_result(
            self.store
                .scan_keys(EMPLOYEE_KEY_PATTERN)
                .await
                .map(|keys| keys.len()),
        );
        let skill_sets = CountComponent::from_result(
            self.store
                .scan_keys(SKILL_KEY_PATTERN)
                .await
                .map(|keys| keys.len()),
        );

        DetailedHealth {
            healthy: ping.is_ok(),
            store,
            employees,
            skill_sets,
        }
    }
}
