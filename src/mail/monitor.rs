//! Background SMTP connectivity check.
//!
//! Runs independently of request handling. Each tick makes up to
//! `1 + max_retries` connection attempts and records the outcome in a shared
//! [`ProviderHealth`] that the health endpoint reads.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use lettre::Address;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::{interval, sleep, MissedTickBehavior};

use super::Mailer;
use crate::config::HealthCheckSettings;
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    #[default]
    Unknown,
    Reachable,
    Unreachable,
}

/// Last known provider reachability
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderStatus {
    pub state: ProviderState,
    pub last_checked: Option<DateTime<Utc>>,
    /// Failed checks in a row. Reset by a successful one.
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

/// Shared, read-mostly view of the provider status
#[derive(Debug, Clone, Default)]
pub struct ProviderHealth {
    inner: Arc<RwLock<ProviderStatus>>,
}

impl ProviderHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProviderStatus {
        match self.inner.read() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut ProviderStatus)) {
        let mut status = match self.inner.write() {
            Ok(status) => status,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut status);
    }

    fn record_success(&self) {
        self.update(|status| {
            status.state = ProviderState::Reachable;
            status.last_checked = Some(Utc::now());
            status.consecutive_failures = 0;
            status.last_error = None;
        });
    }

    fn record_failure(&self, error: String) {
        self.update(|status| {
            status.state = ProviderState::Unreachable;
            status.last_checked = Some(Utc::now());
            status.consecutive_failures = status.consecutive_failures.saturating_add(1);
            status.last_error = Some(error);
        });
    }
}

struct SelfTest {
    recipient: Address,
    renderer: Arc<Renderer>,
}

/// Supervised periodic connectivity check
pub struct ProviderMonitor {
    mailer: Mailer,
    health: ProviderHealth,
    settings: HealthCheckSettings,
    self_test: Option<SelfTest>,
}

impl ProviderMonitor {
    pub fn new(mailer: Mailer, health: ProviderHealth, settings: HealthCheckSettings) -> Self {
        Self {
            mailer,
            health,
            settings,
            self_test: None,
        }
    }

    /// Send one test mail to `recipient` after the first successful check.
    pub fn with_self_test(mut self, recipient: Address, renderer: Arc<Renderer>) -> Self {
        self.self_test = Some(SelfTest {
            recipient,
            renderer,
        });
        self
    }

    /// Run one check, retrying up to `max_retries` times before giving up.
    pub async fn check(&self) -> ProviderState {
        let attempts = self.settings.max_retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.mailer.verify().await {
                Ok(()) => {
                    self.health.record_success();
                    tracing::info!(attempt, "SMTP provider reachable");
                    return ProviderState::Reachable;
                }
                Err(e) => {
                    tracing::warn!(attempt, attempts, error = %e, "SMTP connectivity check failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        sleep(self.settings.retry_delay).await;
                    }
                }
            }
        }

        tracing::error!(attempts, error = %last_error, "SMTP provider unreachable");
        self.health.record_failure(last_error);
        ProviderState::Unreachable
    }

    /// Check every `interval` until a shutdown message arrives or the sender is dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        if self.settings.interval.is_zero() {
            tracing::info!("SMTP connectivity check disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            max_retries = self.settings.max_retries,
            "SMTP connectivity check started"
        );

        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Shutdown also cancels a check that is still waiting on the provider.
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = self.tick() => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Stopping SMTP connectivity check");
    }

    async fn tick(&mut self) {
        if self.check().await == ProviderState::Reachable {
            if let Some(self_test) = self.self_test.take() {
                self.send_self_test(self_test).await;
            }
        }
    }

    async fn send_self_test(&self, self_test: SelfTest) {
        let email = match self_test.renderer.render_self_test(Utc::now()) {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render self-test mail");
                return;
            }
        };

        match self.mailer.deliver(&self_test.recipient, email).await {
            Ok(receipt) => tracing::info!(
                to = %self_test.recipient,
                message_id = %receipt.message_id,
                "Self-test mail sent"
            ),
            Err(e) => tracing::error!(
                to = %self_test.recipient,
                error = %e,
                "Self-test mail failed"
            ),
        }
    }
}
