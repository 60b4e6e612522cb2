//! Stand-in for real device callbacks.
//!
//! Draws random access events and device statuses and feeds them through
//! the same registry operations a real device integration would use. Runs
//! on demand (client `simulate_access` / `refresh_devices` requests) and on
//! optional periodic timers.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use fpd_core::{AccessLogEntry, Device, DeviceStatus};
use fpd_protocol::RawAccessEvent;

use crate::config::DaemonConfig;
use crate::registry::{RegistryError, RegistryHandle};

/// Names attached to simulated access events.
pub const SIMULATED_NAMES: [&str; 5] = [
    "John Doe",
    "Jane Smith",
    "Bob Wilson",
    "Alice Johnson",
    "Mike Brown",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulator {
    online_probability: f64,
    grant_probability: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::from_config(&DaemonConfig::default())
    }
}

impl Simulator {
    /// Probabilities are clamped into `[0, 1]`.
    pub fn new(online_probability: f64, grant_probability: f64) -> Self {
        Self {
            online_probability: clamp_probability(online_probability),
            grant_probability: clamp_probability(grant_probability),
        }
    }

    pub fn from_config(config: &DaemonConfig) -> Self {
        Self::new(config.online_probability, config.grant_probability)
    }

    /// Draws one access attempt: a known name, a `CARDnnn` card, and a
    /// weighted grant.
    pub fn draw_access_event<R: Rng + ?Sized>(&self, rng: &mut R) -> RawAccessEvent {
        let name = SIMULATED_NAMES.choose(&mut *rng).copied().unwrap_or("Unknown");
        let card = format!("CARD{:03}", rng.gen_range(0..1000));

        RawAccessEvent {
            user_name: Some(name.to_string()),
            card_id: Some(card),
            granted: rng.gen_bool(self.grant_probability),
        }
    }

    pub fn draw_device_status<R: Rng + ?Sized>(&self, rng: &mut R) -> DeviceStatus {
        if rng.gen_bool(self.online_probability) {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        }
    }

    /// Records one random access event.
    pub async fn simulate_access(
        &self,
        registry: &RegistryHandle,
    ) -> Result<AccessLogEntry, RegistryError> {
        let event = self.draw_access_event(&mut rand::thread_rng());
        registry.record_access(event).await
    }

    /// Draws a fresh status for every device and records each one.
    pub async fn refresh_devices(
        &self,
        registry: &RegistryHandle,
    ) -> Result<Vec<Device>, RegistryError> {
        let devices = registry.list_devices().await?;
        let draws: Vec<_> = {
            let mut rng = rand::thread_rng();
            devices
                .iter()
                .map(|device| (device.id().clone(), self.draw_device_status(&mut rng)))
                .collect()
        };

        let mut refreshed = Vec::with_capacity(draws.len());
        for (device_id, status) in draws {
            refreshed.push(registry.refresh_device(device_id, status).await?);
        }
        Ok(refreshed)
    }

    /// Spawns the periodic timers enabled in `config`.
    ///
    /// Each timer first fires one full period after start.
    pub fn spawn_timers(
        self,
        config: &DaemonConfig,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();

        if let Some(period) = config.device_refresh_interval() {
            let registry = registry.clone();
            tasks.push(spawn_ticker(period, cancel_token.clone(), move || {
                let registry = registry.clone();
                async move {
                    match self.refresh_devices(&registry).await {
                        Ok(devices) => debug!(count = devices.len(), "Device statuses refreshed"),
                        Err(e) => warn!(error = %e, "Device refresh failed"),
                    }
                    registry.is_connected()
                }
            }));
        }

        if let Some(period) = config.access_simulation_interval() {
            tasks.push(spawn_ticker(period, cancel_token, move || {
                let registry = registry.clone();
                async move {
                    if let Err(e) = self.simulate_access(&registry).await {
                        warn!(error = %e, "Access simulation failed");
                    }
                    registry.is_connected()
                }
            }));
        }

        tasks
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Runs `tick` every `period` until cancelled or until it returns `false`.
fn spawn_ticker<F, Fut>(period: Duration, cancel_token: CancellationToken, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = bool> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {
                    if !tick().await {
                        debug!("Simulator timer stopping: registry channel closed");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_access_event_shape() {
        let simulator = Simulator::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let event = simulator.draw_access_event(&mut rng);
            assert!(SIMULATED_NAMES.contains(&event.user_name()));

            let card = event.card_id();
            assert_eq!(card.len(), 7);
            assert!(card.starts_with("CARD"));
            assert!(card[4..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_extreme_probabilities() {
        let mut rng = StdRng::seed_from_u64(1);

        let always = Simulator::new(1.0, 1.0);
        let never = Simulator::new(0.0, 0.0);
        for _ in 0..20 {
            assert_eq!(always.draw_device_status(&mut rng), DeviceStatus::Online);
            assert!(always.draw_access_event(&mut rng).granted);
            assert_eq!(never.draw_device_status(&mut rng), DeviceStatus::Offline);
            assert!(!never.draw_access_event(&mut rng).granted);
        }
    }

    #[test]
    fn test_probabilities_are_clamped() {
        assert_eq!(Simulator::new(3.0, -1.0), Simulator::new(1.0, 0.0));
        assert_eq!(Simulator::new(f64::NAN, 0.5), Simulator::new(0.0, 0.5));
    }

    #[tokio::test]
    async fn test_refresh_devices_fails_without_actor() {
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::channel(1);
        drop(cmd_rx);
        let (event_tx, _) = tokio::sync::broadcast::channel(1);
        let registry = RegistryHandle::new(cmd_tx, event_tx);

        let result = Simulator::default().refresh_devices(&registry).await;
        assert_eq!(result, Err(RegistryError::ChannelClosed));
    }
}
