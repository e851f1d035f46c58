//! Single-instance startup

use focusguard_config::{DEFAULT_COORDINATION_PORT, DEFAULT_SIGNAL_TIMEOUT, Settings};
use focusguard_ipc::{Acquisition, InstanceCoordinator, RaiseSignal};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// What this process should do after coordinating with other instances
#[derive(Debug)]
pub enum InstanceRole {
    /// Run the service. `listener` is `None` when the port could not be
    /// claimed for reasons other than another instance holding it.
    Primary { listener: Option<JoinHandle<()>> },
    /// Another instance was asked to come forward; exit without starting
    Redundant,
}

/// Port and signal timeout for coordination.
///
/// `settings` is `None` when the settings file could not be loaded, so a
/// broken file never stops a second launch from signalling the first.
pub fn coordination_target(
    port_override: Option<u16>,
    settings: Option<&Settings>,
) -> (u16, Duration) {
    let port = port_override
        .or(settings.map(|s| s.service.port))
        .unwrap_or(DEFAULT_COORDINATION_PORT);
    let timeout = settings
        .map(|s| s.service.signal_timeout)
        .unwrap_or(DEFAULT_SIGNAL_TIMEOUT);
    (port, timeout)
}

/// Claim the coordination port or signal the instance holding it.
///
/// On success the raise listener is spawned and forwards to `raises`.
pub async fn claim_instance(
    port: u16,
    timeout: Duration,
    raises: mpsc::UnboundedSender<RaiseSignal>,
) -> InstanceRole {
    let coordinator = InstanceCoordinator::new(port, timeout);

    match coordinator.acquire_or_signal().await {
        Ok(Acquisition::Signaled) => {
            info!("Another instance was asked to come forward, exiting");
            InstanceRole::Redundant
        }
        Ok(Acquisition::Primary(listener)) => InstanceRole::Primary {
            listener: Some(tokio::spawn(listener.run(raises, timeout))),
        },
        Err(e) => {
            warn!(error = %e, "Single-instance coordination unavailable, continuing without it");
            InstanceRole::Primary { listener: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focusguard_config::parse_settings;

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn override_wins_over_settings() {
        let settings = parse_settings("config_version = 1\n[service]\nport = 48000\n").unwrap();

        assert_eq!(coordination_target(Some(49000), Some(&settings)).0, 49000);
        assert_eq!(coordination_target(None, Some(&settings)).0, 48000);
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        assert_eq!(
            coordination_target(None, None),
            (DEFAULT_COORDINATION_PORT, DEFAULT_SIGNAL_TIMEOUT)
        );
    }

    #[tokio::test]
    async fn second_launch_is_redundant_and_raises_once() {
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let first = InstanceCoordinator::new(0, TIMEOUT);
        let listener = match first.acquire_or_signal().await.unwrap() {
            Acquisition::Primary(listener) => listener,
            Acquisition::Signaled => panic!("ephemeral port should always bind"),
        };
        let port = listener.local_addr().port();
        tokio::spawn(listener.run(first_tx, TIMEOUT));

        let (second_tx, mut second_rx) = mpsc::unbounded_channel();
        let role = claim_instance(port, TIMEOUT, second_tx).await;
        assert!(matches!(role, InstanceRole::Redundant));

        let signal = tokio::time::timeout(TIMEOUT, first_rx.recv()).await.unwrap();
        assert_eq!(signal, Some(RaiseSignal));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(first_rx.try_recv().is_err());
        // The redundant launch never listens
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn first_launch_listens_for_raises() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let role = claim_instance(0, TIMEOUT, tx).await;

        match role {
            InstanceRole::Primary { listener } => {
                let listener = listener.expect("ephemeral port should always bind");
                assert!(!listener.is_finished());
                listener.abort();
            }
            InstanceRole::Redundant => panic!("nothing else holds an ephemeral port"),
        }
    }
}
