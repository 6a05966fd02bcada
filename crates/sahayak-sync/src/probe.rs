//! TCP reachability probe
//!
//! [`TcpConnectivityProbe`] treats the device as online when a TCP
//! connection to a configured `host:port` opens within a timeout.
//! [`run_probe_loop`] samples any probe at a fixed interval and feeds the
//! results to the connectivity monitor's channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use sahayak_core::config::ConnectivityConfig;
use sahayak_core::ports::IConnectivityProbe;

use crate::SyncError;

/// Probes reachability by opening a TCP connection
#[derive(Debug, Clone)]
pub struct TcpConnectivityProbe {
    address: String,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    /// # Errors
    ///
    /// Returns `SyncError::InvalidProbeAddress` unless `address` looks like
    /// `host:port`.
    pub fn new(address: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let address = address.into();
        let valid = address
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(SyncError::InvalidProbeAddress(address));
        }
        Ok(Self { address, timeout })
    }

    pub fn from_config(config: &ConnectivityConfig) -> Result<Self, SyncError> {
        Self::new(config.probe_address.clone(), config.probe_timeout())
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait::async_trait]
impl IConnectivityProbe for TcpConnectivityProbe {
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                trace!(address = %self.address, error = %e, "Probe connection failed");
                false
            }
            Err(_) => {
                trace!(address = %self.address, "Probe timed out");
                false
            }
        }
    }
}

/// Samples `probe` every `interval` and sends the result into `samples`
///
/// Stops when `cancel` fires or the receiving side is dropped.
pub async fn run_probe_loop(
    probe: Arc<dyn IConnectivityProbe>,
    interval: Duration,
    samples: mpsc::Sender<bool>,
    cancel: CancellationToken,
) {
    info!(interval_secs = interval.as_secs(), "Connectivity probe loop starting");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let online = tokio::select! {
            _ = cancel.cancelled() => break,
            online = probe.is_online() => online,
        };
        debug!(online, "Connectivity sample");

        if samples.send(online).await.is_err() {
            debug!("Sample receiver dropped");
            break;
        }
    }

    info!("Connectivity probe loop stopped");
}
