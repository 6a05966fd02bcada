//! Connectivity probe port (driven/secondary port)
//!
//! Samples whether the device can currently reach the network. The
//! connectivity monitor uses it once at construction for its initial state;
//! later samples arrive over a channel.

/// Port trait for sampling the host's online state
#[async_trait::async_trait]
pub trait IConnectivityProbe: Send + Sync {
    /// Returns true if the network is reachable right now
    async fn is_online(&self) -> bool;
}
