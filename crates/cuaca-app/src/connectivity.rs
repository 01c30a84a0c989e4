//! Online/offline signal consulted when a network operation fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use url::Url;

#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Considers the device online if a TCP connection to `address` opens in time
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// Probe the host and port of an HTTP(S) URL
    pub fn for_url(url: &str, timeout: Duration) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let port = parsed.port_or_known_default()?;
        Some(Self::new(format!("{}:{}", host, port), timeout))
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Connectivity for TcpProbe {
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!("Connectivity probe to {} failed: {}", self.address, e);
                false
            }
            Err(_) => {
                tracing::debug!("Connectivity probe to {} timed out", self.address);
                false
            }
        }
    }
}

/// A connectivity flag set by the caller
#[derive(Debug)]
pub struct FixedConnectivity {
    online: AtomicBool,
}

impl FixedConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for FixedConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
