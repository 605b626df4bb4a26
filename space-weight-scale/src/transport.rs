//! The seam between the scale logic and a BLE stack
//!
//! `BtleTransport` talks to a real adapter. Tests drive the resolver and
//! reader with scripted transports instead.

use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::ScaleError;

/// A device seen during a discovery scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: String,
    pub name: Option<String>,
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    pub fn new(address: &str, name: Option<&str>) -> Self {
        Self {
            address: address.to_string(),
            name: name.map(str::to_string),
            rssi: None,
        }
    }
}

pub trait ScaleTransport: Send + Sync {
    type Session: ScaleSession;

    /// Scan for advertising devices for `timeout`, returning them in the
    /// order they were first seen.
    fn discover(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<DiscoveredDevice>, ScaleError>> + Send;

    /// Open a link to the device at `address`.
    ///
    /// No timeout is applied here, the caller bounds it. Dropping the future
    /// must not leave a link or a scan behind. Anything that can stall once
    /// the link is up belongs in [`ScaleSession::discover_services`].
    fn connect(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Self::Session, ScaleError>> + Send;
}

/// An open connection to one device
pub trait ScaleSession: Send + Sync {
    fn address(&self) -> &str;

    /// Resolve the GATT table so characteristics can be read.
    fn discover_services(&self) -> impl Future<Output = Result<(), ScaleError>> + Send {
        async { Ok(()) }
    }

    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    fn read(&self, characteristic: Uuid) -> impl Future<Output = Result<Vec<u8>, ScaleError>> + Send;

    /// Release the connection. Errors are logged, not returned.
    fn disconnect(self) -> impl Future<Output = ()> + Send;
}
