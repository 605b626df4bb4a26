//! Works out which address to connect to.
//!
//! Scales of this kind may change their BLE address between power cycles, so
//! a discovery scan matching on the advertised name is tried first and a
//! configured static address is only used when nothing matches.

use std::time::Duration;

use space_weight_proto::ble::{DEFAULT_NAME_HINTS, name_matches};

use crate::{DiscoveredDevice, ScaleError, ScaleTransport};

/// Extra time a transport gets on top of the scan timeout before the scan is
/// abandoned
const SCAN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub scan_timeout: Duration,
    /// Substrings looked for in advertised names, first device to match any wins
    pub name_hints: Vec<String>,
    pub fallback_address: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(10),
            name_hints: DEFAULT_NAME_HINTS.iter().map(|h| h.to_string()).collect(),
            fallback_address: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScaleResolver {
    config: ResolverConfig,
}

impl ScaleResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// First device, in scan order, whose name contains one of the hints
    pub fn select<'a>(&self, devices: &'a [DiscoveredDevice]) -> Option<&'a DiscoveredDevice> {
        devices.iter().find(|d| self.is_candidate(d))
    }

    pub fn is_candidate(&self, device: &DiscoveredDevice) -> bool {
        device
            .name
            .as_deref()
            .is_some_and(|name| name_matches(name, &self.config.name_hints))
    }

    /// Scan and pick a scale by name.
    pub async fn discover<T: ScaleTransport>(
        &self,
        transport: &T,
    ) -> Result<DiscoveredDevice, ScaleError> {
        let timeout = self.config.scan_timeout;
        let devices =
            match tokio::time::timeout(timeout + SCAN_GRACE, transport.discover(timeout)).await {
                Ok(devices) => devices?,
                Err(_) => {
                    return Err(ScaleError::Discovery(format!(
                        "scan did not finish within {:?}",
                        timeout + SCAN_GRACE
                    )));
                }
            };

        if devices.is_empty() {
            return Err(ScaleError::Discovery("no devices found".to_string()));
        }

        log::debug!("scan found {} devices", devices.len());
        self.select(&devices).cloned().ok_or_else(|| {
            ScaleError::Discovery(format!(
                "none of {} devices matched {:?}",
                devices.len(),
                self.config.name_hints
            ))
        })
    }

    /// Address of the scale, from discovery or else the fallback.
    pub async fn resolve_address<T: ScaleTransport>(&self, transport: &T) -> Option<String> {
        match self.discover(transport).await {
            Ok(device) => {
                log::info!(
                    "found scale {} ({})",
                    device.name.as_deref().unwrap_or("?"),
                    device.address
                );
                Some(device.address)
            }
            Err(e) => match &self.config.fallback_address {
                Some(address) => {
                    log::warn!("{e}, using fallback address {address}");
                    Some(address.clone())
                }
                None => {
                    log::warn!("{e}, and no fallback address is configured");
                    None
                }
            },
        }
    }
}
