//! btleplug backed transport
//!
//! Scans, connects and reads through the first Bluetooth adapter of the host.

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::StreamExt;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::{DiscoveredDevice, ScaleError, ScaleSession, ScaleTransport};

/// How long `connect` scans for an address the adapter has not cached
const FIND_TIMEOUT: Duration = Duration::from_secs(10);

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, ScaleError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(ScaleError::NoAdapter)
}

#[derive(Clone)]
pub struct BtleTransport {
    adapter: Adapter,
}

impl BtleTransport {
    pub async fn new() -> Result<Self, ScaleError> {
        Ok(Self::with_adapter(get_adapter().await?))
    }

    pub fn with_adapter(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Find a peripheral by address, scanning for up to `FIND_TIMEOUT` if
    /// the adapter has not seen it yet.
    async fn find_peripheral(&self, address: &str) -> Result<Peripheral, ScaleError> {
        for peripheral in self.adapter.peripherals().await? {
            if same_address(&peripheral, address) {
                return Ok(peripheral);
            }
        }

        log::debug!("{address} not known to the adapter yet, scanning");
        let mut events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;
        let scan = Cleanup::new(stop_scan(self.adapter.clone()));

        let deadline = tokio::time::sleep(FIND_TIMEOUT);
        tokio::pin!(deadline);

        let found = loop {
            tokio::select! {
                _ = &mut deadline => break None,
                event = events.next() => match event {
                    Some(CentralEvent::DeviceDiscovered(id)) => {
                        if let Ok(peripheral) = self.adapter.peripheral(&id).await {
                            if same_address(&peripheral, address) {
                                break Some(peripheral);
                            }
                        }
                    }
                    Some(_) => {}
                    None => break None,
                },
            }
        };

        scan.run().await;
        found.ok_or_else(|| ScaleError::connection(address, "device not found"))
    }

    async fn describe(&self, id: &PeripheralId) -> Option<DiscoveredDevice> {
        let peripheral = self.adapter.peripheral(id).await.ok()?;
        let props = peripheral.properties().await.ok().flatten();
        Some(DiscoveredDevice {
            address: peripheral.address().to_string(),
            name: props.as_ref().and_then(|p| p.local_name.clone()),
            rssi: props.as_ref().and_then(|p| p.rssi),
        })
    }
}

fn same_address(peripheral: &Peripheral, address: &str) -> bool {
    peripheral.address().to_string().eq_ignore_ascii_case(address)
}

async fn stop_scan(adapter: Adapter) {
    if let Err(e) = adapter.stop_scan().await {
        log::warn!("failed to stop scan: {e}");
    }
}

async fn release(peripheral: Peripheral, address: String) {
    if let Err(e) = peripheral.disconnect().await {
        log::warn!("failed to disconnect from {address}: {e}");
    }
}

/// Undo work that is still pending when the owning future is dropped.
///
/// `run` awaits the cleanup in place, `disarm` drops it. If neither happens
/// the cleanup is spawned onto the current runtime.
struct Cleanup<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    pending: Option<F>,
}

impl<F> Cleanup<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    fn new(pending: F) -> Self {
        Self { pending: Some(pending) }
    }

    async fn run(mut self) {
        if let Some(f) = self.pending.take() {
            f.await;
        }
    }

    fn disarm(mut self) {
        self.pending = None;
    }
}

impl<F> Drop for Cleanup<F>
where
    F: Future<Output = ()> + Send + 'static,
{
    fn drop(&mut self) {
        let Some(f) = self.pending.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::debug!("cancelled mid-operation, cleaning up in the background");
                handle.spawn(f);
            }
            Err(_) => log::warn!("cancelled outside a runtime, cleanup skipped"),
        }
    }
}

impl ScaleTransport for BtleTransport {
    type Session = BtleSession;

    async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>, ScaleError> {
        let mut events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;
        let scan = Cleanup::new(stop_scan(self.adapter.clone()));

        // peripherals() does not keep discovery order, the event stream does
        let mut order: Vec<PeripheralId> = Vec::new();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = events.next() => match event {
                    Some(CentralEvent::DeviceDiscovered(id)) => {
                        if !order.contains(&id) {
                            order.push(id);
                        }
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }

        let peripherals = self.adapter.peripherals().await;
        scan.run().await;

        // devices cached from an earlier scan are not announced again
        for peripheral in peripherals? {
            let id = peripheral.id();
            if !order.contains(&id) {
                order.push(id);
            }
        }

        let mut devices = Vec::with_capacity(order.len());
        for id in &order {
            if let Some(device) = self.describe(id).await {
                devices.push(device);
            }
        }
        Ok(devices)
    }

    async fn connect(&self, address: &str) -> Result<BtleSession, ScaleError> {
        let peripheral = self.find_peripheral(address).await?;

        // the link may come up after the caller gave up on us
        let link = Cleanup::new(release(peripheral.clone(), address.to_string()));
        let connected = peripheral.connect().await;
        link.disarm();
        connected.map_err(|e| ScaleError::connection(address, e))?;

        Ok(BtleSession { address: address.to_string(), peripheral })
    }
}

pub struct BtleSession {
    address: String,
    peripheral: Peripheral,
}

impl ScaleSession for BtleSession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn discover_services(&self) -> Result<(), ScaleError> {
        self.peripheral
            .discover_services()
            .await
            .map_err(|e| ScaleError::connection(&self.address, e))
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, ScaleError> {
        let characteristics = self.peripheral.characteristics();
        let c = characteristics
            .iter()
            .find(|c| c.uuid == characteristic)
            .ok_or_else(|| {
                ScaleError::read(&self.address, format!("characteristic {characteristic} not found"))
            })?;

        self.peripheral
            .read(c)
            .await
            .map_err(|e| ScaleError::read(&self.address, e))
    }

    async fn disconnect(self) {
        release(self.peripheral, self.address).await;
    }
}
