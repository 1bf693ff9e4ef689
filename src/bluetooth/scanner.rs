/// Bluetooth Low Energy scanning for ATC thermometer advertisements
use bluer::{Adapter, AdapterEvent, Address, DiscoveryFilter, DiscoveryTransport, Uuid};
use futures_util::{pin_mut, StreamExt};
use log::{debug, error, info};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ScanMode;
use crate::models::TransportEvent;

/// Environmental Sensing service (0x181A) that carries the custom format.
pub const ATC_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000181a_0000_1000_8000_00805f9b34fb);

pub type ScanError = Box<dyn std::error::Error + Send + Sync>;

/// Discovery filter for a concrete scan mode
///
/// Passive restricts discovery to devices advertising the ATC service so the
/// adapter does not solicit scan responses from everything around.
/// Active reports every LE device and leaves filtering to us.
pub fn discovery_filter(mode: ScanMode) -> DiscoveryFilter {
    let uuids = match mode {
        ScanMode::Passive => HashSet::from([ATC_SERVICE_UUID]),
        ScanMode::Active | ScanMode::Auto => HashSet::new(),
    };
    DiscoveryFilter {
        transport: DiscoveryTransport::Le, // Bluetooth Low Energy only
        duplicate_data: true,              // Every broadcast carries a new counter
        uuids,
        ..Default::default()
    }
}

/// Scan modes to try, in order.
pub fn scan_plan(mode: ScanMode) -> Vec<ScanMode> {
    match mode {
        ScanMode::Auto => vec![ScanMode::Passive, ScanMode::Active],
        other => vec![other],
    }
}

/// Stream ATC advertisements into `tx` until `token` is cancelled
///
/// Opens a BlueZ session, powers the default adapter and runs discovery in
/// the configured mode. In auto mode a failure to start passive discovery
/// falls back to active discovery.
///
/// # Arguments
/// * `mode` - Requested scan mode
/// * `tx` - Channel feeding the ingestion pipeline
/// * `token` - Global stop signal
///
/// # Returns
/// Ok when stopped or the receiver went away, error if no mode could scan
pub async fn run_scanner(
    mode: ScanMode,
    tx: mpsc::Sender<TransportEvent>,
    token: CancellationToken,
) -> Result<(), ScanError> {
    // Initialize Bluetooth session
    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };

    // Get the default Bluetooth adapter
    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get default Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    // Ensure Bluetooth adapter is powered on
    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    for mode in scan_plan(mode) {
        info!("Scanning BLE devices in {:?} mode...", mode);
        match scan(&adapter, mode, &tx, &token).await {
            Ok(()) => return Ok(()),
            Err(e) => error!("Error in {:?} mode: {}", mode, e),
        }
    }

    Err("No scan mode could be started".into())
}

async fn scan(
    adapter: &Adapter,
    mode: ScanMode,
    tx: &mpsc::Sender<TransportEvent>,
    token: &CancellationToken,
) -> bluer::Result<()> {
    adapter.set_discovery_filter(discovery_filter(mode)).await?;

    let events = adapter.discover_devices_with_changes().await?;
    pin_mut!(events);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Scanner stopping");
                return Ok(());
            }
            event = events.next() => match event {
                Some(AdapterEvent::DeviceAdded(addr)) => {
                    if let Some(advertisement) = read_advertisement(adapter, addr).await {
                        if tx.send(advertisement).await.is_err() {
                            debug!("Pipeline gone, scanner stopping");
                            return Ok(());
                        }
                    }
                }
                Some(_) => {}
                None => return Ok(()),
            },
        }
    }
}

/// Current name, RSSI and ATC service data of a device, if it has any.
async fn read_advertisement(adapter: &Adapter, addr: Address) -> Option<TransportEvent> {
    let device = adapter.device(addr).ok()?;

    let payload = match device.service_data().await {
        Ok(Some(service_data)) => service_data.get(&ATC_SERVICE_UUID)?.clone(),
        Ok(None) => return None,
        Err(e) => {
            debug!("Failed to get service data for {}: {}", addr, e);
            return None;
        }
    };

    let name = device.name().await.ok().flatten();
    let rssi = device.rssi().await.ok().flatten().unwrap_or_default();

    Some(TransportEvent {
        address: addr.to_string(),
        name,
        service_data: payload,
        rssi,
    })
}
