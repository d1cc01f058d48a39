//! NetworkManager IPv4 watcher.
//!
//! Read-only D-Bus polling of one device's IPv4 configuration, feeding the
//! "push Wi-Fi IP configuration to modem" requests. Property change
//! notifications on the device's `IP4Config` object drive re-pushes; the
//! watcher itself never writes to NetworkManager.

use std::collections::HashMap;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue};
use zbus::{Connection, Proxy};

use crate::error::{Error, Result};

const NM_SERVICE: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const NM_INTERFACE: &str = "org.freedesktop.NetworkManager";
const NM_DEVICE_INTERFACE: &str = "org.freedesktop.NetworkManager.Device";
const NM_IP4CONFIG_INTERFACE: &str = "org.freedesktop.NetworkManager.IP4Config";

const UPDATE_CHANNEL_CAPACITY: usize = 8;

/// One IPv4 configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ip4Config {
    pub address: Option<String>,
    pub prefix_len: u32,
    pub gateway: Option<String>,
    pub dns: Vec<String>,
}

impl Ip4Config {
    /// The comma-separated nameserver list pushed to the modem.
    pub fn dns_string(&self) -> String {
        self.dns.join(", ")
    }
}

/// NetworkManager hands nameservers out as 32-bit words laid out in
/// address order.
fn format_nameserver(raw: u32) -> String {
    let b = raw.to_le_bytes();
    format!("{}.{}.{}.{}", b[0], b[1], b[2], b[3])
}

/// Watch one device's IPv4 configuration. Returns the current snapshot and
/// a stream of snapshots for every subsequent change.
pub async fn watch(iface_name: &str) -> Result<(Ip4Config, mpsc::Receiver<Ip4Config>)> {
    let conn = Connection::system().await?;
    let device_path = find_device(&conn, iface_name).await?;
    debug!("watching {} at {}", iface_name, device_path);

    let device = device_proxy(&conn, &device_path).await?;
    let ip4_path: OwnedObjectPath = device.get_property("Ip4Config").await?;
    let initial = read_ip4_config(&conn, &ip4_path).await?;

    let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    let iface = iface_name.to_owned();
    tokio::spawn(async move {
        if let Err(e) = watch_task(conn, device_path, tx).await {
            warn!("ip4 watch for {} ended: {}", iface, e);
        }
    });

    Ok((initial, rx))
}

async fn device_proxy<'a>(conn: &Connection, path: &OwnedObjectPath) -> Result<Proxy<'a>> {
    Ok(Proxy::new(conn, NM_SERVICE, path.to_string(), NM_DEVICE_INTERFACE).await?)
}

/// Resolve a NetworkManager device object by interface name. Devices that
/// fail to answer are skipped, matching a daemon restart mid-enumeration.
async fn find_device(conn: &Connection, iface_name: &str) -> Result<OwnedObjectPath> {
    let nm = Proxy::new(conn, NM_SERVICE, NM_PATH, NM_INTERFACE).await?;
    let devices: Vec<OwnedObjectPath> = nm.call("GetAllDevices", &()).await?;
    for path in devices {
        let device = match device_proxy(conn, &path).await {
            Ok(proxy) => proxy,
            Err(_) => continue,
        };
        let name: String = match device.get_property("Interface").await {
            Ok(name) => name,
            Err(_) => continue,
        };
        if name == iface_name {
            return Ok(path);
        }
    }
    Err(Error::DeviceNotFound(iface_name.to_owned()))
}

/// Read the device's current IPv4 configuration. Missing properties leave
/// their fields empty rather than failing the snapshot.
async fn read_ip4_config(conn: &Connection, path: &OwnedObjectPath) -> Result<Ip4Config> {
    let ip4 = Proxy::new(conn, NM_SERVICE, path.to_string(), NM_IP4CONFIG_INTERFACE).await?;
    let mut cfg = Ip4Config::default();

    if let Ok(addresses) =
        ip4.get_property::<Vec<HashMap<String, OwnedValue>>>("AddressData").await
    {
        if let Some(mut first) = addresses.into_iter().next() {
            if let Some(address) = first.remove("address") {
                cfg.address = String::try_from(address).ok();
            }
            if let Some(prefix) = first.remove("prefix") {
                cfg.prefix_len = u32::try_from(prefix).unwrap_or(0);
            }
        }
    }
    if let Ok(gateway) = ip4.get_property::<String>("Gateway").await {
        if !gateway.is_empty() {
            cfg.gateway = Some(gateway);
        }
    }
    if let Ok(nameservers) = ip4.get_property::<Vec<u32>>("Nameservers").await {
        cfg.dns = nameservers.into_iter().map(format_nameserver).collect();
    }
    Ok(cfg)
}

async fn watch_task(
    conn: Connection,
    device_path: OwnedObjectPath,
    tx: mpsc::Sender<Ip4Config>,
) -> Result<()> {
    let device = device_proxy(&conn, &device_path).await?;
    let mut path_changes = device.receive_property_changed::<OwnedObjectPath>("Ip4Config").await;
    let mut ip4_path: OwnedObjectPath = device.get_property("Ip4Config").await?;

    loop {
        let ip4 =
            Proxy::new(&conn, NM_SERVICE, ip4_path.to_string(), NM_IP4CONFIG_INTERFACE).await?;
        let mut addr_changes = ip4
            .receive_property_changed::<Vec<HashMap<String, OwnedValue>>>("AddressData")
            .await;
        let mut gateway_changes = ip4.receive_property_changed::<String>("Gateway").await;
        let mut ns_changes = ip4.receive_property_changed::<Vec<u32>>("Nameservers").await;

        loop {
            tokio::select! {
                change = path_changes.next() => {
                    match change {
                        Some(change) => {
                            if let Ok(path) = change.get().await {
                                // The device moved to a new IP4Config
                                // object; re-subscribe against it.
                                ip4_path = path;
                                break;
                            }
                        }
                        None => return Ok(()),
                    }
                }
                Some(_) = addr_changes.next() => {
                    if !push_snapshot(&conn, &ip4_path, &tx).await { return Ok(()); }
                }
                Some(_) = gateway_changes.next() => {
                    if !push_snapshot(&conn, &ip4_path, &tx).await { return Ok(()); }
                }
                Some(_) = ns_changes.next() => {
                    if !push_snapshot(&conn, &ip4_path, &tx).await { return Ok(()); }
                }
            }
        }
    }
}

async fn push_snapshot(
    conn: &Connection,
    path: &OwnedObjectPath,
    tx: &mpsc::Sender<Ip4Config>,
) -> bool {
    match read_ip4_config(conn, path).await {
        Ok(cfg) => tx.send(cfg).await.is_ok(),
        Err(e) => {
            warn!("failed to read ip4 config: {}", e);
            true
        }
    }
}
