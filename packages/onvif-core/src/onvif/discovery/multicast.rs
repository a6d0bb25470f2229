//! UDP multicast transport for WS-Discovery probes.
//!
//! The probe is sent from a socket bound to the chosen interface's IPv4
//! address; devices reply unicast to that same socket, so one socket does
//! both send and receive.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use local_ip_address::list_afinet_netifas;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use super::types::{DiscoveryError, DiscoveryResult, ProbeReply};
use crate::protocol_constants::{
    WS_DISCOVERY_MAX_REPLY_SIZE, WS_DISCOVERY_MULTICAST_ADDR, WS_DISCOVERY_MULTICAST_TTL,
};

/// Sends a probe and collects raw replies until `window` elapses.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn send_probe(
        &self,
        interface: &str,
        message: &str,
        window: Duration,
    ) -> DiscoveryResult<Vec<ProbeReply>>;
}

/// Default [`ProbeTransport`]: multicast to 239.255.255.250:3702.
#[derive(Debug, Clone, Copy, Default)]
pub struct MulticastProbeTransport;

/// Resolves an interface name (or an IPv4 literal) to its IPv4 address.
pub fn interface_ipv4(interface: &str) -> DiscoveryResult<Ipv4Addr> {
    if let Ok(ip) = interface.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    let interfaces = list_afinet_netifas().map_err(|e| {
        log::warn!("[WS-Discovery] Failed to list network interfaces: {}", e);
        DiscoveryError::InterfaceNotFound(interface.to_string())
    })?;

    interfaces
        .into_iter()
        .find_map(|(name, addr)| match addr {
            IpAddr::V4(ipv4) if name == interface => Some(ipv4),
            _ => None,
        })
        .ok_or_else(|| DiscoveryError::InterfaceNotFound(interface.to_string()))
}

/// Creates a UDP socket bound to `iface_ip` with multicast sends routed
/// through it.
fn create_socket(iface_ip: Ipv4Addr) -> DiscoveryResult<UdpSocket> {
    let bind_addr = SocketAddr::new(IpAddr::V4(iface_ip), 0);

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(DiscoveryError::SocketBind)?;

    if let Err(e) = socket.set_reuse_address(true) {
        log::warn!("[WS-Discovery] Failed to set SO_REUSEADDR on {}: {}", iface_ip, e);
    }

    #[cfg(unix)]
    if let Err(e) = socket.set_reuse_port(true) {
        log::warn!("[WS-Discovery] Failed to set SO_REUSEPORT on {}: {}", iface_ip, e);
    }

    socket
        .set_multicast_if_v4(&iface_ip)
        .map_err(DiscoveryError::SocketBind)?;

    if let Err(e) = socket.set_multicast_ttl_v4(WS_DISCOVERY_MULTICAST_TTL) {
        log::warn!("[WS-Discovery] Failed to set multicast TTL on {}: {}", iface_ip, e);
    }

    socket
        .set_nonblocking(true)
        .map_err(DiscoveryError::SocketBind)?;
    socket
        .bind(&bind_addr.into())
        .map_err(DiscoveryError::SocketBind)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(DiscoveryError::SocketBind)
}

#[async_trait]
impl ProbeTransport for MulticastProbeTransport {
    async fn send_probe(
        &self,
        interface: &str,
        message: &str,
        window: Duration,
    ) -> DiscoveryResult<Vec<ProbeReply>> {
        let iface_ip = interface_ipv4(interface)?;
        let socket = create_socket(iface_ip)?;

        socket
            .send_to(message.as_bytes(), WS_DISCOVERY_MULTICAST_ADDR)
            .await
            .map_err(DiscoveryError::SendProbe)?;
        log::debug!(
            "[WS-Discovery] Probe sent from {} ({}), collecting replies for {}ms",
            interface,
            iface_ip,
            window.as_millis()
        );

        let mut buf = vec![0u8; WS_DISCOVERY_MAX_REPLY_SIZE];
        let mut replies = Vec::new();
        let start = Instant::now();

        while start.elapsed() < window {
            let remaining = window.saturating_sub(start.elapsed());
            match timeout(remaining, socket.recv_from(&mut buf)).await {
                Ok(Ok((amt, src))) => {
                    log::trace!("[WS-Discovery] {} byte reply from {}", amt, src);
                    replies.push(ProbeReply::new(
                        Some(src),
                        String::from_utf8_lossy(&buf[..amt]),
                    ));
                }
                Ok(Err(e)) => {
                    // Nothing collected yet means the socket is unusable
                    if replies.is_empty() {
                        return Err(DiscoveryError::Receive(e));
                    }
                    log::warn!(
                        "[WS-Discovery] Socket recv error on {} after {} replies: {}",
                        interface,
                        replies.len(),
                        e
                    );
                    break;
                }
                Err(_) => break, // Window elapsed
            }
        }

        log::debug!(
            "[WS-Discovery] {} replies on {} after {}ms",
            replies.len(),
            interface,
            start.elapsed().as_millis()
        );
        Ok(replies)
    }
}
