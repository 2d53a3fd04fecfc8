//! System nameserver discovery from a resolv.conf style file.

use ferrous_discovery_domain::DiscoveryError;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_DNS_PORT: u16 = 53;

/// Read the `nameserver` entries of `path`, in file order, without duplicates.
pub fn read_nameservers(path: &Path) -> Result<Vec<SocketAddr>, DiscoveryError> {
    let content = fs::read_to_string(path).map_err(|e| {
        DiscoveryError::Resolution(format!(
            "Failed to read system nameservers from {}: {}",
            path.display(),
            e
        ))
    })?;

    let servers = parse_nameservers(&content);
    debug!(path = %path.display(), count = servers.len(), "System nameservers loaded");
    Ok(servers)
}

pub fn parse_nameservers(content: &str) -> Vec<SocketAddr> {
    let mut servers: Vec<SocketAddr> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let mut words = line.split_whitespace();
        if words.next() != Some("nameserver") {
            continue;
        }

        let Some(addr) = words.next() else {
            continue;
        };
        // Drop an IPv6 zone suffix ("fe80::1%eth0"), std cannot parse it.
        let addr = addr.split('%').next().unwrap_or(addr);

        match addr.parse::<IpAddr>() {
            Ok(ip) => {
                let server = SocketAddr::new(ip, DEFAULT_DNS_PORT);
                if !servers.contains(&server) {
                    servers.push(server);
                }
            }
            Err(_) => debug!(entry = addr, "Skipping unparsable nameserver entry"),
        }
    }

    servers
}
