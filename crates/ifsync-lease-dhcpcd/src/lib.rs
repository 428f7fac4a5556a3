// # dhcpcd Lease Client
//
// This crate negotiates DHCP leases by running `dhcpcd` in test mode.
//
// ## Purpose
//
// The primary LeaseClient implementation for deployments on Linux:
// - One probe per attempt: `dhcpcd -4 --test --timeout <secs> <interface>`
// - Test mode performs the full DISCOVER/OFFER exchange, prints the
//   resulting lease variables to stdout, and exits without configuring
//   anything (address application stays with the engine)
// - A previously held address is passed along with `--request`
//
// ## Architecture
//
// Each attempt is one short-lived subprocess killed at its deadline; the
// retry loop is bounded, so a request always terminates within roughly
// timeout * (retries + 1).

use std::net::{IpAddr, Ipv4Addr};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use ifsync_core::traits::{LeaseClient, LeaseOffer};
use ifsync_core::types::MacAddress;
use ifsync_core::{Error, Result};

/// Default path of the dhcpcd binary
const DEFAULT_DHCPCD_CMD: &str = "/sbin/dhcpcd";

/// dhcpcd-backed lease client
pub struct DhcpcdClient {
    /// Path of the `dhcpcd` binary
    dhcpcd_cmd: String,
}

impl DhcpcdClient {
    /// Create a client using the standard `dhcpcd` location
    pub fn new() -> Self {
        Self {
            dhcpcd_cmd: DEFAULT_DHCPCD_CMD.to_string(),
        }
    }

    /// Create a client using a specific `dhcpcd` binary
    pub fn with_command(dhcpcd_cmd: impl Into<String>) -> Self {
        Self {
            dhcpcd_cmd: dhcpcd_cmd.into(),
        }
    }

    /// Run one probe attempt
    async fn probe(
        &self,
        interface: &str,
        mac: MacAddress,
        hint: Option<IpAddr>,
        timeout: Duration,
    ) -> Result<LeaseOffer> {
        let timeout_secs = timeout.as_secs().max(1).to_string();
        let mac = mac.to_string();
        let hint = hint.map(|h| h.to_string());

        let mut args = vec![
            "-4",
            "--test",
            "--timeout",
            timeout_secs.as_str(),
            "--clientid",
            mac.as_str(),
        ];
        if let Some(ref hint) = hint {
            args.push("--request");
            args.push(hint);
        }
        args.push(interface);

        debug!("Running {} {}", self.dhcpcd_cmd, args.join(" "));

        let child = Command::new(&self.dhcpcd_cmd)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::adapter(format!("could not spawn {}: {}", self.dhcpcd_cmd, e)))?;

        // Dropping the child on deadline kills the probe
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::lease_failed(interface, format!("probe failed: {}", e)));
            }
            Err(_) => return Err(Error::lease_timeout(interface)),
        };

        if !output.status.success() {
            return Err(Error::lease_failed(
                interface,
                format!("dhcpcd exited with {}", output.status.code().unwrap_or(-1)),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_offer(&stdout)
            .ok_or_else(|| Error::lease_failed(interface, "no usable offer in dhcpcd output"))
    }
}

impl Default for DhcpcdClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaseClient for DhcpcdClient {
    async fn request(
        &self,
        interface: &str,
        mac: MacAddress,
        hint: Option<IpAddr>,
        timeout: Duration,
        retries: usize,
    ) -> Result<LeaseOffer> {
        let mut last = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                debug!("Lease attempt {}/{} on {}", attempt + 1, retries + 1, interface);
            }
            match self.probe(interface, mac, hint, timeout).await {
                Ok(offer) => {
                    debug!(
                        "Offer on {}: {}/{} from {:?}",
                        interface, offer.address, offer.prefix_len, offer.server
                    );
                    return Ok(offer);
                }
                Err(e) => {
                    warn!("Lease attempt on {} failed: {}", interface, e);
                    last = Some(e);
                }
            }
        }

        Err(last.unwrap_or_else(|| Error::lease_failed(interface, "no attempts made")))
    }
}

/// Parse the variable dump of a successful `dhcpcd --test` run
///
/// Test mode prints `new_<name>=<value>` lines, values sometimes wrapped
/// in single quotes depending on the dhcpcd version. An offer needs at
/// least an address and a prefix length (given directly as
/// `new_subnet_cidr` or derived from `new_subnet_mask`).
fn parse_offer(output: &str) -> Option<LeaseOffer> {
    let mut address = None;
    let mut prefix_len = None;
    let mut gateway = None;
    let mut broadcast = None;
    let mut dns_servers = Vec::new();
    let mut server = None;

    for line in output.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('\'');
        if value.is_empty() {
            continue;
        }

        match key {
            "new_ip_address" => address = value.parse::<IpAddr>().ok(),
            "new_subnet_cidr" => prefix_len = value.parse::<u8>().ok(),
            "new_subnet_mask" => {
                if prefix_len.is_none() {
                    prefix_len = value
                        .parse::<Ipv4Addr>()
                        .ok()
                        .and_then(netmask_to_prefix_len);
                }
            }
            "new_routers" => {
                gateway = value
                    .split_whitespace()
                    .next()
                    .and_then(|r| r.parse::<IpAddr>().ok());
            }
            "new_broadcast_address" => broadcast = value.parse::<IpAddr>().ok(),
            "new_domain_name_servers" => {
                dns_servers = value
                    .split_whitespace()
                    .filter_map(|d| d.parse::<IpAddr>().ok())
                    .collect();
            }
            "new_dhcp_server_identifier" => server = value.parse::<IpAddr>().ok(),
            _ => {}
        }
    }

    Some(LeaseOffer {
        address: address?,
        prefix_len: prefix_len?,
        gateway,
        broadcast,
        dns_servers,
        server,
    })
}

/// Prefix length of a contiguous IPv4 netmask
///
/// Returns `None` for non-contiguous masks, which no sane DHCP server
/// hands out but a corrupted reply could contain.
fn netmask_to_prefix_len(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let len = bits.leading_ones();
    if bits.checked_shl(len).unwrap_or(0) != 0 {
        return None;
    }
    Some(len as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE_OUTPUT: &str = "\
interface_mtu=1500
new_broadcast_address=192.168.1.255
new_dhcp_lease_time=43200
new_dhcp_server_identifier=192.168.1.1
new_domain_name_servers=192.168.1.1 8.8.8.8
new_ip_address=192.168.1.50
new_network_number=192.168.1.0
new_routers=192.168.1.1
new_subnet_cidr=24
new_subnet_mask=255.255.255.0
";

    #[test]
    fn offer_is_parsed_from_variable_dump() {
        let offer = parse_offer(PROBE_OUTPUT).unwrap();
        assert_eq!(offer.address, "192.168.1.50".parse::<IpAddr>().unwrap());
        assert_eq!(offer.prefix_len, 24);
        assert_eq!(offer.gateway, Some("192.168.1.1".parse().unwrap()));
        assert_eq!(offer.broadcast, Some("192.168.1.255".parse().unwrap()));
        assert_eq!(
            offer.dns_servers,
            vec![
                "192.168.1.1".parse::<IpAddr>().unwrap(),
                "8.8.8.8".parse::<IpAddr>().unwrap(),
            ]
        );
        assert_eq!(offer.server, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn quoted_values_are_accepted() {
        let output = "\
new_ip_address='10.0.0.7'
new_subnet_mask='255.255.254.0'
new_routers='10.0.0.1'
";
        let offer = parse_offer(output).unwrap();
        assert_eq!(offer.address, "10.0.0.7".parse::<IpAddr>().unwrap());
        assert_eq!(offer.prefix_len, 23, "derived from the netmask");
        assert_eq!(offer.gateway, Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn subnet_cidr_wins_over_mask() {
        let output = "\
new_ip_address=10.0.0.7
new_subnet_mask=255.255.255.0
new_subnet_cidr=25
";
        let offer = parse_offer(output).unwrap();
        assert_eq!(offer.prefix_len, 25);
    }

    #[test]
    fn offer_without_address_is_rejected() {
        assert!(parse_offer("new_subnet_cidr=24\n").is_none());
        assert!(parse_offer("").is_none());
        assert!(parse_offer("reason=TIMEOUT\n").is_none());
    }

    #[test]
    fn offer_without_prefix_length_is_rejected() {
        assert!(parse_offer("new_ip_address=10.0.0.7\n").is_none());
    }

    #[test]
    fn netmask_conversion() {
        assert_eq!(netmask_to_prefix_len("255.255.255.0".parse().unwrap()), Some(24));
        assert_eq!(netmask_to_prefix_len("255.255.254.0".parse().unwrap()), Some(23));
        assert_eq!(netmask_to_prefix_len("255.255.255.255".parse().unwrap()), Some(32));
        assert_eq!(netmask_to_prefix_len("0.0.0.0".parse().unwrap()), Some(0));
        assert_eq!(
            netmask_to_prefix_len("255.0.255.0".parse().unwrap()),
            None,
            "non-contiguous masks are refused"
        );
    }

    #[test]
    fn custom_command_path_is_respected() {
        let client = DhcpcdClient::with_command("/usr/sbin/dhcpcd");
        assert_eq!(client.dhcpcd_cmd, "/usr/sbin/dhcpcd");
    }
}
