// # iproute2 Adapter
//
// This crate drives Linux interface configuration through the `ip` command
// from iproute2.
//
// ## Purpose
//
// The primary AdapterControl implementation for deployments on Linux:
// - Enumerates and inspects links with `ip -o link show`
// - Applies and removes addresses with `ip address add/del`
// - Replaces the default route with `ip route replace`
// - Watches for link changes by following `ip -o monitor link`
//
// ## Architecture
//
// Every verb is one short-lived subprocess; nothing is cached between
// calls, so the adapter always reports what the kernel currently holds.
// The watcher keeps a single long-lived `ip monitor` child whose stdout
// lines are translated into LinkEvents. iproute2 applies changes
// immediately, so commit() is a no-op.

use std::net::IpAddr;
use std::pin::Pin;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};

use ifsync_core::traits::{AdapterControl, LinkEvent, LinkStatus};
use ifsync_core::types::{IpPrefix, MacAddress};
use ifsync_core::{Error, Result};

/// Default path of the iproute2 binary
const DEFAULT_IP_CMD: &str = "/sbin/ip";

/// iproute2-backed adapter control
pub struct IprouteAdapter {
    /// Path of the `ip` binary
    ip_cmd: String,
}

impl IprouteAdapter {
    /// Create an adapter using the standard `ip` location
    pub fn new() -> Self {
        Self {
            ip_cmd: DEFAULT_IP_CMD.to_string(),
        }
    }

    /// Create an adapter using a specific `ip` binary
    pub fn with_command(ip_cmd: impl Into<String>) -> Self {
        Self {
            ip_cmd: ip_cmd.into(),
        }
    }

    /// Run one `ip` invocation and capture stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", self.ip_cmd, args.join(" "));

        let output = Command::new(&self.ip_cmd)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::adapter(format!("could not spawn {}: {}", self.ip_cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(Error::adapter(format!(
                "{} {} exited with {}: {}",
                self.ip_cmd,
                args.join(" "),
                output.status.code().unwrap_or(-1),
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for IprouteAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdapterControl for IprouteAdapter {
    async fn interfaces(&self) -> Result<Vec<String>> {
        let output = self.run(&["-o", "link", "show"]).await?;
        Ok(parse_link_names(&output))
    }

    async fn link_status(&self, interface: &str) -> Result<LinkStatus> {
        let output = self
            .run(&["-o", "link", "show", "dev", interface])
            .await
            .map_err(|_| Error::adapter_unavailable(interface))?;
        parse_link_status(&output).ok_or_else(|| Error::adapter_unavailable(interface))
    }

    async fn addresses(&self, interface: &str) -> Result<Vec<IpPrefix>> {
        let output = self.run(&["-o", "addr", "show", "dev", interface]).await?;
        Ok(parse_addresses(&output))
    }

    async fn add_address(
        &self,
        interface: &str,
        prefix: IpPrefix,
        broadcast: Option<IpAddr>,
    ) -> Result<()> {
        let prefix = prefix.to_string();
        let mut args = vec!["address", "add", prefix.as_str()];
        let broadcast = broadcast.map(|b| b.to_string());
        if let Some(ref broadcast) = broadcast {
            args.push("broadcast");
            args.push(broadcast);
        }
        args.extend_from_slice(&["dev", interface]);
        self.run(&args).await.map(|_| ())
    }

    async fn remove_address(&self, interface: &str, prefix: IpPrefix) -> Result<()> {
        let prefix = prefix.to_string();
        self.run(&["address", "del", prefix.as_str(), "dev", interface])
            .await
            .map(|_| ())
    }

    async fn set_gateway(&self, interface: &str, gateway: IpAddr) -> Result<()> {
        let gateway = gateway.to_string();
        self.run(&[
            "route",
            "replace",
            "default",
            "via",
            gateway.as_str(),
            "dev",
            interface,
        ])
        .await
        .map(|_| ())
    }

    async fn set_link(&self, interface: &str, up: bool) -> Result<()> {
        let state = if up { "up" } else { "down" };
        self.run(&["link", "set", "dev", interface, state])
            .await
            .map(|_| ())
    }

    async fn commit(&self, _interface: &str) -> Result<()> {
        // iproute2 applies every change immediately
        Ok(())
    }

    fn watch(&self) -> Pin<Box<dyn Stream<Item = LinkEvent> + Send + 'static>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let ip_cmd = self.ip_cmd.clone();

        tokio::spawn(async move {
            info!("Starting link monitor ({} -o monitor link)", ip_cmd);

            let child = Command::new(&ip_cmd)
                .args(["-o", "monitor", "link"])
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn();

            let mut child = match child {
                Ok(child) => child,
                Err(e) => {
                    error!("Could not start {} monitor: {}", ip_cmd, e);
                    return;
                }
            };

            let Some(stdout) = child.stdout.take() else {
                error!("Monitor child has no stdout");
                return;
            };
            let mut lines = BufReader::new(stdout).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_monitor_line(&line) {
                            debug!(
                                "Link change: {} up={} running={}",
                                event.interface, event.up, event.running
                            );
                            if tx.send(event).is_err() {
                                debug!("Watcher dropped, stopping link monitor");
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        warn!("Link monitor exited");
                        break;
                    }
                    Err(e) => {
                        warn!("Link monitor read failed: {}", e);
                        break;
                    }
                }
            }

            let _ = child.kill().await;
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Interface name from one `ip -o link show` line
///
/// Names come with a trailing colon and, for virtual links, a `@parent`
/// suffix that is not part of the device name.
fn link_name(field: &str) -> String {
    let trimmed = field.trim_end_matches(':');
    match trimmed.split_once('@') {
        Some((name, _)) => name.to_string(),
        None => trimmed.to_string(),
    }
}

/// Flag list between `<` and `>` on a link line
fn link_flags(line: &str) -> Vec<&str> {
    let Some(start) = line.find('<') else {
        return Vec::new();
    };
    let Some(end) = line[start..].find('>') else {
        return Vec::new();
    };
    line[start + 1..start + end].split(',').collect()
}

/// Every interface name in `ip -o link show` output
fn parse_link_names(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(link_name)
        .collect()
}

/// Link status from `ip -o link show dev <name>` output
///
/// The `UP` flag is the administrative state; `LOWER_UP` means a carrier
/// is present. The hardware address follows the `link/ether` token; other
/// link types (loopback, tunnels) carry no usable MAC.
fn parse_link_status(output: &str) -> Option<LinkStatus> {
    let line = output.lines().next()?;
    if line.split_whitespace().nth(1).is_none() {
        return None;
    }

    let flags = link_flags(line);
    let up = flags.iter().any(|f| *f == "UP");
    let running = flags.iter().any(|f| *f == "LOWER_UP");

    let mut mac = None;
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "link/ether" {
            mac = tokens
                .next()
                .and_then(|t| t.parse::<MacAddress>().ok())
                .filter(|m| !m.is_zero());
            break;
        }
    }

    Some(LinkStatus { up, running, mac })
}

/// Addresses from `ip -o addr show dev <name>` output
///
/// One line per address; the prefix is the token after `inet` or `inet6`.
fn parse_addresses(output: &str) -> Vec<IpPrefix> {
    let mut addresses = Vec::new();
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "inet" || token == "inet6" {
                if let Some(prefix) = tokens.next().and_then(|t| t.parse().ok()) {
                    addresses.push(prefix);
                }
                break;
            }
        }
    }
    addresses
}

/// Translate one `ip -o monitor link` line into a LinkEvent
///
/// Deletion lines are prefixed with `Deleted`; the vanished interface is
/// reported as down. Lines that are not link reports (the monitor also
/// prints blank continuation data) yield nothing.
fn parse_monitor_line(line: &str) -> Option<LinkEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (deleted, line) = match line.strip_prefix("Deleted ") {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    // A link report starts with "<ifindex>: <name>: <flags>"
    let mut fields = line.split_whitespace();
    let index = fields.next()?;
    if !index.ends_with(':') || index.trim_end_matches(':').parse::<u32>().is_err() {
        return None;
    }
    let name = link_name(fields.next()?);
    if name.is_empty() {
        return None;
    }

    if deleted {
        return Some(LinkEvent {
            interface: name,
            up: false,
            running: false,
        });
    }

    let flags = link_flags(line);
    Some(LinkEvent {
        interface: name,
        up: flags.iter().any(|f| *f == "UP"),
        running: flags.iter().any(|f| *f == "LOWER_UP"),
    })
}
