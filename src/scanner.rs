// nmap invocation and XML result parsing
//
// The scanner is a thin collaborator around the nmap binary: it assembles
// the command line for the selected scan mode, runs it, and decodes the
// `-oX -` XML stream into flat HostRecord values the renderer consumes.

use std::net::Ipv4Addr;
use std::process::Command;

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::geometry::Subnet;

// ============================================================================
// SCAN MODES
// ============================================================================

// The kind of scan to launch. Host discovery measures RTT; the port-scan
// modes measure how many ports each host has open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanMode {
    // Host discovery only (nmap -sP)
    #[value(name = "hostup")]
    HostUp,

    // TCP connect scan of ports 80 and 443
    #[value(name = "webports")]
    WebPorts,

    // TCP connect scan of nmap's default port set
    #[value(name = "defaultports")]
    DefaultPorts,

    // TCP connect scan of every TCP port
    #[value(name = "allports")]
    AllPorts,
}

impl ScanMode {
    // nmap arguments selecting this scan type.
    fn nmap_args(self) -> &'static [&'static str] {
        match self {
            ScanMode::HostUp => &["-sP"],
            ScanMode::WebPorts => &["-sT", "-p80,443"],
            ScanMode::DefaultPorts => &["-sT"],
            ScanMode::AllPorts => &["-sT", "-p-"],
        }
    }
}

// Aggressive timing, roughly -T5, chosen so an unprivileged scan of a /24
// finishes in reasonable time. Unreachable hosts simply never show up in
// the output; --open keeps closed ports out of it.
const TIMING_ARGS: &[&str] = &[
    "--max-rtt-timeout=300ms",
    "--min-rtt-timeout=50ms",
    "--initial-rtt-timeout=200ms",
    "--max-retries=1",
    "--host-timeout=5m",
];

// ============================================================================
// RESULTS
// ============================================================================

// A single scanned host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub addr: Ipv4Addr,

    // Smoothed round-trip time in microseconds; 0 when nmap reports none.
    pub rtt_us: u64,

    // Open ports as "protocol/portid" strings (e.g. "tcp/443").
    pub open_ports: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to launch nmap (is it installed and on $PATH?): {0}")]
    Spawn(#[from] std::io::Error),

    #[error("nmap exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("could not parse nmap XML output: {0}")]
    Xml(#[from] quick_xml::DeError),
}

// Run an nmap scan against the subnet and return a record per found host.
//
// Fatal on spawn failure, a non-success exit, or undecodable XML; there is
// nothing to render without scan results.
pub fn scan(subnet: Subnet, mode: ScanMode) -> Result<Vec<HostRecord>, ScanError> {
    let target = subnet.to_string();
    let mut cmd = Command::new("nmap");
    cmd.arg(&target)
        .args(["-oX", "-", "-n", "--open"])
        .args(TIMING_ARGS)
        .args(mode.nmap_args());
    debug!(?cmd, "running nmap");

    let output = cmd.output()?;
    if !output.status.success() {
        return Err(ScanError::Failed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_results(&String::from_utf8_lossy(&output.stdout))
}

// ============================================================================
// XML DECODING
// ============================================================================

// Mirror of the slice of nmap's XML schema we care about. Everything else
// in the document (scaninfo, runstats, hostnames, ...) is ignored.

#[derive(Debug, Deserialize)]
struct XmlRun {
    #[serde(default, rename = "host")]
    hosts: Vec<XmlHost>,
}

#[derive(Debug, Deserialize)]
struct XmlHost {
    // One element per address family found (ipv4, mac, ...).
    #[serde(default, rename = "address")]
    addresses: Vec<XmlAddress>,

    #[serde(default, rename = "times")]
    times: Vec<XmlTimes>,

    #[serde(default, rename = "ports")]
    ports: Vec<XmlPorts>,
}

#[derive(Debug, Deserialize)]
struct XmlAddress {
    #[serde(rename = "@addr")]
    addr: String,

    #[serde(rename = "@addrtype")]
    addrtype: String,
}

#[derive(Debug, Deserialize)]
struct XmlTimes {
    #[serde(rename = "@srtt")]
    srtt: String,
}

#[derive(Debug, Deserialize)]
struct XmlPorts {
    #[serde(default, rename = "port")]
    ports: Vec<XmlPort>,
}

#[derive(Debug, Deserialize)]
struct XmlPort {
    #[serde(rename = "@protocol")]
    protocol: String,

    #[serde(rename = "@portid")]
    portid: String,

    state: XmlState,
}

#[derive(Debug, Deserialize)]
struct XmlState {
    #[serde(rename = "@state")]
    state: String,
}

// Decode nmap XML into host records.
//
// Hosts without a parseable IPv4 address are dropped (a MAC-only entry is
// useless to the renderer); a missing or malformed srtt leaves the RTT at 0
// rather than discarding the host.
fn parse_results(xml: &str) -> Result<Vec<HostRecord>, ScanError> {
    let run: XmlRun = quick_xml::de::from_str(xml)?;

    let mut records = Vec::new();
    for host in run.hosts {
        let Some(addr) = host
            .addresses
            .iter()
            .filter(|a| a.addrtype == "ipv4")
            .find_map(|a| a.addr.parse::<Ipv4Addr>().ok())
        else {
            continue;
        };

        let rtt_us = host
            .times
            .iter()
            .find_map(|t| t.srtt.parse::<u64>().ok())
            .unwrap_or(0);

        let mut open_ports = Vec::new();
        for ports in &host.ports {
            for port in &ports.ports {
                if port.state.state == "open" {
                    open_ports.push(format!("{}/{}", port.protocol, port.portid));
                }
            }
        }

        records.push(HostRecord {
            addr,
            rtt_us,
            open_ports,
        });
    }

    Ok(records)
}
