//! Ping-scan probe backed by the `nmap` binary.
//!
//! The probe runs `nmap -sn -oX - <range>` and reads the XML report from
//! stdout.  Only hosts reported `up` with an IPv4 address are kept; MAC
//! address and reverse-DNS name are optional.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use super::{HostProbe, ProbeFailure};
use crate::types::{HostRecord, HostSet};

pub struct NmapProbe {
    program: String,
    timeout: Duration,
}

impl NmapProbe {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl HostProbe for NmapProbe {
    async fn probe(&self, target: &str) -> Result<HostSet, ProbeFailure> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-sn", "-oX", "-", target])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("Running {} -sn -oX - {}", self.program, target);
        let output = match timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(ProbeFailure::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) => {
                warn!("Failed to start {}: {}", self.program, e);
                return Err(ProbeFailure::ToolUnavailable(self.program.clone()));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} failed: {}", self.program, stderr.trim());
            return Err(ProbeFailure::NonZeroExit(output.status.code().unwrap_or(-1)));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ProbeFailure::MalformedOutput(e.to_string()))?;
        let hosts = parse_report(&stdout).map_err(|e| ProbeFailure::MalformedOutput(e.to_string()))?;
        debug!("Probe of {} found {} live hosts", target, hosts.len());
        Ok(hosts)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed report: {0}")]
    Malformed(String),
}

#[derive(Default)]
struct PendingHost {
    up: bool,
    ipv4: Option<String>,
    mac: Option<String>,
    hostname: Option<String>,
}

impl PendingHost {
    fn finish(self) -> Option<HostRecord> {
        match (self.up, self.ipv4) {
            (true, Some(ip)) => Some(HostRecord::new(ip, self.mac, self.hostname)),
            _ => None,
        }
    }
}

/// Parse an nmap XML report into the set of live hosts, in report order.
pub fn parse_report(xml: &str) -> Result<HostSet, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut saw_root = false;
    let mut current: Option<PendingHost> = None;
    let mut hosts = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                match name.as_ref() {
                    b"nmaprun" => saw_root = true,
                    b"host" => current = Some(PendingHost::default()),
                    _ => {
                        if let Some(host) = current.as_mut() {
                            read_host_detail(host, &e, &reader)?;
                        }
                    }
                }
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"nmaprun" => saw_root = true,
                _ => {
                    if let Some(host) = current.as_mut() {
                        read_host_detail(host, &e, &reader)?;
                    }
                }
            },
            Event::End(e) => {
                if e.name().as_ref() == b"host" {
                    if let Some(record) = current.take().and_then(PendingHost::finish) {
                        hosts.push(record);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ParseError::Malformed("missing <nmaprun> element".into()));
    }
    if current.is_some() {
        return Err(ParseError::Malformed("unterminated <host> element".into()));
    }

    Ok(hosts.into_iter().collect())
}

fn read_host_detail(
    host: &mut PendingHost,
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<(), ParseError> {
    match e.name().as_ref() {
        b"status" => {
            host.up = attribute(e, reader, b"state")?.as_deref() == Some("up");
        }
        b"address" => {
            let addr = attribute(e, reader, b"addr")?;
            match attribute(e, reader, b"addrtype")?.as_deref() {
                Some("ipv4") => host.ipv4 = addr.and_then(|a| parse_ipv4(&a)),
                Some("mac") => host.mac = addr,
                _ => {}
            }
        }
        b"hostname" if host.hostname.is_none() => {
            host.hostname = attribute(e, reader, b"name")?;
        }
        _ => {}
    }
    Ok(())
}

/// Canonical form of an IPv4 address attribute; anything else counts as absent.
fn parse_ipv4(addr: &str) -> Option<String> {
    match addr.trim().parse::<Ipv4Addr>() {
        Ok(ip) => Some(ip.to_string()),
        Err(_) => {
            warn!("Ignoring invalid IPv4 address {:?} in scan report", addr);
            None
        }
    }
}

fn attribute(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    key: &[u8],
) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            let value = attr.decode_and_unescape_value(reader.decoder())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
