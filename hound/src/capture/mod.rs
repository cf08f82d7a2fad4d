//! Packet acquisition.
//!
//! Packets are read from pcap savefiles through a [`Source`], which hands out the TCP packets
//! that pass a [`Filter`]. A live capture on Linux writes the packets passing the filter into a
//! temporary savefile, which is then analyzed like any other file.
//!
//! [`Source`]: struct.Source.html
//! [`Filter`]: struct.Filter.html
use core::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::packet::Packet;
use crate::wire::{Ipv4Address, Ipv4Repr, PcapLinkType};

mod file;
#[cfg(target_os = "linux")]
mod live;
#[cfg(target_os = "linux")]
mod sys;

pub use self::file::{Reader, Writer};

#[cfg(target_os = "linux")]
pub use self::live::{capture, default_device};

/// Live capture needs a Linux packet socket.
#[cfg(not(target_os = "linux"))]
pub fn capture(_: &crate::config::Config) -> Result<std::path::PathBuf> {
    Err(Error::Capture {
        call: "socket",
        source: std::io::Error::new(std::io::ErrorKind::Other, "live capture requires Linux"),
    })
}

/// The prefix of temporary capture files.
pub const TMP_FILE_PREFIX: &str = "hound-";

/// Selects the packets of interest.
///
/// A packet passes if it is sent from or to one of the hosts and from or to one of the ports. An
/// empty list of hosts or ports does not restrict the packets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    hosts: Vec<Ipv4Address>,
    ports: Vec<u16>,
}

impl Filter {
    pub fn new(hosts: Vec<Ipv4Address>, ports: Vec<u16>) -> Self {
        Filter { hosts, ports }
    }

    /// The filter passing every TCP packet.
    pub fn any() -> Self {
        Filter::default()
    }

    pub fn hosts(&self) -> &[Ipv4Address] {
        &self.hosts
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn matches(&self, packet: &Packet) -> bool {
        self.matches_hosts(packet.src_addr, packet.dst_addr)
            && self.matches_ports(Some((packet.src_port, packet.dst_port)))
    }

    /// Match the headers of a packet before its TCP header is decoded.
    ///
    /// Unknown ports only pass a filter without ports.
    pub fn matches_headers(&self, ip: &Ipv4Repr, ports: Option<(u16, u16)>) -> bool {
        self.matches_hosts(ip.src_addr, ip.dst_addr) && self.matches_ports(ports)
    }

    fn matches_hosts(&self, src: Ipv4Address, dst: Ipv4Address) -> bool {
        self.hosts.is_empty() || self.hosts.iter().any(|&host| host == src || host == dst)
    }

    fn matches_ports(&self, ports: Option<(u16, u16)>) -> bool {
        if self.ports.is_empty() {
            return true;
        }
        match ports {
            Some((src, dst)) => self.ports.iter().any(|&port| port == src || port == dst),
            None => false,
        }
    }

    /// The equivalent pcap filter expression.
    pub fn expression(&self) -> String {
        let mut clauses = vec![String::from("(ip)")];
        if !self.hosts.is_empty() {
            let hosts: Vec<_> = self.hosts.iter().map(|host| format!("host {}", host)).collect();
            clauses.push(format!("({})", hosts.join(" or ")));
        }
        clauses.push(String::from("tcp"));
        if !self.ports.is_empty() {
            let ports: Vec<_> = self.ports.iter().map(|port| format!("port {}", port)).collect();
            clauses.push(format!("({})", ports.join(" or ")));
        }
        clauses.join(" and ")
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.expression())
    }
}

/// Decoded and filtered packets of a savefile.
///
/// As an iterator, it yields packets until the end of the file or the first error.
#[derive(Debug)]
pub struct Source<R> {
    reader: Reader<R>,
    filter: Filter,
    skipped: u64,
    failed: bool,
}

impl Source<BufReader<File>> {
    /// Open a savefile.
    pub fn open<P: AsRef<Path>>(path: P, filter: Filter) -> Result<Self> {
        Self::new(Reader::open(path)?, filter)
    }
}

impl<R: Read> Source<R> {
    /// Decode the records of a reader.
    ///
    /// Fails with `Error::UnsupportedLink` for link layers other than Ethernet and raw IP.
    pub fn new(reader: Reader<R>, filter: Filter) -> Result<Self> {
        let link = reader.link_type();
        if let PcapLinkType::Unknown(_) = link {
            return Err(Error::UnsupportedLink(link));
        }
        net_debug!("reading {} with filter {}", reader.header(), filter);

        Ok(Source {
            reader,
            filter,
            skipped: 0,
            failed: false,
        })
    }

    /// The next packet passing the filter, `None` at the end of the file.
    ///
    /// The filter applies before the TCP header is decoded, so a malformed segment is only an
    /// error when it passes.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        let link = self.reader.link_type();
        let filter = &self.filter;
        while let Some((record, data)) = self.reader.next_record()? {
            let decoded = Packet::decode_matching(link, &record, data,
                |ip, ports| filter.matches_headers(ip, ports))?;
            match decoded {
                Some(packet) => return Ok(Some(packet)),
                None => self.skipped += 1,
            }
        }
        Ok(None)
    }

    /// The number of records that were not TCP or did not pass the filter.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

impl<R: Read> Iterator for Source<R> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_packet().transpose();
        if let Some(Err(_)) = next {
            self.failed = true;
        }
        next
    }
}
