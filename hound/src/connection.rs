//! Tracked TCP connections.
//!
//! A [`Connection`] is created from the opening SYN and keeps the samples of both directions.
//! The [`ConnectionTable`] owns all connections in discovery order and locates the one a packet
//! belongs to, either by its exact endpoints or, for compatibility, by port only.
//!
//! [`Connection`]: struct.Connection.html
//! [`ConnectionTable`]: struct.ConnectionTable.html
use core::fmt;
use std::collections::HashMap;
use std::slice;

use serde::Deserialize;

use crate::error::Result;
use crate::packet::Packet;
use crate::sample::{Sample, SampleSet};
use crate::time::{Duration, Instant};
use crate::wire::{Ipv4Address, TcpSeqNumber};

/// A direction of a connection, relative to the sender of the opening SYN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the SYN sender to its peer.
    SrcToDst,
    /// Towards the SYN sender.
    DstToSrc,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::SrcToDst => Direction::DstToSrc,
            Direction::DstToSrc => Direction::SrcToDst,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::SrcToDst => write!(f, "Src to Dst"),
            Direction::DstToSrc => write!(f, "Dst to Src"),
        }
    }
}

/// The endpoints of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourTuple {
    pub src_addr: Ipv4Address,
    pub src_port: u16,
    pub dst_addr: Ipv4Address,
    pub dst_port: u16,
}

impl FourTuple {
    /// The endpoints of a packet, oriented as it was sent.
    pub fn of(packet: &Packet) -> Self {
        FourTuple {
            src_addr: packet.src_addr,
            src_port: packet.src_port,
            dst_addr: packet.dst_addr,
            dst_port: packet.dst_port,
        }
    }

    /// The same endpoints seen from the other side.
    pub fn reverse(self) -> Self {
        FourTuple {
            src_addr: self.dst_addr,
            src_port: self.dst_port,
            dst_addr: self.src_addr,
            dst_port: self.src_port,
        }
    }
}

impl fmt::Display for FourTuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{} -> {}:{}", self.src_addr, self.src_port, self.dst_addr, self.dst_port)
    }
}

/// How the table locates the connection of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Match the exact endpoints of a connection, in either orientation.
    FourTuple,
    /// Match when the source port of the packet is either port of the connection.
    ///
    /// This reproduces the historical behaviour and is imprecise: flows of different peers
    /// sharing a server port are all attributed to the first of them.
    PortOnly,
}

impl Default for MatchMode {
    fn default() -> Self {
        MatchMode::FourTuple
    }
}

/// A bidirectional TCP flow.
#[derive(Debug, Clone)]
pub struct Connection {
    tuple: FourTuple,
    src_to_dst: SampleSet,
    dst_to_src: SampleSet,
    established: bool,
    initial_rtt: Option<Duration>,
    start: Instant,
}

impl Connection {
    /// Track a new connection opened by a SYN.
    ///
    /// The SYN itself starts the first sample from source to destination.
    pub fn open(syn: &Packet) -> Self {
        let mut src_to_dst = SampleSet::new();
        // An empty set accepts any key.
        let _ = src_to_dst.insert(syn.expected_ack(), syn.timestamp);

        Connection {
            tuple: FourTuple::of(syn),
            src_to_dst,
            dst_to_src: SampleSet::new(),
            established: false,
            initial_rtt: None,
            start: syn.timestamp,
        }
    }

    /// The endpoints, oriented from the SYN sender.
    pub fn tuple(&self) -> FourTuple {
        self.tuple
    }

    pub fn src_addr(&self) -> Ipv4Address {
        self.tuple.src_addr
    }

    pub fn src_port(&self) -> u16 {
        self.tuple.src_port
    }

    pub fn dst_addr(&self) -> Ipv4Address {
        self.tuple.dst_addr
    }

    pub fn dst_port(&self) -> u16 {
        self.tuple.dst_port
    }

    /// The capture time of the opening SYN.
    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn is_established(&self) -> bool {
        self.established
    }

    /// The time from the SYN to the handshake-completing ACK.
    pub fn initial_rtt(&self) -> Option<Duration> {
        self.initial_rtt
    }

    /// Whether the packet's source port is either port of the connection.
    ///
    /// Addresses are not compared at all.
    pub fn belongs_to(&self, packet: &Packet) -> bool {
        packet.src_port == self.tuple.src_port || packet.src_port == self.tuple.dst_port
    }

    /// Whether the packet was sent from the source to the destination address.
    pub fn is_outgoing(&self, packet: &Packet) -> bool {
        packet.src_addr == self.tuple.src_addr && packet.dst_addr == self.tuple.dst_addr
    }

    /// Whether the packet was sent from the destination to the source address.
    pub fn is_incoming(&self, packet: &Packet) -> bool {
        packet.src_addr == self.tuple.dst_addr && packet.dst_addr == self.tuple.src_addr
    }

    /// The direction in which the packet travels.
    ///
    /// Exact endpoints are compared first, so that both directions of a flow between two
    /// sockets of the same host are told apart. Otherwise only the addresses decide.
    pub fn direction_of(&self, packet: &Packet) -> Option<Direction> {
        let tuple = FourTuple::of(packet);
        if tuple == self.tuple {
            Some(Direction::SrcToDst)
        } else if tuple == self.tuple.reverse() {
            Some(Direction::DstToSrc)
        } else if self.is_outgoing(packet) {
            Some(Direction::SrcToDst)
        } else if self.is_incoming(packet) {
            Some(Direction::DstToSrc)
        } else {
            None
        }
    }

    /// The samples of segments sent in a direction.
    pub fn samples(&self, direction: Direction) -> &SampleSet {
        match direction {
            Direction::SrcToDst => &self.src_to_dst,
            Direction::DstToSrc => &self.dst_to_src,
        }
    }

    fn samples_mut(&mut self, direction: Direction) -> &mut SampleSet {
        match direction {
            Direction::SrcToDst => &mut self.src_to_dst,
            Direction::DstToSrc => &mut self.dst_to_src,
        }
    }

    /// Start a sample for a segment sent in `direction`.
    ///
    /// Fails with `Error::DuplicateSample` when this direction already has a sample expecting
    /// the same acknowledgment.
    pub fn add_sample(&mut self, direction: Direction, expected_ack: TcpSeqNumber, sent_at: Instant)
        -> Result<&Sample>
    {
        self.samples_mut(direction).insert(expected_ack, sent_at)
    }

    /// Find the sample of a segment sent in `direction` which `ack` acknowledges.
    pub fn find_sample(&mut self, direction: Direction, ack: TcpSeqNumber) -> Option<&mut Sample> {
        self.samples_mut(direction).get_mut(ack)
    }

    /// Complete the handshake with the final ACK captured at `at`.
    ///
    /// Returns the initial round-trip time if this call established the connection, `None` when
    /// it was established already. The initial round-trip time stays absent if `at` precedes
    /// the SYN.
    pub fn establish(&mut self, at: Instant) -> Option<Duration> {
        if self.established {
            return None;
        }

        self.established = true;
        self.initial_rtt = at.checked_duration_since(self.start);
        self.initial_rtt
    }
}

/// All tracked connections, in the order of their discovery.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    mode: MatchMode,
    connections: Vec<Connection>,
    /// The first connection with each oriented tuple.
    index: HashMap<FourTuple, usize>,
}

impl ConnectionTable {
    pub fn new(mode: MatchMode) -> Self {
        ConnectionTable {
            mode,
            connections: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Append a connection, returning its position.
    ///
    /// A connection with the same endpoints as an earlier one is kept, but lookups keep
    /// returning the earlier one.
    pub fn append(&mut self, connection: Connection) -> usize {
        let idx = self.connections.len();
        self.index.entry(connection.tuple()).or_insert(idx);
        self.connections.push(connection);
        idx
    }

    /// Locate the position of the first connection the packet belongs to.
    pub fn find(&self, packet: &Packet) -> Option<usize> {
        match self.mode {
            MatchMode::FourTuple => {
                let tuple = FourTuple::of(packet);
                let forward = self.index.get(&tuple).cloned();
                let reverse = self.index.get(&tuple.reverse()).cloned();
                match (forward, reverse) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                }
            },
            MatchMode::PortOnly => self.connections
                .iter()
                .position(|connection| connection.belongs_to(packet)),
        }
    }

    /// Locate the first connection the packet belongs to.
    pub fn find_mut(&mut self, packet: &Packet) -> Option<&mut Connection> {
        let idx = self.find(packet)?;
        self.connections.get_mut(idx)
    }

    pub fn get(&self, idx: usize) -> Option<&Connection> {
        self.connections.get(idx)
    }

    pub fn iter(&self) -> slice::Iter<Connection> {
        self.connections.iter()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Release the connections, in discovery order.
    pub fn into_vec(self) -> Vec<Connection> {
        self.connections
    }
}

impl<'a> IntoIterator for &'a ConnectionTable {
    type Item = &'a Connection;
    type IntoIter = slice::Iter<'a, Connection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests;
