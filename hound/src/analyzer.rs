//! The per-packet state machine.
//!
//! Packets are processed strictly in capture order. Each connection goes through the handshake
//! from the opening SYN over the SYN-ACK to the establishing ACK, after which every segment in
//! either direction starts a sample that the peer's acknowledgment completes.
use core::fmt;

use crate::connection::{Connection, ConnectionTable, Direction, MatchMode};
use crate::error::{Error, Result};
use crate::packet::{Kind, Packet};

/// Counters of one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// All processed packets.
    pub packets: u64,
    /// Opening SYN segments, one connection each.
    pub opened: u64,
    pub establishing: u64,
    pub acks: u64,
    /// Packets with flags that play no role in measurement.
    pub ignored: u64,
    /// Handshake or ack packets without a connection.
    pub unmatched: u64,
    /// Samples not started since one with the same expected acknowledgment existed.
    pub duplicates: u64,
    /// Samples completed by an acknowledgment.
    pub completed: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} packets: {} opened, {} establishing, {} acks, {} ignored, {} unmatched; \
            {} samples completed, {} duplicates",
            self.packets, self.opened, self.establishing, self.acks, self.ignored,
            self.unmatched, self.completed, self.duplicates)
    }
}

/// Drives connection tracking over a sequence of packets.
#[derive(Debug, Default)]
pub struct Analyzer {
    table: ConnectionTable,
    stats: Stats,
}

impl Analyzer {
    pub fn new(mode: MatchMode) -> Self {
        Analyzer {
            table: ConnectionTable::new(mode),
            stats: Stats::default(),
        }
    }

    /// Process all packets, stopping at the first error.
    ///
    /// Connections collected before an error are kept and can still be inspected.
    pub fn run<I>(&mut self, packets: I) -> Result<()>
        where I: IntoIterator<Item=Result<Packet>>
    {
        for packet in packets {
            let packet = match packet {
                Ok(packet) => packet,
                Err(err) => {
                    net_debug!("aborting after {}: {}", self.stats, err);
                    return Err(err)
                },
            };
            self.process(&packet);
        }

        net_debug!("analyzed {} matching by {:?}", self.stats, self.table.mode());
        Ok(())
    }

    /// Process a single packet.
    ///
    /// Packets that match no connection or start a duplicate sample only update the counters.
    pub fn process(&mut self, packet: &Packet) {
        self.stats.packets += 1;
        let stats = &mut self.stats;

        match packet.kind() {
            Kind::Opening => {
                stats.opened += 1;
                let idx = self.table.append(Connection::open(packet));
                net_trace!("#{} opened {}", idx, packet);
            },
            Kind::Establishing => {
                stats.establishing += 1;
                let connection = match self.table.find_mut(packet) {
                    Some(connection) => connection,
                    None => return unmatched(stats, packet),
                };
                complete(connection, stats, Direction::SrcToDst, packet);
                start(connection, stats, Direction::DstToSrc, packet);
            },
            Kind::Ack => {
                stats.acks += 1;
                let connection = match self.table.find_mut(packet) {
                    Some(connection) => connection,
                    None => return unmatched(stats, packet),
                };
                match connection.direction_of(packet) {
                    Some(Direction::SrcToDst) => {
                        complete(connection, stats, Direction::DstToSrc, packet);
                        if connection.is_established() {
                            start(connection, stats, Direction::SrcToDst, packet);
                        } else {
                            let initial = connection.establish(packet.timestamp);
                            net_debug!("{} established, initial rtt {:?}", connection.tuple(), initial);
                        }
                    },
                    Some(Direction::DstToSrc) => {
                        complete(connection, stats, Direction::SrcToDst, packet);
                        start(connection, stats, Direction::DstToSrc, packet);
                    },
                    None => unmatched(stats, packet),
                }
            },
            Kind::Ignored => {
                stats.ignored += 1;
                net_trace!("ignored {}", packet);
            },
        }
    }

    pub fn connections(&self) -> &ConnectionTable {
        &self.table
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn into_connections(self) -> ConnectionTable {
        self.table
    }
}

fn unmatched(stats: &mut Stats, packet: &Packet) {
    stats.unmatched += 1;
    net_trace!("no connection for {}", packet);
}

/// Complete the sample of the segment in `direction` which the packet acknowledges.
fn complete(connection: &mut Connection, stats: &mut Stats, direction: Direction, packet: &Packet) {
    let rtt = connection.find_sample(direction, packet.ack_number)
        .and_then(|sample| sample.complete(packet.timestamp));
    if let Some(rtt) = rtt {
        stats.completed += 1;
        net_trace!("{} {} ack={} rtt={:?}", connection.tuple(), direction, packet.ack_number, rtt);
    }
}

/// Start a sample for the packet, sent in `direction`.
fn start(connection: &mut Connection, stats: &mut Stats, direction: Direction, packet: &Packet) {
    let started = connection.add_sample(direction, packet.expected_ack(), packet.timestamp)
        .map(|_| ());
    match started {
        Ok(()) => (),
        Err(Error::DuplicateSample(seq)) => {
            stats.duplicates += 1;
            net_trace!("{} {} already sampling {}", connection.tuple(), direction, seq);
        },
        Err(err) => net_debug!("{} {} sample not started: {}", connection.tuple(), direction, err),
    }
}
