//! Decoded TCP/IPv4 packet records.
//!
//! A [`Packet`] holds exactly the header fields that connection tracking relies on, copied out of
//! a captured frame. The classification of a packet by its control flags lives in [`classify`].
//!
//! [`Packet`]: struct.Packet.html
//! [`classify`]: classify/index.html
use core::fmt;

use crate::time::Instant;
use crate::wire::{
    Checksum, Error, Result,
    EthernetProtocol, ethernet_frame,
    IpProtocol, Ipv4Address, Ipv4Repr, ipv4_packet,
    PcapLinkType, PcapRecord,
    TcpFlags, TcpRepr, TcpSeqNumber, tcp_packet};

pub mod classify;

pub use self::classify::Kind;

/// The fields of a captured TCP segment in an IPv4 packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// The capture time.
    pub timestamp: Instant,
    pub src_addr: Ipv4Address,
    pub dst_addr: Ipv4Address,
    pub src_port: u16,
    pub dst_port: u16,
    pub seq_number: TcpSeqNumber,
    /// The acknowledgment number, only meaningful with the ACK flag.
    pub ack_number: TcpSeqNumber,
    /// Length of the segment payload, as sent.
    ///
    /// This is derived from the IPv4 length fields and not from the captured bytes, so that a
    /// snapshot length cutting the payload short does not change the expected acknowledgment.
    pub payload_len: usize,
    pub flags: TcpFlags,
    /// The RFC 7323 timestamp option, `(value, echo reply)`.
    pub timestamps: Option<(u32, u32)>,
}

impl Packet {
    /// Decode a captured frame.
    ///
    /// Returns `Ok(None)` for frames that are not TCP in IPv4, such as ARP or IPv6 traffic. An IPv4
    /// or TCP header that can not be parsed is an error. A payload shortened by the capture is
    /// only permitted when the record says so.
    pub fn decode(link: PcapLinkType, record: &PcapRecord, data: &[u8]) -> Result<Option<Packet>> {
        Self::decode_matching(link, record, data, |_, _| true)
    }

    /// Decode a captured frame if its headers are accepted.
    ///
    /// `accept` sees the IPv4 header of every TCP packet and its ports, which are `None` when the
    /// packet is a later fragment or the capture cut them off. Rejected packets are `Ok(None)`
    /// without their TCP header being checked, so only accepted packets can fail on it.
    /// Fragments are not reassembled and are `Unsupported` once accepted.
    pub fn decode_matching<F>(link: PcapLinkType, record: &PcapRecord, data: &[u8], accept: F)
        -> Result<Option<Packet>>
    where
        F: FnOnce(&Ipv4Repr, Option<(u16, u16)>) -> bool,
    {
        let bytes = match link {
            PcapLinkType::Ethernet => {
                let frame = ethernet_frame::new_checked(data)?;
                match frame.payload_ethertype() {
                    EthernetProtocol::Ipv4 => frame.payload_slice(),
                    other => {
                        net_trace!("skipping {} frame", other);
                        return Ok(None)
                    },
                }
            },
            PcapLinkType::Raw => match data.first() {
                None => return Err(Error::Truncated),
                Some(byte) if byte >> 4 == 4 => data,
                Some(_) => return Ok(None),
            },
            PcapLinkType::Ipv4 => data,
            PcapLinkType::Unknown(_) => return Err(Error::Unrecognized),
        };

        let ip = ipv4_packet::new_unchecked(bytes);
        let ip_repr = Ipv4Repr::parse(ip, Checksum::Ignored)?;
        if ip_repr.protocol != IpProtocol::Tcp {
            net_trace!("skipping {}", ip_repr);
            return Ok(None)
        }

        let fragment = ip.more_frags() || ip.frag_offset() != 0;
        let ports = match ip.captured_payload() {
            payload if ip.frag_offset() == 0 && payload.len() >= 4 => {
                let tcp = tcp_packet::new_unchecked(payload);
                Some((tcp.src_port(), tcp.dst_port()))
            },
            _ => None,
        };
        if !accept(&ip_repr, ports) {
            net_trace!("filtered {}", ip_repr);
            return Ok(None)
        }
        if fragment {
            return Err(Error::Unsupported)
        }

        if !record.is_truncated() {
            ip.check_len()?;
        }
        let tcp = tcp_packet::new_checked(ip.captured_payload())?;
        let tcp_repr = TcpRepr::parse(tcp)?;
        let payload_len = ip_repr.payload_len
            .checked_sub(usize::from(tcp.header_len()))
            .ok_or(Error::Malformed)?;

        Ok(Some(Packet::from_reprs(record.timestamp, &ip_repr, &tcp_repr, payload_len)))
    }

    /// Combine parsed header representations.
    pub fn from_reprs(timestamp: Instant, ip: &Ipv4Repr, tcp: &TcpRepr, payload_len: usize) -> Self {
        Packet {
            timestamp,
            src_addr: ip.src_addr,
            dst_addr: ip.dst_addr,
            src_port: tcp.src_port,
            dst_port: tcp.dst_port,
            seq_number: tcp.seq_number,
            ack_number: tcp.ack_number,
            payload_len,
            flags: tcp.flags,
            timestamps: tcp.timestamps,
        }
    }

    /// The sequence number this segment expects the peer to acknowledge.
    pub fn expected_ack(&self) -> TcpSeqNumber {
        classify::expected_ack(self)
    }

    /// Categorize the packet by its control flags.
    pub fn kind(&self) -> Kind {
        classify::classify(self)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}:{} -> {}:{} [{}] seq={}",
            self.timestamp, self.src_addr, self.src_port,
            self.dst_addr, self.dst_port, self.flags, self.seq_number)?;
        if self.flags.ack() {
            write!(f, " ack={}", self.ack_number)?;
        }
        write!(f, " len={}", self.payload_len)
    }
}
