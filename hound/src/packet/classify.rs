//! Classification of packets by TCP control flags.
//!
//! These are pure functions of a single packet. Teardown and reset segments are not used for
//! round-trip measurement and are all classified as [`Kind::Ignored`].
//!
//! [`Kind::Ignored`]: enum.Kind.html#variant.Ignored
use crate::wire::TcpSeqNumber;
use super::Packet;

/// The role a packet plays for connection tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The first leg of the handshake, SYN without ACK.
    Opening,
    /// The second leg of the handshake, SYN with ACK.
    Establishing,
    /// An acknowledgment without SYN, RST or FIN, possibly carrying data.
    Ack,
    /// Every other flag combination.
    Ignored,
}

/// The sequence number the sender expects to be acknowledged next.
///
/// A SYN occupies a single sequence number, any other segment its payload length.
pub fn expected_ack(packet: &Packet) -> TcpSeqNumber {
    if packet.flags.syn() {
        packet.seq_number + 1
    } else {
        packet.seq_number + packet.payload_len
    }
}

pub fn is_opening(packet: &Packet) -> bool {
    packet.flags.syn() && !packet.flags.ack()
}

pub fn is_establishing(packet: &Packet) -> bool {
    packet.flags.syn() && packet.flags.ack()
}

pub fn is_plain_ack(packet: &Packet) -> bool {
    let flags = packet.flags;
    flags.ack() && !flags.syn() && !flags.rst() && !flags.fin()
}

/// Categorize a packet, checking the predicates in handshake order.
///
/// Any segment with RST is `Ignored`, including SYN+RST.
pub fn classify(packet: &Packet) -> Kind {
    if packet.flags.rst() {
        Kind::Ignored
    } else if is_opening(packet) {
        Kind::Opening
    } else if is_establishing(packet) {
        Kind::Establishing
    } else if is_plain_ack(packet) {
        Kind::Ack
    } else {
        Kind::Ignored
    }
}
