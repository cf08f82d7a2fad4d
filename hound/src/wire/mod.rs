/*! Low-level packet access.

# An overview over packet representations

The `wire` module deals with the packet *representation* of captured data. It provides two levels
of functionality.

 * First, it provides functions to extract fields from sequences of octets. This happens in the
   lowercase structures e.g. [`ethernet_frame`] or [`tcp_packet`]. These are dynamically sized
   wrappers around a byte slice.
 * Second, it provides a compact, high-level representation of header data that can be created
   from parsing. This happens through the `Repr` family of structs, e.g. [`Ipv4Repr`] or
   [`TcpRepr`]. The savefile headers are the only ones that are ever written, so they also have an
   `emit` method.

[`ethernet_frame`]: struct.ethernet_frame.html
[`tcp_packet`]: struct.tcp_packet.html
[`Ipv4Repr`]: struct.Ipv4Repr.html
[`TcpRepr`]: struct.TcpRepr.html

The `packet` family of data structures guarantees that, if the `packet::check_len()` method
returned `Ok(())`, then no field accessor method will panic. The `packet::new_checked` method is a
shorthand for combining `new_unchecked` and `check_len`. When parsing untrusted input, which every
capture is, it is *necessary* to use the checked methods.

In the `Repr` family of data structures, the `Repr::parse()` method never panics.

# Examples

To parse the IPv4 header of a captured packet:

```rust
use hound::wire::*;
let bytes = [
    0x45, 0x00, 0x00, 0x14,
    0x00, 0x00, 0x40, 0x00,
    0x40, 0x06, 0x00, 0x00,
    0x0a, 0x00, 0x00, 0x01,
    0x0a, 0x00, 0x00, 0x02,
];
let packet = ipv4_packet::new_checked(&bytes[..])
    .expect("truncated packet");
let repr = Ipv4Repr::parse(packet, Checksum::Ignored)
    .expect("malformed packet");
assert_eq!(repr.src_addr, Ipv4Address::new(10, 0, 0, 1));
assert_eq!(repr.protocol, IpProtocol::Tcp);
```
*/
// Copyright (C) 2016 whitequark@whitequark.org
// Copyright (C) 2019 Andreas Molzer <andreas.molzer@tum.de>
//
// in large parts from `smoltcp` originally distributed under 0-clause BSD
//
// Applies to files in this folder unless otherwise noted. These are:
// * `error.rs`
// * `ethernet.rs`
// * `ipv4.rs`
// * `mod.rs` (this file)
// * `tcp.rs`
#![allow(missing_docs)]

mod field {
    pub(crate) type Field = ::core::ops::Range<usize>;
    pub(crate) type Rest  = ::core::ops::RangeFrom<usize>;
}

mod ethernet;
mod error;
mod ipv4;
mod tcp;
pub mod pcap;

/// Describes how to handle checksums.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checksum {
    /// Checksum must be checked manually.
    Manual,

    /// The checksum field is not checked.
    ///
    /// Packets captured on the sending host usually carry checksums that the NIC only fills in
    /// later.
    Ignored,
}

impl Checksum {
    /// Check if the checksum should be verified.
    pub fn manual(self) -> bool {
        match self {
            Checksum::Manual => true,
            Checksum::Ignored => false,
        }
    }
}

pub use self::ethernet::{
    ethernet as ethernet_frame,
    EtherType as EthernetProtocol,
    Address as EthernetAddress};

pub use self::error::{
    Error,
    Result};

pub use self::ipv4::{
    ipv4 as ipv4_packet,
    Address as Ipv4Address,
    Protocol as IpProtocol,
    Repr as Ipv4Repr};

pub use self::tcp::{
    tcp as tcp_packet,
    SeqNumber as TcpSeqNumber,
    Flags as TcpFlags,
    TcpOption,
    Repr as TcpRepr};

pub use self::pcap::{
    FileHeader as PcapHeader,
    RecordHeader as PcapRecord,
    LinkType as PcapLinkType};
