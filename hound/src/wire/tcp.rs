use core::{i32, ops, cmp, fmt};
use byteorder::{ByteOrder, NetworkEndian};

use super::{Error, Result};

/// A TCP sequence number.
///
/// A sequence number is a monotonically advancing integer modulo 2<sup>32</sup>.
/// Sequence numbers do not have a discontiguity when compared pairwise across a signed overflow.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct SeqNumber(pub i32);

impl SeqNumber {
    /// The sequence number with the given unsigned wire value.
    pub const fn from_u32(value: u32) -> Self {
        SeqNumber(value as i32)
    }

    /// The unsigned value as it appears on the wire.
    pub const fn to_u32(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0 as u32)
    }
}

impl ops::Add<usize> for SeqNumber {
    type Output = SeqNumber;

    fn add(self, rhs: usize) -> SeqNumber {
        if rhs > i32::MAX as usize {
            panic!("attempt to add to sequence number with unsigned overflow")
        }
        SeqNumber(self.0.wrapping_add(rhs as i32))
    }
}

impl ops::Sub for SeqNumber {
    type Output = usize;

    fn sub(self, rhs: SeqNumber) -> usize {
        let result = self.0.wrapping_sub(rhs.0);
        if result < 0 {
            panic!("attempt to subtract sequence numbers with underflow")
        }
        result as usize
    }
}

impl cmp::PartialOrd for SeqNumber {
    fn partial_cmp(&self, other: &SeqNumber) -> Option<cmp::Ordering> {
        self.0.wrapping_sub(other.0).partial_cmp(&0)
    }
}

/// A set of tcp flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags(pub u16);

byte_wrapper! {
    /// A byte sequence representing a TCP segment, header and payload.
    #[derive(Debug, PartialEq, Eq)]
    pub struct tcp([u8]);
}

mod field {
    #![allow(non_snake_case)]

    use crate::wire::field::Field;

    pub(crate) const SRC_PORT: Field = 0..2;
    pub(crate) const DST_PORT: Field = 2..4;
    pub(crate) const SEQ_NUM:  Field = 4..8;
    pub(crate) const ACK_NUM:  Field = 8..12;
    pub(crate) const FLAGS:    Field = 12..14;
    pub(crate) const WIN_SIZE: Field = 14..16;
    pub(crate) const CHECKSUM: Field = 16..18;
    pub(crate) const URGENT:   Field = 18..20;

    pub(crate) fn OPTIONS(length: u8) -> Field {
        URGENT.end..(length as usize)
    }

    pub(crate) const FLG_FIN: u16 = 0x001;
    pub(crate) const FLG_SYN: u16 = 0x002;
    pub(crate) const FLG_RST: u16 = 0x004;
    pub(crate) const FLG_PSH: u16 = 0x008;
    pub(crate) const FLG_ACK: u16 = 0x010;
    pub(crate) const FLG_URG: u16 = 0x020;
    pub(crate) const FLG_ECE: u16 = 0x040;
    pub(crate) const FLG_CWR: u16 = 0x080;
    pub(crate) const FLG_NS:  u16 = 0x100;

    pub(crate) const OPT_END: u8 = 0x00;
    pub(crate) const OPT_NOP: u8 = 0x01;
    pub(crate) const OPT_MSS: u8 = 0x02;
    pub(crate) const OPT_WS:  u8 = 0x03;
    pub(crate) const OPT_SACKPERM: u8 = 0x04;
    pub(crate) const OPT_SACKRNG:  u8 = 0x05;
    pub(crate) const OPT_TSTAMP:   u8 = 0x08;
}

impl tcp {
    /// Imbue a raw octet buffer with TCP segment structure.
    pub fn new_unchecked(data: &[u8]) -> &tcp {
        Self::__from_macro_new_unchecked(data)
    }

    /// Shorthand for a combination of [new_unchecked] and [check_len].
    ///
    /// [new_unchecked]: #method.new_unchecked
    /// [check_len]: #method.check_len
    pub fn new_checked(data: &[u8]) -> Result<&tcp> {
        let packet = Self::new_unchecked(data);
        packet.check_len()?;
        Ok(packet)
    }

    /// View the segment as a raw byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Ensure that no header accessor method will panic if called.
    /// Returns `Err(Error::Truncated)` if the buffer is too short.
    /// Returns `Err(Error::Malformed)` if the header length field has a value smaller
    /// than the minimal header length.
    pub fn check_len(&self) -> Result<()> {
        let len = self.0.len();
        if len < field::URGENT.end {
            Err(Error::Truncated)
        } else {
            let header_len = self.header_len() as usize;
            if len < header_len {
                Err(Error::Truncated)
            } else if header_len < field::URGENT.end {
                Err(Error::Malformed)
            } else {
                Ok(())
            }
        }
    }

    /// Return the source port field.
    #[inline]
    pub fn src_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::SRC_PORT])
    }

    /// Return the destination port field.
    #[inline]
    pub fn dst_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::DST_PORT])
    }

    /// Return the sequence number field.
    #[inline]
    pub fn seq_number(&self) -> SeqNumber {
        SeqNumber(NetworkEndian::read_i32(&self.0[field::SEQ_NUM]))
    }

    /// Return the acknowledgement number field.
    ///
    /// The field is present even when the ACK flag is clear, its value is then meaningless.
    #[inline]
    pub fn ack_number(&self) -> SeqNumber {
        SeqNumber(NetworkEndian::read_i32(&self.0[field::ACK_NUM]))
    }

    /// Read all flags at once.
    pub fn flags(&self) -> Flags {
        Flags(NetworkEndian::read_u16(&self.0[field::FLAGS]) & 0x1ff)
    }

    /// Return the header length, in octets.
    #[inline]
    pub fn header_len(&self) -> u8 {
        let raw = NetworkEndian::read_u16(&self.0[field::FLAGS]);
        ((raw >> 12) * 4) as u8
    }

    /// Return the window size field.
    #[inline]
    pub fn window_len(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::WIN_SIZE])
    }

    /// Return the checksum field.
    #[inline]
    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::CHECKSUM])
    }

    /// Return the urgent pointer field.
    #[inline]
    pub fn urgent_at(&self) -> u16 {
        NetworkEndian::read_u16(&self.0[field::URGENT])
    }

    /// Return the options.
    #[inline]
    pub fn options(&self) -> &[u8] {
        &self.0[field::OPTIONS(self.header_len())]
    }

    /// Return the payload.
    #[inline]
    pub fn payload_slice(&self) -> &[u8] {
        &self.0[self.header_len() as usize..]
    }
}

impl AsRef<[u8]> for tcp {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Flags {
    /// Only the FIN flag.
    pub const FIN: Flags = Flags(field::FLG_FIN);
    /// Only the SYN flag.
    pub const SYN: Flags = Flags(field::FLG_SYN);
    /// Only the RST flag.
    pub const RST: Flags = Flags(field::FLG_RST);
    /// Only the PSH flag.
    pub const PSH: Flags = Flags(field::FLG_PSH);
    /// Only the ACK flag.
    pub const ACK: Flags = Flags(field::FLG_ACK);

    /// Return the FIN flag.
    #[inline]
    pub fn fin(&self) -> bool {
        self.0 & field::FLG_FIN != 0
    }

    /// Return the SYN flag.
    #[inline]
    pub fn syn(&self) -> bool {
        self.0 & field::FLG_SYN != 0
    }

    /// Return the RST flag.
    #[inline]
    pub fn rst(&self) -> bool {
        self.0 & field::FLG_RST != 0
    }

    /// Return the PSH flag.
    #[inline]
    pub fn psh(&self) -> bool {
        self.0 & field::FLG_PSH != 0
    }

    /// Return the ACK flag.
    #[inline]
    pub fn ack(&self) -> bool {
        self.0 & field::FLG_ACK != 0
    }

    /// Return the URG flag.
    #[inline]
    pub fn urg(&self) -> bool {
        self.0 & field::FLG_URG != 0
    }

    /// Return the ECE flag.
    #[inline]
    pub fn ece(&self) -> bool {
        self.0 & field::FLG_ECE != 0
    }

    /// Return the CWR flag.
    #[inline]
    pub fn cwr(&self) -> bool {
        self.0 & field::FLG_CWR != 0
    }

    /// Return the NS flag.
    #[inline]
    pub fn ns(&self) -> bool {
        self.0 & field::FLG_NS != 0
    }

    /// Return the length of a control flag, in terms of sequence space.
    pub fn sequence_len(self) -> usize {
        (if self.syn() { 1 } else { 0 })
        + (if self.fin() { 1 }  else { 0 })
    }
}

impl ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names = [
            (self.syn(), "syn"),
            (self.ack(), "ack"),
            (self.fin(), "fin"),
            (self.rst(), "rst"),
            (self.psh(), "psh"),
            (self.urg(), "urg"),
            (self.ece(), "ece"),
            (self.cwr(), "cwr"),
            (self.ns(), "ns"),
        ];
        let mut first = true;
        for &(set, name) in names.iter() {
            if !set {
                continue;
            }
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}", name)?;
            first = false;
        }
        if first {
            write!(f, "none")?;
        }
        Ok(())
    }
}

/// A representation of a single TCP option.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TcpOption<'a> {
    EndOfList,
    NoOperation,
    MaxSegmentSize(u16),
    WindowScale(u8),
    SackPermitted,
    SackRange([Option<(u32, u32)>; 3]),
    /// RFC 7323 timestamps, the sender's value and the echoed reply.
    Timestamps { value: u32, echo: u32 },
    Unknown { kind: u8, data: &'a [u8] }
}

impl<'a> TcpOption<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<(&'a [u8], TcpOption<'a>)> {
        let (length, option);
        match *buffer.get(0).ok_or(Error::Truncated)? {
            field::OPT_END => {
                length = 1;
                option = TcpOption::EndOfList;
            }
            field::OPT_NOP => {
                length = 1;
                option = TcpOption::NoOperation;
            }
            kind => {
                length = *buffer.get(1).ok_or(Error::Truncated)? as usize;
                let data = buffer.get(2..length).ok_or(Error::Truncated)?;
                match (kind, length) {
                    (field::OPT_MSS, 4) =>
                        option = TcpOption::MaxSegmentSize(NetworkEndian::read_u16(data)),
                    (field::OPT_MSS, _) =>
                        return Err(Error::Malformed),
                    (field::OPT_WS, 3) =>
                        option = TcpOption::WindowScale(data[0]),
                    (field::OPT_WS, _) =>
                        return Err(Error::Malformed),
                    (field::OPT_SACKPERM, 2) =>
                        option = TcpOption::SackPermitted,
                    (field::OPT_SACKPERM, _) =>
                        return Err(Error::Malformed),
                    (field::OPT_TSTAMP, 10) =>
                        option = TcpOption::Timestamps {
                            value: NetworkEndian::read_u32(&data[0..4]),
                            echo: NetworkEndian::read_u32(&data[4..8]),
                        },
                    (field::OPT_TSTAMP, _) =>
                        return Err(Error::Malformed),
                    (field::OPT_SACKRNG, n) => {
                        if n < 10 || (n-2) % 8 != 0 {
                            return Err(Error::Malformed)
                        }
                        if n > 26 {
                            // RFC 2018: a maximum of 3 SACK blocks fit next to the timestamp
                            // option. A 4th block is dropped.
                            net_debug!("sACK with >3 blocks, truncating to 3");
                        }
                        let mut sack_ranges: [Option<(u32, u32)>; 3] = [None; 3];

                        sack_ranges.iter_mut().enumerate().for_each(|(i, nmut)| {
                            let left = i * 8;
                            *nmut = if left < data.len() {
                                let mid = left + 4;
                                let right = mid + 4;
                                let range_left = NetworkEndian::read_u32(
                                    &data[left..mid]);
                                let range_right = NetworkEndian::read_u32(
                                    &data[mid..right]);
                                Some((range_left, range_right))
                            } else {
                                None
                            };
                        });
                        option = TcpOption::SackRange(sack_ranges);
                    },
                    (_, _) =>
                        option = TcpOption::Unknown { kind, data }
                }
            }
        }
        Ok((&buffer[length..], option))
    }
}

/// A high-level representation of a Transmission Control Protocol segment header.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Repr {
    pub src_port:     u16,
    pub dst_port:     u16,
    pub flags:        Flags,
    pub seq_number:   SeqNumber,
    pub ack_number:   SeqNumber,
    pub window_len:   u16,
    pub window_scale: Option<u8>,
    pub max_seg_size: Option<u16>,
    pub sack_permitted: bool,
    pub timestamps:   Option<(u32, u32)>,
    pub payload_len:  u16,
}

impl Repr {
    /// Parse a Transmission Control Protocol segment and return a high-level representation.
    ///
    /// The checksum is not verified. Local captures see segments before checksum offloading
    /// filled them in.
    pub fn parse(packet: &tcp) -> Result<Repr> {
        packet.check_len()?;
        // Source and destination ports must be present.
        if packet.src_port() == 0 { return Err(Error::Malformed) }
        if packet.dst_port() == 0 { return Err(Error::Malformed) }

        let mut max_seg_size = None;
        let mut window_scale = None;
        let mut sack_permitted = false;
        let mut timestamps = None;
        let mut options = packet.options();
        while !options.is_empty() {
            let (next_options, option) = TcpOption::parse(options)?;
            match option {
                TcpOption::EndOfList => break,
                TcpOption::NoOperation => (),
                TcpOption::MaxSegmentSize(value) =>
                    max_seg_size = Some(value),
                TcpOption::WindowScale(value) => {
                    // RFC 1323: a shift count exceeding 14 is treated as 14.
                    window_scale = if value > 14 {
                        net_debug!("parsed window scaling factor {} > 14, setting to 14", value);
                        Some(14)
                    } else {
                        Some(value)
                    };
                },
                TcpOption::SackPermitted =>
                    sack_permitted = true,
                TcpOption::Timestamps { value, echo } =>
                    timestamps = Some((value, echo)),
                _ => (),
            }
            options = next_options;
        }

        Ok(Repr {
            src_port:     packet.src_port(),
            dst_port:     packet.dst_port(),
            flags:        packet.flags(),
            seq_number:   packet.seq_number(),
            ack_number:   packet.ack_number(),
            window_len:   packet.window_len(),
            window_scale,
            max_seg_size,
            sack_permitted,
            timestamps,
            payload_len:  packet.payload_slice().len() as u16,
        })
    }

    /// Return the length of the segment, in terms of sequence space.
    pub fn sequence_len(&self) -> usize {
        usize::from(self.payload_len) + self.flags.sequence_len()
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TCP src={} dst={} [{}]",
               self.src_port, self.dst_port, self.flags)?;
        write!(f, " seq={}", self.seq_number)?;
        if self.flags.ack() {
            write!(f, " ack={}", self.ack_number)?;
        }
        write!(f, " win={}", self.window_len)?;
        write!(f, " len={}", self.payload_len)?;
        if let Some(max_seg_size) = self.max_seg_size {
            write!(f, " mss={}", max_seg_size)?;
        }
        if let Some((value, echo)) = self.timestamps {
            write!(f, " tsval={} tsecr={}", value, echo)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static PACKET_BYTES: [u8; 28] =
        [0xbf, 0x00, 0x00, 0x50,
         0x01, 0x23, 0x45, 0x67,
         0x89, 0xab, 0xcd, 0xef,
         0x60, 0x35, 0x01, 0x23,
         0x01, 0xb6, 0x02, 0x01,
         0x03, 0x03, 0x0c, 0x01,
         0xaa, 0x00, 0x00, 0xff];

    static OPTION_BYTES: [u8; 4] =
        [0x03, 0x03, 0x0c, 0x01];

    static PAYLOAD_BYTES: [u8; 4] =
        [0xaa, 0x00, 0x00, 0xff];

    static SYN_PACKET_BYTES: [u8; 36] =
        [0xbf, 0x00, 0x00, 0x50,
         0x01, 0x23, 0x45, 0x67,
         0x00, 0x00, 0x00, 0x00,
         0x90, 0x02, 0x01, 0x23,
         0x00, 0x00, 0x00, 0x00,
         0x02, 0x04, 0x05, 0xb4,
         0x01, 0x01, 0x08, 0x0a,
         0x00, 0x00, 0x10, 0x00,
         0x00, 0x00, 0x00, 0x00];

    #[test]
    fn test_deconstruct() {
        let packet = tcp::new_checked(&PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.src_port(), 48896);
        assert_eq!(packet.dst_port(), 80);
        assert_eq!(packet.seq_number(), SeqNumber(0x01234567));
        assert_eq!(packet.ack_number(), SeqNumber(0x89abcdefu32 as i32));
        assert_eq!(packet.header_len(), 24);
        assert_eq!(packet.flags().fin(), true);
        assert_eq!(packet.flags().syn(), false);
        assert_eq!(packet.flags().rst(), true);
        assert_eq!(packet.flags().psh(), false);
        assert_eq!(packet.flags().ack(), true);
        assert_eq!(packet.flags().urg(), true);
        assert_eq!(packet.window_len(), 0x0123);
        assert_eq!(packet.urgent_at(), 0x0201);
        assert_eq!(packet.checksum(), 0x01b6);
        assert_eq!(packet.options(), &OPTION_BYTES[..]);
        assert_eq!(packet.payload_slice(), &PAYLOAD_BYTES[..]);
    }

    #[test]
    fn test_truncated() {
        assert_eq!(tcp::new_checked(&PACKET_BYTES[..23]), Err(Error::Truncated));
        assert_eq!(tcp::new_checked(&PACKET_BYTES[..19]), Err(Error::Truncated));
    }

    #[test]
    fn test_impossible_len() {
        let mut bytes = PACKET_BYTES.to_vec();
        bytes[12] = 0x20;
        assert_eq!(tcp::new_checked(&bytes), Err(Error::Malformed));
    }

    #[test]
    fn test_parse_syn() {
        let packet = tcp::new_checked(&SYN_PACKET_BYTES[..]).unwrap();
        assert_eq!(packet.header_len(), 36);
        assert!(packet.payload_slice().is_empty());
        let repr = Repr::parse(packet).unwrap();
        assert_eq!(repr, Repr {
            src_port:     48896,
            dst_port:     80,
            flags:        Flags::SYN,
            seq_number:   SeqNumber(0x01234567),
            ack_number:   SeqNumber(0),
            window_len:   0x0123,
            window_scale: None,
            max_seg_size: Some(1460),
            sack_permitted: false,
            timestamps:   Some((0x1000, 0)),
            payload_len:  0,
        });
        assert_eq!(repr.sequence_len(), 1);
    }

    #[test]
    fn test_parse_zero_port() {
        let mut bytes = SYN_PACKET_BYTES.to_vec();
        bytes[2] = 0;
        bytes[3] = 0;
        let packet = tcp::new_checked(&bytes).unwrap();
        assert_eq!(Repr::parse(packet), Err(Error::Malformed));
    }

    #[test]
    fn test_seq_number_wraps() {
        let seq = SeqNumber::from_u32(0xffff_ffff);
        assert_eq!(seq + 1, SeqNumber(0));
        assert_eq!((seq + 10).to_u32(), 9);
        assert!(seq < seq + 1);
        assert_eq!((seq + 10) - seq, 10);
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(format!("{}", Flags::SYN | Flags::ACK), "syn,ack");
        assert_eq!(format!("{}", Flags::default()), "none");
    }

    #[test]
    fn test_tcp_options() {
        assert_eq!(TcpOption::parse(&[0x00]), Ok((&[][..], TcpOption::EndOfList)));
        assert_eq!(TcpOption::parse(&[0x01]), Ok((&[][..], TcpOption::NoOperation)));
        assert_eq!(TcpOption::parse(&[0x02, 0x04, 0x05, 0xdc]),
                   Ok((&[][..], TcpOption::MaxSegmentSize(1500))));
        assert_eq!(TcpOption::parse(&[0x03, 0x03, 0x0c]),
                   Ok((&[][..], TcpOption::WindowScale(12))));
        assert_eq!(TcpOption::parse(&[0x04, 0x02]),
                   Ok((&[][..], TcpOption::SackPermitted)));
        assert_eq!(TcpOption::parse(&[0x05, 0x0a,
                                      0x00, 0x00, 0x01, 0xf4, 0x00, 0x00, 0x05, 0xdc]),
                   Ok((&[][..], TcpOption::SackRange([Some((500, 1500)), None, None]))));
        assert_eq!(TcpOption::parse(&[0x08, 0x0a,
                                      0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02]),
                   Ok((&[][..], TcpOption::Timestamps { value: 1, echo: 2 })));
        assert_eq!(TcpOption::parse(&[0x0c, 0x05, 0x01, 0x02, 0x03]),
                   Ok((&[][..], TcpOption::Unknown { kind: 12, data: &[1, 2, 3][..] })));
    }

    #[test]
    fn test_malformed_tcp_options() {
        assert_eq!(TcpOption::parse(&[]),
                   Err(Error::Truncated));
        assert_eq!(TcpOption::parse(&[0xc]),
                   Err(Error::Truncated));
        assert_eq!(TcpOption::parse(&[0xc, 0x05, 0x01, 0x02]),
                   Err(Error::Truncated));
        assert_eq!(TcpOption::parse(&[0x2, 0x02]),
                   Err(Error::Malformed));
        assert_eq!(TcpOption::parse(&[0x3, 0x02]),
                   Err(Error::Malformed));
        assert_eq!(TcpOption::parse(&[0x8, 0x06, 0x00, 0x00, 0x00, 0x01]),
                   Err(Error::Malformed));
    }
}
