//! The pcap savefile format.
//!
//! A savefile is a file header followed by a sequence of records, each a record header and the
//! captured bytes of one packet. Writers use their native byte order and readers detect it from
//! the magic number, which also selects between microsecond and nanosecond timestamps.
use core::fmt;
use byteorder::{ByteOrder, BigEndian, LittleEndian};

use super::{Error, Result};
use crate::time::Instant;

/// Magic number of a savefile with microsecond timestamps.
pub const MAGIC_MICROS: u32 = 0xa1b2_c3d4;

/// Magic number of a savefile with nanosecond timestamps.
pub const MAGIC_NANOS: u32 = 0xa1b2_3c4d;

/// The snapshot length of files written by this crate.
pub const DEFAULT_SNAPLEN: u32 = 1024;

/// The largest record accepted by readers, as in libpcap.
pub const MAX_SNAPLEN: u32 = 262_144;

enum_with_unknown! {
    /// Link-layer header type of a savefile, from the tcpdump.org registry.
    pub enum LinkType(u32) {
        Ethernet = 1,
        Raw = 101,
        Ipv4 = 228,
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LinkType::Ethernet => write!(f, "EN10MB"),
            LinkType::Raw => write!(f, "RAW"),
            LinkType::Ipv4 => write!(f, "IPV4"),
            LinkType::Unknown(id) => write!(f, "linktype {}", id),
        }
    }
}

/// The byte order in which a savefile was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
}

/// The unit of the fractional timestamp field in record headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Micros,
    Nanos,
}

mod field {
    use crate::wire::field::Field;

    pub(crate) const MAGIC:         Field =  0..4;
    pub(crate) const VERSION_MAJOR: Field =  4..6;
    pub(crate) const VERSION_MINOR: Field =  6..8;
    pub(crate) const THISZONE:      Field =  8..12;
    pub(crate) const SIGFIGS:       Field = 12..16;
    pub(crate) const SNAPLEN:       Field = 16..20;
    pub(crate) const LINKTYPE:      Field = 20..24;

    pub(crate) const TS_SEC:   Field =  0..4;
    pub(crate) const TS_FRAC:  Field =  4..8;
    pub(crate) const INCL_LEN: Field =  8..12;
    pub(crate) const ORIG_LEN: Field = 12..16;
}

impl Endian {
    /// The byte order of the running machine.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    fn write_u16(self, buf: &mut [u8], value: u16) {
        match self {
            Endian::Little => LittleEndian::write_u16(buf, value),
            Endian::Big => BigEndian::write_u16(buf, value),
        }
    }

    fn write_u32(self, buf: &mut [u8], value: u32) {
        match self {
            Endian::Little => LittleEndian::write_u32(buf, value),
            Endian::Big => BigEndian::write_u32(buf, value),
        }
    }
}

impl Resolution {
    fn magic(self) -> u32 {
        match self {
            Resolution::Micros => MAGIC_MICROS,
            Resolution::Nanos => MAGIC_NANOS,
        }
    }

    fn nanos_per_unit(self) -> u32 {
        match self {
            Resolution::Micros => 1_000,
            Resolution::Nanos => 1,
        }
    }
}

/// A high-level representation of the savefile header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub endian: Endian,
    pub resolution: Resolution,
    pub version_major: u16,
    pub version_minor: u16,
    pub snaplen: u32,
    pub link_type: LinkType,
}

impl FileHeader {
    /// The length of the file header in octets.
    pub const LEN: usize = 24;

    /// The header written by this crate for a given link type.
    pub fn new(link_type: LinkType) -> Self {
        FileHeader {
            endian: Endian::native(),
            resolution: Resolution::Micros,
            version_major: 2,
            version_minor: 4,
            snaplen: DEFAULT_SNAPLEN,
            link_type,
        }
    }

    /// Parse a file header, detecting byte order and timestamp resolution from the magic.
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        let buffer = buffer.get(..Self::LEN).ok_or(Error::Truncated)?;
        let magic = &buffer[field::MAGIC];
        let (endian, resolution) = match (LittleEndian::read_u32(magic), BigEndian::read_u32(magic)) {
            (MAGIC_MICROS, _) => (Endian::Little, Resolution::Micros),
            (MAGIC_NANOS, _) => (Endian::Little, Resolution::Nanos),
            (_, MAGIC_MICROS) => (Endian::Big, Resolution::Micros),
            (_, MAGIC_NANOS) => (Endian::Big, Resolution::Nanos),
            _ => return Err(Error::Unrecognized),
        };

        let version_major = endian.read_u16(&buffer[field::VERSION_MAJOR]);
        if version_major != 2 {
            net_debug!("pcap: unsupported savefile version {}", version_major);
            return Err(Error::Unsupported)
        }

        Ok(FileHeader {
            endian,
            resolution,
            version_major,
            version_minor: endian.read_u16(&buffer[field::VERSION_MINOR]),
            snaplen: endian.read_u32(&buffer[field::SNAPLEN]),
            link_type: LinkType::from(endian.read_u32(&buffer[field::LINKTYPE])),
        })
    }

    /// Emit the header into the first `LEN` octets of the buffer.
    ///
    /// # Panics
    /// This function panics if the buffer is shorter than `LEN`.
    pub fn emit(&self, buffer: &mut [u8]) {
        let endian = self.endian;
        endian.write_u32(&mut buffer[field::MAGIC], self.resolution.magic());
        endian.write_u16(&mut buffer[field::VERSION_MAJOR], self.version_major);
        endian.write_u16(&mut buffer[field::VERSION_MINOR], self.version_minor);
        endian.write_u32(&mut buffer[field::THISZONE], 0);
        endian.write_u32(&mut buffer[field::SIGFIGS], 0);
        endian.write_u32(&mut buffer[field::SNAPLEN], self.snaplen);
        endian.write_u32(&mut buffer[field::LINKTYPE], self.link_type.into());
    }
}

impl fmt::Display for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pcap v{}.{} {} snaplen={} {:?}/{:?}",
            self.version_major, self.version_minor, self.link_type,
            self.snaplen, self.endian, self.resolution)
    }
}

/// A high-level representation of a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Capture time of the packet.
    pub timestamp: Instant,
    /// The number of octets stored in the file.
    pub captured_len: u32,
    /// The number of octets the packet had on the wire.
    pub original_len: u32,
}

impl RecordHeader {
    /// The length of a record header in octets.
    pub const LEN: usize = 16;

    /// Parse a record header of a file with the given file header.
    ///
    /// Records larger than `MAX_SNAPLEN` or with an out-of-range fractional timestamp are
    /// `Malformed`.
    pub fn parse(buffer: &[u8], file: &FileHeader) -> Result<Self> {
        let buffer = buffer.get(..Self::LEN).ok_or(Error::Truncated)?;
        let endian = file.endian;
        let secs = endian.read_u32(&buffer[field::TS_SEC]);
        let frac = endian.read_u32(&buffer[field::TS_FRAC]);
        let captured_len = endian.read_u32(&buffer[field::INCL_LEN]);
        let original_len = endian.read_u32(&buffer[field::ORIG_LEN]);

        let subsec_nanos = frac.checked_mul(file.resolution.nanos_per_unit())
            .filter(|&nanos| nanos < 1_000_000_000)
            .ok_or(Error::Malformed)?;
        if captured_len > MAX_SNAPLEN {
            return Err(Error::Malformed)
        }

        Ok(RecordHeader {
            timestamp: Instant::from_parts(secs, subsec_nanos),
            captured_len,
            original_len,
        })
    }

    /// Emit the record header into the first `LEN` octets of the buffer.
    ///
    /// # Panics
    /// This function panics if the buffer is shorter than `LEN`.
    pub fn emit(&self, buffer: &mut [u8], file: &FileHeader) {
        let endian = file.endian;
        let frac = self.timestamp.subsec_nanos() / file.resolution.nanos_per_unit();
        endian.write_u32(&mut buffer[field::TS_SEC], self.timestamp.secs() as u32);
        endian.write_u32(&mut buffer[field::TS_FRAC], frac);
        endian.write_u32(&mut buffer[field::INCL_LEN], self.captured_len);
        endian.write_u32(&mut buffer[field::ORIG_LEN], self.original_len);
    }

    /// Whether the snapshot length cut the packet short.
    pub fn is_truncated(&self) -> bool {
        self.captured_len < self.original_len
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static LE_MICROS_HEADER: [u8; 24] =
        [0xd4, 0xc3, 0xb2, 0xa1,
         0x02, 0x00, 0x04, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x04, 0x00, 0x00,
         0x01, 0x00, 0x00, 0x00];

    static BE_NANOS_HEADER: [u8; 24] =
        [0xa1, 0xb2, 0x3c, 0x4d,
         0x00, 0x02, 0x00, 0x04,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0x00, 0x00,
         0x00, 0x00, 0xff, 0xff,
         0x00, 0x00, 0x00, 0x65];

    static BE_RECORD: [u8; 16] =
        [0x00, 0x00, 0x00, 0x02,
         0x00, 0x00, 0x01, 0xf4,
         0x00, 0x00, 0x00, 0x36,
         0x00, 0x00, 0x05, 0xdc];

    #[test]
    fn test_parse_little_endian() {
        let header = FileHeader::parse(&LE_MICROS_HEADER[..]).unwrap();
        assert_eq!(header, FileHeader {
            endian: Endian::Little,
            resolution: Resolution::Micros,
            version_major: 2,
            version_minor: 4,
            snaplen: 1024,
            link_type: LinkType::Ethernet,
        });
    }

    #[test]
    fn test_parse_big_endian_nanos() {
        let header = FileHeader::parse(&BE_NANOS_HEADER[..]).unwrap();
        assert_eq!(header.endian, Endian::Big);
        assert_eq!(header.resolution, Resolution::Nanos);
        assert_eq!(header.snaplen, 0xffff);
        assert_eq!(header.link_type, LinkType::Raw);

        let record = RecordHeader::parse(&BE_RECORD[..], &header).unwrap();
        assert_eq!(record.timestamp, Instant::from_nanos(2_000_000_500i64));
        assert_eq!(record.captured_len, 54);
        assert_eq!(record.original_len, 1500);
        assert!(record.is_truncated());
    }

    #[test]
    fn test_micros_record() {
        let header = FileHeader::parse(&LE_MICROS_HEADER[..]).unwrap();
        let record = [0x02, 0, 0, 0, 0xf4, 0x01, 0, 0, 0x36, 0, 0, 0, 0x36, 0, 0, 0];
        let record = RecordHeader::parse(&record[..], &header).unwrap();
        assert_eq!(record.timestamp, Instant::from_micros(2_000_500));
        assert!(!record.is_truncated());
    }

    #[test]
    fn test_unrecognized_magic() {
        let mut bytes = LE_MICROS_HEADER;
        bytes[0] = 0x0a;
        assert_eq!(FileHeader::parse(&bytes[..]), Err(Error::Unrecognized));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = LE_MICROS_HEADER;
        bytes[4] = 0x01;
        assert_eq!(FileHeader::parse(&bytes[..]), Err(Error::Unsupported));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(FileHeader::parse(&LE_MICROS_HEADER[..23]), Err(Error::Truncated));
        let header = FileHeader::parse(&BE_NANOS_HEADER[..]).unwrap();
        assert_eq!(RecordHeader::parse(&BE_RECORD[..15], &header), Err(Error::Truncated));
    }

    #[test]
    fn test_malformed_record() {
        let header = FileHeader::parse(&BE_NANOS_HEADER[..]).unwrap();
        let mut bytes = BE_RECORD;
        bytes[4] = 0x3c;
        assert_eq!(RecordHeader::parse(&bytes[..], &header), Err(Error::Malformed));
        let mut bytes = BE_RECORD;
        bytes[9] = 0x10;
        assert_eq!(RecordHeader::parse(&bytes[..], &header), Err(Error::Malformed));
    }

    #[test]
    fn test_emit() {
        let header = FileHeader {
            endian: Endian::Little,
            ..FileHeader::new(LinkType::Ethernet)
        };
        let mut bytes = [0xff; 24];
        header.emit(&mut bytes);
        assert_eq!(&bytes[..], &LE_MICROS_HEADER[..]);

        let record = RecordHeader {
            timestamp: Instant::from_nanos(2_000_500_999i64),
            captured_len: 54,
            original_len: 54,
        };
        let mut bytes = [0; 16];
        record.emit(&mut bytes, &header);
        assert_eq!(&bytes[..8], &[0x02, 0, 0, 0, 0xf4, 0x01, 0, 0][..]);
    }
}
