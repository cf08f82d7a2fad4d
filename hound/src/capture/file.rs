//! Reading and writing pcap savefiles.
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::time::Instant;
use crate::wire::{self, PcapHeader, PcapLinkType, PcapRecord};

/// Reads the records of a savefile.
#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
    header: PcapHeader,
    buffer: Vec<u8>,
}

impl Reader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> Reader<R> {
    /// Read the file header.
    ///
    /// A file shorter than the header is `Truncated`, an unknown magic `Unrecognized`.
    pub fn new(mut inner: R) -> Result<Self> {
        let mut raw = [0; PcapHeader::LEN];
        if fill(&mut inner, &mut raw)? < raw.len() {
            return Err(wire::Error::Truncated.into());
        }
        let header = PcapHeader::parse(&raw)?;

        Ok(Reader {
            inner,
            header,
            buffer: Vec::new(),
        })
    }

    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    pub fn link_type(&self) -> PcapLinkType {
        self.header.link_type
    }

    /// Read the next record and its captured octets.
    ///
    /// Returns `None` when the file ends between two records. A file ending within a record is
    /// `Truncated`.
    pub fn next_record(&mut self) -> Result<Option<(PcapRecord, &[u8])>> {
        let mut raw = [0; PcapRecord::LEN];
        match fill(&mut self.inner, &mut raw)? {
            0 => return Ok(None),
            PcapRecord::LEN => (),
            _ => return Err(wire::Error::Truncated.into()),
        }
        let record = PcapRecord::parse(&raw, &self.header)?;

        self.buffer.resize(record.captured_len as usize, 0);
        if fill(&mut self.inner, &mut self.buffer)? < self.buffer.len() {
            return Err(wire::Error::Truncated.into());
        }
        Ok(Some((record, &self.buffer[..])))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Writes records to a savefile.
#[derive(Debug)]
pub struct Writer<W: Write> {
    inner: W,
    header: PcapHeader,
    buffer: [u8; PcapRecord::LEN],
}

impl<W: Write> Writer<W> {
    /// Write the default header for the link type.
    pub fn new(inner: W, link_type: PcapLinkType) -> Result<Self> {
        Self::with_header(inner, PcapHeader::new(link_type))
    }

    /// Write a custom header, e.g. with another byte order or timestamp resolution.
    pub fn with_header(mut inner: W, header: PcapHeader) -> Result<Self> {
        let mut raw = [0; PcapHeader::LEN];
        header.emit(&mut raw);
        inner.write_all(&raw)?;

        Ok(Writer {
            inner,
            header,
            buffer: [0; PcapRecord::LEN],
        })
    }

    pub fn header(&self) -> &PcapHeader {
        &self.header
    }

    /// Append a packet of `original_len` octets on the wire.
    ///
    /// The data is cut to the snapshot length of the file.
    pub fn write(&mut self, timestamp: Instant, data: &[u8], original_len: usize) -> Result<()> {
        let captured = data.len().min(self.header.snaplen as usize);
        let record = PcapRecord {
            timestamp,
            captured_len: captured as u32,
            original_len: original_len.max(captured) as u32,
        };
        record.emit(&mut self.buffer, &self.header);
        self.inner.write_all(&self.buffer)?;
        self.inner.write_all(&data[..captured])?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(Error::from)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Read until the buffer is full or the input ends.
fn fill<R: Read>(inner: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match inner.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(len) => filled += len,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => (),
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::wire::pcap::{Endian, Resolution};

    fn written(header: PcapHeader, records: &[(i64, &[u8])]) -> Vec<u8> {
        let mut writer = Writer::with_header(Vec::new(), header).unwrap();
        for &(micros, data) in records {
            writer.write(Instant::from_micros(micros), data, data.len()).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn read_written() {
        for &endian in [Endian::Little, Endian::Big].iter() {
            for &resolution in [Resolution::Micros, Resolution::Nanos].iter() {
                let header = PcapHeader {
                    endian,
                    resolution,
                    ..PcapHeader::new(PcapLinkType::Ethernet)
                };
                let file = written(header, &[(1_500_000, &[1, 2, 3][..]), (2_000_001, &[][..])]);
                assert_eq!(file.len(), 24 + 16 + 3 + 16);

                let mut reader = Reader::new(Cursor::new(file)).unwrap();
                assert_eq!(*reader.header(), header);

                let (record, data) = reader.next_record().unwrap().unwrap();
                assert_eq!(record.timestamp, Instant::from_micros(1_500_000));
                assert_eq!(data, &[1, 2, 3]);
                let (record, data) = reader.next_record().unwrap().unwrap();
                assert_eq!(record.timestamp, Instant::from_micros(2_000_001));
                assert!(data.is_empty());
                assert!(reader.next_record().unwrap().is_none());
            }
        }
    }

    #[test]
    fn snaplen_cuts() {
        let header = PcapHeader {
            snaplen: 4,
            ..PcapHeader::new(PcapLinkType::Raw)
        };
        let file = written(header, &[(0, &[0; 10][..])]);
        let mut reader = Reader::new(Cursor::new(file)).unwrap();
        let (record, data) = reader.next_record().unwrap().unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(record.original_len, 10);
        assert!(record.is_truncated());
    }

    #[test]
    fn truncated_file() {
        match Reader::new(Cursor::new(vec![0xd4, 0xc3, 0xb2])) {
            Err(Error::Decode(wire::Error::Truncated)) => (),
            other => panic!("{:?}", other),
        }

        let mut file = written(PcapHeader::new(PcapLinkType::Ethernet), &[(0, &[1, 2, 3, 4][..])]);
        file.pop();
        let mut reader = Reader::new(Cursor::new(file.clone())).unwrap();
        assert!(matches!(reader.next_record(), Err(Error::Decode(wire::Error::Truncated))));

        // Ending inside the record header.
        file.truncate(24 + 7);
        let mut reader = Reader::new(Cursor::new(file)).unwrap();
        assert!(matches!(reader.next_record(), Err(Error::Decode(wire::Error::Truncated))));
    }

    #[test]
    fn not_a_savefile() {
        let garbage = vec![0x42; 64];
        assert!(matches!(Reader::new(Cursor::new(garbage)),
            Err(Error::Decode(wire::Error::Unrecognized))));
    }
}
