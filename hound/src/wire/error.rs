use core::fmt;

/// The error type for decoding captured packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A captured packet could not be parsed because it was shorter than assumed.
    ///
    /// The packet may be shorter than the minimum length specified or a length field points
    /// beyond the captured data. Note that a capture snapshot length can cut packets short, the
    /// record header then reports a smaller captured length than the original length.
    Truncated,

    /// A captured packet had an incorrect checksum.
    ///
    /// Checksums are only verified when explicitly requested since offloading NICs hand
    /// unfinished checksums to local captures.
    WrongChecksum,

    /// A captured packet or file could not be recognized.
    ///
    /// E.g. a capture file with an unknown magic number or a frame with an unknown EtherType.
    Unrecognized,

    /// A captured packet was recognized but was self-contradictory.
    ///
    /// Examples: an IPv4 header length larger than its total length; a TCP data offset smaller
    /// than the minimum header.
    Malformed,

    /// Decoding depends on features that are not implemented.
    ///
    /// Similar to `Unrecognized` but we know that the implementation is incomplete, such as for
    /// fragmented IPv4 packets.
    Unsupported,
}

/// The result type for decoding.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated     => write!(f, "truncated packet"),
            Error::WrongChecksum => write!(f, "checksum error"),
            Error::Unrecognized  => write!(f, "unrecognized packet"),
            Error::Unsupported   => write!(f, "unsupported packet"),
            Error::Malformed     => write!(f, "malformed packet"),
        }
    }
}

impl std::error::Error for Error {}
