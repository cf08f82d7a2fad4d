use std::io;

use thiserror::Error;

use crate::wire::{self, PcapLinkType, TcpSeqNumber};

/// Errors of capturing and analyzing packets.
#[derive(Debug, Error)]
pub enum Error {
    /// A captured packet could not be decoded, which aborts the analysis.
    #[error("could not decode packet: {0}")]
    Decode(#[from] wire::Error),

    /// A sample for this expected acknowledgment already exists.
    ///
    /// This signals a retransmission or reuse of the sequence number and is not fatal.
    #[error("duplicate sample for expected acknowledgment {0}")]
    DuplicateSample(TcpSeqNumber),

    /// There were no completed samples to aggregate.
    #[error("no round-trip time samples")]
    NoData,

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The configuration was invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file was not valid JSON for a configuration.
    #[error("could not parse configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// A system call of the live capture failed.
    #[error("capture failed in {call}: {source}")]
    Capture {
        call: &'static str,
        #[source]
        source: io::Error,
    },

    /// The capture file uses a link layer that can not be decoded.
    #[error("unsupported link type {0}")]
    UnsupportedLink(PcapLinkType),
}

/// The result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
