//! Passive TCP round-trip time measurement.
//!
//! `hound` reconstructs the round-trip times of TCP connections purely from captured packets,
//! without any instrumentation on the endpoints. Every data segment observed in one direction
//! starts a sample that is anchored to the acknowledgment number the peer is expected to send.
//! When that acknowledgment is captured, the difference of the capture timestamps is the
//! round-trip time as seen from the capture point.
//!
//! ## Table of contents
//!
//! 1. [The wire module](wire/index.html), pcap savefiles and Ethernet, IPv4 and TCP headers
//! 2. [Decoded packets](packet/index.html) and their classification
//! 3. [Samples](sample/index.html) and [connections](connection/index.html)
//! 4. [The analyzer](analyzer/index.html)
//! 5. [Aggregation](stats/index.html)
//! 6. [Acquisition](capture/index.html) from files or a live interface
//!
//! ## Usage
//!
//! ```no_run
//! use hound::{config::Config, stats::Summary, Direction};
//!
//! let config = Config::load("hound.json")?;
//! let table = hound::analyze("trace.pcap", &config)?;
//! for connection in &table {
//!     match Summary::of(connection.samples(Direction::SrcToDst)) {
//!         Ok(summary) => println!("{} {}", connection.tuple(), summary),
//!         Err(_) => println!("{} unknown", connection.tuple()),
//!     }
//! }
//! # Ok::<(), hound::Error>(())
//! ```
//!
//! The measured time includes the processing delay of the acknowledging host, and samples of
//! retransmitted segments are not corrected. Round-trip times are only as accurate as the capture
//! timestamps.
#[macro_use] mod macros;
pub mod analyzer;
pub mod capture;
pub mod config;
pub mod connection;
pub mod error;
pub mod packet;
pub mod sample;
pub mod stats;
pub mod time;
pub mod wire;

use std::path::Path;

pub use self::analyzer::Analyzer;
pub use self::connection::{Connection, ConnectionTable, Direction, MatchMode};
pub use self::error::{Error, Result};
pub use self::packet::Packet;
pub use self::sample::{Sample, SampleSet};

/// Analyze a savefile with the filter and matching mode of a configuration.
///
/// Stops at the first packet that can not be decoded. Use an [`Analyzer`] directly to inspect the
/// connections found before such an error.
///
/// [`Analyzer`]: analyzer/struct.Analyzer.html
pub fn analyze<P: AsRef<Path>>(path: P, config: &config::Config) -> Result<ConnectionTable> {
    let source = capture::Source::open(path, config.filter())?;
    let mut analyzer = Analyzer::new(config.match_mode);
    analyzer.run(source)?;
    Ok(analyzer.into_connections())
}
