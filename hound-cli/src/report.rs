//! Presentation of the analysis result.
//!
//! Round-trip times are reported in seconds. Values that could not be measured are `unknown` in
//! the text layout, `-` within sample lists, and `null` in JSON.
use core::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

use hound::stats::Summary;
use hound::{Connection, ConnectionTable, Direction, SampleSet};
use hound::time::Duration;

/// The result of one analysis run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub connections: Vec<ConnectionReport>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConnectionReport {
    pub src: Ipv4Addr,
    pub src_port: u16,
    pub dst: Ipv4Addr,
    pub dst_port: u16,
    pub initial_rtt: Option<f64>,
    pub src_to_dst: DirectionReport,
    pub dst_to_src: DirectionReport,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectionReport {
    #[serde(skip)]
    pub summary: Option<Summary>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    /// All samples in the order they were started.
    pub samples: Vec<Option<f64>>,
}

impl Report {
    pub fn new(table: &ConnectionTable) -> Self {
        Report {
            connections: table.iter().map(ConnectionReport::new).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl ConnectionReport {
    pub fn new(connection: &Connection) -> Self {
        ConnectionReport {
            src: connection.src_addr().into(),
            src_port: connection.src_port(),
            dst: connection.dst_addr().into(),
            dst_port: connection.dst_port(),
            initial_rtt: connection.initial_rtt().map(secs),
            src_to_dst: DirectionReport::new(connection.samples(Direction::SrcToDst)),
            dst_to_src: DirectionReport::new(connection.samples(Direction::DstToSrc)),
        }
    }
}

impl DirectionReport {
    pub fn new(samples: &SampleSet) -> Self {
        let summary = Summary::of(samples).ok();
        DirectionReport {
            summary,
            min: summary.map(|summary| secs(summary.min)),
            max: summary.map(|summary| secs(summary.max)),
            avg: summary.map(|summary| secs(summary.avg)),
            samples: samples.iter().map(|sample| sample.rtt().map(secs)).collect(),
        }
    }
}

fn secs(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for connection in &self.connections {
            write!(f, "{}", connection)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConnectionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}:{} -> {}:{}", self.src, self.src_port, self.dst, self.dst_port)?;
        match self.initial_rtt {
            Some(rtt) => writeln!(f, "\tiRTT: {:.4}", rtt)?,
            None => writeln!(f, "\tiRTT: unknown")?,
        }
        writeln!(f, "\t{} -> {}", Direction::SrcToDst, self.src_to_dst)?;
        writeln!(f, "\t{} -> {}", Direction::DstToSrc, self.dst_to_src)?;
        writeln!(f, "\tSamples {}: {}", Direction::SrcToDst, SampleList(&self.src_to_dst.samples))?;
        writeln!(f, "\tSamples {}: {}", Direction::DstToSrc, SampleList(&self.dst_to_src.samples))
    }
}

impl fmt::Display for DirectionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.summary {
            Some(summary) => write!(f, "{}", summary),
            None => f.write_str("unknown"),
        }
    }
}

struct SampleList<'a>(&'a [Option<f64>]);

impl fmt::Display for SampleList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("[")?;
        for (i, rtt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match rtt {
                Some(rtt) => write!(f, "{:.6}", rtt)?,
                None => f.write_str("-")?,
            }
        }
        f.write_str("]")
    }
}
