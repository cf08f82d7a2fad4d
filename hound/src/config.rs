//! The configuration file.
//!
//! A JSON object naming the interface to capture on, the hosts and ports of interest, the
//! duration of a live capture and how packets are matched to connections:
//!
//! ```json
//! {
//!     "device": "eth0",
//!     "customer_ips": ["10.0.0.1", "10.0.0.2"],
//!     "ports": [80, 443],
//!     "duration": 30,
//!     "match_mode": "four_tuple"
//! }
//! ```
//!
//! Every field is optional, unknown fields are rejected.
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::capture::Filter;
use crate::connection::MatchMode;
use crate::error::{Error, Result};

/// Seconds of a live capture when none are configured.
pub const DEFAULT_DURATION: u64 = 10;

/// The longest live capture, one day.
pub const MAX_DURATION: u64 = 24 * 60 * 60;

fn default_duration() -> u64 {
    DEFAULT_DURATION
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The interface of a live capture, the first non-loopback interface if absent.
    #[serde(default)]
    pub device: Option<String>,
    /// Only packets from or to one of these hosts are analyzed, all if empty.
    #[serde(default)]
    pub customer_ips: Vec<Ipv4Addr>,
    /// Only packets from or to one of these ports are analyzed, all if empty.
    #[serde(default)]
    pub ports: Vec<u16>,
    /// The length of a live capture in seconds.
    #[serde(default = "default_duration")]
    pub duration: u64,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: None,
            customer_ips: Vec::new(),
            ports: Vec::new(),
            duration: DEFAULT_DURATION,
            match_mode: MatchMode::default(),
        }
    }
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::from_slice(&data)
    }

    /// Parse and validate a configuration.
    ///
    /// The top level must be an object.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_slice(data)?;
        let config: Config = serde_json::from_value(Value::Object(object))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(Error::Config("duration must be at least one second".into()));
        }
        if self.duration > MAX_DURATION {
            return Err(Error::Config(format!("duration must be at most {} seconds", MAX_DURATION)));
        }
        if let Some(device) = &self.device {
            // Must fit the interface name of an ifreq, including the terminating zero.
            if device.is_empty() || device.len() >= 16 || device.contains('\0') {
                return Err(Error::Config(format!("invalid device name {:?}", device)));
            }
        }
        if self.ports.contains(&0) {
            return Err(Error::Config("port 0 can not be captured".into()));
        }
        Ok(())
    }

    /// The length of a live capture.
    pub fn capture_duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }

    /// The filter selecting the packets of interest.
    pub fn filter(&self) -> Filter {
        Filter::new(
            self.customer_ips.iter().map(|&ip| ip.into()).collect(),
            self.ports.clone(),
        )
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;
    use super::*;

    #[test]
    fn full() {
        let config = Config::from_slice(br#"{
            "device": "eth0",
            "customer_ips": ["10.0.0.1", "192.168.1.20"],
            "ports": [80, 443],
            "duration": 30,
            "match_mode": "port_only"
        }"#).unwrap();
        assert_eq!(config, Config {
            device: Some("eth0".into()),
            customer_ips: vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(192, 168, 1, 20)],
            ports: vec![80, 443],
            duration: 30,
            match_mode: MatchMode::PortOnly,
        });
        assert_eq!(config.capture_duration(), Duration::from_secs(30));
    }

    #[test]
    fn defaults() {
        let config = Config::from_slice(b"{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.duration, 10);
        assert_eq!(config.match_mode, MatchMode::FourTuple);
    }

    #[test]
    fn invalid() {
        let cases: &[&[u8]] = &[
            br#"{"customer_ips": ["10.0.0"]}"#,
            br#"{"ports": [70000]}"#,
            br#"{"match_mode": "three_tuple"}"#,
            br#"{"interface": "eth0"}"#,
            br#"["eth0"]"#,
            br#"[null, [], [], 10]"#,
            b"10",
        ];
        for case in cases {
            match Config::from_slice(case) {
                Err(Error::ConfigFormat(_)) => (),
                other => panic!("{:?} gave {:?}", String::from_utf8_lossy(case), other),
            }
        }

        let cases: &[&[u8]] = &[
            br#"{"duration": 0}"#,
            br#"{"duration": 86401}"#,
            br#"{"duration": 18446744073709551615}"#,
            br#"{"ports": [0]}"#,
            br#"{"device": ""}"#,
            br#"{"device": "a-very-long-interface-name"}"#,
        ];
        for case in cases {
            match Config::from_slice(case) {
                Err(Error::Config(_)) => (),
                other => panic!("{:?} gave {:?}", String::from_utf8_lossy(case), other),
            }
        }
    }

    #[test]
    fn load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"ports": [8080]}"#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.ports, [8080]);

        let missing = file.path().with_extension("missing");
        assert!(matches!(Config::load(&missing), Err(Error::Io(_))));
    }
}
