//! Live capture on a Linux packet socket.
use std::fs;
use std::io::{self, BufWriter};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::time::Instant as Clock;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::packet::Packet;
use crate::time::Instant;
use crate::wire::{PcapLinkType, PcapRecord};
use crate::wire::pcap::DEFAULT_SNAPLEN;
use super::{Filter, Writer, TMP_FILE_PREFIX};
use super::sys::{self, Errno, RawSocketDesc};

/// The first non-loopback network interface, in name order.
pub fn default_device() -> Result<String> {
    let mut names = fs::read_dir("/sys/class/net")?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    names.into_iter()
        .find(|name| name != "lo")
        .ok_or_else(|| Error::Config("no network interface to capture on".into()))
}

/// Capture the packets passing the configured filter for the configured duration.
///
/// The packets are stored in a new temporary savefile that is kept after the capture. Returns its
/// path.
pub fn capture(config: &Config) -> Result<PathBuf> {
    let device = match &config.device {
        Some(device) => device.clone(),
        None => default_device()?,
    };
    let filter = config.filter();

    let mut socket = RawSocketDesc::new(&device)
        .map_err(|errno| capture_error("socket", errno))?;
    socket.bind_interface()
        .map_err(|errno| capture_error("bind", errno))?;
    socket.enable_timestamps()
        .map_err(|errno| capture_error("setsockopt", errno))?;

    let file = tempfile::Builder::new()
        .prefix(TMP_FILE_PREFIX)
        .suffix(".pcap")
        .tempfile()?;
    let (file, path) = file.keep().map_err(|err| err.error)?;
    net_debug!("capturing on {} for {}s into {}: {}",
        device, config.duration, path.display(), filter);

    let mut writer = Writer::new(BufWriter::new(file), PcapLinkType::Ethernet)?;
    let mut buffer = vec![0; DEFAULT_SNAPLEN as usize];
    let mut written = 0u64;
    let deadline = Clock::now().checked_add(config.capture_duration())
        .ok_or_else(|| Error::Config(format!("capture of {}s is too long", config.duration)))?;

    loop {
        let now = Clock::now();
        if now >= deadline {
            break;
        }
        match sys::wait(socket.as_raw_fd(), Some(deadline - now)) {
            Ok(true) => (),
            Ok(false) => continue,
            Err(ref errno) if errno.interrupted() => continue,
            Err(errno) => return Err(capture_error("select", errno)),
        }

        // Drain all pending frames, the socket does not block.
        loop {
            let (captured, original) = match socket.recv(&mut buffer) {
                Ok(lens) => lens,
                Err(ref errno) if errno.would_block() => break,
                Err(ref errno) if errno.interrupted() => continue,
                Err(errno) => return Err(capture_error("recv", errno)),
            };
            let timestamp = match socket.last_timestamp() {
                Ok(timestamp) => timestamp,
                Err(errno) => {
                    net_trace!("frame without receive timestamp: {}", io::Error::from(errno));
                    Instant::now()
                },
            };
            let record = PcapRecord {
                timestamp,
                captured_len: captured as u32,
                original_len: original as u32,
            };
            let frame = &buffer[..captured];
            if passes(&filter, &record, frame) {
                writer.write(record.timestamp, frame, original)?;
                written += 1;
            }
        }
    }

    writer.flush()?;
    net_debug!("captured {} packets into {}", written, path.display());
    Ok(path)
}

fn passes(filter: &Filter, record: &PcapRecord, frame: &[u8]) -> bool {
    let decoded = Packet::decode_matching(PcapLinkType::Ethernet, record, frame,
        |ip, ports| filter.matches_headers(ip, ports));
    match decoded {
        Ok(packet) => packet.is_some(),
        Err(err) => {
            net_trace!("dropping undecodable frame of {} octets: {}", record.original_len, err);
            false
        },
    }
}

fn capture_error(call: &'static str, errno: Errno) -> Error {
    Error::Capture {
        call,
        source: errno.into(),
    }
}
