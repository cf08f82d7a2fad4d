//! Passive TCP round-trip time measurement.
//!
//! Analyze a savefile:
//!
//! * `hound --config hound.json --input trace.pcap`
//!
//! Capture live on the configured device, then analyze the capture:
//!
//! * `hound --config hound.json --analyze`
//!
//! Set `RUST_LOG=debug` for progress output.
use std::io;
use std::process;

use hound_cli::Opts;

fn main() {
    env_logger::init();

    let opts = Opts::from_args();
    let stdout = io::stdout();
    if let Err(err) = hound_cli::run(&opts, &mut stdout.lock()) {
        log::error!("{:?}", err);
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}
