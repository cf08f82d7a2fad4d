use std::path::PathBuf;

use structopt::StructOpt;

/// Passively measure TCP round-trip times.
///
/// Without an input file, packets are captured live for the configured duration into a
/// temporary pcap file whose name is printed.
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "hound")]
pub struct Opts {
    /// The JSON configuration file.
    #[structopt(long, parse(from_os_str))]
    pub config: PathBuf,

    /// Analyze this pcap file instead of capturing.
    #[structopt(long, parse(from_os_str))]
    pub input: Option<PathBuf>,

    /// Print the analysis result.
    #[structopt(long, default_value = "true", parse(try_from_str))]
    pub stdout: bool,

    /// Analyze the captured packets, implied by `--input`.
    #[structopt(long)]
    pub analyze: bool,

    /// Print the result as JSON.
    #[structopt(long)]
    pub json: bool,
}

impl Opts {
    pub fn from_args() -> Self {
        StructOpt::from_args()
    }

    /// Whether the packets are analyzed at all.
    pub fn should_analyze(&self) -> bool {
        self.analyze || self.input.is_some()
    }
}
