mod dump;
mod info;

use std::fs::File;
use std::io::{stderr, stdin, Read};
use std::path::{Path, PathBuf};

use adcp::{DecoderOpts, PipelineOpts};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct DecodeArgs {
    /// Largest ensemble payload, in bytes, accepted before a sync is treated
    /// as false.
    #[arg(long, default_value_t = DecoderOpts::DEFAULT_MAX_PAYLOAD_LEN, value_name = "bytes")]
    max_payload_len: usize,

    /// Reject headers whose inverse ensemble number or payload length fields
    /// do not match.
    #[arg(long, action)]
    verify_header: bool,

    /// Number of bytes read from the input at a time.
    #[arg(long, default_value_t = 64 * 1024, value_name = "bytes")]
    read_size: usize,
}

impl DecodeArgs {
    fn pipeline_opts(&self) -> PipelineOpts {
        PipelineOpts::new()
            .with_read_size(self.read_size)
            .with_decoder(
                DecoderOpts::new()
                    .with_max_payload_len(self.max_payload_len)
                    .with_header_inverse_check(self.verify_header),
            )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of the ensembles in a file.
    Info {
        /// Input ensemble file, or - for stdin.
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,

        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Write each decoded ensemble as one line of JSON.
    Dump {
        /// Input ensemble file, or - for stdin.
        input: PathBuf,

        /// Include the raw header and payload bytes of each ensemble.
        #[arg(long, action)]
        raw: bool,

        #[command(flatten)]
        decode: DecodeArgs,
    },
}

/// Open `path` for reading, treating `-` as stdin.
fn open_input(path: &Path) -> Result<Box<dyn Read + Send>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(stdin()));
    }
    let file = File::open(path).with_context(|| format!("opening input {path:?}"))?;
    Ok(Box::new(file))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("ADCP_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Info {
            input,
            format,
            decode,
        } => info::info(input, format, &decode.pipeline_opts()),
        Commands::Dump { input, raw, decode } => dump::dump(input, *raw, &decode.pipeline_opts()),
    }
}
