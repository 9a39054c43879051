/// fgk – adaptive Huffman compression tool.
///
///   fgk c input.txt input.fgk    → compress
///   fgk d input.fgk input.txt    → decompress
///   fgk d -v --bit-order lsb x y → decompress with a forced bit order
///
/// Set `RUST_LOG` for finer control over log output; `-v` and `--trace`
/// only raise the default level.
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use fgk::codec::{self, DecompressOptions};
use fgk::{BitOrder, FgkError, NoopObserver, StreamError, TracingObserver};

#[derive(Parser, Debug)]
#[command(name = "fgk", version, about = "Single-pass adaptive Huffman (FGK) compressor")]
struct Cli {
    /// Operation to perform.
    mode: Mode,
    /// File to read.
    input: PathBuf,
    /// File to create (truncated if it exists).
    output: PathBuf,
    /// Print sizes and compression ratio.
    #[arg(short, long)]
    verbose: bool,
    /// Log every tree operation (split, swap, update step).
    #[arg(long)]
    trace: bool,
    /// Skip bit-order probing when decompressing.
    #[arg(long, value_enum)]
    bit_order: Option<BitOrderArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    #[value(name = "c", alias = "compress")]
    Compress,
    #[value(name = "d", alias = "decompress")]
    Decompress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BitOrderArg {
    Msb,
    Lsb,
}

impl From<BitOrderArg> for BitOrder {
    fn from(arg: BitOrderArg) -> Self {
        match arg {
            BitOrderArg::Msb => BitOrder::MsbFirst,
            BitOrderArg::Lsb => BitOrder::LsbFirst,
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_files(input: &Path, output: &Path) -> Result<(File, File)> {
    let source = File::open(input)
        .with_context(|| format!("cannot open input file {}", input.display()))?;
    let sink = File::create(output)
        .with_context(|| format!("cannot create output file {}", output.display()))?;
    Ok((source, sink))
}

/// Run one compression or decompression, returning (bytes in, bytes out).
fn run(cli: &Cli) -> Result<(u64, u64)> {
    let (source, sink) = open_files(&cli.input, &cli.output)?;
    let in_len = source
        .metadata()
        .with_context(|| format!("cannot stat {}", cli.input.display()))?
        .len();

    let out_len = match cli.mode {
        Mode::Compress => {
            let result = if cli.trace {
                codec::compress_observed(source, sink, TracingObserver)
            } else {
                codec::compress_observed(source, sink, NoopObserver)
            };
            result.with_context(|| format!("compressing {}", cli.input.display()))?
        }
        Mode::Decompress => {
            let mut options = DecompressOptions::default();
            if let Some(order) = cli.bit_order {
                options = options.with_bit_order(order.into());
            }
            let result = if cli.trace {
                codec::decompress_with_options(source, sink, &options, TracingObserver)
            } else {
                codec::decompress_with_options(source, sink, &options, NoopObserver)
            };
            result.with_context(|| format!("decompressing {}", cli.input.display()))?
        }
    };
    Ok((in_len, out_len))
}

/// Exit status for a failed run.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StreamError>() {
        Some(StreamError::Io(_)) | None => 1,
        Some(StreamError::Fgk(e)) => match e {
            FgkError::TruncatedHeader { .. } => 2,
            FgkError::UnknownBitOrder => 3,
            FgkError::UnexpectedEof { .. } => 4,
            _ => 5,
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok((in_len, out_len)) => {
            if cli.verbose {
                let ratio = if in_len == 0 {
                    0.0
                } else {
                    out_len as f64 / in_len as f64 * 100.0
                };
                eprintln!(
                    "fgk: {} ({} bytes) -> {} ({} bytes), {:.1}%",
                    cli.input.display(),
                    in_len,
                    cli.output.display(),
                    out_len,
                    ratio
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("fgk: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
