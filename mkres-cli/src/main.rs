//! mkres - embed files as C++ source
//!
//! Every input file becomes a byte array in a generated `.cpp` file, with a
//! matching `.h` declaring the resource table. Resources can be stored as-is
//! or gzip-compressed; compression streams through a fixed-size session, so
//! large inputs are never loaded whole.

mod embed;
mod manifest;
mod render;
mod scan;
#[cfg(test)]
mod scratch;

use clap::Parser;
use embed::{EmbedOptions, cmd_embed};
use mkres_core::{CompressionConfig, CompressionLevel, DEFAULT_BUFFER_LEN, Transform};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mkres")]
#[command(author, version, about = "Embed files as C++ source code")]
#[command(long_about = "
Embeds files as byte arrays in a generated C++ header/source pair.

'.h' and '.cpp' are appended to the destination, so give it without an
extension. Compressed resources must be decompressed by the application
before use.

Examples:
  mkres -d gen/assets logo.png style.css
  mkres -r --filter '*.png' -c gzip -d gen/images assets/
  mkres -c gzip --verify --manifest gen/assets.json -d gen/assets data.bin
")]
struct Cli {
    /// Files (or directories with --recurse) to embed
    #[arg(value_name = "INPUT-FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Be verbose about what's being done (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Recurse into directories
    #[arg(short, long)]
    recurse: bool,

    /// Only embed files whose name matches (glob syntax: *.png, img/**/*)
    #[arg(long)]
    filter: Option<String>,

    /// Destination path/name, without extension
    #[arg(short, long, default_value = "out")]
    destination: PathBuf,

    /// Compression to use: none or gzip
    #[arg(short, long, default_value = "none")]
    compression: Transform,

    /// Deflate level for gzip (0-9)
    #[arg(short, long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(0..=9))]
    level: u8,

    /// Staging and output buffer capacity in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_LEN)]
    buffer_size: usize,

    /// Also write a JSON manifest of the embedded resources
    #[arg(long, value_name = "FILE")]
    manifest: Option<PathBuf>,

    /// Decompress every gzip resource again and compare it with its file
    #[arg(long)]
    verify: bool,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    // Only fails if a subscriber is already installed.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CompressionConfig::new()
        .with_level(CompressionLevel::new(cli.level)?)
        .with_buffer_len(cli.buffer_size);

    cmd_embed(&EmbedOptions {
        inputs: &cli.inputs,
        recurse: cli.recurse,
        filter: cli.filter.as_deref(),
        destination: &cli.destination,
        transform: cli.compression,
        config,
        manifest: cli.manifest.as_deref(),
        verify: cli.verify,
    })
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mkres", "logo.png"]).unwrap();
        assert_eq!(cli.inputs, [PathBuf::from("logo.png")]);
        assert_eq!(cli.destination, PathBuf::from("out"));
        assert_eq!(cli.compression, Transform::None);
        assert_eq!(cli.level, 9);
        assert_eq!(cli.buffer_size, DEFAULT_BUFFER_LEN);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.recurse && !cli.verify);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "mkres", "-vv", "-r", "--filter", "*.png", "-d", "gen/res", "-c", "GZIP", "-l", "6",
            "--manifest", "res.json", "--verify", "assets",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.recurse && cli.verify);
        assert_eq!(cli.filter.as_deref(), Some("*.png"));
        assert_eq!(cli.compression, Transform::Gzip);
        assert_eq!(cli.level, 6);
        assert_eq!(cli.manifest, Some(PathBuf::from("res.json")));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["mkres"]).is_err());
        assert!(Cli::try_parse_from(["mkres", "-c", "zstd", "a"]).is_err());
        assert!(Cli::try_parse_from(["mkres", "-l", "10", "a"]).is_err());
    }
}
