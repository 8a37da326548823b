use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use netvar_tools::{
    decode_report, decode_varint, format_report, parse_hex, parse_layout, to_hex, varint_bytes,
};

#[derive(Parser)]
#[command(
    name = "netvar-tools",
    version,
    about = "netvar encoding inspection tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode or decode a single varint.
    Varint {
        #[command(subcommand)]
        action: VarintAction,
    },
    /// Show the zig-zag mapping of a signed integer.
    Zigzag {
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<i64>,
    },
    /// Decode one record from a packet file.
    Decode {
        /// Path to the packet bytes, or hex text with `--hex`.
        packet: String,
        /// Layout JSON describing the record.
        #[arg(long)]
        layout: PathBuf,
        /// Treat the packet argument as hex text.
        #[arg(long)]
        hex: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
    /// Print the fingerprint of a layout.
    LayoutHash {
        /// Layout JSON.
        layout: PathBuf,
    },
}

#[derive(Subcommand)]
enum VarintAction {
    /// Print the bytes of unsigned values.
    Encode {
        #[arg(required = true)]
        values: Vec<u64>,
    },
    /// Decode hex bytes into a value.
    Decode { hex: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Varint { action } => match action {
            VarintAction::Encode { values } => {
                for value in values {
                    let bytes = varint_bytes(value);
                    println!("{value}: {} ({} bytes)", to_hex(&bytes), bytes.len());
                }
            }
            VarintAction::Decode { hex } => {
                let bytes = parse_hex(&hex)?;
                let (value, used) = decode_varint(&bytes)?;
                println!("{value} ({used} bytes)");
                if used < bytes.len() {
                    log::warn!("{} trailing bytes ignored", bytes.len() - used);
                }
            }
        },
        Command::Zigzag { values } => {
            for value in values {
                let encoded = wire::zigzag_encode(value);
                println!("{value} -> {encoded} -> {}", to_hex(&varint_bytes(encoded)));
            }
        }
        Command::Decode {
            packet,
            layout,
            hex,
            format,
        } => {
            let layout = load_layout(&layout)?;
            let bytes = if hex {
                parse_hex(&packet)?
            } else {
                fs::read(&packet).with_context(|| format!("read packet {packet}"))?
            };
            let report = decode_report(&layout, &bytes)?;
            match format {
                DecodeFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).context("serialize json")?;
                    println!("{json}");
                }
                DecodeFormat::Pretty => print!("{}", format_report(&report)),
            }
        }
        Command::LayoutHash { layout } => {
            let layout = load_layout(&layout)?;
            println!("0x{:016x}", schema::layout_hash(&layout));
        }
    }
    Ok(())
}

fn load_layout(path: &Path) -> Result<schema::Layout> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read layout {}", path.display()))?;
    parse_layout(&contents)
}
