mod decode;
mod filter;
mod info;
mod render;

use std::path::PathBuf;
use std::str::FromStr;
use std::{fs::File, io::stderr};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use dshk::spacepacket::Apid;
use hifitime::Epoch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and print every packet in a DS housekeeping file.
    ///
    /// Packets decoded before a failure are printed before the failure is reported.
    Decode {
        /// Input DS housekeeping telemetry file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: render::Format,

        /// Fail if a primary header length field does not match the decoded packet size.
        #[arg(long, action)]
        validate_length: bool,
    },
    /// Show summary information about a DS housekeeping file.
    Info {
        /// Input DS housekeeping telemetry file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: render::Format,
    },
    /// Write the packets matching filters to a new file.
    Filter {
        /// Include these apids or apid ranges.
        ///
        /// This accepts a CSV of APIDs as well as ranges of the format <start>-<end>
        /// where start and end are inclusive. For example, you can specify
        /// --include 0,1,2,3,4,5,10,20,30 or --include 0-5,10,20,30
        #[arg(short, long, value_name = "csv", value_delimiter = ',')]
        include: Vec<String>,

        /// Exclude these apids or apid ranges.
        #[arg(short, long, value_name = "csv", value_delimiter = ',')]
        exclude: Vec<String>,

        /// Only include packets before this time (RFC3339).
        ///
        /// Packets without a secondary header have no time and are dropped.
        #[arg(short, long, value_parser = parse_timestamp, value_name = "timestamp")]
        before: Option<Epoch>,

        /// Only include packets after this time (RFC3339).
        #[arg(short, long, value_parser = parse_timestamp, value_name = "timestamp")]
        after: Option<Epoch>,

        /// Delete output file if it already exists
        #[arg(long, action)]
        clobber: bool,

        /// Output file path.
        #[arg(short, long, default_value = "filtered.dat", value_name = "path")]
        output: PathBuf,

        /// Input DS housekeeping telemetry file
        input: PathBuf,
    },
}

fn parse_number_ranges(list: &[String]) -> Result<Vec<u32>> {
    let rx = regex::Regex::new(r"^(?:(\d+)|(\d+)-(\d+))$").expect("regex to compile");
    let mut values = Vec::default();
    for (i, s) in list.iter().enumerate() {
        let Some(cap) = rx.captures(s) else {
            bail!("invalid number or range at {i}: {s}");
        };

        if cap.get(1).is_some() {
            let x = cap[1]
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid number value"))?;
            values.push(x);
        } else {
            let start = cap[2]
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid range value"))?;
            let end = cap[3]
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid range value"))?;
            if start >= end {
                bail!("invalid range at {i}: {s}")
            }
            values.extend(start..=end);
        }
    }

    Ok(values)
}

fn parse_apids(list: &[String]) -> Result<Vec<Apid>> {
    Ok(parse_number_ranges(list)?
        .iter()
        .filter_map(|v| Apid::try_from(*v).ok())
        .collect())
}

fn parse_timestamp(s: &str) -> Result<Epoch, String> {
    Epoch::from_str(s).map_err(|_| "Could not parse into an RFC3339 timestamp".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("DSHK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Decode {
            input,
            format,
            validate_length,
        } => decode::decode(input, format, *validate_length),
        Commands::Info { input, format } => info::info(input, format),
        Commands::Filter {
            include,
            exclude,
            before,
            after,
            clobber,
            output,
            input,
        } => {
            if !clobber && output.exists() {
                bail!("{output:?} exists; use --clobber");
            }
            let criteria = filter::Criteria {
                include: parse_apids(include)?,
                exclude: parse_apids(exclude)?,
                before: *before,
                after: *after,
            };
            debug!("filter criteria {criteria:?}");

            let dat = std::fs::read(input).with_context(|| format!("reading {input:?}"))?;
            let dest = File::create(output)
                .with_context(|| format!("failed to create output {output:?}"))?;
            let count = filter::filter(&dat, dest, &criteria)?;
            info!("wrote {count} packets to {output:?}");
            Ok(())
        }
    }
}
