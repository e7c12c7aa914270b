use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use finport_chuck::ChuckPositionsIndiv;
use finport_core::time::{parse_time_of_day, parse_time_zone};
use finport_core::{AllocSchema, DecodeOptions, Importer, Prospector, RejectedRow, SourceFormat};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

mod config;
mod state;

#[derive(Parser, Debug)]
#[command(name = "finport", version, about = "Detect and decode brokerage statement exports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report which importers claim a file, and for which schemas
    Detect {
        file: PathBuf,
    },

    /// Decode a file into records of one schema (JSON on stdout)
    Decode {
        file: PathBuf,

        /// allocMetaSource | allocAccount | allocHolding | allocSecurity
        #[arg(long)]
        schema: AllocSchema,

        /// Importer id (default: first importer that detects the file)
        #[arg(long)]
        importer: Option<String>,

        /// Source URL recorded in source metadata
        #[arg(long)]
        url: Option<Url>,

        /// "As of" time for quotes: RFC3339, or MM/DD/YYYY resolved with --tz/--time-of-day
        #[arg(long)]
        timestamp: Option<String>,

        /// IANA time zone (overrides config)
        #[arg(long)]
        tz: Option<String>,

        /// HH:MM local time for bare dates (overrides config)
        #[arg(long)]
        time_of_day: Option<String>,
    },

    /// Manage ~/.finport/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

#[derive(Serialize)]
struct DetectReport<'a> {
    importer: &'a str,
    name: &'a str,
    schemas: finport_core::DetectResult,
}

#[derive(Serialize)]
struct DecodeReport {
    importer: String,
    schema: AllocSchema,
    records: Vec<finport_core::DecodedRow>,
    rejected: Vec<RejectedRow>,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Detect { file } => {
            let cfg = config::load_config()?;
            let prefix = read_prefix(&file, cfg.detect.prefix_bytes)?;
            let prospector = prospector();

            let found = prospector
                .prospect(&[SourceFormat::Csv], &prefix)
                .with_context(|| format!("detecting {}", file.display()))?;
            info!("{} importer(s) matched {}", found.len(), file.display());

            let reports: Vec<_> = found
                .into_iter()
                .map(|(imp, schemas)| DetectReport {
                    importer: imp.id(),
                    name: imp.name(),
                    schemas,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }

        Command::Decode {
            file,
            schema,
            importer,
            url,
            timestamp,
            tz,
            time_of_day,
        } => {
            let cfg = config::load_config()?;
            let options = decode_options(&cfg, tz, time_of_day, url, timestamp)?;

            let data = std::fs::read(&file).with_context(|| format!("read {}", file.display()))?;
            let report = decode_file(&prospector(), &data, schema, importer.as_deref(), &options)
                .with_context(|| format!("decoding {}", file.display()))?;

            if !report.rejected.is_empty() {
                eprintln!("{} row(s) rejected", report.rejected.len());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg)?);
            }
            ConfigCommand::Path => println!("{}", config::config_path()?.display()),
        },
    }

    Ok(())
}

fn prospector() -> Prospector {
    Prospector::new(vec![Box::new(ChuckPositionsIndiv::new())])
}

fn read_prefix(path: &Path, limit: usize) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut buf = Vec::with_capacity(limit);
    file.take(limit as u64)
        .read_to_end(&mut buf)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(buf)
}

/// Config values overridden by command-line flags. `--timestamp` is resolved
/// last so a bare date picks up `--tz` and `--time-of-day`.
fn decode_options(
    cfg: &config::Config,
    tz: Option<String>,
    time_of_day: Option<String>,
    url: Option<Url>,
    timestamp: Option<String>,
) -> Result<DecodeOptions> {
    let mut options = cfg.decode_options()?;
    if let Some(tz) = tz {
        options = options.with_time_zone(parse_time_zone(&tz)?);
    }
    if let Some(tod) = time_of_day {
        parse_time_of_day(&tod)?;
        options = options.with_time_of_day(tod);
    }
    if let Some(url) = url {
        options = options.with_url(url);
    }
    if let Some(ts) = timestamp {
        let ts = parse_timestamp(&ts, &options)?;
        options = options.with_timestamp(ts);
    }
    Ok(options)
}

/// RFC3339, else a statement date resolved with the decode options.
fn parse_timestamp(raw: &str, options: &DecodeOptions) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    options
        .resolve_date(raw)
        .map_err(|e| anyhow!("invalid --timestamp '{raw}': {e}"))
}

fn decode_file(
    prospector: &Prospector,
    data: &[u8],
    schema: AllocSchema,
    importer_id: Option<&str>,
    options: &DecodeOptions,
) -> Result<DecodeReport> {
    let importer: &dyn Importer = match importer_id {
        Some(id) => prospector
            .get(id)
            .ok_or_else(|| anyhow!("unknown importer: {id}"))?,
        None => {
            let found = prospector.prospect(&[SourceFormat::Csv], data)?;
            match found.into_iter().next() {
                Some((imp, _)) => imp,
                None => bail!("no importer recognizes this file"),
            }
        }
    };

    let mut rejected = Vec::new();
    let records = importer.decode_checked(schema, data, &mut rejected, options)?;
    info!(
        "{} decoded {} {} record(s), {} rejected",
        importer.id(),
        records.len(),
        schema,
        rejected.len()
    );

    Ok(DecodeReport {
        importer: importer.id().to_string(),
        schema,
        records,
        rejected,
    })
}
