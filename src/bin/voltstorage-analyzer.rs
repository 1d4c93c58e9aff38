//! Command line front end for the analyzer.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voltstorage_analyzer::{
    codec, resample, Analyzer, AnalyzerError, FileStore, MonthSelector, Result, StoreKind,
    VoltStorageClient,
};

#[derive(Parser)]
#[command(name = "voltstorage-analyzer")]
#[command(author, version, about = "Fetch, merge and summarize VoltStorage battery telemetry")]
struct Cli {
    /// VoltStorage API token
    #[arg(long, env = "VS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Product id of the primary device (grid, household, PV and battery 1)
    #[arg(long, env = "VS_PRIMARY")]
    primary: Option<String>,

    /// Product id of the secondary device (battery 2)
    #[arg(long, env = "VS_SECONDARY")]
    secondary: Option<String>,

    /// Directory for stored datasets (defaults to the platform cache dir)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Never contact the API, use stored data only
    #[arg(long)]
    offline: bool,

    /// Keep raw exports of completed days in the store
    #[arg(long)]
    save_raw: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the unified dataset of one day
    Day {
        /// Day to load (YYYY-MM-DD, UTC)
        date: NaiveDate,

        /// Resample to buckets of this many minutes
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
        resolution: i64,

        /// Print JSON instead of the semicolon separated format
        #[arg(long)]
        json: bool,
    },

    /// Print the statistics of one day as JSON
    Stats {
        /// Day to summarize (YYYY-MM-DD, UTC)
        date: NaiveDate,
    },

    /// Print the statistics of every stored day of a month as JSON
    MonthStats { year: i32, month: u32 },

    /// Load and store every completed day of a month
    Preload { year: i32, month: u32 },

    /// List the products registered for the token
    Devices,

    /// List stored days
    List {
        /// List days with raw exports instead of processed datasets
        #[arg(long)]
        raw: bool,
    },

    /// Delete stored entries of a year or one month of it
    Delete {
        year: i32,

        /// Month to delete; the whole year if omitted
        month: Option<u32>,

        /// Delete raw exports instead of processed datasets
        #[arg(long)]
        raw: bool,
    },

    /// Remove every stored entry from the cache directory
    Clear,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn store_kind(raw: bool) -> StoreKind {
    if raw {
        StoreKind::Raw
    } else {
        StoreKind::Processed
    }
}

/// Bucket width in seconds for a resolution in minutes, `None` for native.
fn bucket_seconds(resolution: i64) -> Result<Option<i64>> {
    if resolution < 1 {
        return Err(AnalyzerError::InvalidArgument(format!(
            "resolution must be at least 1 minute, got {resolution}"
        )));
    }
    if resolution == 1 {
        return Ok(None);
    }
    resolution.checked_mul(60).map(Some).ok_or_else(|| {
        AnalyzerError::InvalidArgument(format!("resolution {resolution} is out of range"))
    })
}

fn build_analyzer(cli: &Cli) -> Result<Analyzer> {
    let mut builder = Analyzer::builder()
        .offline(cli.offline)
        .save_raw_data(cli.save_raw)
        .timeout(Duration::from_secs(cli.timeout));
    if let Some(dir) = &cli.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(token) = &cli.token {
        builder = builder.token(token.clone());
    }
    if let (Some(primary), Some(secondary)) = (&cli.primary, &cli.secondary) {
        builder = builder.devices(primary.clone(), secondary.clone());
    }
    builder.build()
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Devices = cli.command {
        let token = cli.token.clone().ok_or(AnalyzerError::Unauthorized)?;
        let client = VoltStorageClient::new(token, Duration::from_secs(cli.timeout))?;
        for device in client.devices()? {
            println!(
                "{}\t{}\tonline={}\terrors={}",
                device.id,
                device.serial_number,
                device.online,
                device.errors.join(",")
            );
        }
        return Ok(());
    }

    if let Commands::Clear = cli.command {
        let store = FileStore::new(cli.cache_dir.clone())?;
        store.clear()?;
        tracing::info!("cleared {}", store.cache_dir.display());
        return Ok(());
    }

    let analyzer = build_analyzer(&cli)?;
    tracing::debug!("{}", analyzer);

    match cli.command {
        Commands::Day {
            date,
            resolution,
            json,
        } => {
            let Some(data) = analyzer.days().load(date)? else {
                return Err(AnalyzerError::NotFound(format!("no data for {date}")));
            };
            let data = match bucket_seconds(resolution)? {
                Some(seconds) => resample(&data, seconds)?,
                None => data,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print!("{}", codec::encode(&data)?);
            }
        }
        Commands::Stats { date } => match analyzer.stats().for_day(date)? {
            Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            None => return Err(AnalyzerError::NotFound(format!("no data for {date}"))),
        },
        Commands::MonthStats { year, month } => {
            let stats = analyzer.stats().for_month(year, month)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Preload { year, month } => {
            let loaded = analyzer.days().preload_month(year, month)?;
            println!("{loaded} days loaded");
        }
        Commands::List { raw } => {
            for day in analyzer.storage().stored_days(store_kind(raw))? {
                println!("{day}");
            }
        }
        Commands::Delete { year, month, raw } => {
            let selector = month.map_or(MonthSelector::All, MonthSelector::Month);
            let deleted = analyzer.storage().delete_month(store_kind(raw), year, selector)?;
            println!("{deleted} entries deleted");
        }
        Commands::Devices | Commands::Clear => {}
    }
    Ok(())
}
