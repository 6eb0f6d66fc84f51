use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rata_map::api::{Api, HttpTransport};
use rata_map::config::{Config, DEFAULT_BASE_URL, DEFAULT_OUTPUT, DEFAULT_USER, MapView};

#[derive(Parser, Debug)]
#[command(
    name = "rata-map",
    author,
    version,
    about = "Live map of trains on the Finnish rail network",
    long_about = "Polls the Digitraffic rail API and keeps a GeoJSON layer of station and \
                  train markers up to date.\n\n\
                  While running, type `click <train>` to inspect a train's composition \
                  (this pauses the refresh) and `close` to resume."
)]
struct Args {
    /// Digitraffic rail API root
    #[arg(long, env = "RATA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Value sent in the Digitraffic-User header
    #[arg(long, env = "DIGITRAFFIC_USER", default_value = DEFAULT_USER)]
    user: String,

    /// Seconds between train position refreshes
    #[arg(long, env = "RATA_REFRESH_SECS", default_value_t = 5)]
    interval_secs: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// GeoJSON file the marker layer is written to
    #[arg(short, long, env = "RATA_MAP_OUTPUT", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the live map (default)
    Run,
    /// Print the current train positions
    Trains,
    /// Print station metadata
    Stations,
    /// Print the composition of one train run
    Composition {
        /// Departure date, e.g. 2024-03-01
        departure_date: NaiveDate,
        train_number: u32,
    },
    /// Print the API update times document
    UpdateTimes,
}

impl Args {
    fn config(&self) -> Result<Config> {
        if self.interval_secs == 0 {
            bail!("--interval-secs must be at least 1");
        }
        Ok(Config {
            base_url: self.base_url.clone(),
            user: self.user.clone(),
            refresh_interval: Duration::from_secs(self.interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            output: self.output.clone(),
            view: MapView::default(),
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    let config = args.config()?;
    log::debug!("Using {} as {:?}", config.base_url, config.user);

    match args.command.unwrap_or(Cmd::Run) {
        Cmd::Run => rata_map::app::run(config).await,
        cmd => print_once(cmd, Api::new(HttpTransport::from_config(&config)?)).await,
    }
}

/// One-shot subcommands: fetch, print, exit.
async fn print_once(cmd: Cmd, api: Api<HttpTransport>) -> Result<()> {
    match cmd {
        Cmd::Run => {}
        Cmd::Trains => {
            let trains = api.fetch_running_trains().await;
            for train in &trains {
                println!(
                    "{:>6}  {}  {:>5} km/h  {}  {}",
                    train.train_number, train.departure_date, train.speed, train.location, train.timestamp
                );
            }
            println!("{} trains running.", trains.len());
        }
        Cmd::Stations => {
            let stations = api.fetch_stations().await.context("Failed to fetch stations")?;
            for station in &stations {
                let location = station.location().map(|l| l.to_string()).unwrap_or_default();
                println!("{:<6} {:<32} {}", station.short_code, station.name, location);
            }
            println!("{} stations.", stations.len());
        }
        Cmd::Composition { departure_date, train_number } => {
            let lookup = api.fetch_station_name_lookup().await.context("Failed to fetch station names")?;
            match api
                .fetch_composition(train_number, departure_date, &lookup)
                .await
                .context("Failed to fetch train composition")?
            {
                Some(composition) => println!("{}", rata_map::map::composition_popup(&composition)),
                None => println!("No composition data available for train {train_number} on {departure_date}."),
            }
        }
        Cmd::UpdateTimes => {
            let times = api.fetch_update_times().await.context("Failed to fetch update times")?;
            println!("{}", serde_json::to_string_pretty(&times)?);
        }
    }

    Ok(())
}
