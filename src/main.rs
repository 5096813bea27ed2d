use anyhow::Context;
use clap::{Parser, Subcommand};
use racecast::application::race::{PredictionRequest, RacePredictionPipeline};
use racecast::application::racing_line::RacingLineService;
use racecast::config::Config;
use racecast::domain::ports::{SessionDataProvider, TelemetryProvider};
use racecast::domain::session::{RoundSelector, validate_season};
use racecast::infrastructure::{
    CachedSessionProvider, CachedTelemetryProvider, JolpicaSessionProvider,
    OpenF1TelemetryProvider, SessionCache,
};
use racecast::interfaces::{
    PredictionReportView, render_report, render_schedule, write_racing_line_csv,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Formula 1 race lap time forecasts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the events of a season
    Events {
        /// Season (e.g. 2024)
        #[arg(short, long)]
        year: i32,
    },

    /// Forecast race lap times from qualifying pace
    Predict {
        /// Season whose qualifying results are used
        #[arg(short, long)]
        year: i32,

        /// Round number or event name ("5", "Monaco")
        #[arg(short, long)]
        round: RoundSelector,

        /// Season whose race laps train the models (default: year - 1)
        #[arg(long)]
        prior_year: Option<i32>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fastest-lap telemetry and the predicted racing line of an event
    RacingLine {
        /// Season to show
        #[arg(short, long)]
        year: i32,

        /// Event name or round number
        #[arg(short, long)]
        event: RoundSelector,

        /// CSV output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full report (track maps included) as JSON instead of CSV
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so tables, JSON and CSV on stdout stay clean.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(run(cli.command, config))
}

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    let cache = Arc::new(SessionCache::from_config(&config.cache));
    if let Some(dir) = cache.directory() {
        info!("Session cache directory: {}", dir.display());
    }

    let sessions: Arc<dyn SessionDataProvider> = Arc::new(CachedSessionProvider::new(
        JolpicaSessionProvider::new(&config.provider),
        cache.clone(),
        config.provider.request_timeout(),
    ));

    match command {
        Commands::Events { year } => {
            let year = validate_season(year)?;
            let events = sessions
                .get_schedule(year)
                .await
                .with_context(|| format!("Failed to load the {} schedule", year))?;
            print!("{}", render_schedule(year, &events));
        }

        Commands::Predict {
            year,
            round,
            prior_year,
            json,
        } => {
            let target_year = validate_season(year)?;
            let prior_year = prior_year.map(validate_season).transpose()?;

            let pipeline = RacePredictionPipeline::new(sessions, &config.model);
            let request = PredictionRequest {
                target_year,
                prior_year,
                round,
            };
            let report = pipeline.run(&request).await?;

            if json {
                let view = PredictionReportView::new(&report, &config.presentation);
                println!("{}", view.to_json().context("Failed to encode report")?);
            } else {
                print!("{}", render_report(&report, &config.presentation));
            }
        }

        Commands::RacingLine {
            year,
            event,
            output,
            json,
        } => {
            let year = validate_season(year)?;
            let telemetry: Arc<dyn TelemetryProvider> = Arc::new(CachedTelemetryProvider::new(
                OpenF1TelemetryProvider::new(&config.provider),
                cache.clone(),
                config.provider.request_timeout(),
            ));

            let service = RacingLineService::new(sessions, telemetry, config.racing_line.clone());
            let report = service.run(year, &event).await?;
            for warning in &report.warnings {
                eprintln!("⚠️  {}", warning);
            }

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to encode report")?
                );
                return Ok(());
            }

            let written = match &output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_racing_line_csv(&report, BufWriter::new(file))?
                }
                None => write_racing_line_csv(&report, std::io::stdout().lock())?,
            };
            info!(
                "Racing line for {} {}: {} rows written{}",
                report.event_name,
                year,
                written,
                output
                    .as_ref()
                    .map(|p| format!(" to {}", p.display()))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}
