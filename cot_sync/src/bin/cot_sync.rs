use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cot_ingestor::models::report::{ReportType, SubType, Variant};
use cot_sync::analytics::Calculator;
use cot_sync::config::SyncConfig;
use cot_sync::pipeline::{CancelToken, Pipeline, RunOptions, RunResult};
use cot_sync::service::ReadService;
use cot_sync::store::CotStore;
use serde::Serialize;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

const EXIT_ALREADY_RUNNING: u8 = 2;

#[derive(Parser)]
#[command(version, about = "CFTC Commitments of Traders sync")]
struct Cli {
    /// TOML config file; defaults and environment apply without one.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Download, store, price and export.
    Run(RunArgs),
    /// Record counts per variant.
    Status,
    /// Markets of one variant.
    Markets(VariantArgs),
    /// Detail for one market.
    Market {
        code: String,
        #[command(flatten)]
        variant: VariantArgs,
    },
    /// Group definitions of a report type.
    Groups {
        #[arg(long, default_value = "legacy")]
        report_type: ReportType,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Delete and re-ingest the selected variants.
    #[arg(long)]
    force: bool,
    #[arg(long)]
    report_type: Option<ReportType>,
    #[arg(long)]
    sub_type: Option<SubType>,
    /// Use cached prices when available.
    #[arg(long)]
    skip_prices: bool,
    /// Treat this as the current year.
    #[arg(long, value_name = "YYYY")]
    year: Option<i32>,
}

#[derive(Args)]
struct VariantArgs {
    #[arg(long, default_value = "legacy")]
    report_type: ReportType,
    #[arg(long, default_value = "fo")]
    sub_type: SubType,
}

impl VariantArgs {
    fn variant(&self) -> Variant {
        Variant::new(self.report_type, self.sub_type)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_service(config: &SyncConfig) -> Result<ReadService> {
    let store = CotStore::open(&config.db_path)?;
    Ok(ReadService::new(store, Calculator::new(config.analytics.clone())))
}

async fn run(config: &SyncConfig, args: RunArgs) -> Result<ExitCode> {
    let pipeline = Pipeline::from_config(config)?;
    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current step");
            on_signal.cancel();
        }
    });

    let options = RunOptions {
        force_reload: args.force,
        report_type: args.report_type,
        sub_type: args.sub_type,
        skip_prices: args.skip_prices,
        as_of_year: args.year,
    };
    let result = pipeline.run(&options, &cancel).await?;
    print_json(&result)?;
    Ok(match result {
        RunResult::Completed(_) => ExitCode::SUCCESS,
        RunResult::AlreadyRunning { .. } => ExitCode::from(EXIT_ALREADY_RUNNING),
    })
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = SyncConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.cmd {
        Cmd::Run(args) => return run(&config, args).await,
        Cmd::Status => print_json(&read_service(&config)?.status()?)?,
        Cmd::Markets(args) => print_json(&read_service(&config)?.markets(args.variant())?)?,
        Cmd::Market { code, variant } => {
            let detail = read_service(&config)?.market_detail(&code, variant.variant(), None)?;
            match detail {
                Some(detail) => print_json(&detail)?,
                None => anyhow::bail!("no data for market {code} in {}", variant.variant()),
            }
        }
        Cmd::Groups { report_type } => print_json(ReadService::groups(report_type))?,
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
