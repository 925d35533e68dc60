use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use salesreport::batch::{run_report, ReportJob};
use salesreport::config::AppConfig;
use salesreport::{server, terminal};
use salesreport_core::{FilterState, RenderRequest, EXPORT_FILE_NAME};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sales CSV report generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the browser UI
    Serve(ServeArgs),
    /// Render one report from a CSV file
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on (overrides SALESREPORT_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// CSV file to analyse
    #[arg(long)]
    input: PathBuf,
    /// Keep only these years (repeatable)
    #[arg(long = "year")]
    years: Vec<i64>,
    /// Keep only these regions (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,
    /// Region for the drill-down section
    #[arg(long)]
    drill: Option<String>,
    /// Where to write the filtered dataset
    #[arg(long, default_value = EXPORT_FILE_NAME)]
    output: PathBuf,
    /// Also write every chart as an SVG file into this directory
    #[arg(long)]
    svg_dir: Option<PathBuf>,
    /// Print the report bundle as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                config.bind = bind;
            }
            server::serve(config).await
        }
        Command::Report(args) => {
            let job = ReportJob {
                input: args.input,
                request: RenderRequest {
                    filters: FilterState::new(args.years, args.regions),
                    drilldown_region: args.drill,
                },
                output: args.output,
                svg_dir: args.svg_dir,
            };
            let bundle = run_report(&job, &config.settings)?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            } else {
                println!("{}", terminal::render_bundle(&bundle));
                println!("Wrote {}", job.output.display());
            }
            Ok(())
        }
    }
}
