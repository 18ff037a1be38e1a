use anyhow::{Context, Result};
use clap::Parser;
use life_expectancy_reports::config::ReportConfig;
use life_expectancy_reports::csv_reader;
use life_expectancy_reports::report::{self, ChartKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "life-expectancy-reports")]
#[command(about = "Render life expectancy line, bar and pie charts from a CSV file", long_about = None)]
struct Args {
    /// CSV file with Country, Year and Life Expectancy columns
    #[arg(long)]
    data: Option<PathBuf>,

    /// JSON file describing the reports to render
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving the PNG files
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Output resolution in dots per inch
    #[arg(long)]
    dpi: Option<u32>,

    /// Render only these charts (repeatable)
    #[arg(long, value_enum)]
    only: Vec<ChartKind>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path).context("Failed to load configuration")?,
        None => ReportConfig::default(),
    };
    if let Some(data) = args.data {
        config.data_path = data;
    }
    if let Some(out_dir) = args.out_dir {
        config.output_dir = out_dir;
    }
    if let Some(dpi) = args.dpi {
        config.render.dpi = dpi;
    }

    let dataset = csv_reader::load_dataset(&config.data_path)
        .context("Failed to load life expectancy data")?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    let specs = config.specs(&args.only);
    let outcomes = report::run_all(&dataset, &specs, &config.render, &config.output_dir);

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} reports failed", failed, outcomes.len());
    }

    Ok(())
}
