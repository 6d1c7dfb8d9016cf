mod loader;
mod logging;
mod output;

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use boll_core::common::time::format_timestamp;
use boll_core::kline::sample::{generate_sample_bars, SampleConfig};
use boll_core::{cal_boll, BollConfig, BollMetric, BollOverlay, BollSettings, KLineList};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "boll_cli", version, about = "Bollinger Bands over OHLCV csv data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute bands for a csv file or every csv file in a directory
    Compute(ComputeArgs),
    /// Write a generated random-walk bar series as csv
    Sample(SampleArgs),
}

#[derive(Args, Debug)]
struct ComputeArgs {
    #[arg(long)]
    input: PathBuf,

    /// Window length; unparseable input falls back to 20
    #[arg(long, env = "BOLL_LENGTH", default_value = "20")]
    length: String,

    /// Standard deviation multiplier; unparseable input falls back to 2
    #[arg(long = "mult", env = "BOLL_MULT", default_value = "2")]
    std_dev_multiplier: String,

    /// Bar shift of output timestamps
    #[arg(long, env = "BOLL_OFFSET", default_value = "0", allow_hyphen_values = true)]
    offset: String,

    /// JSON parameter file; takes precedence over the individual options
    #[arg(long, env = "BOLL_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Feed bars one at a time through the incremental overlay
    #[arg(long)]
    stream: bool,

    /// Reject malformed or non-finite bars instead of passing them through
    #[arg(long)]
    strict: bool,

    /// Output file, or directory when several inputs are processed
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[arg(long, default_value_t = 200)]
    count: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Compute(args) => run_compute(&args),
        Command::Sample(args) => run_sample(&args),
    }
}

fn run_compute(args: &ComputeArgs) -> Result<(), Box<dyn Error>> {
    let conf = resolve_config(args)?;
    info!(
        length = conf.length,
        ma_type = %conf.ma_type,
        source = %conf.source,
        k = conf.std_dev_multiplier,
        offset = conf.offset,
        "band parameters"
    );

    let inputs = loader::collect_inputs(&args.input)?;
    let many = inputs.len() > 1;
    if many {
        if let Some(dir) = &args.out {
            std::fs::create_dir_all(dir)?;
        }
    }

    for path in &inputs {
        info!("Processing file: {:?}", path);
        let bars = match loader::load_csv_file(path, args.strict) {
            Ok(bars) => bars,
            Err(e) if many && e.is_kldata_err() => {
                warn!(path = %path.display(), error = %e, "skipping file");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let points = if args.stream {
            compute_streaming(&bars, &conf)?
        } else {
            cal_boll(&bars, &conf)?
        };
        log_summary(path, &bars, &points);

        match target_path(args, path, many) {
            Some(target) => {
                let file = BufWriter::new(File::create(&target)?);
                output::write_points(file, &points, args.format)?;
                info!(out = %target.display(), "bands written");
            }
            None => output::write_points(io::stdout().lock(), &points, args.format)?,
        }
    }

    Ok(())
}

/// The config file is trusted as-is; the loose options go through the
/// settings fallbacks.
fn resolve_config(args: &ComputeArgs) -> Result<BollConfig, Box<dyn Error>> {
    match &args.config {
        Some(path) => {
            let doc: HashMap<String, serde_json::Value> =
                serde_json::from_reader(File::open(path)?)?;
            Ok(BollConfig::from_json(Some(doc))?)
        }
        None => {
            let settings = BollSettings::new(&args.length, &args.std_dev_multiplier, &args.offset);
            Ok(settings.to_config()?)
        }
    }
}

/// Replays the series bar by bar, the way a live chart receives it
fn compute_streaming(bars: &KLineList, conf: &BollConfig) -> Result<Vec<BollMetric>, Box<dyn Error>> {
    let mut overlay = BollOverlay::new(conf.clone())?;
    for n in 1..=bars.len() {
        overlay.update(&bars.as_slice()[..n]);
    }
    Ok(overlay.last_valid().to_vec())
}

fn target_path(args: &ComputeArgs, input: &Path, many: bool) -> Option<PathBuf> {
    let out = args.out.as_ref()?;
    if !many {
        return Some(out.clone());
    }
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("bars");
    Some(out.join(format!("{}.boll.{}", stem, args.format.extension())))
}

fn log_summary(path: &Path, bars: &KLineList, points: &[BollMetric]) {
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return;
    };
    info!(
        "{:?}: {} bars from {} to {}, {} band points",
        path,
        bars.len(),
        format_timestamp(first.timestamp),
        format_timestamp(last.timestamp),
        points.len()
    );
}

fn run_sample(args: &SampleArgs) -> Result<(), Box<dyn Error>> {
    let conf = SampleConfig::daily_until(Utc::now().timestamp_millis(), args.count, args.seed);
    let bars = generate_sample_bars(&conf);
    info!(count = bars.len(), seed = args.seed, "sample bars generated");

    match &args.out {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            output::write_bars(&mut file, &bars)?;
            file.flush()?;
        }
        None => output::write_bars(io::stdout().lock(), &bars)?,
    }
    Ok(())
}
