use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::commands;
use dataset_core::config::{self, AppConfig, ClipFailurePolicy};
use dataset_core::models::Split;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download {
            split,
            workers,
            halt_on_clip_error,
            no_progress,
            json,
        } => run_download(cfg, split, workers, halt_on_clip_error, no_progress, json).await,
        Commands::Preprocess { thresholds, json } => run_preprocess(cfg, thresholds, json),
        Commands::Check { verbose, json } => run_check(cfg, verbose, json),
        Commands::Failures { json } => run_failures(cfg, json).await,
    }
}

#[derive(Parser)]
#[command(name = "msasl-prep")]
#[command(about = "Download and cut MS-ASL sign clips", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download raw videos and cut clips (train, then val, then test)
    Download {
        /// Only process these splits (comma-separated: train,val,test)
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        split: Vec<Split>,
        /// Concurrent source videos; overrides run.workers
        #[arg(long)]
        workers: Option<usize>,
        /// Stop the batch on the first failed cut instead of logging it
        #[arg(long, default_value_t = false)]
        halt_on_clip_error: bool,
        /// Disable the progress bar
        #[arg(long, default_value_t = false)]
        no_progress: bool,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Write train/val/test label lists and the class table per threshold
    Preprocess {
        /// Class-count thresholds; defaults to preprocess.thresholds
        #[arg(long = "threshold", value_delimiter = ',', num_args = 1..)]
        thresholds: Vec<usize>,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Compare expected raw videos against the raw video directory
    Check {
        /// List every missing file
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
        /// Output JSON report
        #[arg(long)]
        json: bool,
    },
    /// List failed downloads and unfinished clips recorded by previous runs
    Failures {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_download(
    mut cfg: AppConfig,
    split: Vec<Split>,
    workers: Option<usize>,
    halt_on_clip_error: bool,
    no_progress: bool,
    json: bool,
) -> Result<()> {
    if let Some(w) = workers {
        cfg.run.workers = w;
    }
    if halt_on_clip_error {
        cfg.run.clip_failure = ClipFailurePolicy::Halt;
    }
    if no_progress || json {
        cfg.run.progress = false;
    }
    let splits = if split.is_empty() {
        Split::ALL.to_vec()
    } else {
        Split::ALL
            .iter()
            .copied()
            .filter(|s| split.contains(s))
            .collect()
    };

    let summaries = commands::download(&cfg, &splits).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for s in &summaries {
        println!(
            "{}: records {}, raw videos {} (downloaded {}, present {}, failed {}), clips {} (failed {}, skipped {})",
            s.split,
            s.records,
            s.raw_videos,
            s.downloaded,
            s.already_present,
            s.fetch_failed,
            s.clips_written,
            s.clips_failed,
            s.clips_skipped
        );
    }
    if summaries.iter().any(|s| s.fetch_failed + s.clips_failed > 0) {
        println!("failures were appended to {}", cfg.paths.log_path.display());
    }
    Ok(())
}

fn run_preprocess(cfg: AppConfig, thresholds: Vec<usize>, json: bool) -> Result<()> {
    let thresholds = if thresholds.is_empty() {
        cfg.preprocess.thresholds.clone()
    } else {
        thresholds
    };
    let summaries = commands::preprocess(&cfg, &thresholds)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }
    for s in &summaries {
        println!(
            "{}: train {}, val {}, test {}, classes {}",
            s.dir.display(),
            s.train,
            s.val,
            s.test,
            s.classes
        );
    }
    Ok(())
}

fn run_check(cfg: AppConfig, verbose: bool, json: bool) -> Result<()> {
    let report = commands::check(&cfg)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", commands::render_report(&report, verbose));
    }
    Ok(())
}

async fn run_failures(cfg: AppConfig, json: bool) -> Result<()> {
    let listing = commands::failures(&cfg).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }
    println!("failed downloads: {}", listing.fetches.len());
    for f in &listing.fetches {
        println!(
            "  {} {} {}",
            f.raw_name,
            f.url,
            f.error.as_deref().unwrap_or("")
        );
    }
    println!("unfinished clips: {}", listing.clips.len());
    for c in &listing.clips {
        println!(
            "  [{}] {} {} {}",
            c.split,
            c.status,
            c.output_path,
            c.error.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
