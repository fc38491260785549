mod cli;
mod error;
mod ui;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use csscan_config::Config;
use csscan_coverage::format::PrettyFormatter;
use csscan_crawl::{ScanEvent, ScanOptions, scan};
use csscan_render::{ChromeLauncher, CollectOptions};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(&args);
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            eprintln!("{}", ui::failure(&err.to_string()));
            ExitCode::FAILURE
        },
    }
}

fn setup_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &args.overrides()).or_raise(|| ErrorKind::Config)?;
    let url = match args.url {
        Some(url) => url,
        None => {
            let stdin = std::io::stdin();
            ui::prompt_url(stdin.lock(), std::io::stdout())
                .or_raise(|| ErrorKind::Terminal)?
                .ok_or_raise(|| ErrorKind::NoUrl)?
        },
    };

    let launcher = ChromeLauncher::discover(config.chrome.as_deref())
        .or_raise(|| ErrorKind::Browser)?
        .sandbox(config.sandbox);
    tracing::info!(chrome = %launcher.executable().display(), "Using browser");

    let options = ScanOptions {
        depth: config.depth,
        max_pages: config.max_pages,
        output_dir: config.output_dir.clone(),
        collect: CollectOptions {
            navigation_timeout: config.navigation_timeout(),
            settle: config.settle(),
        },
    };
    let mut events = std::pin::pin!(scan(&launcher, &url, &options, &PrettyFormatter));
    while let Some(event) = events.next().await {
        match event.or_raise(|| ErrorKind::Scan)? {
            ScanEvent::Started { seed } => println!("Scanning {seed}"),
            ScanEvent::PageVisited { url, count } => println!("{}", ui::progress_line(&url, count, config.max_pages)),
            ScanEvent::Complete(result) => print!("{}", ui::summary(&result, config.depth, config.max_pages)),
        }
    }
    Ok(())
}

