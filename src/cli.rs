use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::limiter::RateLimiter;
use crate::load_config::load_config;
use crate::segment::SegmentClient;
use crate::synchronise::{synchronise, FailurePolicy};
use crate::voucherify::VoucherifyClient;

/// CLI for segment-voucherify-sync: bulk-migrate Segment profiles into Voucherify.
#[derive(Parser)]
#[clap(
    name = "segment-voucherify-sync",
    version,
    about = "Migrate Segment.io Personas profiles into Voucherify customers in bulk"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full or resumed synchronisation pass
    Sync {
        /// Cursor to resume from (omit to start a full pass from the beginning)
        #[clap(long)]
        cursor: Option<String>,
        /// Consecutive page failures tolerated before giving up
        #[clap(long, default_value_t = 3)]
        max_retries: u32,
        /// Abort on the first page failure instead of retrying
        #[clap(long)]
        stop_on_failure: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync {
            cursor,
            max_retries,
            stop_on_failure,
        } => {
            let policy = if stop_on_failure {
                FailurePolicy::Stop
            } else {
                FailurePolicy::RetryUpTo(max_retries)
            };
            let config = load_config(cursor, policy)?;
            config.trace_loaded();

            let limiter = Arc::new(RateLimiter::new(config.min_request_interval));
            let source = SegmentClient::new(&config.segment, limiter);
            let sink = VoucherifyClient::new(&config.voucherify);

            println!("Synchronise starting...");
            let started = std::time::Instant::now();
            match synchronise(&source, &sink, &config).await {
                Ok(report) => {
                    println!("Synchronise complete in {:?}.", started.elapsed());
                    println!("Pages fetched: {}", report.pages_fetched);
                    println!("Customers upserted: {}", report.customers_upserted);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Synchronisation failed: {e}");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
