//! Headless driver for the pagination coordinator

use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pokelist::api::{ApiConfig, PokeApiClient, DEFAULT_API_BASE, DEFAULT_PAGE_SIZE};
use pokelist::pager::Pager;
use pokelist::state::{LoadPhase, ViewState};

/// Page through PokeAPI and print the merged list
#[derive(Parser, Debug)]
#[command(name = "pokelist")]
#[command(about = "Paginated Pokemon list with lazily fetched details")]
struct Args {
    /// PokeAPI base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Entries per page (minimum 1)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: u32,

    /// Number of extra pages to load after the first one
    #[arg(long, short, default_value_t = 1)]
    pages: u32,

    /// Refresh the list once paging is done
    #[arg(long)]
    refresh: bool,

    /// Artificial delay before each page request, in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Upper bound on concurrent HTTP requests
    #[arg(long, default_value_t = 12)]
    max_concurrent_requests: usize,

    /// Seconds to wait for each load to settle
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Print the final snapshot as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print the JSON schema of the view state and exit
    #[arg(long)]
    schema: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.schema {
        let schema = schemars::schema_for!(ViewState);
        println!("{}", serde_json::to_string_pretty(&schema).map_err(io::Error::other)?);
        return Ok(());
    }

    let client = PokeApiClient::new(ApiConfig {
        base_url: args.api_base.clone(),
        page_size: args.page_size,
        max_concurrent_requests: args.max_concurrent_requests,
        latency: Duration::from_millis(args.latency_ms),
    });
    let pager = Pager::spawn(Arc::new(client));
    let observer = tokio::spawn(log_snapshots(pager.subscribe()));

    let limit = Duration::from_secs(args.timeout_secs);
    let mut state = step(&pager, Pager::load_initial, limit).await?;
    for _ in 0..args.pages {
        if state.phase.is_failed() {
            break;
        }
        let before = state.current_page;
        state = step(&pager, Pager::load_more, limit).await?;
        if state.current_page == before && state.is_ready() {
            info!("no more pages");
            break;
        }
    }
    if args.refresh {
        state = step(&pager, Pager::refresh, limit).await?;
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(state.as_ref()).map_err(io::Error::other)?
        );
    } else {
        print_table(&state);
    }

    pager.shutdown().await;
    observer.abort();

    match &state.phase {
        LoadPhase::Failed(reason) => Err(io::Error::other(reason.clone())),
        _ => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

async fn step(
    pager: &Pager,
    intent: fn(&Pager),
    limit: Duration,
) -> io::Result<Arc<ViewState>> {
    pager.settle_after(intent, limit).await.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no settled state within {}s", limit.as_secs()),
        )
    })
}

async fn log_snapshots(mut snapshots: watch::Receiver<Arc<ViewState>>) {
    while snapshots.changed().await.is_ok() {
        let state = Arc::clone(&snapshots.borrow_and_update());
        info!(
            phase = ?state.phase,
            page = state.current_page,
            entries = state.entries.len(),
            details = state.loaded_details(),
            "snapshot"
        );
    }
}

fn print_table(state: &ViewState) {
    println!(
        "{:>5}  {:<16} {:>7}  {:<20} image",
        "id", "name", "weight", "move"
    );
    for entry in &state.entries {
        let (weight, primary_move, image) = match &entry.detail {
            Some(detail) => (
                detail.weight.to_string(),
                detail.primary_move.clone().unwrap_or_else(|| "-".to_string()),
                detail.image.clone().unwrap_or_else(|| "-".to_string()),
            ),
            None => ("?".to_string(), "?".to_string(), "?".to_string()),
        };
        println!(
            "{:>5}  {:<16} {:>7}  {:<20} {}",
            entry.id(),
            entry.summary.name,
            weight,
            primary_move,
            image
        );
    }
    println!(
        "-- {:?}, page {}, {} entries, {} with details",
        state.phase,
        state.current_page,
        state.entries.len(),
        state.loaded_details()
    );
}
