//! FairCompute CLI - rent GPUs from the marketplace
//!
//! Resolves the marketplace configuration from the environment (and an
//! optional `.env` file), shows the quote for a node offer and submits the
//! rental with the user's bearer token.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use serde_json::Value;

use faircompute_client::{FairClient, Method, RequestOptions};
use faircompute_common::{
    FairConfig, FileTokenStore, MemoryTokenStore, NodeOffer, RentalSelection, TokenStore,
};

mod checkout;
mod display;

use checkout::{Outcome, checkout};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Load environment variables from this file (defaults to ./.env when present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Bearer token to authenticate with (or set FAIRCOMPUTE_TOKEN env var)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Read the bearer token from this file instead of the default location
    #[arg(long, global = true, conflicts_with = "token")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the resolved configuration with secrets masked
    Config,
    /// Quote and rent resources on a node
    Rent(RentArgs),
    /// Send a raw request to the API
    Request(RequestArgs),
}

#[derive(Args, Debug)]
struct RentArgs {
    /// Node to rent from
    #[arg(long)]
    node_id: String,

    /// GPU model, "None" for CPU-only nodes
    #[arg(long, default_value = "None")]
    gpu_name: String,

    /// Display price per GPU, e.g. "$0.45/hr"
    #[arg(long, default_value = "0")]
    price: String,

    /// GPUs installed on the node
    #[arg(long, default_value_t = 0)]
    gpus: u32,

    /// CPU cores available for rent
    #[arg(long)]
    cpu_cores: u32,

    /// CPU cores installed on the node
    #[arg(long)]
    total_cpus: u32,

    /// RAM available for rent, in GB
    #[arg(long)]
    dram: u64,

    /// RAM installed on the node, in GB
    #[arg(long)]
    total_ram: u64,

    /// GPUs available for rent
    #[arg(long, default_value_t = 0)]
    avail_gpus: u32,

    /// GPUs to rent (defaults to 1 when any is available)
    #[arg(long)]
    gpu_quantity: Option<u32>,

    /// CPU cores to rent on CPU-only nodes
    #[arg(long)]
    cores: Option<u32>,

    /// Print the quote and the request without sending it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Path appended to the API URL, e.g. /api/v1/marketplace/nodes
    endpoint: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "POST")]
    method: String,

    /// Attach the provider public key
    #[arg(long)]
    api_key: bool,

    /// Attach the bearer token
    #[arg(long)]
    bearer: bool,

    /// Include the API version in the envelope
    #[arg(long)]
    with_version: bool,

    /// JSON payload placed under "data"
    #[arg(long)]
    data: Option<String>,
}

impl RentArgs {
    fn selection(&self) -> RentalSelection {
        let offer = NodeOffer::builder()
            .gpu_name(self.gpu_name.as_str())
            .price(self.price.as_str())
            .node_id(self.node_id.as_str())
            .gpus(self.gpus)
            .cpu_cores(self.cpu_cores)
            .total_cpus(self.total_cpus)
            .dram(self.dram)
            .total_ram(self.total_ram)
            .avail_gpus(self.avail_gpus)
            .build();

        let mut selection = RentalSelection::new(offer);
        if let Some(quantity) = self.gpu_quantity {
            selection = selection.with_gpu_quantity(quantity);
        }
        if let Some(cores) = self.cores {
            selection = selection.with_cpu_cores(cores);
        }
        selection
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    load_env_file(cli.env_file.as_ref())?;

    let config = FairConfig::from_env();
    debug!("Resolved configuration: {config:?}");

    match cli.command {
        Command::Config => {
            display::display_config(&config);
            Ok(())
        }
        Command::Rent(ref args) => {
            let client = build_client(&cli, config)?;
            rent(&client, args).await
        }
        Command::Request(ref args) => {
            let client = build_client(&cli, config)?;
            request(&client, args).await
        }
    }
}

/// Load a `.env` file without overriding variables that are already set
fn load_env_file(path: Option<&PathBuf>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                debug!("Loaded {}", path.display());
            }
        }
    }
    Ok(())
}

fn token_store(cli: &Cli) -> Result<Arc<dyn TokenStore>> {
    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var("FAIRCOMPUTE_TOKEN").ok());

    if let Some(token) = token {
        return Ok(Arc::new(MemoryTokenStore::new(token)));
    }

    let store = match &cli.token_file {
        Some(path) => FileTokenStore::at_path(path),
        None => FileTokenStore::default_location().context("Failed to locate token file")?,
    };
    debug!("Reading bearer token from {}", store.path().display());
    Ok(Arc::new(store))
}

fn build_client(cli: &Cli, config: FairConfig) -> Result<FairClient> {
    let store = token_store(cli)?;
    FairClient::with_token_store(config, store).context("Failed to create API client")
}

async fn rent(client: &FairClient, args: &RentArgs) -> Result<()> {
    let selection = args.selection();
    display::display_quote(&selection, &selection.quote());

    match checkout(client, &selection, args.dry_run).await {
        Ok(Outcome::DryRun(request)) => {
            println!("{}", serde_json::to_string_pretty(&request)?);
            Ok(())
        }
        Ok(Outcome::Rented(executor)) => {
            display::display_rented(&executor.executor_id);
            Ok(())
        }
        Err(e) => {
            display::display_rent_error();
            Err(e).context("Rent request failed")
        }
    }
}

async fn request(client: &FairClient, args: &RequestArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", args.method))?;

    let payload: Option<Value> = args
        .data
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("--data must be valid JSON")?;

    let options = RequestOptions::builder()
        .use_api_key(args.api_key)
        .use_bearer_token(args.bearer)
        .include_version(args.with_version)
        .build();

    let response = client
        .send::<Value, Value>(&args.endpoint, method, options, payload.as_ref())
        .await?;

    if response.is_text() {
        debug!("Response body is not JSON");
    }
    println!("{}", serde_json::to_string_pretty(&response.into_json())?);

    Ok(())
}
