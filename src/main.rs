use clap::{Parser, ValueEnum};
use flexserver_iops::{
    validate_storage_update, CatalogCache, Config, FileCapabilitySource, StorageSizeGb,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Work out the storage IOPS to provision for a flexible server.
#[derive(Debug, Parser)]
#[command(name = "flexserver-iops", version)]
struct Cli {
    /// Capability listing file, or a directory of `<location>.json` listings.
    #[arg(long, env = "FLEXSERVER_CAPABILITIES")]
    capabilities: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, env = "FLEXSERVER_IOPS_CONFIG")]
    config: Option<PathBuf>,

    /// Location whose capability listing is used.
    #[arg(short, long, env = "FLEXSERVER_LOCATION")]
    location: String,

    /// Compute tier, e.g. Burstable.
    #[arg(long)]
    tier: String,

    /// SKU name, e.g. Standard_B1ms.
    #[arg(long)]
    sku_name: String,

    /// Requested storage size in GB.
    #[arg(long)]
    storage_size: u64,

    /// Current storage size in GB when updating an existing server.
    #[arg(long)]
    current_storage_size: Option<u64>,

    /// Requested IOPS; defaults to what the storage size and SKU allow.
    #[arg(long)]
    iops: Option<u64>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Resolution<'a> {
    location: &'a str,
    tier: &'a str,
    sku_name: &'a str,
    storage_size_gb: u64,
    requested_iops: Option<u64>,
    iops: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let capabilities = cli
        .capabilities
        .clone()
        .or_else(|| config.capability_dir.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("no capability listing given (--capabilities or capabilityDir)")
        })?;

    let storage = StorageSizeGb::new(cli.storage_size)?;
    if let Some(current) = cli.current_storage_size {
        validate_storage_update(StorageSizeGb::new(current)?, storage)?;
    }

    let cache = CatalogCache::new(
        FileCapabilitySource::from_path(&capabilities),
        config.retry,
        config.default_free_iops,
    );
    let catalog = cache.get_or_load(&cli.location).await?;
    let iops = catalog.resolve(storage, cli.iops, &cli.tier, &cli.sku_name)?;

    info!("Resolved {} IOPS for {}/{} in {}", iops, cli.tier, cli.sku_name, cli.location);

    match cli.output {
        OutputFormat::Text => println!("{}", iops),
        OutputFormat::Json => {
            let resolution = Resolution {
                location: &cli.location,
                tier: &cli.tier,
                sku_name: &cli.sku_name,
                storage_size_gb: storage.get(),
                requested_iops: cli.iops,
                iops,
            };
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
    }

    Ok(())
}
