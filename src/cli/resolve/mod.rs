//! Resolve command - one forward lookup through a fresh cache

use clap::Args;

use crate::config::AppConfig;
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Free-text address to resolve
    pub address: String,
}

/// Resolve `args.address` and print the result to stdout
pub async fn run(args: ResolveArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let service = crate::create_geocoding_service(&config)?;

    match service.resolve_address(&args.address).await? {
        Some(location) => {
            println!("{}", serde_json::to_string_pretty(&location)?);
            Ok(())
        }
        None => anyhow::bail!("No location found for '{}'", args.address.trim()),
    }
}
