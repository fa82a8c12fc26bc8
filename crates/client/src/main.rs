//! Storefront checkout client

use std::{io, process, sync::Arc};

use clap::{Parser, Subcommand};
use tracing::error;

use storefront_client::{
    HttpAggregateApi, PurchaseFlow, Storefront, config::ClientConfig,
    observability::init_subscriber,
};

/// Storefront checkout client
#[derive(Debug, Parser)]
#[command(name = "storefront-cli", about = "Storefront checkout client", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Print the cart's checkout summary
    Cart,

    /// Print the buy-now session's checkout summary
    BuyNow,
}

impl From<Command> for PurchaseFlow {
    fn from(command: Command) -> Self {
        match command {
            Command::Cart => PurchaseFlow::Cart,
            Command::BuyNow => PurchaseFlow::BuyNow,
        }
    }
}

impl Cli {
    fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::load().unwrap_or_else(|e| e.exit());

    let format = cli.config.format_config().unwrap_or_else(|e| {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized yet, must use eprintln for config errors"
        )]
        {
            eprintln!("Configuration error: {e}");
        }

        process::exit(2);
    });

    if let Err(e) = init_subscriber(&cli.config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialize, must use eprintln"
        )]
        {
            eprintln!("Logging error: {e}");
        }

        process::exit(1);
    }

    let api = match HttpAggregateApi::new(&cli.config.api) {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "failed to build HTTP client");

            process::exit(1);
        }
    };

    let storefront = Storefront::new(Arc::new(api), format);
    let flow = PurchaseFlow::from(cli.command);

    if let Err(e) = storefront.refresh(flow).await {
        error!(error = %e, notice = %e.notice(), "failed to load checkout");

        process::exit(1);
    }

    if let Err(e) = storefront.checkout_summary(flow).write_to(io::stdout().lock()) {
        error!(error = %e, "failed to print summary");

        process::exit(1);
    }
}
