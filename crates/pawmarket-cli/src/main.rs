mod cart;
mod checkout;
mod coupon;

use clap::{Args, Parser, Subcommand};
use pawmarket_api::MarketplaceClient;
use pawmarket_checkout::{CartStore, CheckoutSession, ShippingPolicy};
use pawmarket_core::{AppConfig, DeliveryMethod, DwellingType, GeoPoint, ShippingAddress};
use tracing_subscriber::EnvFilter;

use crate::cart::CartCommands;
use crate::coupon::CouponCommands;

#[derive(Debug, Parser)]
#[command(name = "pawmarket")]
#[command(about = "Pawmarket storefront command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect and edit the local cart
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Apply or remove a promotional coupon
    Coupon {
        #[command(subcommand)]
        command: CouponCommands,
    },
    /// Preview totals, including shipping, for a delivery choice
    Quote(DeliveryArgs),
    /// Look up delivery addresses
    Address {
        #[command(subcommand)]
        command: AddressCommands,
    },
    /// Place one order per vendor for the current cart
    Checkout {
        #[command(flatten)]
        delivery: DeliveryArgs,
        /// Payment method (e.g. webpay)
        #[arg(long)]
        payment_method: Option<String>,
        /// Shopper email, used for test-account payment exemption
        #[arg(long, env = "PAWMARKET_CUSTOMER_EMAIL")]
        email: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum AddressCommands {
    /// Suggest addresses matching free text
    Suggest {
        /// Free-text query (street and number)
        query: String,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        comuna: Option<String>,
    },
}

/// Delivery choice shared by `quote` and `checkout`.
#[derive(Debug, Clone, Default, Args)]
struct DeliveryArgs {
    /// Pick the order up at the store instead of delivering it
    #[arg(long)]
    pickup: bool,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    comuna: Option<String>,
    /// Street and number
    #[arg(long)]
    street: Option<String>,
    /// Apartment, office or other unit detail
    #[arg(long)]
    unit: Option<String>,
    /// house, apartment or office
    #[arg(long, default_value = "house")]
    dwelling: DwellingType,
    /// Latitude of the address, as returned by `address suggest`
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    lat: Option<f64>,
    /// Longitude of the address, as returned by `address suggest`
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    lon: Option<f64>,
}

impl DeliveryArgs {
    fn method(&self) -> DeliveryMethod {
        if self.pickup {
            DeliveryMethod::Pickup
        } else {
            DeliveryMethod::Delivery
        }
    }

    fn address(&self) -> Option<ShippingAddress> {
        if self.pickup {
            return None;
        }
        Some(ShippingAddress {
            region: self.region.clone(),
            comuna: self.comuna.clone(),
            street: self.street.clone().unwrap_or_default(),
            unit: self.unit.clone(),
            dwelling_type: self.dwelling,
            location: self.lat.zip(self.lon).map(|(lat, lon)| GeoPoint::new(lat, lon)),
        })
    }
}

/// Everything a command handler needs: config, API client and the local
/// cart file.
pub(crate) struct Context {
    pub config: AppConfig,
    pub client: MarketplaceClient,
    pub store: CartStore,
}

impl Context {
    fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client = MarketplaceClient::from_config(&config)?;
        let store = CartStore::new(config.cart_path.clone());
        Ok(Self {
            config,
            client,
            store,
        })
    }

    /// Loads the stored cart into a fresh checkout session.
    pub(crate) async fn session(&self) -> anyhow::Result<CheckoutSession> {
        let cart = self.store.load().await?;
        Ok(CheckoutSession::new(
            cart,
            ShippingPolicy::from_config(&self.config),
        ))
    }

    pub(crate) async fn save(&self, session: &CheckoutSession) -> anyhow::Result<()> {
        let cart = session.cart.snapshot().await;
        self.store.save(&cart).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pawmarket: run `pawmarket --help` for available commands");
        return Ok(());
    };

    let config = pawmarket_core::load_app_config()?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::new(config)?;
    match command {
        Commands::Cart { command } => cart::run(&ctx, command).await,
        Commands::Coupon { command } => coupon::run(&ctx, command).await,
        Commands::Quote(delivery) => checkout::run_quote(&ctx, &delivery).await,
        Commands::Address {
            command:
                AddressCommands::Suggest {
                    query,
                    region,
                    comuna,
                },
        } => {
            checkout::run_address_suggest(&ctx, &query, region.as_deref(), comuna.as_deref())
                .await
        }
        Commands::Checkout {
            delivery,
            payment_method,
            email,
        } => checkout::run_checkout(&ctx, &delivery, payment_method, email).await,
    }
}

#[cfg(test)]
mod tests;
