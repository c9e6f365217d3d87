use super::{StoreConfig, TomlConfig};
use crate::core::{Credentials, OrderStatus, RecordId};
use crate::utils::error::{Result, StoreError};
use crate::utils::validation::Validate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "storefront")]
#[command(about = "Cart and order lifecycle client for a small storefront")]
pub struct CliConfig {
    /// TOML configuration file
    #[arg(long, env = "STOREFRONT_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "STOREFRONT_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "STOREFRONT_CART_PATH")]
    pub cart_path: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List purchasable products
    Products,
    #[command(subcommand)]
    Cart(CartCommand),
    /// Submit the cart as an order
    Checkout {
        #[arg(long)]
        name: String,
        #[arg(long)]
        telephone: String,
    },
    Login(CredentialArgs),
    Register(CredentialArgs),
    Logout,
    /// Show the user the service associates with this session
    Whoami,
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// Keep the order list refreshed until interrupted
    Watch {
        /// Seconds between refreshes; defaults to the configured interval
        #[arg(long)]
        interval: Option<u64>,
        #[command(flatten)]
        login: LoginArgs,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CartCommand {
    Show,
    Add {
        item_id: RecordId,
        #[arg(long, short, default_value = "1")]
        quantity: u32,
    },
    Remove {
        item_id: RecordId,
    },
    Clear,
}

#[derive(Debug, Clone, Subcommand)]
pub enum OrdersCommand {
    List {
        #[command(flatten)]
        login: LoginArgs,
    },
    /// Move an order to placed, in-progress or completed (or 1, 2, 3)
    Status {
        order_id: RecordId,
        status: OrderStatus,
        #[command(flatten)]
        login: LoginArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CredentialArgs {
    #[arg(long, env = "STOREFRONT_USERNAME")]
    pub username: String,
    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl From<&CredentialArgs> for Credentials {
    fn from(args: &CredentialArgs) -> Self {
        Credentials {
            username: args.username.clone(),
            password: args.password.clone(),
        }
    }
}

/// Optional credentials for commands that need a logged-in session.
#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    #[arg(long, env = "STOREFRONT_USERNAME")]
    pub username: Option<String>,
    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl LoginArgs {
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

impl CliConfig {
    /// Loads the TOML file when given, then applies command-line overrides.
    pub fn resolve(&self) -> Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                StoreConfig::from_toml(&file)
            }
            None => StoreConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(cart_path) = &self.cart_path {
            config.cart_path = cart_path.clone();
        }
        if let Command::Watch {
            interval: Some(seconds),
            ..
        } = &self.command
        {
            config.refresh_interval_seconds = *seconds;
        }
        config.verbose |= self.verbose;

        config.validate()?;
        Ok(config)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(StoreError::InvalidConfigValueError {
                    field: "config".to_string(),
                    value: path.display().to_string(),
                    reason: "Configuration file does not exist".to_string(),
                });
            }
        }
        Ok(())
    }
}
