use anyhow::Context;
use clap::Parser;
use small_storefront::config::{CartCommand, Command, LoginArgs, OrdersCommand};
use small_storefront::core::orders::ReplicaSnapshot;
use small_storefront::core::{Cart, CheckoutForm, ConfigProvider, Credentials};
use small_storefront::utils::error::ErrorSeverity;
use small_storefront::utils::{logger, validation::Validate};
use small_storefront::{
    ApiClient, CliConfig, FileCartStorage, Notifier, Session, StoreConfig, StoreError,
    StoreSession,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.validate().and_then(|_| cli.resolve()) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            tracing::error!("❌ Configuration validation failed: {}", e);
            fail(&e);
        }
    };

    logger::init_logger(&config.log_format, config.verbose);
    tracing::debug!("Resolved config: {:?}", config);

    match run(cli.command, &config).await {
        Ok(()) => Ok(()),
        Err(RunError::Store(e)) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            fail(&e);
        }
        Err(RunError::Other(e)) => Err(e),
    }
}

fn fail(e: &StoreError) -> ! {
    tracing::debug!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

/// Store errors get the friendly report; anything else goes through anyhow.
enum RunError {
    Store(StoreError),
    Other(anyhow::Error),
}

impl From<StoreError> for RunError {
    fn from(e: StoreError) -> Self {
        RunError::Store(e)
    }
}

impl From<anyhow::Error> for RunError {
    fn from(e: anyhow::Error) -> Self {
        RunError::Other(e)
    }
}

async fn run(command: Command, config: &StoreConfig) -> Result<(), RunError> {
    let client = Arc::new(ApiClient::from_config(config)?);
    let notifier = Arc::new(Notifier::from_config(config)?);
    let storage = FileCartStorage::new(config.cart_path());
    let mut session: StoreSession = Session::open(client, storage, notifier)?;

    let outcome = execute(&mut session, command, config).await;
    session.close().await;
    outcome
}

async fn execute(
    session: &mut StoreSession,
    command: Command,
    config: &StoreConfig,
) -> Result<(), RunError> {
    match command {
        Command::Products => {
            session.sync_catalog().await?;
            for product in session.catalog().active_products() {
                println!("{}\t{}\t{}", product.item_id, product.name, product.price);
            }
        }
        Command::Cart(CartCommand::Show) => print_cart(session.cart()),
        Command::Cart(CartCommand::Add { item_id, quantity }) => {
            session.sync_catalog().await?;
            if let Some(product) = session.catalog().find(&item_id) {
                if !product.active {
                    println!("⚠️  {} is not available right now", product.name);
                }
            }
            let cart = session.add_to_cart(&item_id, quantity)?;
            print_cart(cart);
        }
        Command::Cart(CartCommand::Remove { item_id }) => {
            let cart = session.remove_from_cart(&item_id)?;
            print_cart(cart);
        }
        Command::Cart(CartCommand::Clear) => {
            session.clear_cart()?;
            println!("🛒 Cart cleared");
        }
        Command::Checkout { name, telephone } => {
            let form = CheckoutForm { name, telephone };
            let order = session.checkout(&form).await?;
            println!(
                "✅ Order {} placed for {} (total {})",
                order.order_id, order.name, order.total
            );
        }
        Command::Login(args) => {
            let user = session.login(&Credentials::from(&args)).await?;
            println!("🔑 Signed in as {}", user.display_name());
        }
        Command::Register(args) => {
            let user = session.register(&Credentials::from(&args)).await?;
            println!("🔑 Registered and signed in as {}", user.display_name());
        }
        Command::Logout => {
            if session.logout().await? {
                println!("👋 Signed out");
            } else {
                println!("⚠️  Service did not confirm the logout");
            }
        }
        Command::Whoami => match session.check_user().await? {
            Some(user) => {
                let details = serde_json::to_string_pretty(user)
                    .context("Failed to render user details")?;
                println!("{}", details);
            }
            None => println!("Not signed in"),
        },
        Command::Orders(OrdersCommand::List { login }) => {
            authenticate(session, &login).await?;
            session.refresh_orders().await?;
            print_orders(&session.orders().await?);
        }
        Command::Orders(OrdersCommand::Status {
            order_id,
            status,
            login,
        }) => {
            authenticate(session, &login).await?;
            let order = session.set_order_status(&order_id, status).await?;
            println!("📦 Order {} is now {}", order.order_id, order.status);
        }
        Command::Watch { login, .. } => {
            authenticate(session, &login).await?;
            watch(session, config).await?;
        }
    }
    Ok(())
}

/// Logs in with the given credentials, or falls back to whatever session the
/// service already recognises.
async fn authenticate(session: &mut StoreSession, login: &LoginArgs) -> Result<(), RunError> {
    match login.credentials() {
        Some(credentials) => {
            session.login(&credentials).await?;
        }
        None => {
            if session.check_user().await?.is_none() {
                return Err(StoreError::Unauthenticated.into());
            }
        }
    }
    Ok(())
}

async fn watch(session: &mut StoreSession, config: &StoreConfig) -> Result<(), RunError> {
    session.watch_orders(config.refresh_interval()).await?;
    let engine = session.order_engine();
    let mut changes = engine.subscribe();
    print_orders(&engine.list_orders().await);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                tracing::info!("🛑 Stopping order watch");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_orders(&engine.list_orders().await);
            }
        }
    }

    session.stop_watching().await;
    Ok(())
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("🛒 Cart is empty");
        return;
    }
    for item in cart.items() {
        println!(
            "{}\t{}\tx{}\t{}",
            item.item_id(),
            item.product.name,
            item.cart_quantity,
            item.line_total()
                .map(|total| total.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    println!(
        "Items: {}  Subtotal: {}",
        cart.total_quantity(),
        cart.sub_total()
    );
}

fn print_orders(snapshot: &ReplicaSnapshot) {
    let refreshed = snapshot
        .refreshed_at
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "📋 {} order(s) (refreshed {})",
        snapshot.orders.len(),
        refreshed
    );
    for order in &snapshot.orders {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            order.order_id, order.status, order.name, order.contact, order.total
        );
    }
}
