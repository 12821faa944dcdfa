//! Glow & Shine CLI - browse salons, manage a cart, and handle your account.
//!
//! # Usage
//!
//! ```bash
//! # List salons in Surat offering a facial
//! glow salons list --city Surat --service Facial
//!
//! # Show one salon with its service menu
//! glow salons show 694ce6be84ba8f65cd267400
//!
//! # Browse a salon's services by category and gender
//! glow services 694ce6be84ba8f65cd267400 --category "Hair Coloring" --gender female
//!
//! # Create an account, verify it, and log in
//! glow auth register -n "Riya Shah" -e riya@example.com -p secret --accept-terms
//! glow auth verify-otp -e riya@example.com 4 8 1 5 1 6
//! glow auth login -e riya@example.com -p secret
//!
//! # Add a service and review the cart
//! glow cart add 694ce6be84ba8f65cd267400 694ce6be84ba8f65cd267411
//! glow cart show 694ce6be84ba8f65cd267400
//! ```
//!
//! # Commands
//!
//! - `salons` - List and inspect salons
//! - `services` - Browse a salon's menu
//! - `auth` - Register, verify, log in/out, reset password
//! - `profile` - View and edit the profile, manage the avatar
//! - `cart` - Show, add to, and clear a salon cart
//!
//! # Environment Variables
//!
//! See `glow_client::config` for the full list. `RUST_LOG` controls log
//! verbosity (default `glow_cli=info,glow_client=info`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glow_client::config::ClientConfig;
use glow_client::{AppState, ClientError};
use glow_core::GenderFilter;

mod commands;

#[derive(Parser)]
#[command(name = "glow")]
#[command(author, version, about = "Glow & Shine salon booking")]
struct Cli {
    /// Directory for the persisted session and cart (overrides `GLOW_STATE_DIR`)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and inspect salons
    Salons {
        #[command(subcommand)]
        action: SalonsAction,
    },
    /// Browse a salon's services in one category
    Services {
        /// Salon id
        salon_id: String,

        /// Service category
        #[arg(short, long, default_value = "Haircut")]
        category: String,

        /// Gender filter (`all`, `male`, `female`, `kid`, `unisex`)
        #[arg(short, long, default_value = "all")]
        gender: GenderFilter,
    },
    /// Account registration, login, and password reset
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// View and edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage your cart at a salon
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum SalonsAction {
    /// List salons, optionally filtered
    List {
        /// Search salon names and cities
        #[arg(short, long, default_value = "")]
        query: String,

        /// Only salons in this city
        #[arg(long, default_value = "")]
        city: String,

        /// Only salons offering this service
        #[arg(long, default_value = "")]
        service: String,
    },
    /// Show one salon and its service menu
    Show {
        /// Salon id
        salon_id: String,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account; an OTP is emailed for verification
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Accept the terms and conditions
        #[arg(long)]
        accept_terms: bool,
    },
    /// Verify the OTP emailed after registration
    VerifyOtp {
        #[arg(short, long)]
        email: String,

        /// The six-digit code, as one value or one digit per value
        #[arg(required = true, num_args = 1..=6)]
        otp: Vec<String>,
    },
    /// Log in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Log out and drop the local cart copy
    Logout,
    /// Request a password-reset OTP
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Verify the password-reset OTP
    VerifyResetOtp {
        #[arg(short, long)]
        email: String,

        /// The six-digit code, as one value or one digit per value
        #[arg(required = true, num_args = 1..=6)]
        otp: Vec<String>,
    },
    /// Set a new password after a verified reset
    NewPassword {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the signed-in profile
    Show,
    /// Update profile fields
    Update {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Phone number; pass an empty string to remove it
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Manage the profile image
    Avatar {
        #[command(subcommand)]
        action: AvatarAction,
    },
}

#[derive(Subcommand)]
enum AvatarAction {
    /// Upload an image file
    Upload {
        path: PathBuf,
    },
    /// Fetch the current image URL from the server
    Refresh,
    /// Remove the image locally
    Remove,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show your cart at a salon
    Show {
        /// Salon id
        salon_id: String,

        /// Show the local copy without contacting the server
        #[arg(long)]
        offline: bool,
    },
    /// Add a service to your cart at a salon
    Add {
        /// Salon id
        salon_id: String,

        /// Service id
        service_id: String,

        /// Category to look the service up in if the salon menu lacks it
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Empty your cart at a salon
    Clear {
        /// Salon id
        salon_id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber, with the Sentry layer when enabled.
fn init_tracing(sentry_enabled: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "glow_cli=info,glow_client=info".into());

    let sentry_layer =
        sentry_enabled.then(|| sentry_tracing::layer().event_filter(sentry_event_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing(sentry_guard.is_some());

    if let Err(e) = run(cli, config).await {
        tracing::error!(error = %e, "{}", e.user_message());
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: ClientConfig) -> Result<(), ClientError> {
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }
    let state = AppState::new(&config)?;

    match cli.command {
        Commands::Salons { action } => match action {
            SalonsAction::List {
                query,
                city,
                service,
            } => commands::salons::list(&state, query, city, service).await?,
            SalonsAction::Show { salon_id } => commands::salons::show(&state, &salon_id).await?,
        },
        Commands::Services {
            salon_id,
            category,
            gender,
        } => commands::salons::services(&state, &salon_id, &category, gender).await?,
        Commands::Auth { action } => match action {
            AuthAction::Register {
                name,
                email,
                password,
                accept_terms,
            } => commands::auth::register(&state, name, email, password, accept_terms).await?,
            AuthAction::VerifyOtp { email, otp } => {
                commands::auth::verify_otp(&state, &email, &otp).await?;
            }
            AuthAction::Login { email, password } => {
                commands::auth::login(&state, &email, password).await?;
            }
            AuthAction::Logout => commands::auth::logout(&state)?,
            AuthAction::ForgotPassword { email } => {
                commands::auth::forgot_password(&state, &email).await?;
            }
            AuthAction::VerifyResetOtp { email, otp } => {
                commands::auth::verify_reset_otp(&state, &email, &otp).await?;
            }
            AuthAction::NewPassword { email, password } => {
                commands::auth::new_password(&state, &email, password).await?;
            }
        },
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(&state)?,
            ProfileAction::Update { name, email, phone } => {
                commands::profile::update(&state, name, email, phone)?;
            }
            ProfileAction::Avatar { action } => match action {
                AvatarAction::Upload { path } => commands::profile::upload_avatar(&state, &path).await?,
                AvatarAction::Refresh => commands::profile::refresh_avatar(&state).await?,
                AvatarAction::Remove => commands::profile::remove_avatar(&state)?,
            },
        },
        Commands::Cart { action } => match action {
            CartAction::Show { salon_id, offline } => {
                commands::cart::show(&state, &salon_id, offline).await?;
            }
            CartAction::Add {
                salon_id,
                service_id,
                category,
            } => commands::cart::add(&state, &salon_id, &service_id, category.as_deref()).await?,
            CartAction::Clear { salon_id } => commands::cart::clear(&state, &salon_id).await?,
        },
    }
    Ok(())
}
