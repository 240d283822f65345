//! Icarus CLI
//!
//! Manage integration credentials and preferences, and watch live activity.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use icarus::credentials::{validate_url, CredentialStore};
use icarus::integration::Integration;
use icarus::io::ReqwestHttpClient;
use icarus::settings::{
    AppearanceMode, JsonFileSettings, Preferences, RefreshInterval, SettingsRepository,
};
use icarus::{load_config, Config, DashboardBuilder, IcarusError};
use tokio_util::sync::CancellationToken;
use tracing::Level;

#[derive(Parser)]
#[command(name = "icarus")]
#[command(about = "Media-server status poller")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings file (overrides config file)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store the endpoint URL and API key for an integration
    Configure {
        integration: Integration,
        #[arg(long)]
        url: String,
        #[arg(long)]
        api_key: String,
    },
    /// Print stored credentials and preferences
    Show,
    /// Set the refresh interval in seconds (10, 30, 60 or 120)
    SetInterval { seconds: u64 },
    /// Set the appearance mode (system, light or dark)
    SetAppearance { mode: AppearanceMode },
    /// Check that an integration's API is reachable
    TestConnection { integration: Integration },
    /// Poll every configured integration until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, settings={:?}, log_level={:?}, command={:?}",
        args.config,
        args.settings,
        args.log_level,
        args.command
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(settings) = args.settings {
        config.settings_path = settings;
    }

    match args.command {
        Command::Configure {
            integration,
            url,
            api_key,
        } => {
            if !validate_url(&url) {
                return Err(IcarusError::InvalidValue(format!(
                    "invalid URL '{}', expected e.g. http://192.168.1.10:8181",
                    url
                ))
                .into());
            }
            let settings = open_settings(&config)?;
            CredentialStore::new(settings).save(integration, &url, &api_key)?;
            println!("{} API settings saved", integration);
        }
        Command::Show => {
            let settings = open_settings(&config)?;
            let preferences = Preferences::load(settings.as_ref());
            let credentials = CredentialStore::new(settings);
            for integration in Integration::ALL {
                let credential = credentials.load(integration);
                if credential.is_configured() {
                    println!("{}: {}", integration, credential.endpoint_url);
                } else {
                    println!("{}: not configured", integration);
                }
            }
            println!("Refresh interval: {}", preferences.refresh_interval);
            println!("Appearance: {}", preferences.appearance_mode);
        }
        Command::SetInterval { seconds } => {
            let interval = RefreshInterval::try_from(seconds)?;
            let settings = open_settings(&config)?;
            let preferences = Preferences {
                refresh_interval: interval,
                ..Preferences::load(settings.as_ref())
            };
            preferences.save(settings.as_ref())?;
            println!("Refresh interval set to {}", interval);
        }
        Command::SetAppearance { mode } => {
            let settings = open_settings(&config)?;
            let preferences = Preferences {
                appearance_mode: mode,
                ..Preferences::load(settings.as_ref())
            };
            preferences.save(settings.as_ref())?;
            println!("Appearance set to {}", mode);
        }
        Command::TestConnection { integration } => {
            let credentials = CredentialStore::new(open_settings(&config)?);
            let http = ReqwestHttpClient::new(&config.http)?;
            if icarus::test_connection(integration, &credentials, &http).await {
                println!("✅ Success: API is reachable");
            } else {
                println!("❌ Failed: API is unreachable");
            }
        }
        Command::Watch => {
            tracing::info!("Starting icarus");
            let dashboard = Arc::new(DashboardBuilder::new(config).build()?);

            let cancel = CancellationToken::new();
            let cancel_for_signal = cancel.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => tracing::info!("Shutdown signal received"),
                    Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
                }
                cancel_for_signal.cancel();
            });

            icarus::run(dashboard, cancel).await?;
        }
    }

    Ok(())
}

fn open_settings(config: &Config) -> icarus::Result<Arc<dyn SettingsRepository>> {
    tracing::debug!("Opening settings file {:?}", config.settings_path);
    Ok(Arc::new(JsonFileSettings::open(&config.settings_path)?))
}
