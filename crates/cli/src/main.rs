mod config_commands;
mod crypto_commands;
mod plugin_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    strongroom_config::StrongroomConfig,
    strongroom_crypto::{CryptoRouter, PluginCatalog},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "strongroom", about = "Strongroom: plugin-routed secret encryption")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and the user config directory).
    #[arg(long, global = true, env = "STRONGROOM_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the configured plugin order and what the catalog provides.
    Plugins {
        #[command(flatten)]
        args: plugin_commands::PluginArgs,
    },
    /// Encrypt input and print the resulting secret as JSON.
    Encrypt {
        #[command(flatten)]
        args: crypto_commands::EncryptArgs,
    },
    /// Decrypt a secret JSON document and write the plaintext to stdout.
    Decrypt {
        #[command(flatten)]
        args: crypto_commands::DecryptArgs,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Initialise tracing. Logs go to stderr so stdout stays clean for command
/// output.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load the config named on the command line, or discover one.
///
/// An explicit path must load; a discovered file falls back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<StrongroomConfig> {
    match path {
        Some(path) => strongroom_config::load_config(path),
        None => Ok(strongroom_config::discover_and_load()),
    }
}

/// Build the router from the configured plugin list.
fn build_router(
    catalog: &PluginCatalog,
    config: &StrongroomConfig,
) -> anyhow::Result<CryptoRouter> {
    let crypto = &config.crypto;
    let router = CryptoRouter::from_catalog(
        catalog,
        &crypto.namespace,
        &crypto.enabled_plugins,
        &crypto.plugin_settings(),
    )?;
    debug!(plugins = ?router.registry().names(), "crypto router ready");
    Ok(router)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "strongroom starting");

    let catalog = PluginCatalog::with_builtin();

    match cli.command {
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_deref(), &catalog)
        },
        Commands::Plugins { args } => {
            let config = load_config(cli.config.as_deref())?;
            plugin_commands::handle_plugins(args, &config, &catalog)
        },
        Commands::Encrypt { args } => {
            let config = load_config(cli.config.as_deref())?;
            let router = build_router(&catalog, &config)?;
            crypto_commands::handle_encrypt(args, &router).await
        },
        Commands::Decrypt { args } => {
            let config = load_config(cli.config.as_deref())?;
            let router = build_router(&catalog, &config)?;
            crypto_commands::handle_decrypt(args, &router).await
        },
    }
}
