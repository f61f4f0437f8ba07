use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;

mod domain;
mod application;
mod infrastructure;
mod extensions;

use application::context::Services;
use application::errors::BotError;
use application::messaging::MessageDispatcher;
use application::services::{ExtensionInstaller, InstallPaths};
use application::widgets::WidgetManager;
use domain::traits::Bot;
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::config::Config;
use infrastructure::extensions::{discover_entries, ExtensionRegistry, GitFetcher, NativeLoader};

#[derive(Parser)]
#[command(name = "rick-bot")]
#[command(about = "A chat bot that installs its own cogs and features", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Write the default config
    InitConfig,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config),
        Commands::Version => {
            println!("rick-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_bot(config_path: &Path) -> Result<(), BotError> {
    let config = Arc::new(Config::load(config_path)?);
    tracing::info!("Starting {}", config.bot.name);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(serve(config))
}

async fn serve(config: Arc<Config>) -> Result<(), BotError> {
    for dir in [
        &config.paths.cogs,
        &config.paths.features,
        &config.paths.helpers,
        &config.paths.configs,
        &config.paths.cache,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }

    let console = config
        .adapters
        .console
        .clone()
        .filter(|c| c.enabled)
        .ok_or_else(|| BotError::Internal("no adapter is enabled".to_string()))?;
    if config.bot.owner.is_none() {
        tracing::warn!("No owner configured, owner-only commands are unavailable");
    }
    let console_user = config.bot.owner.clone().unwrap_or_else(|| "console".to_string());
    let adapter = Arc::new(ConsoleAdapter::new(console_user, console.guild));
    let bot: Arc<dyn Bot> = adapter.clone();

    // Library copies left by a previous run are no longer open.
    let staging = config.paths.cache.join("loaded");
    match tokio::fs::remove_dir_all(&staging).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    // Internal set first, then everything already installed on disk.
    let registry = Arc::new(ExtensionRegistry::new(NativeLoader::new(
        &config.paths.cogs,
        &config.paths.features,
        staging,
    )));
    extensions::register_internal(&registry)?;
    for (kind, raw_name) in discover_entries(&config.paths.cogs, &config.paths.features) {
        if let Err(e) = registry.load(kind, &raw_name) {
            tracing::error!(%raw_name, kind = %kind, "Failed to load extension: {}", e);
        }
    }
    tracing::info!("Loaded {} extension(s)", registry.len());

    let installer = ExtensionInstaller::new(
        InstallPaths::from_config(&config),
        Arc::clone(&registry),
        GitFetcher::with_binary(config.installer.git.clone()),
    )
    .with_cleanup_grace(config.cleanup_grace())
    .with_rollback_on_load_failure(config.installer.rollback_on_load_failure);

    let dispatcher = Arc::new(MessageDispatcher::new(Services {
        bot: Arc::clone(&bot),
        config: Arc::clone(&config),
        registry,
        widgets: Arc::new(WidgetManager::new()),
        installer: Arc::new(installer),
    }));

    bot.start().await?;

    let (tx, mut events) = mpsc::channel(64);
    let reader = {
        let adapter = Arc::clone(&adapter);
        tokio::spawn(async move { adapter.read_events(tx).await })
    };

    tracing::info!("Listening for events (prefix '{}')", config.bot.prefix);
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move { dispatcher.handle_event(event).await });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    reader.abort();
    Ok(())
}

fn init_config(path: &Path) -> Result<(), BotError> {
    if path.exists() {
        return Err(BotError::Internal(format!("{} already exists", path.display())));
    }

    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml)?;
    println!("Wrote default config to {}. Set bot.owner before running.", path.display());
    Ok(())
}
