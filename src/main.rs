//! Binary entrypoint for the mmoengine CLI.
//!
//! Commands:
//! - `start` - run every configured character until Ctrl-C
//! - `init` - write a starter `config.toml`
//! - `status` - print characters, cooldowns and a bank summary
//! - `state`, `move`, `gather`, `fight`, `craft`, `bank` - single actions for
//!   one character
//!
//! See the library crate docs for module-level details: `mmoengine::`.
use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::sync::Arc;

use mmoengine::api::{HttpWorldApi, WorldApi};
use mmoengine::config::Config;
use mmoengine::engine::{actions, bank, shutdown_channel, CharacterContext, Engine, SharedState};
use mmoengine::models::{Coords, Order};

#[derive(Parser)]
#[command(name = "mmoengine")]
#[command(about = "Character automation for a turn-paced MMO API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// API token; overrides the config file and MMO_TOKEN
    #[arg(long, global = true)]
    token: Option<String>,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all configured characters until interrupted
    Start,
    /// Initialize a new configuration file
    Init,
    /// Show characters, cooldowns and bank summary
    Status,
    /// Print a character's full state as JSON
    State {
        #[arg(long)]
        character: String,
    },
    /// Move a character to a tile
    Move {
        #[arg(long)]
        character: String,
        #[arg(long, allow_hyphen_values = true)]
        x: i32,
        #[arg(long, allow_hyphen_values = true)]
        y: i32,
    },
    /// Gather once at the character's current tile
    Gather {
        #[arg(long)]
        character: String,
    },
    /// Fight once at the character's current tile
    Fight {
        #[arg(long)]
        character: String,
    },
    /// Craft an item at the character's current workshop
    Craft {
        #[arg(long)]
        character: String,
        #[arg(long)]
        code: String,
        #[arg(long, default_value_t = 1)]
        qty: u32,
    },
    /// Travel to the nearest bank and deposit everything
    Bank {
        #[arg(long)]
        character: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        info!("Initializing new configuration");
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let mut config = Config::load(&cli.config).await?;
    if let Some(token) = cli.token.clone() {
        config.api.token = token;
    }
    init_logging(&Some(config.clone()), cli.verbose);
    let api: Arc<dyn WorldApi> = Arc::new(HttpWorldApi::new(config.api.clone())?);

    match cli.command {
        // written before the config was loaded
        Commands::Init => {}
        Commands::Start => {
            info!("Starting mmoengine v{}", env!("CARGO_PKG_VERSION"));
            let (trigger, shutdown) = shutdown_channel();
            let orders: Vec<Order> = config.orders.iter().cloned().map(Order::from).collect();
            let engine = Engine::new(
                api,
                config.engine.clone(),
                config.characters.clone(),
                orders,
                shutdown,
            );

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-C received, stopping after current actions");
                    trigger.trigger();
                }
            });

            let reports = engine.run().await;
            let failed = reports.iter().filter(|r| r.result.is_err()).count();
            info!(
                "all characters stopped ({} ok, {} failed)",
                reports.len() - failed,
                failed
            );
        }
        Commands::Status => {
            let now = Utc::now();
            for character in &config.characters {
                match api.get_character(&character.name).await {
                    Ok(c) => println!(
                        "{:<16} lvl {:>3} at {:<10} inventory {}/{} cooldown {:.0}s",
                        c.name,
                        c.level,
                        c.position().to_string(),
                        c.count_inventory(),
                        c.inventory_max_items,
                        c.cooldown_remaining(now).as_secs_f64()
                    ),
                    Err(e) => error!("{}: {}", character.name, e),
                }
            }
            let holdings = api.get_bank_items().await?;
            println!(
                "bank: {} item types, {} units",
                holdings.len(),
                holdings.total_items()
            );
        }
        Commands::State { character } => {
            let c = api.get_character(&character).await?;
            println!("{}", serde_json::to_string_pretty(&c)?);
        }
        Commands::Move { character, x, y } => {
            let (ctx, mut c) = single_action_context(api, &config, &character).await?;
            actions::move_to(&ctx, &mut c, Coords::new(x, y)).await?;
            println!("{} is at {}", c.name, c.position());
        }
        Commands::Gather { character } => {
            let (ctx, mut c) = single_action_context(api, &config, &character).await?;
            let details = actions::gather(&ctx, &mut c).await?;
            println!("{}", serde_json::to_string_pretty(&details.items)?);
        }
        Commands::Fight { character } => {
            let (ctx, mut c) = single_action_context(api, &config, &character).await?;
            let fight = actions::fight(&ctx, &mut c).await?;
            println!(
                "{} in {} turns, +{} xp, +{} gold",
                fight.result, fight.turns, fight.xp, fight.gold
            );
        }
        Commands::Craft {
            character,
            code,
            qty,
        } => {
            let (ctx, mut c) = single_action_context(api, &config, &character).await?;
            let details = actions::craft(&ctx, &mut c, &code, qty).await?;
            println!("{}", serde_json::to_string_pretty(&details.items)?);
        }
        Commands::Bank { character } => {
            let (ctx, mut c) = single_action_context(api, &config, &character).await?;
            let deposited = bank::deposit_all(&ctx, &mut c).await?;
            println!("deposited {} items", deposited);
        }
    }

    Ok(())
}

/// Context for a one-off command, with the character's current cooldown
/// already known so the action waits it out instead of being rejected.
async fn single_action_context(
    api: Arc<dyn WorldApi>,
    config: &Config,
    name: &str,
) -> Result<(CharacterContext, mmoengine::models::Character)> {
    let (_trigger, shutdown) = shutdown_channel();
    let shared = SharedState::new(api, config.engine.clone(), shutdown);
    let ctx = CharacterContext::new(name, shared);
    let character = ctx
        .refresh_character()
        .await
        .map_err(|e| anyhow!("cannot load character {}: {}", name, e))?;
    Ok((ctx, character))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    match log_file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    }) {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
