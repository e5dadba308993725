//! memchat: interactive chat console with side-channel memory extraction.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI args
//!   3. Load config
//!   4. Init logger once (CLI `-v` flags > env > config)
//!   5. Build generation engine and memory store
//!   6. Pick run mode (terminal stdin or `-i`)
//!   7. Spawn Ctrl-C → shutdown watcher
//!   8. Run the chat loop until EOF or shutdown

use tokio_util::sync::CancellationToken;
use tracing::info;

use memchat::chat::{self, ChatLoop, RunMode};
use memchat::{config, error, llm, logger, memory};

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    // Exit explicitly: a pending blocking stdin read would otherwise hold
    // runtime shutdown until the next newline.
    std::process::exit(code);
}

async fn run() -> Result<(), error::AppError> {
    // Load .env if present, ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some(), config.log_file.as_deref())?;

    info!(
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        provider = %config.llm.provider,
        model = %config.llm.active_model(),
        "config loaded"
    );

    let engine = llm::providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| error::AppError::Config(e.to_string()))?;
    let store = memory::build(&config.memory).map_err(|e| error::AppError::Config(e.to_string()))?;

    let mode = RunMode::detect(args.interactive);

    // Shared shutdown token. Ctrl-C cancels it, the loop watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received: initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    if mode == RunMode::Interactive {
        print_startup_summary(&config);
    }

    let chat_loop = ChatLoop::new(config.chat.clone(), config.memory.clone(), engine, store);
    let mut console = chat::console::stdio();
    let turns = chat_loop.run(mode, &mut console, &shutdown).await?;

    info!(turns, "chat loop finished");
    if mode == RunMode::Interactive {
        println!("\nBye :) ...");
    }

    Ok(())
}

fn print_startup_summary(config: &config::Config) {
    let store_line = if config.memory.enabled {
        config.memory.endpoint.clone()
    } else {
        "disabled (local only)".to_string()
    };
    println!("─────────────────────────────────────────────");
    println!(" memchat  (Ctrl-C to quit)");
    println!("   model : {} via {}", config.llm.active_model(), config.llm.provider);
    println!("   memory: {store_line}");
    println!("─────────────────────────────────────────────");
}

// Plain argument parsing over `std::env::args`.
struct CliArgs {
    log_level: Option<&'static str>,
    interactive: bool,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut interactive = false;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: memchat [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -i, --interactive          Run the chat loop even when stdin is not a terminal");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-i" | "--interactive" => interactive = true,
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    CliArgs {
        log_level: logger::level_for_verbosity(verbosity),
        interactive,
        config_path,
    }
}
