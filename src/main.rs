use std::sync::Arc;

use teloxide::dispatching::HandlerExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use remindbot::bot::{handle_command, handle_text, BotState, Command};
use remindbot::config::Config;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "remindbot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("remindbot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting remindbot...");
    info!("Loaded config from {}", config.config_path.display());
    info!("Timezone: {}", config.timezone);
    if !config.allowed_users.is_empty() {
        info!("Allowed users: {:?}", config.allowed_users);
    }

    let bot = Bot::new(&config.telegram_bot_token);

    let state = match BotState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    info!("Sink: {}", state.sink_name());
    match state.model_name() {
        Some(model) => info!("Analyzer: rules + {model}"),
        None => info!("Analyzer: rules only"),
    }

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        error!("Failed to register commands: {e}");
    }

    let handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
        .branch(dptree::endpoint(handle_text));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
