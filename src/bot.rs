//! Telegram handlers: slash commands and free-text messages.

use std::collections::HashSet;
use std::sync::Arc;

use chrono_tz::Tz;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::analyzer::Analyzer;
use crate::config::Config;
use crate::extractor::Extraction;
use crate::llm::{self, LanguageModel};
use crate::message::CandidateMessage;
use crate::reply;
use crate::sink::{self, Sink};

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Команды:")]
pub enum Command {
    #[command(description = "приветствие")]
    Start,
    #[command(description = "как пользоваться ботом")]
    Help,
    #[command(description = "сохраненные напоминания")]
    List,
    #[command(description = "удалить сохраненные напоминания")]
    Clear,
}

/// Errors while assembling the bot from its config.
#[derive(Debug)]
pub enum StartupError {
    Model(llm::Error),
    Sink(sink::SinkError),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Model(e) => write!(f, "failed to set up language model: {e}"),
            StartupError::Sink(e) => write!(f, "failed to set up sink: {e}"),
        }
    }
}

impl std::error::Error for StartupError {}

pub struct BotState {
    allowed_users: HashSet<UserId>,
    timezone: Tz,
    analyzer: Analyzer,
    sink: Sink,
    /// Users already told they are not allowed.
    denied: Mutex<HashSet<UserId>>,
}

impl BotState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let model = LanguageModel::from_settings(&config.analyzer, config.request_timeout)
            .map_err(StartupError::Model)?;
        let sink = Sink::from_settings(&config.sink, config.timezone, config.request_timeout)
            .map_err(StartupError::Sink)?;

        Ok(Self {
            allowed_users: config.allowed_users,
            timezone: config.timezone,
            analyzer: Analyzer::new(config.extractor, model),
            sink,
            denied: Mutex::new(HashSet::new()),
        })
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn model_name(&self) -> Option<&'static str> {
        self.analyzer.model_name()
    }

    fn is_allowed(&self, user_id: UserId) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }

    /// True the first time a user is turned away.
    async fn first_denial(&self, user_id: UserId) -> bool {
        self.denied.lock().await.insert(user_id)
    }
}

async fn send_html(bot: &Bot, chat_id: ChatId, text: String) -> ResponseResult<Message> {
    bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await
}

/// Returns false (after telling the user once) when the sender is not allowed.
async fn check_access(bot: &Bot, msg: &Message, state: &BotState) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    if state.is_allowed(user.id) {
        return true;
    }
    if state.first_denial(user.id).await {
        info!("Message from non-allowed user {} - denial", user.id);
        bot.send_message(msg.chat.id, reply::ACCESS_DENIED).await.ok();
    }
    false
}

pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, state: Arc<BotState>) -> ResponseResult<()> {
    if !check_access(&bot, &msg, &state).await {
        return Ok(());
    }
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);
    info!("Command {:?} from {}", cmd, user_id);

    let text = match cmd {
        Command::Start => reply::welcome(state.sink_name()),
        Command::Help => reply::help(),
        Command::List => match state.sink.memory() {
            Some(memory) => reply::reminder_list(&memory.list(user_id).await),
            None => reply::LIST_UNAVAILABLE.to_string(),
        },
        Command::Clear => match state.sink.memory() {
            Some(memory) => reply::cleared(memory.clear(user_id).await),
            None => reply::LIST_UNAVAILABLE.to_string(),
        },
    };

    if let Err(e) = send_html(&bot, msg.chat.id, text).await {
        warn!("Failed to answer command: {e}");
    }
    Ok(())
}

pub async fn handle_text(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !check_access(&bot, &msg, &state).await {
        return Ok(());
    }
    if text.starts_with('/') {
        bot.send_message(msg.chat.id, reply::UNKNOWN_COMMAND).await.ok();
        return Ok(());
    }

    let candidate = CandidateMessage {
        text: text.to_string(),
        user_id: msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0),
        received_at: msg.date,
    };
    info!("📨 Message from {}: \"{}\"", candidate.user_id, candidate.preview());

    // Nothing that goes wrong here may take the dispatcher down.
    if let Err(e) = process(&bot, msg.chat.id, &state, &candidate).await {
        error!("Failed to handle message from {}: {e}", candidate.user_id);
        bot.send_message(msg.chat.id, reply::GENERIC_ERROR).await.ok();
    }
    Ok(())
}

async fn process(bot: &Bot, chat_id: ChatId, state: &BotState, candidate: &CandidateMessage) -> ResponseResult<()> {
    bot.send_message(chat_id, reply::ANALYZING).await?;

    let now = candidate.local_time(state.timezone);
    let analysis = state.analyzer.analyze(&candidate.text, now).await;

    let reminder = match analysis.extraction {
        Extraction::Task(reminder) => reminder,
        Extraction::Rejected { reason } => {
            info!("Not a task ({}): \"{}\"", reason, candidate.preview());
            send_html(bot, chat_id, reply::not_recognized(&reason)).await?;
            return Ok(());
        }
    };
    info!(
        "Task: category={} priority={} date={:?} time={:?} keywords={:?}",
        reminder.category,
        reminder.priority,
        reminder.date_string(),
        reminder.time_string(),
        reminder.keywords_found
    );

    let text = match state.sink.deliver(&reminder, candidate).await {
        Ok(receipt) => reply::confirmation(&reminder, &receipt, analysis.assisted_by),
        Err(e) => {
            warn!("Delivery to {} failed: {e}", state.sink_name());
            reply::delivery_failed(&reminder, &e)
        }
    };
    send_html(bot, chat_id, text).await?;
    Ok(())
}
