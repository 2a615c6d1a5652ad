use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

pub const DEFAULT_MENTION_BATCH_SIZE: usize = 45;
pub const MAX_MENTION_BATCH_SIZE: usize = 100;
pub const DEFAULT_LIVENESS_PORT: u16 = 10_000;
pub const DEFAULT_NO_MEMBERS_MESSAGE: &str = "No members are tracked in this chat yet.";

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    /// Handle used for the mention trigger. `None` means "ask Telegram via getMe".
    pub bot_username: Option<String>,

    // Roster
    pub roster_file: PathBuf,

    // Behavior
    pub mention_batch_size: usize,
    pub delete_leave_messages: bool,
    pub no_members_message: String,

    // Liveness endpoint (0 = disabled)
    pub liveness_port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("TELEGRAM_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let bot_username = lookup("BOT_USERNAME")
            .map(|s| s.trim().trim_start_matches('@').to_string())
            .and_then(non_empty);

        let roster_file = lookup("ROSTER_FILE")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("roster.json"));

        let mention_batch_size = lookup("MENTION_BATCH_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_MENTION_BATCH_SIZE)
            .clamp(1, MAX_MENTION_BATCH_SIZE);

        let delete_leave_messages = lookup("DELETE_LEAVE_MESSAGES")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        let no_members_message = lookup("NO_MEMBERS_MESSAGE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_NO_MEMBERS_MESSAGE.to_string());

        let liveness_port = match lookup("LIVENESS_PORT") {
            None => DEFAULT_LIVENESS_PORT,
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                Error::Config(format!("LIVENESS_PORT is not a valid port: {raw}"))
            })?,
        };

        Ok(Self {
            telegram_bot_token,
            bot_username,
            roster_file,
            mention_batch_size,
            delete_leave_messages,
            no_members_message,
            liveness_port,
        })
    }

    /// The subset of the config the event handlers need.
    ///
    /// `username` is the resolved bot handle (from config or `getMe`).
    pub fn settings(&self, username: impl Into<String>) -> Settings {
        Settings {
            bot_username: username.into(),
            mention_batch_size: self.mention_batch_size,
            delete_leave_messages: self.delete_leave_messages,
            no_members_message: self.no_members_message.clone(),
        }
    }
}

/// Handler-facing settings; free of environment access so tests can build them directly.
#[derive(Clone, Debug)]
pub struct Settings {
    pub bot_username: String,
    pub mention_batch_size: usize,
    pub delete_leave_messages: bool,
    pub no_members_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_username: String::new(),
            mention_batch_size: DEFAULT_MENTION_BATCH_SIZE,
            delete_leave_messages: false,
            no_members_message: DEFAULT_NO_MEMBERS_MESSAGE.to_string(),
        }
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
