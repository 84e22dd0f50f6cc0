//! Configuration for the fear & greed bot

use crate::api::{alternative_me, cnn};
use crate::error::{BotError, Result};
use crate::interface::{ChatId, MessageFormatter};
use crate::scheduler::{CronSchedule, PushJob};
use bot_utils::Env;
use chrono_tz::Tz;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MORNING_SCHEDULE: &str = "0 9 * * *";
pub const DEFAULT_EVENING_SCHEDULE: &str = "0 21 * * *";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Shanghai;
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration for the bot process
#[derive(Clone)]
pub struct BotConfig {
    /// Bot token from BotFather
    pub telegram_token: String,

    /// Recipient of the scheduled pushes
    pub chat_id: ChatId,

    pub morning_schedule: CronSchedule,
    pub evening_schedule: CronSchedule,

    /// Zone the schedules and displayed timestamps are interpreted in
    pub timezone: Tz,

    pub stock_api_url: String,
    pub crypto_api_url: String,

    /// `limit` sent to Alternative.me
    pub crypto_history_limit: u32,

    /// Timeout for each index request
    pub request_timeout: Duration,

    pub user_agent: String,

    /// Server-side wait of a `getUpdates` long poll
    pub poll_timeout: Duration,

    pub telegram_api_base: String,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("morning_schedule", &self.morning_schedule.expression())
            .field("evening_schedule", &self.evening_schedule.expression())
            .field("timezone", &self.timezone)
            .field("stock_api_url", &self.stock_api_url)
            .field("crypto_api_url", &self.crypto_api_url)
            .field("crypto_history_limit", &self.crypto_history_limit)
            .field("request_timeout", &self.request_timeout)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl BotConfig {
    /// Create a new configuration builder
    pub fn builder() -> BotConfigBuilder {
        BotConfigBuilder::default()
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&Env::process())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(env: &Env<F>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder()
            .telegram_token(env.required("TELEGRAM_BOT_TOKEN")?)
            .chat_id(
                env.parsed::<ChatId>("TELEGRAM_CHAT_ID")?
                    .ok_or_else(|| BotError::Config("TELEGRAM_CHAT_ID not set".to_string()))?,
            );

        if let Some(schedule) = env.optional("PUSH_SCHEDULE_MORNING") {
            builder = builder.morning_schedule(schedule);
        }
        if let Some(schedule) = env.optional("PUSH_SCHEDULE_EVENING") {
            builder = builder.evening_schedule(schedule);
        }
        if let Some(timezone) = env.optional("TIMEZONE") {
            builder = builder.timezone(timezone);
        }
        if let Some(url) = env.optional("STOCK_FEAR_GREED_API") {
            builder = builder.stock_api_url(url);
        }
        if let Some(url) = env.optional("CRYPTO_FEAR_GREED_API") {
            builder = builder.crypto_api_url(url);
        }
        if let Some(limit) = env.parsed::<u32>("CRYPTO_HISTORY_LIMIT")? {
            builder = builder.crypto_history_limit(limit);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.telegram_token.trim().is_empty() {
            return Err(BotError::Config("telegram token must not be empty".to_string()));
        }

        if self.crypto_history_limit == 0 {
            return Err(BotError::Config(
                "crypto_history_limit must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(BotError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The two daily push jobs
    pub fn push_jobs(&self) -> Vec<PushJob> {
        vec![
            PushJob::new("morning", "早间", self.morning_schedule.clone()),
            PushJob::new("evening", "晚间", self.evening_schedule.clone()),
        ]
    }

    /// Formatter for the configured timezone and push times
    pub fn formatter(&self) -> MessageFormatter {
        MessageFormatter::new(self.timezone)
            .with_push_times(self.push_jobs().iter().map(PushJob::push_time).collect())
    }
}

/// Builder for BotConfig
#[derive(Debug, Default)]
pub struct BotConfigBuilder {
    telegram_token: Option<String>,
    chat_id: Option<ChatId>,
    morning_schedule: Option<String>,
    evening_schedule: Option<String>,
    timezone: Option<String>,
    stock_api_url: Option<String>,
    crypto_api_url: Option<String>,
    crypto_history_limit: Option<u32>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
    poll_timeout: Option<Duration>,
    telegram_api_base: Option<String>,
}

impl BotConfigBuilder {
    pub fn telegram_token(mut self, token: impl Into<String>) -> Self {
        self.telegram_token = Some(token.into());
        self
    }

    pub fn chat_id(mut self, chat_id: ChatId) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    /// Cron expression of the morning push
    pub fn morning_schedule(mut self, expression: impl Into<String>) -> Self {
        self.morning_schedule = Some(expression.into());
        self
    }

    /// Cron expression of the evening push
    pub fn evening_schedule(mut self, expression: impl Into<String>) -> Self {
        self.evening_schedule = Some(expression.into());
        self
    }

    /// IANA timezone name, e.g. `Asia/Shanghai`
    pub fn timezone(mut self, name: impl Into<String>) -> Self {
        self.timezone = Some(name.into());
        self
    }

    pub fn stock_api_url(mut self, url: impl Into<String>) -> Self {
        self.stock_api_url = Some(url.into());
        self
    }

    pub fn crypto_api_url(mut self, url: impl Into<String>) -> Self {
        self.crypto_api_url = Some(url.into());
        self
    }

    pub fn crypto_history_limit(mut self, limit: u32) -> Self {
        self.crypto_history_limit = Some(limit);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    /// Base URL of the Bot API, without trailing slash
    pub fn telegram_api_base(mut self, base: impl Into<String>) -> Self {
        self.telegram_api_base = Some(base.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<BotConfig> {
        let telegram_token = self
            .telegram_token
            .ok_or_else(|| BotError::Config("telegram token is required".to_string()))?;
        let chat_id = self
            .chat_id
            .ok_or_else(|| BotError::Config("chat id is required".to_string()))?;

        let schedule = |expression: Option<String>, default: &str| {
            expression
                .as_deref()
                .unwrap_or(default)
                .parse::<CronSchedule>()
                .map_err(|e| BotError::Config(e.to_string()))
        };

        let timezone = match self.timezone {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| BotError::Config(format!("unknown timezone {name:?}: {e}")))?,
            None => DEFAULT_TIMEZONE,
        };

        let config = BotConfig {
            telegram_token,
            chat_id,
            morning_schedule: schedule(self.morning_schedule, DEFAULT_MORNING_SCHEDULE)?,
            evening_schedule: schedule(self.evening_schedule, DEFAULT_EVENING_SCHEDULE)?,
            timezone,
            stock_api_url: self.stock_api_url.unwrap_or_else(|| cnn::DEFAULT_URL.to_string()),
            crypto_api_url: self
                .crypto_api_url
                .unwrap_or_else(|| alternative_me::DEFAULT_URL.to_string()),
            crypto_history_limit: self
                .crypto_history_limit
                .unwrap_or(alternative_me::DEFAULT_LIMIT),
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(10)),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            poll_timeout: self.poll_timeout.unwrap_or(Duration::from_secs(30)),
            telegram_api_base: self
                .telegram_api_base
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> Env<impl Fn(&str) -> Option<String>> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Env::with_lookup(move |name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::builder()
            .telegram_token("123:abc")
            .chat_id(ChatId(42))
            .build()
            .unwrap();

        assert_eq!(config.morning_schedule.expression(), "0 9 * * *");
        assert_eq!(config.evening_schedule.expression(), "0 21 * * *");
        assert_eq!(config.timezone, chrono_tz::Asia::Shanghai);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.crypto_history_limit, 30);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.telegram_api_base, "https://api.telegram.org");
    }

    #[test]
    fn test_from_lookup() {
        let env = env_of(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "987654321"),
            ("PUSH_SCHEDULE_MORNING", "30 8 * * *"),
            ("TIMEZONE", "America/New_York"),
            ("CRYPTO_HISTORY_LIMIT", "60"),
        ]);
        let config = BotConfig::from_lookup(&env).unwrap();

        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.chat_id, ChatId(987_654_321));
        assert_eq!(config.morning_schedule.expression(), "30 8 * * *");
        assert_eq!(config.evening_schedule.expression(), DEFAULT_EVENING_SCHEDULE);
        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.crypto_history_limit, 60);
    }

    #[test]
    fn test_missing_required_variables() {
        let err = BotConfig::from_lookup(&env_of(&[])).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: TELEGRAM_BOT_TOKEN not set");

        let err = BotConfig::from_lookup(&env_of(&[("TELEGRAM_BOT_TOKEN", "t")])).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: TELEGRAM_CHAT_ID not set");

        let err = BotConfig::from_lookup(&env_of(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "@me"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_CHAT_ID is invalid"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = || BotConfig::builder().telegram_token("t").chat_id(ChatId(1));

        assert!(base().morning_schedule("0 25 * * *").build().is_err());
        assert!(base().timezone("Mars/Olympus_Mons").build().is_err());
        assert!(base().crypto_history_limit(0).build().is_err());
        assert!(base().request_timeout(Duration::ZERO).build().is_err());
        assert!(BotConfig::builder().telegram_token(" ").chat_id(ChatId(1)).build().is_err());
    }

    #[test]
    fn test_push_jobs() {
        let config = BotConfig::builder()
            .telegram_token("t")
            .chat_id(ChatId(1))
            .evening_schedule("15 22 * * *")
            .build()
            .unwrap();
        let jobs = config.push_jobs();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "morning");
        assert_eq!(jobs[1].push_time().time, "22:15");

        let help = config.formatter().help_text();
        assert!(help.contains("09:00"));
        assert!(help.contains("22:15"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = BotConfig::builder()
            .telegram_token("123:super-secret")
            .chat_id(ChatId(1))
            .build()
            .unwrap();
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
