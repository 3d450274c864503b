use chrono::{DateTime, TimeZone, Utc};
use config::{Case, Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Social-graph API connection
    pub social: SocialConfig,

    /// Marker counting and allowance settings
    #[serde(default)]
    pub stats: StatsConfig,

    /// Background polling of tracked users
    #[serde(default)]
    pub poller: PollerConfig,

    /// How long resolved user profiles stay cached
    #[serde(default = "default_profile_cache_ttl_secs")]
    pub profile_cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SocialConfig {
    /// Base URL of the social-graph API (no trailing slash)
    #[serde(default = "default_social_base_url")]
    pub base_url: String,

    /// API key sent as `x-api-key`
    pub api_key: String,

    /// Per-request timeout
    #[serde(default = "default_social_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    /// Symbol counted as a send (in own posts) or a receive (in replies)
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Sends available per reset period
    #[serde(default = "default_daily_allowance")]
    pub daily_allowance: u64,

    /// Oldest post creation time included in the scan
    #[serde(default = "default_epoch_start")]
    pub epoch_start: DateTime<Utc>,

    /// Hour of day (UTC) at which the allowance resets
    #[serde(default = "default_reset_hour_utc")]
    pub reset_hour_utc: u32,

    /// Maximum number of posts fetched per computation
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            daily_allowance: default_daily_allowance(),
            epoch_start: default_epoch_start(),
            reset_hour_utc: default_reset_hour_utc(),
            max_posts: default_max_posts(),
        }
    }
}

impl StatsConfig {
    /// Reject settings the aggregator cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() {
            return Err(ConfigError::Message("stats.marker must not be empty".to_string()));
        }
        if self.daily_allowance == 0 {
            return Err(ConfigError::Message(
                "stats.daily_allowance must be positive".to_string(),
            ));
        }
        if self.reset_hour_utc > 23 {
            return Err(ConfigError::Message(format!(
                "stats.reset_hour_utc must be in 0..=23, got {}",
                self.reset_hour_utc
            )));
        }
        if self.max_posts == 0 {
            return Err(ConfigError::Message(
                "stats.max_posts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    /// Whether tracked users are refreshed in the background
    #[serde(default)]
    pub enabled: bool,

    /// Cron expression with seconds field (e.g., "*/30 * * * * *")
    #[serde(default = "default_poll_cron")]
    pub cron: String,

    /// User ids refreshed on every tick
    #[serde(default)]
    pub users: Vec<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: default_poll_cron(),
            users: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_profile_cache_ttl_secs() -> u64 {
    60 * 60
}

fn default_social_base_url() -> String {
    "https://api.neynar.com/v2/farcaster".to_string()
}

fn default_social_timeout_secs() -> u64 {
    30
}

fn default_marker() -> String {
    "🎩".to_string()
}

fn default_daily_allowance() -> u64 {
    10
}

fn default_epoch_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn default_reset_hour_utc() -> u32 {
    11
}

fn default_max_posts() -> usize {
    1000
}

fn default_poll_cron() -> String {
    "*/30 * * * * *".to_string()
}

impl AppConfig {
    /// Defaults, then `config` / `config.local` files, then `MARKSTATS_*` env vars.
    /// The merged result is validated before it is returned.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port())?
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config.local").required(false))
            // MARKSTATS_SOCIAL__API_KEY -> social.api_key
            .add_source(
                Environment::with_prefix("MARKSTATS")
                    .prefix_separator("_")
                    .separator("__")
                    .convert_case(Case::Snake)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("poller.users"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.stats.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_stats_defaults() {
        let stats = StatsConfig::default();
        assert_eq!(stats.marker, "🎩");
        assert_eq!(stats.daily_allowance, 10);
        assert_eq!(stats.reset_hour_utc, 11);
        assert_eq!(stats.max_posts, 1000);
        assert_eq!(stats.epoch_start.to_rfc3339(), "2025-02-01T00:00:00+00:00");
        assert!(stats.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_cap = StatsConfig {
            daily_allowance: 0,
            ..StatsConfig::default()
        };
        assert!(zero_cap.validate().is_err());

        let bad_hour = StatsConfig {
            reset_hour_utc: 24,
            ..StatsConfig::default()
        };
        assert!(bad_hour.validate().is_err());

        let no_marker = StatsConfig {
            marker: String::new(),
            ..StatsConfig::default()
        };
        assert!(no_marker.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let raw = r#"
            port = 8080

            [social]
            api_key = "secret"

            [stats]
            marker = "🍖"
            daily_allowance = 25
            epoch_start = "2025-03-01T00:00:00Z"

            [poller]
            enabled = true
            users = ["3", "5650"]
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.social.api_key, "secret");
        assert_eq!(config.social.timeout_secs, 30);
        assert_eq!(config.stats.marker, "🍖");
        assert_eq!(config.stats.daily_allowance, 25);
        assert_eq!(config.stats.reset_hour_utc, 11);
        assert_eq!(
            config.stats.epoch_start,
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(config.poller.enabled);
        assert_eq!(config.poller.users, vec!["3", "5650"]);
        assert_eq!(config.poller.cron, "*/30 * * * * *");
    }
}
