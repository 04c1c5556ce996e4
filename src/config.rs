use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{Role, Rubric, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Redis L2 cache; the in-process L1 cache is used alone when unset
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_mentor_survey_id")]
    pub mentor_survey_id: i64,
    #[serde(default = "default_mentee_survey_id")]
    pub mentee_survey_id: i64,
    #[serde(default = "default_suitor_limit")]
    pub suitor_limit: usize,
    #[serde(default = "default_max_suitor_limit")]
    pub max_suitor_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            mentor_survey_id: default_mentor_survey_id(),
            mentee_survey_id: default_mentee_survey_id(),
            suitor_limit: default_suitor_limit(),
            max_suitor_limit: default_max_suitor_limit(),
        }
    }
}

impl MatchingSettings {
    /// Role a submission to `survey_id` registers the respondent in
    pub fn role_for_survey(&self, survey_id: i64) -> Option<Role> {
        if survey_id == self.mentor_survey_id {
            Some(Role::Mentor)
        } else if survey_id == self.mentee_survey_id {
            Some(Role::Mentee)
        } else {
            None
        }
    }

    /// Suitor count for a request: the configured default when none is
    /// asked for, never more than `max_suitor_limit`
    pub fn effective_suitor_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.suitor_limit)
            .min(self.max_suitor_limit)
    }
}

fn default_mentor_survey_id() -> i64 { 1 }
fn default_mentee_survey_id() -> i64 { 2 }
fn default_suitor_limit() -> usize { 3 }
fn default_max_suitor_limit() -> usize { 50 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub rubric: Rubric,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationSettings {
    /// Participants get e-mailed when a pair is finalized
    #[serde(default)]
    pub send_email: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MENTORING__)
    /// 5. DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MENTORING__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MENTORING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MENTORING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_database_url(settings)?.try_deserialize()
    }
}

/// The conventional DATABASE_URL wins over any configured database.url
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let scoring = ScoringSettings::default();
        assert_eq!(scoring.weights.field_of_study_mutual, 2.0);
        assert_eq!(scoring.weights.gender_partial, 1.0);
        assert_eq!(scoring.rubric.mentee_skill_requests, 55);
        assert_eq!(scoring.rubric.skill_threshold, 3);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_role_for_survey() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.role_for_survey(1), Some(Role::Mentor));
        assert_eq!(matching.role_for_survey(2), Some(Role::Mentee));
        assert_eq!(matching.role_for_survey(7), None);
        assert_eq!(matching.suitor_limit, 3);
    }

    #[test]
    fn test_effective_suitor_limit() {
        let matching = MatchingSettings {
            max_suitor_limit: 20,
            ..MatchingSettings::default()
        };

        assert_eq!(matching.effective_suitor_limit(None), 3);
        assert_eq!(matching.effective_suitor_limit(Some(7)), 7);
        assert_eq!(matching.effective_suitor_limit(Some(20)), 20);
        assert_eq!(matching.effective_suitor_limit(Some(500)), 20);
        assert_eq!(matching.effective_suitor_limit(Some(0)), 0);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [database]
            url = "postgres://localhost/mentoring"

            [scoring.weights]
            skill = 0.5

            [scoring.rubric]
            mentor_interests = 31
            "#,
        )
        .unwrap();

        assert_eq!(settings.scoring.weights.skill, 0.5);
        assert_eq!(settings.scoring.weights.availability, 1.0);
        assert_eq!(settings.scoring.rubric.mentor_interests, 31);
        assert_eq!(settings.scoring.rubric.mentee_interests, 57);
        assert!(settings.cache.redis_url.is_none());
        assert!(!settings.notifications.send_email);
    }
}
