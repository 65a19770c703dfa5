//! Engine configuration loaded from a TOML file.
//!
//! Every field is optional in the file; missing fields take the values
//! the engine ships with, so an absent file is itself a complete, valid
//! configuration. The board token may also arrive through the
//! [`BOARD_TOKEN_ENV`] environment variable, which takes precedence
//! over the file.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::domain::RunPolicy;
use crate::model::domain::{ModelId, ParamCount};
use crate::model::services::{DEFAULT_GENERATION_ATTEMPTS, ModelPolicy};
use crate::pipeline::domain::{Points, StageThresholds};
use crate::pipeline::services::DEFAULT_RATE_LIMIT_ATTEMPTS;

/// Environment variable that overrides the board token from the file.
pub const BOARD_TOKEN_ENV: &str = "VASARI_BOARD_TOKEN";

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file {path}")]
    Io {
        /// Path of the unreadable file.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The file's contents are not valid TOML for this schema.
    #[error("failed to parse configuration file {path}")]
    Parse {
        /// Path of the malformed file.
        path: String,
        /// Underlying TOML failure.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A field value fails validation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the value.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Engine configuration (TOML).
///
/// The file is meant to be edited by hand; every section and field may
/// be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Stage gate thresholds.
    pub policy: PolicyConfig,
    /// Inference endpoint and model selection settings.
    pub models: ModelsConfig,
    /// Limits governing one run.
    pub run: RunConfig,
    /// Hosted tracker access.
    pub board: BoardConfig,
}

/// Review point thresholds gating stage transitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Points an idea needs before entering `Ready`.
    pub ready_threshold: f64,
    /// Points an idea needs before entering `InProgress`.
    pub in_progress_threshold: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            ready_threshold: 5.0,
            in_progress_threshold: 5.0,
        }
    }
}

/// Inference endpoint and model selection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelsConfig {
    /// Base URL of the inference endpoint.
    pub endpoint: String,
    /// Bearer token for the inference endpoint, when it requires one.
    pub token: Option<String>,
    /// Model loaded when ranking produces no candidate.
    pub fallback: String,
    /// Largest loadable model, in millions of parameters.
    pub param_ceiling_millions: u64,
    /// Tags every selected model must carry.
    pub required_tags: Vec<String>,
    /// Generation calls allowed per request across candidates.
    pub generation_attempts: u32,
    /// Token cap for one generation call.
    pub max_tokens: u32,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_owned(),
            token: None,
            fallback: "hermes-7b".to_owned(),
            param_ceiling_millions: 7000,
            required_tags: vec!["instruct".to_owned()],
            generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
            max_tokens: RunPolicy::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Limits governing one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock budget for one run, in seconds.
    pub budget_secs: u64,
    /// Cap on concurrently executing tasks.
    pub worker_limit: usize,
    /// Commit attempts per task under version conflicts.
    pub commit_attempts: u32,
    /// Retry budget for rate-limited board calls.
    pub rate_limit_attempts: u32,
    /// Run-lock time-to-live, in seconds.
    pub lock_ttl_secs: u64,
    /// Pause between runs in watch mode, in seconds.
    pub watch_interval_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget_secs: RunPolicy::DEFAULT_BUDGET.as_secs(),
            worker_limit: RunPolicy::DEFAULT_WORKER_LIMIT,
            commit_attempts: RunPolicy::DEFAULT_COMMIT_ATTEMPTS,
            rate_limit_attempts: DEFAULT_RATE_LIMIT_ATTEMPTS,
            lock_ttl_secs: RunPolicy::DEFAULT_LOCK_TTL.as_secs(),
            watch_interval_secs: 3600,
        }
    }
}

/// Hosted tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BoardConfig {
    /// Base URL of the tracker.
    pub endpoint: String,
    /// Bearer token for the tracker, when it requires one.
    pub token: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000".to_owned(),
            token: None,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from a TOML file.
    ///
    /// A missing file yields the default configuration. Every load is
    /// validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file exists but cannot be
    /// read, [`ConfigError::Parse`] when its contents are not valid TOML
    /// for this schema, and [`ConfigError::Invalid`] when a field fails
    /// validation.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field, returning the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        self.thresholds()?;
        self.model_policy()?;
        self.run_policy()?;
        if self.models.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("models.endpoint must not be empty"));
        }
        if self.board.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("board.endpoint must not be empty"));
        }
        if self.models.required_tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "models.required_tags must not contain empty tags",
            ));
        }
        if self.run.rate_limit_attempts == 0 {
            return Err(ConfigError::invalid(
                "run.rate_limit_attempts must be at least 1",
            ));
        }
        if self.run.watch_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "run.watch_interval_secs must be at least 1",
            ));
        }
        Ok(())
    }

    /// Converts the threshold fields into stage gate points.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a threshold is negative or
    /// not a multiple of 0.5.
    pub fn thresholds(&self) -> ConfigResult<StageThresholds> {
        let ready = Points::try_from_f64(self.policy.ready_threshold)
            .map_err(|err| ConfigError::invalid(format!("policy.ready_threshold: {err}")))?;
        let in_progress = Points::try_from_f64(self.policy.in_progress_threshold)
            .map_err(|err| ConfigError::invalid(format!("policy.in_progress_threshold: {err}")))?;
        Ok(StageThresholds::new(ready, in_progress))
    }

    /// Converts the model fields into a selection policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the fallback identifier is
    /// malformed or the parameter ceiling or attempt budget is zero.
    pub fn model_policy(&self) -> ConfigResult<ModelPolicy> {
        let fallback = ModelId::new(&self.models.fallback)
            .map_err(|err| ConfigError::invalid(format!("models.fallback: {err}")))?;
        let ceiling = ParamCount::from_millions(self.models.param_ceiling_millions)
            .map_err(|err| ConfigError::invalid(format!("models.param_ceiling_millions: {err}")))?;
        if self.models.generation_attempts == 0 {
            return Err(ConfigError::invalid(
                "models.generation_attempts must be at least 1",
            ));
        }
        Ok(ModelPolicy::new(fallback, ceiling)
            .with_generation_attempts(self.models.generation_attempts))
    }

    /// Converts the run fields into run limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a budget, cap, or bound is
    /// zero.
    pub fn run_policy(&self) -> ConfigResult<RunPolicy> {
        if self.run.budget_secs == 0 {
            return Err(ConfigError::invalid("run.budget_secs must be at least 1"));
        }
        if self.run.worker_limit == 0 {
            return Err(ConfigError::invalid("run.worker_limit must be at least 1"));
        }
        if self.run.commit_attempts == 0 {
            return Err(ConfigError::invalid(
                "run.commit_attempts must be at least 1",
            ));
        }
        if self.run.lock_ttl_secs == 0 {
            return Err(ConfigError::invalid("run.lock_ttl_secs must be at least 1"));
        }
        if self.models.max_tokens == 0 {
            return Err(ConfigError::invalid("models.max_tokens must be at least 1"));
        }
        Ok(RunPolicy::default()
            .with_budget(Duration::from_secs(self.run.budget_secs))
            .with_worker_limit(self.run.worker_limit)
            .with_commit_attempts(self.run.commit_attempts)
            .with_lock_ttl(Duration::from_secs(self.run.lock_ttl_secs))
            .with_max_tokens(self.models.max_tokens))
    }

    /// Returns the tags every selected model must carry.
    #[must_use]
    pub fn required_tags(&self) -> BTreeSet<String> {
        self.models.required_tags.iter().cloned().collect()
    }

    /// Returns the pause between runs in watch mode.
    #[must_use]
    pub const fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.run.watch_interval_secs)
    }

    /// Returns the retry budget for rate-limited board calls.
    #[must_use]
    pub const fn rate_limit_attempts(&self) -> u32 {
        self.run.rate_limit_attempts
    }

    /// Returns the board token, preferring the environment override.
    ///
    /// An override that is set but empty counts as unset.
    #[must_use]
    pub fn board_token(&self) -> Option<String> {
        Self::token_override(env::var(BOARD_TOKEN_ENV).ok(), self.board.token.as_deref())
    }

    fn token_override(env_token: Option<String>, file_token: Option<&str>) -> Option<String> {
        env_token
            .filter(|token| !token.is_empty())
            .or_else(|| file_token.map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(contents: &str) -> EngineConfig {
        toml::from_str(contents).expect("configuration parses")
    }

    #[rstest]
    fn a_missing_file_yields_the_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = EngineConfig::load(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.run.budget_secs, 900);
        assert_eq!(config.run.worker_limit, 2);
        assert_eq!(config.models.fallback, "hermes-7b");
    }

    #[rstest]
    fn a_partial_file_keeps_the_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[run]\nworker_limit = 4\n").expect("write");

        let config = EngineConfig::load(&path).expect("load");

        assert_eq!(config.run.worker_limit, 4);
        assert_eq!(config.run.budget_secs, 900);
        assert_eq!(config.policy, PolicyConfig::default());
    }

    #[rstest]
    fn unparseable_files_are_reported_with_their_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "not toml ][").expect("write");

        let error = EngineConfig::load(&path).expect_err("load fails");

        let ConfigError::Parse { path: reported, .. } = error else {
            panic!("expected a parse error, got {error:?}");
        };
        assert!(reported.ends_with("config.toml"));
    }

    #[rstest]
    fn thresholds_convert_to_half_points() {
        let thresholds = EngineConfig::default()
            .thresholds()
            .expect("default thresholds");
        assert_eq!(
            thresholds,
            StageThresholds::new(Points::from_half_points(10), Points::from_half_points(10))
        );
    }

    #[rstest]
    fn quarter_point_thresholds_are_rejected() {
        let config = parse("[policy]\nready_threshold = 4.3\n");

        let error = config.thresholds().expect_err("validation fails");

        assert!(error.to_string().contains("policy.ready_threshold"));
    }

    #[rstest]
    fn a_malformed_fallback_id_is_rejected() {
        let config = parse("[models]\nfallback = \"bad name!\"\n");

        let error = config.validate().expect_err("validation fails");

        assert!(error.to_string().contains("models.fallback"));
    }

    #[rstest]
    #[case::worker_limit("[run]\nworker_limit = 0\n", "run.worker_limit")]
    #[case::budget("[run]\nbudget_secs = 0\n", "run.budget_secs")]
    #[case::rate_limit("[run]\nrate_limit_attempts = 0\n", "run.rate_limit_attempts")]
    #[case::generation("[models]\ngeneration_attempts = 0\n", "models.generation_attempts")]
    #[case::endpoint("[board]\nendpoint = \"\"\n", "board.endpoint")]
    fn zeroed_limits_are_rejected(#[case] contents: &str, #[case] field: &str) {
        let config = parse(contents);

        let error = config.validate().expect_err("validation fails");

        assert!(error.to_string().contains(field), "missing {field}: {error}");
    }

    #[rstest]
    fn run_limits_carry_into_the_policy() {
        let config = parse(
            "[run]\nbudget_secs = 60\nworker_limit = 3\ncommit_attempts = 5\n\
             lock_ttl_secs = 120\n\n[models]\nmax_tokens = 512\n",
        );

        let policy = config.run_policy().expect("run policy");

        assert_eq!(policy.budget(), Duration::from_secs(60));
        assert_eq!(policy.worker_limit(), 3);
        assert_eq!(policy.commit_attempts(), 5);
        assert_eq!(policy.lock_ttl(), Duration::from_secs(120));
        assert_eq!(policy.max_tokens(), 512);
    }

    #[rstest]
    fn model_limits_carry_into_the_policy() {
        let policy = EngineConfig::default().model_policy().expect("model policy");

        assert_eq!(policy.fallback().as_str(), "hermes-7b");
        assert_eq!(policy.param_ceiling().millions(), 7000);
        assert_eq!(policy.generation_attempts(), DEFAULT_GENERATION_ATTEMPTS);
    }

    #[rstest]
    #[case::env_wins(Some("from-env"), Some("from-file"), Some("from-env"))]
    #[case::empty_env_is_unset(Some(""), Some("from-file"), Some("from-file"))]
    #[case::file_only(None, Some("from-file"), Some("from-file"))]
    #[case::neither(None, None, None)]
    fn the_environment_token_outranks_the_file(
        #[case] env_token: Option<&str>,
        #[case] file_token: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let resolved =
            EngineConfig::token_override(env_token.map(str::to_owned), file_token);
        assert_eq!(resolved.as_deref(), expected);
    }
}
