//! Drives orchestrator runs over the research board.
//!
//! Usage:
//!
//! ```text
//! scheduler <operation> [config-path]
//! ```
//!
//! The `operation` must be `run` (execute one run and exit) or `watch`
//! (execute runs forever, pausing for the configured interval between
//! them). The optional `config-path` names a TOML file deserialising
//! into an [`EngineConfig`]; when omitted, `vasari.toml` in the working
//! directory is used, and a missing file runs on defaults. A
//! representative configuration is:
//!
//! ```toml
//! [policy]
//! ready_threshold = 5.0
//! in_progress_threshold = 5.0
//!
//! [models]
//! endpoint = "http://localhost:8080"
//! fallback = "hermes-7b"
//! param_ceiling_millions = 7000
//! required_tags = ["instruct"]
//!
//! [run]
//! budget_secs = 900
//! worker_limit = 2
//!
//! [board]
//! endpoint = "http://localhost:3000"
//! token = "..."
//! ```
//!
//! The board token may also arrive through the `VASARI_BOARD_TOKEN`
//! environment variable, which overrides the file.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use vasari::config::{ConfigError, EngineConfig};
use vasari::engine::adapters::generation::ProviderGenerator;
use vasari::engine::adapters::handlers::HandlerTable;
use vasari::engine::adapters::rest::RestRunCoordination;
use vasari::engine::ports::TextGenerator;
use vasari::engine::services::{Orchestrator, OrchestratorError, TaskExecutor, TaskSelector};
use vasari::model::adapters::rest::ManifestCatalog;
use vasari::model::services::ModelProvider;
use vasari::pipeline::adapters::rest::RestBoard;
use vasari::pipeline::ports::AcceptAllHumanReviews;
use vasari::pipeline::services::RepositoryStateStore;

const DEFAULT_CONFIG_PATH: &str = "vasari.toml";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Orchestrator wired to the live REST adapters.
type LiveOrchestrator =
    Orchestrator<RestBoard, AcceptAllHumanReviews, DefaultClock, RestRunCoordination>;

/// Errors that can occur while standing up or driving the scheduler.
#[derive(Debug, Error)]
enum SchedulerError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to load configuration: {0}")]
    Config(#[source] ConfigError),
    #[error("failed to construct a client: {0}")]
    ClientInit(String),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("run failed: {0}")]
    Run(#[source] OrchestratorError),
}

#[derive(Debug)]
enum Operation {
    Run,
    Watch,
}

impl Operation {
    fn parse(arg: &str) -> Result<Self, SchedulerError> {
        match arg {
            "run" => Ok(Self::Run),
            "watch" => Ok(Self::Watch),
            other => Err(SchedulerError::InvalidArgs(format!(
                "unknown operation '{other}'; expected run or watch"
            ))),
        }
    }
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    run_scheduler(env::args()).map_err(Into::into)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn run_scheduler(args: impl Iterator<Item = String>) -> Result<(), SchedulerError> {
    let (operation, config_path) = parse_args(args)?;
    let config = EngineConfig::load(&config_path).map_err(SchedulerError::Config)?;
    let runtime = build_runtime()?;
    runtime.block_on(async {
        let orchestrator = assemble(&config)?;
        match operation {
            Operation::Run => run_once(&orchestrator).await,
            Operation::Watch => watch(&orchestrator, config.watch_interval()).await,
        }
    })
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(Operation, PathBuf), SchedulerError> {
    let _program = args.next();
    let operation = args
        .next()
        .ok_or_else(|| SchedulerError::InvalidArgs("missing operation argument".into()))
        .and_then(|arg| Operation::parse(&arg))?;
    let config_path = args
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if let Some(extra) = args.next() {
        return Err(SchedulerError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok((operation, config_path))
}

fn build_runtime() -> Result<tokio::runtime::Runtime, SchedulerError> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SchedulerError::RuntimeInit)
}

fn assemble(config: &EngineConfig) -> Result<LiveOrchestrator, SchedulerError> {
    let thresholds = config.thresholds().map_err(SchedulerError::Config)?;
    let model_policy = config.model_policy().map_err(SchedulerError::Config)?;
    let run_policy = config.run_policy().map_err(SchedulerError::Config)?;

    let catalog = Arc::new(
        ManifestCatalog::new(&config.models.endpoint, config.models.token.clone())
            .map_err(|err| SchedulerError::ClientInit(err.to_string()))?,
    );
    let provider = ModelProvider::new(catalog, model_policy);
    let generator: Arc<dyn TextGenerator> =
        Arc::new(ProviderGenerator::new(provider, config.required_tags()));

    let board = Arc::new(
        RestBoard::new(&config.board.endpoint, config.board_token())
            .map_err(|err| SchedulerError::ClientInit(err.to_string()))?,
    );
    let coordination = Arc::new(
        RestRunCoordination::new(&config.board.endpoint, config.board_token())
            .map_err(|err| SchedulerError::ClientInit(err.to_string()))?,
    );
    let clock = Arc::new(DefaultClock);
    let store =
        RepositoryStateStore::new(board, Arc::new(AcceptAllHumanReviews), Arc::clone(&clock))
            .with_rate_limit_attempts(config.rate_limit_attempts());

    Ok(Orchestrator::new(
        store,
        coordination,
        TaskSelector::new(thresholds),
        TaskExecutor::new(HandlerTable::with_defaults()),
        generator,
        clock,
        run_policy,
    ))
}

async fn run_once(orchestrator: &LiveOrchestrator) -> Result<(), SchedulerError> {
    let report = orchestrator.run().await.map_err(SchedulerError::Run)?;
    info!(
        outcome = ?report.outcome(),
        completed = report.completed_count(),
        failed = report.failed_count(),
        "run finished"
    );
    Ok(())
}

async fn watch(
    orchestrator: &LiveOrchestrator,
    interval: Duration,
) -> Result<(), SchedulerError> {
    loop {
        run_once(orchestrator).await?;
        debug!(secs = interval.as_secs(), "sleeping until the next run");
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        std::iter::once("scheduler".to_owned()).chain(raw.iter().map(|&arg| arg.to_owned()))
    }

    #[rstest]
    fn the_config_path_defaults_when_omitted() {
        let (operation, path) = parse_args(args(&["run"])).expect("args parse");
        assert!(matches!(operation, Operation::Run));
        assert_eq!(path, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[rstest]
    fn an_explicit_config_path_is_honoured() {
        let (operation, path) = parse_args(args(&["watch", "/etc/vasari.toml"])).expect("args parse");
        assert!(matches!(operation, Operation::Watch));
        assert_eq!(path, PathBuf::from("/etc/vasari.toml"));
    }

    #[rstest]
    fn unknown_operations_are_named_in_the_error() {
        let error = parse_args(args(&["serve"])).expect_err("parse fails");
        assert!(error.to_string().contains("unknown operation 'serve'"));
    }

    #[rstest]
    fn extra_arguments_are_rejected() {
        let error =
            parse_args(args(&["run", "vasari.toml", "extra"])).expect_err("parse fails");
        assert!(error.to_string().contains("unexpected extra argument"));
    }

    #[rstest]
    fn missing_operations_are_rejected() {
        let error = parse_args(args(&[])).expect_err("parse fails");
        assert!(error.to_string().contains("missing operation"));
    }
}
