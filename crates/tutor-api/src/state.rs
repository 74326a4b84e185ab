//! Application state wiring the tutor together.
//!
//! [`Storage`] is everything that works without a model: the archive on
//! disk, the in-memory log, the archivist and the checkpoint writer. The
//! offline commands (`flush`, `status`) only need that. [`AppState`] adds
//! the session manager and the orchestrator on top, pinned to the JSON-file
//! archive.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use tutor_core::agent::orchestrator::Tutor;
use tutor_core::chat::log_store::LogStore;
use tutor_core::chat::manager::SessionManager;
use tutor_core::llm::box_provider::BoxLlmProvider;
use tutor_core::service::archivist::{Archivist, LoadReport};
use tutor_core::service::checkpoint::{CheckpointWriter, RecoveryReport};
use tutor_core::service::maintenance::Maintenance;
use tutor_core::service::shutdown::{shutdown, ShutdownReport};
use tutor_infra::archive::JsonFileArchive;
use tutor_infra::config::{load_tutor_config, resolve_api_key, API_KEY_ENV};
use tutor_infra::filesystem::{resolve_data_dir, DataLayout};
use tutor_infra::llm::create_provider;
use tutor_types::config::TutorConfig;
use tutor_types::llm::LlmError;

pub type ConcreteArchivist = Archivist<JsonFileArchive>;
pub type ConcreteCheckpointWriter = CheckpointWriter<JsonFileArchive>;
pub type ConcreteSessionManager = SessionManager<JsonFileArchive>;
pub type ConcreteTutor = Tutor<JsonFileArchive>;

/// Durable side of the bot.
pub struct Storage {
    pub data_dir: PathBuf,
    pub config: TutorConfig,
    pub archive: Arc<JsonFileArchive>,
    pub log: Arc<LogStore>,
    pub archivist: Arc<ConcreteArchivist>,
    pub checkpoints: Arc<ConcreteCheckpointWriter>,
}

impl Storage {
    /// Open the data directory named by `TUTOR_DATA_DIR` (or the default)
    /// and load its `config.toml`.
    pub async fn open() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let config = load_tutor_config(&data_dir).await;
        Ok(Self::at(data_dir, config))
    }

    /// Wire storage over an explicit directory and config.
    pub fn at(data_dir: PathBuf, config: TutorConfig) -> Self {
        let archive = Arc::new(JsonFileArchive::new(DataLayout::new(&data_dir)));
        let log = Arc::new(LogStore::new());
        let archivist = Arc::new(Archivist::new(Arc::clone(&archive), Arc::clone(&log)));
        let checkpoints = Arc::new(CheckpointWriter::new(Arc::clone(&archive), Arc::clone(&log)));

        Self {
            data_dir,
            config,
            archive,
            log,
            archivist,
            checkpoints,
        }
    }

    /// Bring memory back to where the last run left it: latest snapshots
    /// first, then anything newer from a leftover checkpoint.
    pub async fn restore(&self) -> anyhow::Result<(LoadReport, RecoveryReport)> {
        let loaded = self
            .archivist
            .load_latest()
            .await
            .context("failed to load archived logs")?;
        let recovered = self
            .checkpoints
            .recover()
            .await
            .context("failed to recover checkpoint")?;

        tracing::info!(
            students = loaded.students,
            entries = loaded.entries,
            recovered = recovered.recovered,
            "log store restored"
        );
        Ok((loaded, recovered))
    }
}

/// Shared application state used by the HTTP server and the console loop.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub sessions: Arc<ConcreteSessionManager>,
    pub tutor: Arc<ConcreteTutor>,
}

impl AppState {
    /// Build the LLM provider from config and the environment, then wire the
    /// orchestrator.
    pub fn init(storage: Arc<Storage>) -> anyhow::Result<Self> {
        let api_key = resolve_api_key();
        let provider = create_provider(&storage.config.llm, api_key.as_ref()).map_err(|e| match e {
            LlmError::AuthenticationFailed => {
                anyhow::anyhow!("no LLM API key found; set {API_KEY_ENV} (or GOOGLE_API_KEY)")
            }
            other => anyhow::anyhow!("failed to create LLM provider: {other}"),
        })?;
        Ok(Self::with_provider(storage, provider))
    }

    pub fn with_provider(storage: Arc<Storage>, provider: BoxLlmProvider) -> Self {
        let config = &storage.config;
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&storage.log),
            Arc::clone(&storage.archive),
            config.summary,
        ));
        let tutor = Arc::new(Tutor::new(
            Arc::clone(&sessions),
            Arc::new(provider),
            config.llm.clone(),
            config.reply.chunk_limit,
        ));

        Self {
            storage,
            sessions,
            tutor,
        }
    }

    /// Start the periodic checkpoint and archive tasks.
    pub fn start_maintenance(&self, cancel: CancellationToken) -> Maintenance {
        Maintenance::spawn(
            Arc::clone(&self.storage.archivist),
            Arc::clone(&self.storage.checkpoints),
            self.storage.config.schedule,
            cancel,
        )
    }

    /// Run the shutdown sequence. Stop maintenance first.
    pub async fn shutdown(&self) -> ShutdownReport {
        shutdown(
            &*self.storage.archivist,
            &*self.storage.checkpoints,
            &*self.sessions,
        )
        .await
    }
}
