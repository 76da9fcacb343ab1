//! Wiring: configuration → collaborators → pipeline.

use attune_agent::{AttentionMechanism, ContextPipeline, PipelineOptions};
use attune_config::{AppConfig, EmbeddingProvider, RankingStrategy, StorageBackend};
use attune_core::embedding::Embedder;
use attune_core::memory::{MemorySource, SemanticMemory};
use attune_core::persona::PersonaCatalog;
use attune_core::session::SessionStore;
use attune_memory::{FileStore, HashEmbedder, InMemoryStore, KnowledgeBase, SqliteStore};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub type CliResult<T> = Result<T, Box<dyn Error>>;

/// SQLite database file inside the data directory.
pub const SQLITE_FILE: &str = "attune.sqlite";

pub fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    Ok(AppConfig::load_with(path).map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The configured storage backend. One value serves as both memory source
/// and session store.
#[derive(Clone)]
pub enum Store {
    File(Arc<FileStore>),
    Sqlite(Arc<SqliteStore>),
    Memory(InMemoryStore),
}

impl Store {
    pub async fn open(config: &AppConfig) -> CliResult<Self> {
        let data_dir = config.data_dir();
        let store = match config.storage.backend {
            StorageBackend::File => Self::File(Arc::new(FileStore::new(&data_dir))),
            StorageBackend::Sqlite => {
                std::fs::create_dir_all(&data_dir)?;
                let url = format!("sqlite://{}", data_dir.join(SQLITE_FILE).display());
                Self::Sqlite(Arc::new(SqliteStore::new(&url).await?))
            }
            StorageBackend::Memory => Self::Memory(InMemoryStore::new()),
        };
        debug!(backend = %config.storage.backend, dir = %data_dir.display(), "Store opened");
        Ok(store)
    }

    pub fn memory(&self) -> Arc<dyn MemorySource> {
        match self {
            Self::File(s) => s.clone(),
            Self::Sqlite(s) => s.clone(),
            Self::Memory(s) => Arc::new(s.clone()),
        }
    }

    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        match self {
            Self::File(s) => s.clone(),
            Self::Sqlite(s) => s.clone(),
            Self::Memory(s) => Arc::new(s.clone()),
        }
    }

    pub async fn import_semantic(&self, memories: Vec<SemanticMemory>) -> CliResult<usize> {
        Ok(match self {
            Self::File(s) => s.import_semantic(memories).await?,
            Self::Sqlite(s) => s.import_semantic(memories).await?,
            Self::Memory(s) => s.import_semantic(memories).await,
        })
    }
}

/// The configured embedder, if any.
pub fn embedder(config: &AppConfig) -> Option<Arc<dyn Embedder>> {
    match config.embedding.provider {
        EmbeddingProvider::None => None,
        EmbeddingProvider::Hash => Some(Arc::new(HashEmbedder::new(config.embedding.dimensions))),
    }
}

fn attention(
    strategy: RankingStrategy,
    embedder: Option<&Arc<dyn Embedder>>,
) -> CliResult<AttentionMechanism> {
    Ok(match strategy {
        RankingStrategy::Passthrough => AttentionMechanism::Passthrough,
        RankingStrategy::Lexical => AttentionMechanism::Lexical,
        RankingStrategy::Vectorized => match embedder {
            Some(embedder) => AttentionMechanism::vectorized(Arc::clone(embedder)),
            None => return Err("vectorized ranking needs an embedding provider".into()),
        },
    })
}

pub fn load_catalog(config: &AppConfig) -> CliResult<PersonaCatalog> {
    let path = config.personas_path();
    if !path.exists() {
        return Err(format!(
            "No persona catalog at {} (run `attune onboard` first)",
            path.display()
        )
        .into());
    }
    let catalog = PersonaCatalog::load(&path)?;
    Ok(catalog.with_default_domain(config.pipeline.default_domain.clone()))
}

/// Everything a command needs to run requests.
pub struct Runtime {
    pub config: AppConfig,
    pub catalog: Arc<PersonaCatalog>,
    pub store: Store,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub pipeline: ContextPipeline,
}

impl Runtime {
    pub async fn build(config: AppConfig) -> CliResult<Self> {
        let catalog = Arc::new(load_catalog(&config)?);
        let store = Store::open(&config).await?;
        let embedder = embedder(&config);

        let mut pipeline = ContextPipeline::new(catalog.clone(), store.memory(), store.sessions())
            .with_semantic_attention(attention(config.attention.semantic, embedder.as_ref())?)
            .with_episodic_attention(attention(config.attention.episodic, embedder.as_ref())?)
            .with_options(PipelineOptions {
                semantic_candidates: config.pipeline.semantic_candidates,
                episodic_candidates: config.pipeline.episodic_candidates,
                collaborator_timeout: Duration::from_millis(config.pipeline.collaborator_timeout_ms),
            });
        if let Some(dir) = &config.storage.knowledge_dir {
            pipeline = pipeline.with_task_source(Arc::new(KnowledgeBase::new(dir)));
        }

        Ok(Self {
            config,
            catalog,
            store,
            embedder,
            pipeline,
        })
    }

    pub async fn from_path(config_path: Option<&Path>) -> CliResult<Self> {
        Self::build(load_config(config_path)?).await
    }
}
