//! Context assembly pipeline: the single entry point of the engine.
//!
//! One request runs these steps in order:
//!
//! 1. Load (or create) the user's workspace
//! 2. Classify the input into a domain
//! 3. Switch focus to that domain
//! 4. Describe the active task
//! 5. Fetch candidate semantic and episodic memories
//! 6. Rank both lists and truncate them to 3 and 5
//! 7. Store the ranked lists in the focused domain
//! 8. Resolve task data for the focused domain
//! 9. Persist the workspace, exactly once
//! 10. Render the context blob
//!
//! Steps 1 to 9 run under an exclusive per-user lock. Every collaborator
//! call before step 9 is bounded by a timeout and races the request's
//! cancellation token; a request aborted there persists nothing. The
//! persist call itself is never cancelled once started.

use crate::attention::AttentionMechanism;
use crate::context::{
    Clock, ContextSerializer, MAX_HISTORY_TURNS, MAX_RELEVANT_MEMORIES, SerializeInput,
    SystemClock,
};
use crate::locks::UserLocks;
use crate::task_data::TaskDataResolver;
use crate::workspace::WorkspaceManager;
use attune_core::error::{Error, Result};
use attune_core::memory::{EpisodicMemory, MemorySource};
use attune_core::persona::PersonaSource;
use attune_core::session::SessionStore;
use attune_core::task::TaskDataSource;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Semantic memories kept after ranking.
pub const SEMANTIC_LIMIT: usize = MAX_RELEVANT_MEMORIES;

/// Episodic memories kept after ranking.
pub const EPISODIC_LIMIT: usize = MAX_HISTORY_TURNS;

/// Characters of user input quoted in the active task description.
pub const ACTIVE_TASK_PREFIX_CHARS: usize = 50;

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Semantic candidates requested from the memory source before ranking.
    pub semantic_candidates: usize,
    /// Episodic candidates requested from the memory source before ranking.
    pub episodic_candidates: usize,
    /// Upper bound on any single collaborator call.
    pub collaborator_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            semantic_candidates: SEMANTIC_LIMIT,
            episodic_candidates: EPISODIC_LIMIT,
            collaborator_timeout: Duration::from_secs(10),
        }
    }
}

/// What one assembly did, for logging and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub user_id: String,
    pub domain_id: String,
    pub previous_focus: Option<String>,
    /// The domain was visited for the first time.
    pub domain_created: bool,
    pub semantic_candidates: usize,
    pub semantic_kept: usize,
    pub episodic_candidates: usize,
    pub episodic_kept: usize,
    pub has_task_data: bool,
    pub persona_found: bool,
    pub elapsed_ms: u64,
}

/// A rendered context plus its report.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub context: String,
    pub report: AssemblyReport,
}

/// Human-readable task line for the focused domain.
pub fn describe_task(user_input: &str, domain_id: &str) -> String {
    let mut chars = user_input.chars();
    let prefix: String = chars.by_ref().take(ACTIVE_TASK_PREFIX_CHARS).collect();
    let ellipsis = if chars.next().is_some() { "..." } else { "" };
    format!("Processing user input: '{prefix}{ellipsis}' in domain '{domain_id}'")
}

/// The context assembly pipeline.
///
/// Holds its collaborators as trait objects; everything is injected at
/// construction and nothing is global.
pub struct ContextPipeline {
    personas: Arc<dyn PersonaSource>,
    memory: Arc<dyn MemorySource>,
    sessions: Arc<dyn SessionStore>,
    task_source: Option<Arc<dyn TaskDataSource>>,
    resolver: TaskDataResolver,
    semantic_attention: AttentionMechanism,
    episodic_attention: AttentionMechanism,
    clock: Arc<dyn Clock>,
    options: PipelineOptions,
    locks: UserLocks,
}

impl ContextPipeline {
    /// A pipeline with lexical semantic ranking, passthrough episodic
    /// ranking, the built-in task formatters, and no task-data source.
    pub fn new(
        personas: Arc<dyn PersonaSource>,
        memory: Arc<dyn MemorySource>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            personas,
            memory,
            sessions,
            task_source: None,
            resolver: TaskDataResolver::with_builtin_formatters(),
            semantic_attention: AttentionMechanism::Lexical,
            episodic_attention: AttentionMechanism::Passthrough,
            clock: Arc::new(SystemClock),
            options: PipelineOptions::default(),
            locks: UserLocks::new(),
        }
    }

    pub fn with_task_source(mut self, source: Arc<dyn TaskDataSource>) -> Self {
        self.task_source = Some(source);
        self
    }

    pub fn with_resolver(mut self, resolver: TaskDataResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_semantic_attention(mut self, attention: AttentionMechanism) -> Self {
        self.semantic_attention = attention;
        self
    }

    pub fn with_episodic_attention(mut self, attention: AttentionMechanism) -> Self {
        self.episodic_attention = attention;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Build the context blob for one request.
    pub async fn generate_context(&self, user_id: &str, user_input: &str) -> Result<String> {
        self.generate_context_with_cancel(user_id, user_input, CancellationToken::new())
            .await
    }

    /// [`generate_context`](Self::generate_context) with caller-driven
    /// cancellation.
    pub async fn generate_context_with_cancel(
        &self,
        user_id: &str,
        user_input: &str,
        cancel: CancellationToken,
    ) -> Result<String> {
        let assembly = self.assemble(user_id, user_input, &cancel).await?;
        Ok(assembly.context)
    }

    /// Run the full pipeline and return the blob with its report.
    pub async fn assemble(
        &self,
        user_id: &str,
        user_input: &str,
        cancel: &CancellationToken,
    ) -> Result<Assembly> {
        let started = Instant::now();

        let guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Error::Cancelled { stage: "acquire_lock".into() });
            }
            guard = self.locks.acquire(user_id) => guard,
        };

        // 1. Load or create
        let mut workspace = self
            .guarded(
                "load_workspace",
                cancel,
                WorkspaceManager::load_or_create(self.sessions.as_ref(), user_id),
            )
            .await?;

        // 2. Classify
        let domain_id = self
            .guarded(
                "detect_domain",
                cancel,
                self.personas.detect_domain(user_input),
            )
            .await?;
        debug!(user_id, domain_id = %domain_id, "Input classified");

        // 3. Focus
        let change = WorkspaceManager::switch_focus(&mut workspace, &domain_id);

        // 4. Active task
        workspace
            .active_domains
            .entry(domain_id.clone())
            .or_default()
            .active_task = describe_task(user_input, &domain_id);

        // 5. Candidates
        let semantic = self
            .guarded(
                "fetch_semantic",
                cancel,
                self.memory.fetch_semantic_memories(
                    user_input,
                    &domain_id,
                    self.options.semantic_candidates,
                ),
            )
            .await?;
        let episodic = self
            .guarded(
                "fetch_episodic",
                cancel,
                self.memory.fetch_episodic_memories(
                    user_id,
                    &domain_id,
                    self.options.episodic_candidates,
                ),
            )
            .await?;
        let semantic_candidates = semantic.len();
        let episodic_candidates = episodic.len();

        // 6. Rank and truncate
        let mut semantic = self
            .guarded(
                "rank_semantic",
                cancel,
                self.semantic_attention.rank(user_input, semantic),
            )
            .await?;
        semantic.truncate(SEMANTIC_LIMIT);

        let mut episodic: Vec<EpisodicMemory> = self
            .guarded(
                "rank_episodic",
                cancel,
                self.episodic_attention.rank(user_input, episodic),
            )
            .await?;
        episodic.truncate(EPISODIC_LIMIT);

        // 7. Store
        let semantic_kept = semantic.len();
        let episodic_kept = episodic.len();
        let state = workspace.active_domains.entry(domain_id.clone()).or_default();
        state.semantic_memories = semantic;
        state.episodic_memories = episodic;

        // 8. Task data
        let task_data = self.resolve_task_data(&domain_id, user_input, cancel).await?;
        let has_task_data = task_data.is_some();
        workspace
            .active_domains
            .entry(domain_id.clone())
            .or_default()
            .task_data = task_data;

        // 9. Persist, not raced against cancellation
        if cancel.is_cancelled() {
            return Err(Error::Cancelled { stage: "persist".into() });
        }
        self.bounded("save_workspace", self.sessions.save_workspace(&workspace))
            .await?;
        drop(guard);

        // 10. Render
        let persona = self
            .bounded("get_persona", self.personas.get_persona(&domain_id))
            .await?;
        if persona.is_none() {
            warn!(user_id, domain_id = %domain_id, "No persona for focused domain");
        }
        let context = ContextSerializer::render(&SerializeInput {
            workspace: &workspace,
            persona: persona.as_ref(),
            user_input,
            timestamp: self.clock.now(),
        });

        let report = AssemblyReport {
            user_id: user_id.to_string(),
            domain_id,
            previous_focus: change.previous,
            domain_created: change.created,
            semantic_candidates,
            semantic_kept,
            episodic_candidates,
            episodic_kept,
            has_task_data,
            persona_found: persona.is_some(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            user_id,
            domain_id = %report.domain_id,
            semantic = report.semantic_kept,
            episodic = report.episodic_kept,
            task_data = report.has_task_data,
            elapsed_ms = report.elapsed_ms,
            "Context assembled"
        );

        Ok(Assembly { context, report })
    }

    /// Append a finished turn to the memory source.
    pub async fn record_interaction(&self, interaction: EpisodicMemory) -> Result<()> {
        debug!(
            user_id = %interaction.user_id,
            domain_id = %interaction.domain_id,
            "Recording interaction"
        );
        self.bounded("log_interaction", self.memory.log_interaction(interaction))
            .await
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Load and summarize task data. Source failures become an error
    /// payload so the request still completes and persists.
    async fn resolve_task_data(
        &self,
        domain_id: &str,
        user_input: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<serde_json::Value>> {
        let Some(source) = &self.task_source else {
            return Ok(None);
        };

        match self
            .guarded("load_task_data", cancel, source.load(domain_id, user_input))
            .await
        {
            Ok(Some(raw)) => Ok(Some(self.resolver.resolve(domain_id, raw))),
            Ok(None) => Ok(None),
            Err(Error::TaskData(e)) => {
                warn!(domain_id, error = %e, "Task data unavailable");
                Ok(Some(serde_json::json!({ "error": e.to_string() })))
            }
            Err(e) => Err(e),
        }
    }

    /// Run a collaborator call under the timeout, racing cancellation.
    async fn guarded<T, E, F>(&self, stage: &str, cancel: &CancellationToken, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<Error>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(stage, "Request cancelled");
                Err(Error::Cancelled { stage: stage.into() })
            }
            result = self.bounded(stage, fut) => result,
        }
    }

    /// Run a collaborator call under the timeout only.
    async fn bounded<T, E, F>(&self, stage: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<Error>,
    {
        let timeout = self.options.collaborator_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                warn!(stage, timeout_ms = timeout.as_millis() as u64, "Collaborator timed out");
                Err(Error::Timeout {
                    stage: stage.into(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
