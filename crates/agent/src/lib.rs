//! The attune engine: focus management, relevance ranking, and context
//! assembly.
//!
//! A request flows through the [`ContextPipeline`]:
//!
//! 1. **Load** the user's cognitive workspace (or start a new one)
//! 2. **Classify** the input into a domain and move focus there
//! 3. **Recall** candidate memories and **rank** them with the configured
//!    [`AttentionMechanism`]
//! 4. **Attach** summarized task data
//! 5. **Persist** the workspace and **render** the tagged context blob
//!
//! Collaborators (personas, memories, sessions, task data, embeddings) are
//! traits from `attune-core`; concrete stores live in `attune-memory`.

pub mod attention;
pub mod context;
pub mod locks;
pub mod pipeline;
pub mod task_data;
pub mod workspace;

pub use attention::AttentionMechanism;
pub use context::{Clock, ContextSerializer, FixedClock, SerializeInput, SystemClock};
pub use locks::UserLocks;
pub use pipeline::{
    ACTIVE_TASK_PREFIX_CHARS, Assembly, AssemblyReport, ContextPipeline, EPISODIC_LIMIT,
    PipelineOptions, SEMANTIC_LIMIT, describe_task,
};
pub use task_data::{
    FiscalDocumentFormatter, ProductRecordFormatter, TaskDataResolver, TaskFormatter,
};
pub use workspace::{FocusChange, WorkspaceManager};
