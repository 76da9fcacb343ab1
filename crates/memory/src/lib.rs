//! Storage collaborators for attune: memory sources, session stores,
//! embedders, and the knowledge-base task-data source.

pub mod embedding;
pub mod file_backend;
pub mod in_memory;
pub mod knowledge;
pub mod noop;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use embedding::HashEmbedder;
pub use file_backend::FileStore;
pub use in_memory::InMemoryStore;
pub use knowledge::KnowledgeBase;
pub use noop::NoopMemory;
pub use vector::{cosine_similarity, l2_normalize};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
