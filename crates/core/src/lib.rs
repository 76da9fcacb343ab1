//! # attune core
//!
//! Domain types, collaborator traits, and error definitions for the attune
//! context engine. This crate performs no I/O beyond loading a persona
//! catalog; it defines the model every other crate implements against.
//!
//! ## Collaborators
//!
//! The context pipeline only talks to the outside world through traits:
//! - [`PersonaSource`]: personas and domain classification
//! - [`MemorySource`]: semantic and episodic memories
//! - [`SessionStore`]: workspace persistence
//! - [`TaskDataSource`]: auxiliary task payloads
//! - [`Embedder`]: query embeddings for vector ranking

pub mod embedding;
pub mod error;
pub mod memory;
pub mod persona;
pub mod session;
pub mod task;
pub mod workspace;

// Re-export key types at crate root for ergonomics
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use memory::{EpisodicMemory, MemorySource, Recallable, SemanticMemory};
pub use persona::{CatalogEntry, Persona, PersonaCatalog, PersonaConfig, PersonaSource, DEFAULT_DOMAIN};
pub use session::SessionStore;
pub use task::TaskDataSource;
pub use workspace::{CognitiveWorkspace, DomainState, DomainStatus};
