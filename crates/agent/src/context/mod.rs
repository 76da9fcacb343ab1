//! Rendering a cognitive workspace into the context blob handed to the
//! downstream generator.

pub mod clock;
pub mod serializer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use serializer::{
    ContextSerializer, MAX_HISTORY_TURNS, MAX_RELEVANT_MEMORIES, SerializeInput,
};
