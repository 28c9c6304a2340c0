//! Domain services for group programs.
//!
//! Storage and collaborators are traits so the service runs unchanged over
//! PostgreSQL or the in-memory implementations.

pub mod announcement;
pub mod catalog_cache;
pub mod collaborators;
pub mod memory;
pub mod program;
pub mod progress;
pub mod store;
pub mod sync;

pub use announcement::{build_announcement, resolve_messages};
pub use catalog_cache::{CatalogCache, DEFAULT_STALENESS};
pub use collaborators::{CatalogSource, ChatService, GroupRoster};
pub use memory::{
    InMemoryCatalog, InMemoryChatService, InMemoryGroupRoster, InMemoryProgramStore,
    InMemorySessionLogStore,
};
pub use program::{Applied, ProgramService};
pub use progress::aggregate_progress;
pub use store::{EditOutcome, ProgramEdit, ProgramStore, SessionLogStore};
pub use sync::{merge, MergeOutcome, Versioned};
