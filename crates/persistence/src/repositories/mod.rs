//! PostgreSQL implementations of the domain storage and collaborator traits.

pub mod catalog;
pub mod chat;
pub mod group_member;
pub mod program;
pub mod session;

pub use catalog::CatalogRepository;
pub use chat::ChatMessageRepository;
pub use group_member::GroupMemberRepository;
pub use program::ProgramRepository;
pub use session::SessionRepository;
