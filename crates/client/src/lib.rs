//! HTTP client for the group programs API.
//!
//! Besides one method per endpoint, this crate carries the pieces a consumer
//! needs to keep a view fresh without a push channel:
//! - [`ActionGate`]: at most one accept/decline in flight per program
//! - [`Poller`]: cancellable fixed-interval polling, one fetch at a time,
//!   reconciled by id and published through a watch channel
//! - [`MembershipOverlay`]: optimistic membership status laid over polled data

pub mod actions;
pub mod error;
pub mod gate;
pub mod http;
pub mod overlay;
pub mod poller;

pub use actions::MembershipActions;
pub use error::{ClientError, ClientResult};
pub use gate::{ActionGate, ActionPermit};
pub use http::{ClientConfig, ProgramsClient};
pub use overlay::MembershipOverlay;
pub use poller::{
    GroupMessagesSource, GroupProgramsSource, PollHandle, PollSource, Poller, DEFAULT_POLL_INTERVAL,
};
