//! Tundra Lifecycle — the account freeze/unfreeze/delete state machine,
//! the cascade that mirrors an account's freeze state onto its posts
//! and comments, and the content gate that reads through the
//! visibility resolver.

pub mod cascade;
pub mod config;
pub mod content;
pub mod manager;
pub mod policy;

pub use cascade::{CascadeCoordinator, CascadeReport, PurgeReport};
pub use config::LifecycleConfig;
pub use content::{ContentService, NewComment};
pub use manager::{AccountLifecycleManager, DeletionOutcome, SweepReport, TransitionOutcome};
pub use policy::can_self_unfreeze;
