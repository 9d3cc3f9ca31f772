//! Tundra Core — domain models, error kinds, repository traits and the
//! content visibility resolver shared by every other crate.

pub mod collaborator;
pub mod error;
pub mod models;
pub mod repository;
pub mod visibility;

pub use error::{ErrorKind, TundraError, TundraResult};
pub use visibility::VisibilityResolver;
