//! Domain models for Tundra.
//!
//! Accounts own posts and comments; the freeze state of an account is
//! mirrored onto everything it owns.

pub mod account;
pub mod content;
pub mod freeze;
