//! Shared error types for the solcloak workspace.

pub mod errors;
