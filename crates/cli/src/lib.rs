//! Library half of the `solcloak` binary: argument types and subcommand
//! implementations, exposed so they can be driven from tests.

pub mod commands;
