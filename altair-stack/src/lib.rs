//! Altair Stack
//!
//! The declarative stack for the RAG application's runtime environment:
//! an isolated network, access-control groups, one application instance,
//! and one managed Postgres instance. `EnvironmentStack::synthesize`
//! produces the desired-state resource graph handed to the provisioning
//! engine.

pub mod access;
pub mod compute;
pub mod database;
pub mod network;
pub mod stack;

pub use stack::EnvironmentStack;
