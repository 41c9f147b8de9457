//! Altair Core
//!
//! Core library for a declarative infrastructure stack definition: typed
//! resources, attribute schemas, an ordered resource graph, and a
//! diff/plan pipeline handed to an external provisioning engine.

pub mod differ;
pub mod effect;
pub mod graph;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
