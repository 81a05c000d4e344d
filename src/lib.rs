pub mod citegraph;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod graph;
pub mod normalize;
pub mod query;
pub mod report;
pub mod resolution;
pub mod snapshot;
pub mod types;
