/// In-memory citation graph and its derived indexes.
pub mod model;

/// Assembles a graph from extracted documents.
pub mod builder;

/// Level-bounded traversal over outgoing references.
pub mod traversal;

/// Analytical queries over the graph.
pub mod queries;

pub use builder::{build_graph, GraphBuilder};
pub use model::ReferenceGraph;
pub use queries::{DocumentMetrics, GraphQueryManager};
pub use traversal::{expand, GraphTraverser};
