/// Reference resolution module.
///
/// Matches the candidate references extracted from a query document against
/// the known documents of a [`crate::graph::ReferenceGraph`].
mod resolver;

pub use resolver::{resolve, ReferenceResolver};
