pub mod edge;
pub mod error;
pub mod expr;
pub mod finalize;
pub mod graph;
pub mod id;
pub mod library;
pub mod node;

// Re-export commonly used types
pub use edge::Wire;
pub use error::CoreError;
pub use expr::RowExpression;
pub use finalize::{finalize, FinalizeReport};
pub use graph::Subgraph;
pub use id::{EdgeId, NodeId};
pub use library::Library;
pub use node::{Block, BlockKind, ConcatDimension, Position};
