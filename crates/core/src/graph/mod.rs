//! Knowledge-graph canvas: nodes, drag handling and derived edges.
//!
//! - [`node`]: node kinds, the node record and the seeded template
//! - [`canvas`]: the mutable node set and the single active drag
//! - [`edges`]: connector geometry from every node to the focal node

pub mod canvas;
pub mod edges;
pub mod node;

pub use canvas::{DragPolicy, DragSession, GraphCanvas};
pub use edges::{Edge, EdgeLabel, EdgeRenderer};
pub use node::{FOCAL_NODE_ID, GraphNode, NodeKind, NodeSnapshot, seed_template};
