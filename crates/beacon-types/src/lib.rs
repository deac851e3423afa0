pub mod api;
pub mod models;
pub mod node;

pub use node::{Attrs, BinaryNode, NodeContent};
