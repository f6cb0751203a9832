pub mod store_nodes;

pub use store_nodes as store_node_entity;
