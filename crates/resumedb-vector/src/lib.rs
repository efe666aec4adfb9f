//! resumedb-vector
//!
//! Exact inner-product vector store with a positional payload side-car,
//! type-filtered over-fetch search, and paired on-disk persistence.

pub mod builder;
pub mod flat;
pub mod persist;
pub mod store;

pub use builder::IndexBuilder;
pub use flat::{FlatIpIndex, Neighbor};
pub use persist::{IndexPaths, Manifest};
pub use store::{PayloadStore, VectorStore};
