//! The store-facing half: type lattice, record normalisation, the schema
//! evolution writer and the connection registry.

pub mod error;
pub mod normalize;
pub mod registry;
pub mod types;
pub mod writer;

pub use error::StoreError;
pub use registry::{registry, ConnectionRegistry};
pub use types::ColumnType;
pub use writer::Writer;
