//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod writers;

pub use loaders::{LoaderError, VpRecord};
pub use transforms::{BinnedRecord, HeightBand};
pub use writers::{write_flowviz_csv, FlowvizRow, WriteError};
