//! Vertical-profile bird radar aggregation for flow visualization.
//!
//! This crate provides tools for:
//! - Discovering and loading per-radar vp CSV files
//! - Binning measurements by UTC hour and altitude band
//! - Filtering low-density and excluded records
//! - Aggregating per radar, hour and band (circular mean for wind direction)
//! - Writing the flowviz CSV consumed by the visualization
//!
//! # Example
//!
//! ```no_run
//! use vp_flowviz::{processors::pipeline::run_pipeline, FlowvizConfig};
//!
//! let config = FlowvizConfig::from_yaml("flowviz.yaml").unwrap();
//! let summary = run_pipeline(&config).unwrap();
//! println!("{} rows written", summary.rows_written);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use crate::config::{BinningConfig, FilterConfig, FlowvizConfig, InputConfig, ProjectConfig};
pub use crate::core::loaders::VpRecord;
pub use crate::processors::aggregation::AggregateRecord;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
