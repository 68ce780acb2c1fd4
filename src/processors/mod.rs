//! Data processing modules.

pub mod aggregation;
pub mod filtering;
pub mod pipeline;

// Re-export key types for convenience
pub use aggregation::{aggregate, circular_mean, AggregateRecord, GroupKey};
pub use filtering::{drop_empty_aggregates, filter_for_aggregation, passes_quality};
pub use pipeline::{process_records, run_pipeline, PipelineSummary, RadarCoverage};
