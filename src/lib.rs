//! Bounded-capacity handoff pipeline with a single producer and a single
//! consumer, plus the sales-table analyses that accompany it.
//!
//! [`channel::BoundedChannel`] is the synchronization core: a fixed-capacity
//! FIFO whose `put` blocks while full and `get` blocks while empty, so
//! capacity is the sole backpressure mechanism. [`pipeline::Pipeline`] drives
//! one producer and one consumer context against a shared channel and
//! validates that every produced item was consumed in order.
//! [`analysis::SalesAnalyzer`] aggregates an in-memory sales table, and
//! [`report::OutputLog`] writes run transcripts.

pub mod analysis;
pub mod channel;
pub mod pipeline;
pub mod report;

pub use channel::{BoundedChannel, ChannelError};
pub use pipeline::{
    Pipeline, PipelineConfig, PipelineError, PipelineEvent, PipelineReport, PipelineState,
};
