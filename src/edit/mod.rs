//! Edit model, validation, and merge engine

pub mod merger;
pub mod model;

pub use merger::{merge, MergeOutcome, MergeReport, RejectedEdit};
pub use model::{AggregatedEdit, Edit, RejectReason};
