//! Config composition: default policy and source ordering.

pub mod merge_policy;
pub mod service;
