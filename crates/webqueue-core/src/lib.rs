//! Core domain types and traits for the webqueue job server.
//!
//! This crate contains:
//! - Job identifiers
//! - The job record and its status
//! - The executor trait and the default delay executor
//! - The shared error type

pub mod error;
pub mod executor;
pub mod id;
pub mod job;

pub use error::{Error, Result};
pub use executor::{DelayExecutor, Executor};
pub use id::JobId;
pub use job::{Job, JobStatus, Payload};
